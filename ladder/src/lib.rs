//! Semantic ladder core
//!
//! Deterministic, I/O-free building blocks for moving one piece of content up
//! and down a ladder of abstraction levels:
//!
//! - `level`: the rungs (emoji, word, sentence, paragraph, article, text, image)
//! - `ladder`: ordered level sequences and clamped adjacent moves
//! - `flush`: when streamed text is surfaced to the reader
//! - `state_machine`: the Idle → Clamping → Transforming → Committing cycle
//! - `state`: the per-session position and per-level content cache
//! - `input`: key and pinch translation into directions

pub mod error;
pub mod flush;
pub mod input;
pub mod ladder;
pub mod level;
pub mod state;
pub mod state_machine;

pub use error::LadderError;
pub use flush::{FlushBuffer, FlushPolicy};
pub use input::{direction_for_key, PinchTracker, PINCH_THRESHOLD};
pub use ladder::{Direction, Ladder};
pub use level::Level;
pub use state::LadderState;
pub use state_machine::{
    IllegalTransition, NavState, StateMachine, TransitionRecord, TRANSITION_LOG_CAPACITY,
};
