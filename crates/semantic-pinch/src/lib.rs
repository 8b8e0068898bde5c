//! Semantic pinch-zoom: walk a piece of content up and down a ladder of
//! abstraction levels, regenerating it at each step with a streaming model.
//!
//! ```text
//! Navigator ──▶ Transformer ──▶ TransformEngine ──▶ TextBackend (proxy | openai)
//!    │                └────────▶ MediaBackend (image / caption)
//!    └── LadderState + StateMachine (from the `ladder` crate)
//! ```

pub mod backend;
pub mod config;
pub mod engine;
pub mod errors;
pub mod media;
pub mod navigator;
pub mod prompts;
pub mod transformer;

pub use config::{BackendKind, LadderKind, PinchConfig};
pub use engine::{TransformEngine, TransformReport};
pub use errors::{ErrorKind, TransformError, USER_FAILURE_MESSAGE};
pub use navigator::{seed_state, NavigationOutcome, Navigator};
pub use transformer::{LadderTransformer, Transformer};
