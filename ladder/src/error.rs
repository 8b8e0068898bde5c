use thiserror::Error;

use crate::level::Level;

/// Errors raised while building or indexing a ladder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LadderError {
    /// A ladder needs at least one level.
    #[error("ladder has no levels")]
    EmptyLadder,

    /// Each level may appear at most once.
    #[error("level {0} appears more than once")]
    DuplicateLevel(Level),

    /// The requested index does not name a rung of this ladder.
    #[error("index {index} out of range for ladder of {len} levels")]
    IndexOutOfRange { index: usize, len: usize },

    /// A session state with no content for its current level.
    #[error("no content for current level {0}")]
    MissingContent(Level),

    /// The level is not on this ladder, or the name is not a level at all.
    #[error("unknown level: {0}")]
    UnknownLevel(String),
}
