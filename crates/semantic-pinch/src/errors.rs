//! Transform error taxonomy.
//!
//! Every failure in the transform path is one of these. Callers classify with
//! `kind()` instead of string matching. Nothing here is retried automatically:
//! each failure ends that one user-triggered attempt.
//!
//! | Kind          | Variants                      | Fatal |
//! |---------------|-------------------------------|-------|
//! | Configuration | `Configuration`               | yes   |
//! | Transport     | `Transport`, `Http`, `Media`  | no    |
//! | EmptyResult   | `EmptyResult`                 | no    |

use std::fmt;

use thiserror::Error;

/// Message shown to the user for any recoverable failure.
pub const USER_FAILURE_MESSAGE: &str = "Failed to transform content. Please try again.";

/// Coarse classification used by the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unusable setup: unknown target level, missing credential.
    Configuration,
    /// Network or backend failure during a transform.
    Transport,
    /// The backend answered but produced nothing usable.
    EmptyResult,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Transport => write!(f, "transport"),
            Self::EmptyResult => write!(f, "empty_result"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    /// Configuration is invalid or a required credential is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection, stream framing or backend-reported failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Image generation or captioning failed.
    #[error("Media backend error: {0}")]
    Media(String),

    /// The backend completed without producing any content.
    #[error("Empty result: {0}")]
    EmptyResult(String),
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport(_) | Self::Http { .. } | Self::Media(_) => ErrorKind::Transport,
            Self::EmptyResult(_) => ErrorKind::EmptyResult,
        }
    }

    /// Configuration errors cannot be fixed by trying again.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// Text suitable for a transient status line.
    pub fn user_message(&self) -> String {
        if self.is_fatal() {
            self.to_string()
        } else {
            USER_FAILURE_MESSAGE.to_string()
        }
    }
}

impl From<reqwest::Error> for TransformError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
