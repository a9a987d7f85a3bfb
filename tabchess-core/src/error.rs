//! Error types shared across the tabchess crates

use thiserror::Error;

/// Contract violations raised by the rules adapter, the agent and config validation.
///
/// Running out of legal moves is not an error: it is reported as `None` by the
/// move selectors and ends the episode.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("malformed state key '{key}': {reason}")]
    MalformedState { key: String, reason: String },

    #[error("malformed action '{action}': {reason}")]
    MalformedAction { action: String, reason: String },

    #[error("action '{action}' is not legal in state '{state}'")]
    IllegalAction { action: String, state: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}
