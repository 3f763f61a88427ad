//! Error types for the ownership ring.

use thiserror::Error;

/// Result type alias for ring operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ownership ring.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No owners are registered, so items cannot be placed.
    ///
    /// Nothing is committed when this is returned; retry once an owner exists.
    #[error("empty hash ring: no owners registered")]
    EmptyRing,

    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the operation may succeed if retried after membership changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::EmptyRing)
    }
}
