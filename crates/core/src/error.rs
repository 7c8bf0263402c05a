//! Error types for the catalog index
//!
//! Every crate in the workspace reports failures through [`Error`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the catalog index
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying file read or write failed
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A decoded value is out of range, truncated or malformed
    #[error("Data corruption: {0}")]
    CorruptData(String),

    /// A structural consistency check failed (cycles, double reachability)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The engine observed an unrecoverable error earlier and refuses work
    #[error("Index engine is poisoned by an earlier failure; reopen it")]
    Poisoned,

    /// Configuration could not be read, parsed or validated
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Build a [`Error::CorruptData`] from any displayable message.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptData(msg.into())
    }

    /// Build a [`Error::InvariantViolation`] from any displayable message.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }

    /// Whether this error leaves the on-disk structure in an unknown state.
    ///
    /// Fatal errors poison the engine that observed them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::IoError(_) | Error::CorruptData(_) | Error::InvariantViolation(_)
        )
    }
}
