//! Error types for `bytebridge` core library.

use thiserror::Error;

/// Result type alias using `bytebridge` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `bytebridge` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed connection or sniff specification
    #[error("Invalid connection specification: {0}")]
    Spec(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
