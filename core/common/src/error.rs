//! Common error types for FolioVault.

use thiserror::Error;

/// Top-level error type for FolioVault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Decryption rejected the input. Deliberately carries no detail:
    /// a wrong password, a flipped bit, and a truncated envelope must be
    /// indistinguishable to the caller.
    #[error("Authentication failed: invalid password or corrupted data")]
    Authentication,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
