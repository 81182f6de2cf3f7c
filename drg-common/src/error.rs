//! Common error types for DRG

use thiserror::Error;

/// Common result type for DRG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the DRG crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend channel failure (spawn or upstream connect)
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
