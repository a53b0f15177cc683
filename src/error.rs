//! Error handling for the Pixel Watch core
//!
//! This module defines the error type and a Result alias used throughout
//! the crate.
//!
//! Contract violations (wrong call order, use of a destroyed handle,
//! double-initialization) are deliberately *not* represented here: they are
//! programmer errors at the embedding boundary and surface as panics. The
//! variants below cover the recoverable failures a well-behaved host can
//! encounter and react to.

use thiserror::Error;

/// Main error type for Pixel Watch operations
#[derive(Error, Debug)]
pub enum PixWatchError {
    /// A buffer descriptor failed validation; the window's displayed set
    /// is left unchanged.
    #[error("invalid buffer descriptor for '{name}': {reason}")]
    InvalidBufferDescriptor { name: String, reason: String },

    /// The host's plot callback could not resolve the requested symbol.
    #[error("symbol '{0}' could not be resolved by the host")]
    UnresolvedSymbol(String),

    /// Errors raised by the windowing surface backend.
    #[error("surface error: {0}")]
    Surface(String),

    /// Errors related to preference loading/saving.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Pixel Watch operations
pub type Result<T> = std::result::Result<T, PixWatchError>;

impl PixWatchError {
    /// Create an `InvalidBufferDescriptor` error for the named buffer
    pub fn invalid_descriptor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        PixWatchError::InvalidBufferDescriptor {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
