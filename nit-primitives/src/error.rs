//! Shared error definitions for NIT primitives.

use thiserror::Error;

/// Result alias used throughout the primitives crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The supplied NIT-ID is not four hexadecimal characters.
    #[error("invalid nit id `{id}`: {reason}")]
    InvalidNitId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Manifest definition failed validation.
    #[error("invalid plugin manifest: {reason}")]
    InvalidManifest {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
