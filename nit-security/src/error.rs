//! Error types for the security layer.

use thiserror::Error;

/// Result alias for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Errors surfaced while deriving or parsing NIT-IDs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
    /// HMAC key material was rejected.
    #[error("invalid HMAC key: {reason}")]
    Key {
        /// Description reported by the MAC implementation.
        reason: String,
    },

    /// Derived or supplied identifier is not a valid NIT-ID.
    #[error(transparent)]
    Id(#[from] nit_primitives::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nit_primitives::NitId;

    #[test]
    fn id_errors_convert_and_clone() {
        let err: SecurityError = NitId::new("xyz").unwrap_err().into();
        let copy = err.clone();
        assert_eq!(copy, err);
        assert!(matches!(copy, SecurityError::Id(_)));
    }
}
