// ============================================
// File: crates/stls-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Base error enum shared by `stls-core` and `stls-client`. Each of
//! those crates defines its own error type and wraps `CommonError`
//! transparently.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never put nonces or key bytes into an error message
//! - Keep variants coarse; protocol-specific detail belongs in the
//!   crate that understands the protocol
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

/// Common result type.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Errors shared across stls crates.
#[derive(Error, Debug)]
pub enum CommonError {
    /// Data length doesn't match expected size.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// Internal error (bug or unexpected condition).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of what went wrong
        message: String,
    },
}

impl CommonError {
    /// Creates an `InvalidLength` error.
    pub const fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommonError::invalid_length(32, 7);
        assert!(err.to_string().contains("32"));
        assert!(err.to_string().contains('7'));

        let err = CommonError::internal("handshake lost its keys");
        assert!(err.to_string().contains("lost its keys"));
    }
}
