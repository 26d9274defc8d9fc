// ============================================
// File: crates/stls-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for framing, key derivation, certificate
//! handling and record cryptography.
//!
//! ## Error Categories
//! 1. **Transport Errors**: truncated frames, socket read failures
//! 2. **Protocol Errors**: unknown types, malformed or oversized messages
//! 3. **Crypto Errors**: certificate, encryption, decryption, derivation
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material or nonces in error messages
//! - All errors should be loggable without leaking secrets
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use stls_common::error::CommonError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for protocol and cryptographic operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Transport Errors
    // ========================================

    /// The stream closed before a complete frame arrived.
    #[error("Truncated frame: expected {expected} bytes, got {actual}")]
    TruncatedFrame {
        /// Bytes the header (or header itself) promised
        expected: usize,
        /// Bytes actually received before end of stream
        actual: usize,
    },

    /// Reading from the underlying stream failed.
    #[error("Transport read failed: {0}")]
    Transport(#[source] std::io::Error),

    // ========================================
    // Protocol Errors
    // ========================================

    /// Unknown message type byte.
    #[error("Unknown message type: 0x{0:02x}")]
    UnknownMessageType(u8),

    /// Message is malformed.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    /// Message is too short to be valid.
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// Message exceeds the maximum allowed size.
    #[error("Message too large: max {max} bytes, got {actual}")]
    MessageTooLarge {
        /// Maximum allowed size
        max: usize,
        /// Actual size
        actual: usize,
    },

    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Certificate could not be decoded or did not validate.
    #[error("Invalid certificate: {reason}")]
    InvalidCertificate {
        /// Why the certificate was rejected
        reason: String,
    },

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What was being encrypted
        context: String,
    },

    /// Decryption failed (authentication failure or bad length).
    #[error("Decryption failed: authentication error")]
    Decryption,

    /// Key derivation failed.
    #[error("Key derivation failed: {reason}")]
    KeyDerivation {
        /// Why derivation failed
        reason: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates a `MessageTooShort` error.
    pub const fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    /// Creates a `TruncatedFrame` error.
    pub const fn truncated(expected: usize, actual: usize) -> Self {
        Self::TruncatedFrame { expected, actual }
    }

    /// Creates an `InvalidCertificate` error.
    pub fn invalid_certificate(reason: impl Into<String>) -> Self {
        Self::InvalidCertificate {
            reason: reason.into(),
        }
    }

    /// Creates an `Encryption` error.
    pub fn encryption(context: impl Into<String>) -> Self {
        Self::Encryption {
            context: context.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` for stream-level failures (short read, socket error).
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::TruncatedFrame { .. } | Self::Transport(_))
    }

    /// Returns `true` if this is a protocol error.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownMessageType(_)
                | Self::MalformedMessage { .. }
                | Self::MessageTooShort { .. }
                | Self::MessageTooLarge { .. }
        )
    }

    /// Returns `true` if this is a cryptographic error.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCertificate { .. }
                | Self::Encryption { .. }
                | Self::Decryption
                | Self::KeyDerivation { .. }
        )
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
        let err = CoreError::truncated(100, 50);
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));

        let err = CoreError::UnknownMessageType(0xAB);
        assert!(err.to_string().contains("0xab"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::truncated(4, 1).is_transport_error());
        assert!(!CoreError::truncated(4, 1).is_protocol_error());

        assert!(CoreError::UnknownMessageType(0xFF).is_protocol_error());
        assert!(CoreError::too_short(36, 3).is_protocol_error());

        assert!(CoreError::invalid_certificate("expired").is_crypto_error());
        assert!(CoreError::Decryption.is_crypto_error());
        assert!(!CoreError::Decryption.is_transport_error());
    }

    #[test]
    fn test_common_error_conversion() {
        let common = CommonError::invalid_length(32, 5);
        let core: CoreError = common.into();
        assert!(matches!(core, CoreError::Common(_)));
    }
}
