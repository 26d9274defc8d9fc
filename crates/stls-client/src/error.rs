// ============================================
// File: crates/stls-client/src/error.rs
// ============================================
//! # Client Error Types
//!
//! ## Error Categories
//! 1. **Transport**: connect failure, reset, short read
//! 2. **Protocol**: unexpected message, bad certificate, bad server tag
//! 3. **Configuration / Output**: config file and sink failures
//!
//! Record-level integrity failures are not errors; the reader drops
//! those records and keeps going.
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use stls_common::error::CommonError;
use stls_core::error::CoreError;
use stls_core::protocol::MessageType;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error types.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport failure while {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Truncated frame: expected {expected} bytes, got {actual}")]
    TruncatedFrame {
        expected: usize,
        actual: usize,
    },

    #[error("Connection closed while waiting for {expected}")]
    ConnectionClosed {
        expected: MessageType,
    },

    #[error("Unexpected message: expected {expected}, got {got}")]
    UnexpectedMessage {
        expected: MessageType,
        got: MessageType,
    },

    #[error("Unknown message type 0x{0:02x} during handshake")]
    UnknownMessageType(u8),

    #[error("Invalid server certificate: {reason}")]
    InvalidCertificate {
        reason: String,
    },

    #[error("Server authentication failed: transcript tag mismatch")]
    ServerAuthenticationFailed,

    #[error("Server reported an error: {message}")]
    PeerError {
        message: String,
    },

    #[error("Handshake already aborted")]
    HandshakeAborted,

    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        field: String,
        reason: String,
    },

    #[error("Failed to write output to {target}: {source}")]
    Output {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(CoreError),

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl ClientError {
    pub fn transport(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }

    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn output(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::Output {
            target: target.into(),
            source,
        }
    }

    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::Transport { .. }
                | Self::TruncatedFrame { .. }
                | Self::ConnectionClosed { .. }
        )
    }

    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedMessage { .. }
                | Self::UnknownMessageType(_)
                | Self::InvalidCertificate { .. }
                | Self::ServerAuthenticationFailed
                | Self::PeerError { .. }
        ) || matches!(self, Self::Core(e) if e.is_protocol_error())
    }

    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }
}

impl From<CoreError> for ClientError {
    /// Lifts stream and certificate failures into the client taxonomy.
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TruncatedFrame { expected, actual } => {
                Self::TruncatedFrame { expected, actual }
            }
            CoreError::Transport(source) => Self::transport("reading a frame", source),
            CoreError::UnknownMessageType(byte) => Self::UnknownMessageType(byte),
            CoreError::InvalidCertificate { reason } => Self::InvalidCertificate { reason },
            other => Self::Core(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::config_load("/etc/stls/client.toml", "file not found");
        assert!(err.to_string().contains("/etc/stls/client.toml"));

        let err = ClientError::UnexpectedMessage {
            expected: MessageType::Hash,
            got: MessageType::Data,
        };
        assert!(err.to_string().contains("Hash"));
        assert!(err.to_string().contains("Data"));
    }

    #[test]
    fn test_core_error_lifting() {
        let err: ClientError = CoreError::truncated(36, 10).into();
        assert!(matches!(err, ClientError::TruncatedFrame { expected: 36, actual: 10 }));
        assert!(err.is_transport_error());

        let err: ClientError = CoreError::invalid_certificate("expired").into();
        assert!(matches!(err, ClientError::InvalidCertificate { .. }));
        assert!(err.is_protocol_error());

        let err: ClientError = CoreError::too_short(32, 5).into();
        assert!(matches!(err, ClientError::Core(_)));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_classification() {
        assert!(ClientError::ServerAuthenticationFailed.is_protocol_error());
        assert!(!ClientError::ServerAuthenticationFailed.is_transport_error());
        assert!(ClientError::config_invalid("connection.port", "cannot be 0").is_config_error());
    }
}
