// ============================================
// File: crates/stls-core/src/protocol/messages.rs
// ============================================
//! # Protocol Messages
//!
//! ## Creation Reason
//! Defines the message types carried in frame headers and the structures
//! parsed out of frame payloads.
//!
//! ## Main Functionality
//! - `MessageType`: Type byte of every frame
//! - `FrameHeader` / `Frame`: Decoded header and full frame
//! - `ServerHello`: Server nonce + certificate payload split
//! - `Record`: Decrypted data record (sequence, chunk, tag)
//!
//! ## Message Formats
//!
//! ### Frame Header (4 bytes)
//! ```text
//! ┌──────────────┬─────────────────────────────────────┐
//! │ Type (1B)    │ Payload length (3B, big-endian)     │
//! └──────────────┴─────────────────────────────────────┘
//! ```
//!
//! ### Certificate Payload
//! ```text
//! ┌──────────────────────┬──────────────────────────────┐
//! │ Server nonce (32B)   │ Certificate (remaining)      │
//! └──────────────────────┴──────────────────────────────┘
//! ```
//!
//! ### Decrypted Record
//! ```text
//! ┌──────────────┬─────────────────────┬────────────────┐
//! │ Seq (4B, BE) │ Chunk (variable)    │ MAC tag (32B)  │
//! └──────────────┴─────────────────────┴────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Type bytes are wire-visible; never renumber them
//! - A record is valid only if it holds at least seq + tag bytes
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Size of a frame header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest payload length representable in the 24-bit length field.
pub const MAX_PAYLOAD_LEN: usize = 0x00FF_FFFF;

/// Size of the client and server nonces.
pub const NONCE_SIZE: usize = 32;

/// Size of an HMAC-SHA256 tag.
pub const MAC_TAG_SIZE: usize = 32;

/// Size of a record sequence number.
pub const SEQUENCE_SIZE: usize = 4;

/// Smallest well-formed decrypted record (empty chunk).
pub const MIN_RECORD_SIZE: usize = SEQUENCE_SIZE + MAC_TAG_SIZE;

// ============================================
// MessageType
// ============================================

/// Type byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Peer-reported error; the payload is a diagnostic string.
    Error = 0x00,
    /// Client greeting with an empty payload.
    Hello = 0x01,
    /// Server nonce followed by the server certificate.
    Certificate = 0x02,
    /// Client nonce encrypted to the certificate key.
    EncryptedNonce = 0x03,
    /// Handshake transcript tag, sent by both sides.
    Hash = 0x04,
    /// Encrypted data record.
    Data = 0x05,
}

impl MessageType {
    /// Parses a message type from its byte value.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Error),
            0x01 => Some(Self::Hello),
            0x02 => Some(Self::Certificate),
            0x03 => Some(Self::EncryptedNonce),
            0x04 => Some(Self::Hash),
            0x05 => Some(Self::Data),
            _ => None,
        }
    }

    /// Returns the byte value of this message type.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the messages that make up the handshake.
    #[must_use]
    pub const fn is_handshake(self) -> bool {
        matches!(
            self,
            Self::Hello | Self::Certificate | Self::EncryptedNonce | Self::Hash
        )
    }
}

impl TryFrom<u8> for MessageType {
    type Error = CoreError;

    fn try_from(byte: u8) -> Result<Self> {
        Self::from_byte(byte).ok_or(CoreError::UnknownMessageType(byte))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "Error",
            Self::Hello => "Hello",
            Self::Certificate => "Certificate",
            Self::EncryptedNonce => "EncryptedNonce",
            Self::Hash => "Hash",
            Self::Data => "Data",
        };
        write!(f, "{name}(0x{:02x})", self.as_byte())
    }
}

// ============================================
// FrameHeader / Frame
// ============================================

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Message type
    pub message_type: MessageType,
    /// Payload length in bytes
    pub length: usize,
}

/// A complete frame: type plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type
    pub message_type: MessageType,
    /// Payload bytes
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame.
    pub fn new(message_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            message_type,
            payload: payload.into(),
        }
    }

    /// Payload length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Returns the header as it appears on the wire for inbound frames.
    ///
    /// Inbound headers are always type byte + big-endian length, so this
    /// reproduces the received bytes exactly.
    #[must_use]
    pub fn wire_header(&self) -> [u8; HEADER_SIZE] {
        let len = self.payload.len();
        [
            self.message_type.as_byte(),
            (len >> 16) as u8,
            (len >> 8) as u8,
            len as u8,
        ]
    }

    /// Returns the payload of an `Error` frame as text.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; the text is only
    /// ever logged.
    #[must_use]
    pub fn error_message(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

// ============================================
// ServerHello
// ============================================

/// Payload of the server's `Certificate` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Server nonce
    pub server_nonce: [u8; NONCE_SIZE],
    /// Opaque certificate blob
    pub certificate: Bytes,
}

impl ServerHello {
    /// Splits a `Certificate` payload into nonce and certificate.
    ///
    /// # Errors
    /// Returns `MessageTooShort` if the payload holds fewer than 32 bytes.
    pub fn parse(payload: &Bytes) -> Result<Self> {
        if payload.len() < NONCE_SIZE {
            return Err(CoreError::too_short(NONCE_SIZE, payload.len()));
        }
        let mut server_nonce = [0u8; NONCE_SIZE];
        server_nonce.copy_from_slice(&payload[..NONCE_SIZE]);
        Ok(Self {
            server_nonce,
            certificate: payload.slice(NONCE_SIZE..),
        })
    }

    /// Encodes nonce followed by certificate.
    #[must_use]
    pub fn to_payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(NONCE_SIZE + self.certificate.len());
        buf.put_slice(&self.server_nonce);
        buf.put_slice(&self.certificate);
        buf.freeze()
    }
}

// ============================================
// Record
// ============================================

/// A decrypted data record.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    /// Position of this chunk in the stream
    pub sequence: u32,
    /// Application data
    pub chunk: Bytes,
    /// HMAC over `chunk` with the server integrity key
    pub tag: [u8; MAC_TAG_SIZE],
}

impl Record {
    /// Splits a decrypted record plaintext.
    ///
    /// Returns `None` if the plaintext is shorter than sequence + tag.
    #[must_use]
    pub fn parse(plaintext: &[u8]) -> Option<Self> {
        if plaintext.len() < MIN_RECORD_SIZE {
            return None;
        }
        let (seq_bytes, rest) = plaintext.split_at(SEQUENCE_SIZE);
        let (chunk, tag_bytes) = rest.split_at(rest.len() - MAC_TAG_SIZE);

        let mut seq = [0u8; SEQUENCE_SIZE];
        seq.copy_from_slice(seq_bytes);
        let mut tag = [0u8; MAC_TAG_SIZE];
        tag.copy_from_slice(tag_bytes);

        Some(Self {
            sequence: u32::from_be_bytes(seq),
            chunk: Bytes::copy_from_slice(chunk),
            tag,
        })
    }

    /// Encodes `sequence ‖ chunk ‖ tag`.
    #[must_use]
    pub fn to_plaintext(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(MIN_RECORD_SIZE + self.chunk.len());
        data.extend_from_slice(&self.sequence.to_be_bytes());
        data.extend_from_slice(&self.chunk);
        data.extend_from_slice(&self.tag);
        data
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("sequence", &self.sequence)
            .field("chunk_len", &self.chunk.len())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_roundtrip() {
        for byte in 0x00..=0x05u8 {
            let msg_type = MessageType::from_byte(byte).unwrap();
            assert_eq!(msg_type.as_byte(), byte);
        }
        assert!(MessageType::from_byte(0x06).is_none());
        assert!(MessageType::Hash.is_handshake());
        assert!(!MessageType::Data.is_handshake());
        assert!(!MessageType::Error.is_handshake());
        assert!(matches!(
            MessageType::try_from(0xFF),
            Err(CoreError::UnknownMessageType(0xFF))
        ));
    }

    #[test]
    fn test_wire_header() {
        let frame = Frame::new(MessageType::Data, vec![0u8; 0x01_02_03]);
        assert_eq!(frame.wire_header(), [0x05, 0x01, 0x02, 0x03]);

        let hello = Frame::new(MessageType::Hello, Bytes::new());
        assert_eq!(hello.wire_header(), [0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_server_hello_split() {
        let mut payload = vec![0xFFu8; NONCE_SIZE];
        payload.extend_from_slice(b"cert");
        let hello = ServerHello::parse(&Bytes::from(payload.clone())).unwrap();

        assert_eq!(hello.server_nonce, [0xFF; NONCE_SIZE]);
        assert_eq!(&hello.certificate[..], b"cert");
        assert_eq!(&hello.to_payload()[..], &payload[..]);
    }

    #[test]
    fn test_server_hello_nonce_only() {
        let hello = ServerHello::parse(&Bytes::from(vec![1u8; NONCE_SIZE])).unwrap();
        assert!(hello.certificate.is_empty());
    }

    #[test]
    fn test_server_hello_too_short() {
        let result = ServerHello::parse(&Bytes::from(vec![0u8; 31]));
        assert!(matches!(
            result,
            Err(CoreError::MessageTooShort { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn test_record_parse() {
        let record = Record {
            sequence: 0x0102_0304,
            chunk: Bytes::from_static(b"image bytes"),
            tag: [0xAB; MAC_TAG_SIZE],
        };
        let plaintext = record.to_plaintext();
        assert_eq!(&plaintext[..4], &[1, 2, 3, 4]);

        let parsed = Record::parse(&plaintext).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_record_empty_chunk() {
        let parsed = Record::parse(&[0u8; MIN_RECORD_SIZE]).unwrap();
        assert_eq!(parsed.sequence, 0);
        assert!(parsed.chunk.is_empty());
    }

    #[test]
    fn test_record_too_short() {
        assert!(Record::parse(&[0u8; MIN_RECORD_SIZE - 1]).is_none());
        assert!(Record::parse(&[]).is_none());
    }
}
