// ============================================
// File: crates/stls-core/src/protocol/codec.rs
// ============================================
//! # Frame Codec
//!
//! ## Creation Reason
//! Provides header encoding/decoding for every frame and a blocking
//! reader that pulls whole frames off a byte stream.
//!
//! ## Main Functionality
//! - `FrameLayout`: Which header shape outbound frames use
//! - `encode_header` / `encode_frame`: Outbound serialization
//! - `decode_header` / `decode_frame`: Inbound parsing
//! - `FrameReader`: Reads exactly one frame at a time from any `Read`
//!
//! ## Parsing Strategy
//! 1. Read exactly 4 header bytes (partial reads are retried)
//! 2. Take the 24-bit big-endian length and enforce the size limit
//! 3. Read exactly `length` payload bytes
//! 4. Map the type byte last, so an unknown type still consumes its frame
//!
//! ## ⚠️ Important Note for Next Developer
//! - `FrameReader` never buffers past the current frame. Callers may
//!   build a fresh reader over the same stream for each message.
//! - End of stream before the first header byte is `Ok(None)`; anywhere
//!   else it is `TruncatedFrame`.
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use std::io::{self, Read};

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::protocol::messages::{Frame, FrameHeader, MessageType, HEADER_SIZE, MAX_PAYLOAD_LEN};

// ============================================
// FrameLayout
// ============================================

/// Header shape used for outbound frames.
///
/// Inbound parsing does not depend on the layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameLayout {
    /// Type byte + 24-bit big-endian length on every frame.
    #[default]
    Canonical,
    /// Header shapes accepted by the original reference server.
    ///
    /// - Hello: the integer `1` as 4 little-endian bytes
    /// - EncryptedNonce: type byte + 24-bit little-endian length
    /// - Hash: the type as 3 little-endian bytes + a single length byte
    ///
    /// Hello and Hash come out identical to `Canonical`; only the
    /// encrypted-nonce length differs on the wire.
    Legacy,
}

// ============================================
// Encoding
// ============================================

/// Encodes a frame header.
///
/// # Errors
/// - `MessageTooLarge` if `length` does not fit the length field
/// - `MalformedMessage` for a `Legacy` hello with a payload
pub fn encode_header(
    message_type: MessageType,
    length: usize,
    layout: FrameLayout,
) -> Result<[u8; HEADER_SIZE]> {
    if length > MAX_PAYLOAD_LEN {
        return Err(CoreError::MessageTooLarge {
            max: MAX_PAYLOAD_LEN,
            actual: length,
        });
    }

    let type_byte = message_type.as_byte();
    let header = match (layout, message_type) {
        (FrameLayout::Legacy, MessageType::Hello) => {
            if length != 0 {
                return Err(CoreError::malformed("legacy hello cannot carry a payload"));
            }
            u32::from(type_byte).to_le_bytes()
        }
        (FrameLayout::Legacy, MessageType::EncryptedNonce) => {
            let len = (length as u32).to_le_bytes();
            [type_byte, len[0], len[1], len[2]]
        }
        (FrameLayout::Legacy, MessageType::Hash) => {
            let len = u8::try_from(length).map_err(|_| CoreError::MessageTooLarge {
                max: usize::from(u8::MAX),
                actual: length,
            })?;
            let ty = u32::from(type_byte).to_le_bytes();
            [ty[0], ty[1], ty[2], len]
        }
        _ => {
            let len = (length as u32).to_be_bytes();
            [type_byte, len[1], len[2], len[3]]
        }
    };
    Ok(header)
}

/// Encodes a complete frame (header + payload).
///
/// # Errors
/// See [`encode_header`].
pub fn encode_frame(
    message_type: MessageType,
    payload: &[u8],
    layout: FrameLayout,
) -> Result<BytesMut> {
    let header = encode_header(message_type, payload.len(), layout)?;
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_slice(&header);
    buf.put_slice(payload);
    Ok(buf)
}

// ============================================
// Decoding
// ============================================

/// Payload length announced by a header, without validating the type.
fn header_length(header: &[u8; HEADER_SIZE]) -> usize {
    u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize
}

/// Decodes a frame header.
///
/// A bare 4-byte hello marker decodes as `Hello` with length 0.
///
/// # Errors
/// Returns `UnknownMessageType` for type bytes outside `0x00..=0x05`.
pub fn decode_header(header: [u8; HEADER_SIZE]) -> Result<FrameHeader> {
    let message_type = MessageType::try_from(header[0])?;
    Ok(FrameHeader {
        message_type,
        length: header_length(&header),
    })
}

/// Decodes a buffer holding exactly one frame.
///
/// # Errors
/// - `TruncatedFrame` if the buffer ends before the announced length
/// - `MalformedMessage` if bytes follow the frame
/// - `UnknownMessageType` for an unknown type byte
pub fn decode_frame(buf: &[u8]) -> Result<Frame> {
    if buf.len() < HEADER_SIZE {
        return Err(CoreError::truncated(HEADER_SIZE, buf.len()));
    }
    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&buf[..HEADER_SIZE]);
    let decoded = decode_header(header)?;

    let body = &buf[HEADER_SIZE..];
    if body.len() < decoded.length {
        return Err(CoreError::truncated(decoded.length, body.len()));
    }
    if body.len() > decoded.length {
        return Err(CoreError::malformed(format!(
            "{} trailing bytes after frame",
            body.len() - decoded.length
        )));
    }
    Ok(Frame::new(decoded.message_type, Bytes::copy_from_slice(body)))
}

// ============================================
// FrameReader
// ============================================

/// Reads whole frames from a blocking byte stream.
///
/// # Example
/// ```
/// use std::io::Cursor;
/// use stls_core::protocol::{encode_frame, FrameLayout, FrameReader, MessageType};
///
/// let wire = encode_frame(MessageType::Data, b"abc", FrameLayout::Canonical).unwrap();
/// let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
///
/// let frame = reader.read_frame().unwrap().unwrap();
/// assert_eq!(frame.message_type, MessageType::Data);
/// assert!(reader.read_frame().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    max_payload_len: usize,
    frames_read: u64,
    bytes_read: u64,
}

impl<R: Read> FrameReader<R> {
    /// Creates a reader accepting payloads up to [`MAX_PAYLOAD_LEN`].
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            max_payload_len: MAX_PAYLOAD_LEN,
            frames_read: 0,
            bytes_read: 0,
        }
    }

    /// Lowers the accepted payload size.
    #[must_use]
    pub fn with_max_payload_len(mut self, max: usize) -> Self {
        self.max_payload_len = max.min(MAX_PAYLOAD_LEN);
        self
    }

    /// Reads the next frame.
    ///
    /// # Returns
    /// - `Ok(Some(frame))` - A complete frame
    /// - `Ok(None)` - The stream ended cleanly on a frame boundary
    ///
    /// # Errors
    /// - `TruncatedFrame` if the stream ends inside a frame
    /// - `MessageTooLarge` if the header exceeds the size limit
    /// - `UnknownMessageType` after consuming a frame with an unknown type
    /// - `Transport` if the underlying read fails
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut header = [0u8; HEADER_SIZE];
        let got = read_full(&mut self.inner, &mut header).map_err(CoreError::Transport)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            return Err(CoreError::truncated(HEADER_SIZE, got));
        }

        let length = header_length(&header);
        if length > self.max_payload_len {
            return Err(CoreError::MessageTooLarge {
                max: self.max_payload_len,
                actual: length,
            });
        }

        let mut payload = vec![0u8; length];
        let got = read_full(&mut self.inner, &mut payload).map_err(CoreError::Transport)?;
        if got < length {
            return Err(CoreError::truncated(length, got));
        }

        self.frames_read += 1;
        self.bytes_read += (HEADER_SIZE + length) as u64;

        let message_type = MessageType::try_from(header[0])?;
        trace!(message_type = %message_type, length, "Frame read");
        Ok(Some(Frame::new(message_type, payload)))
    }

    /// Number of complete frames read.
    #[must_use]
    pub const fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Number of bytes consumed by complete frames.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

/// Fills `buf` unless the stream ends first. Returns bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ============================================
// Tests
// ============================================
