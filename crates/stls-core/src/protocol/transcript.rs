// ============================================
// File: crates/stls-core/src/protocol/transcript.rs
// ============================================
//! # Handshake Transcript
//!
//! ## Creation Reason
//! Both handshake tags are MACs over the exact bytes of the first three
//! handshake messages. This module collects those bytes.
//!
//! ## Main Functionality
//! - `Transcript`: Append-only log while the handshake runs
//! - `HandshakeTranscript`: Frozen, read-only result
//!
//! ## ⚠️ Important Note for Next Developer
//! - Append what was put on or taken off the wire, never a re-encoding
//!   in a different layout
//! - Once frozen, nothing may be added

use std::fmt;

use crate::protocol::messages::{Frame, HEADER_SIZE};

/// Append-only byte log of handshake messages 1 to 3.
#[derive(Default, Clone)]
pub struct Transcript {
    bytes: Vec<u8>,
    messages: usize,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outbound message exactly as written to the stream.
    pub fn append_sent(&mut self, wire: &[u8]) {
        self.bytes.extend_from_slice(wire);
        self.messages += 1;
    }

    /// Appends an inbound frame: header as received followed by payload.
    pub fn append_received(&mut self, frame: &Frame) {
        self.bytes.reserve(HEADER_SIZE + frame.len());
        self.bytes.extend_from_slice(&frame.wire_header());
        self.bytes.extend_from_slice(&frame.payload);
        self.messages += 1;
    }

    /// Number of messages appended so far.
    #[must_use]
    pub const fn message_count(&self) -> usize {
        self.messages
    }

    /// Total bytes appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Freezes the transcript.
    #[must_use]
    pub fn finish(self) -> HandshakeTranscript {
        HandshakeTranscript {
            bytes: self.bytes,
            messages: self.messages,
        }
    }
}

impl fmt::Debug for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("messages", &self.messages)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Frozen transcript, the MAC input for both handshake tags.
#[derive(Clone, PartialEq, Eq)]
pub struct HandshakeTranscript {
    bytes: Vec<u8>,
    messages: usize,
}

impl HandshakeTranscript {
    /// Transcript bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of messages in the transcript.
    #[must_use]
    pub const fn message_count(&self) -> usize {
        self.messages
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the transcript is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for HandshakeTranscript {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for HandshakeTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeTranscript")
            .field("messages", &self.messages)
            .field("len", &self.bytes.len())
            .finish()
    }
}
