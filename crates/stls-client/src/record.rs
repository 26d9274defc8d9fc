// ============================================
// File: crates/stls-client/src/record.rs
// ============================================
//! # Authenticated Record Reader
//!
//! ## Creation Reason
//! After the handshake the server streams data records. This module
//! decrypts them, enforces strict sequence order, checks each chunk's
//! tag and reassembles the payload.
//!
//! ## Record Processing Order
//! 1. Frame type must be `Data`
//! 2. Decrypt with `server_encryption`
//! 3. Split into sequence, chunk and tag
//! 4. Sequence must equal the expected counter
//! 5. Tag must equal `HMAC(server_integrity, chunk)`
//! 6. Append chunk, advance counter by one
//!
//! Any failure in steps 1 to 5 drops the record and leaves the counter
//! alone. A dropped record never stops the loop.
//!
//! ## ⚠️ Important Note for Next Developer
//! - There is no reordering buffer. A lost record stalls the stream:
//!   every later record is dropped as out of sequence.
//! - The counter is a `u64` so it can step past `u32::MAX`; at that point
//!   no wire sequence can match and the reader stops.
//!
//! ## Last Modified
//! v0.1.0 - Initial record reader

use std::fmt;
use std::io::Read;

use tracing::{debug, info, trace, warn};

use stls_core::crypto::{parse_record, KeySchedule, RecordCrypto};
use stls_core::error::CoreError;
use stls_core::protocol::{Frame, FrameReader, MessageType};

use crate::error::Result;

// ============================================
// Outcomes
// ============================================

/// Why a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRejection {
    /// The frame was not a data frame.
    UnexpectedType(MessageType),
    /// The frame type byte is unknown.
    UnknownType(u8),
    /// Decryption failed.
    Undecryptable,
    /// Decrypted record too short for sequence + tag.
    Malformed {
        /// Decrypted length
        len: usize,
    },
    /// Sequence number is not the expected one.
    SequenceMismatch {
        /// Counter value
        expected: u64,
        /// Sequence on the record
        got: u32,
    },
    /// Chunk tag did not verify.
    MacMismatch {
        /// Sequence on the record
        sequence: u32,
    },
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedType(t) => write!(f, "unexpected frame type {t}"),
            Self::UnknownType(b) => write!(f, "unknown frame type 0x{b:02x}"),
            Self::Undecryptable => f.write_str("decryption failed"),
            Self::Malformed { len } => write!(f, "malformed record of {len} bytes"),
            Self::SequenceMismatch { expected, got } => {
                write!(f, "sequence {got} while expecting {expected}")
            }
            Self::MacMismatch { sequence } => write!(f, "tag mismatch on sequence {sequence}"),
        }
    }
}

/// Result of processing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Chunk appended.
    Accepted {
        /// Sequence of the accepted record
        sequence: u32,
        /// Chunk length
        len: usize,
    },
    /// Frame ignored.
    Dropped(RecordRejection),
}

/// Counters kept by a [`Session`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames seen by the session
    pub frames: u64,
    /// Records appended
    pub accepted: u64,
    /// Frames of a type other than `Data`
    pub unexpected_type: u64,
    /// Records that failed decryption
    pub undecryptable: u64,
    /// Records too short to parse
    pub malformed: u64,
    /// Records out of sequence
    pub sequence_mismatch: u64,
    /// Records with a bad tag
    pub mac_mismatch: u64,
}

impl SessionStats {
    /// Total dropped frames.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.unexpected_type
            + self.undecryptable
            + self.malformed
            + self.sequence_mismatch
            + self.mac_mismatch
    }

    fn record(&mut self, outcome: &RecordOutcome) {
        self.frames += 1;
        match outcome {
            RecordOutcome::Accepted { .. } => self.accepted += 1,
            RecordOutcome::Dropped(rejection) => match rejection {
                RecordRejection::UnexpectedType(_) | RecordRejection::UnknownType(_) => {
                    self.unexpected_type += 1;
                }
                RecordRejection::Undecryptable => self.undecryptable += 1,
                RecordRejection::Malformed { .. } => self.malformed += 1,
                RecordRejection::SequenceMismatch { .. } => self.sequence_mismatch += 1,
                RecordRejection::MacMismatch { .. } => self.mac_mismatch += 1,
            },
        }
    }
}

// ============================================
// Session
// ============================================

/// Record-phase state: keys, sequence counter and reassembled output.
#[derive(Debug)]
pub struct Session {
    keys: KeySchedule,
    expected_sequence: u64,
    output: Vec<u8>,
    stats: SessionStats,
}

impl Session {
    /// Creates a session expecting sequence 0.
    #[must_use]
    pub fn new(keys: KeySchedule) -> Self {
        Self {
            keys,
            expected_sequence: 0,
            output: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    /// Processes one frame.
    pub fn process_frame<C: RecordCrypto + ?Sized>(
        &mut self,
        crypto: &C,
        frame: &Frame,
    ) -> RecordOutcome {
        let outcome = self.evaluate(crypto, frame);
        self.stats.record(&outcome);
        outcome
    }

    fn evaluate<C: RecordCrypto + ?Sized>(&mut self, crypto: &C, frame: &Frame) -> RecordOutcome {
        if frame.message_type != MessageType::Data {
            return RecordOutcome::Dropped(RecordRejection::UnexpectedType(frame.message_type));
        }

        let Ok(plaintext) = crypto.decrypt(&self.keys.server_encryption, &frame.payload) else {
            return RecordOutcome::Dropped(RecordRejection::Undecryptable);
        };

        let Some(record) = parse_record(&plaintext) else {
            return RecordOutcome::Dropped(RecordRejection::Malformed {
                len: plaintext.len(),
            });
        };

        if u64::from(record.sequence) != self.expected_sequence {
            return RecordOutcome::Dropped(RecordRejection::SequenceMismatch {
                expected: self.expected_sequence,
                got: record.sequence,
            });
        }

        if !crypto.verify_mac(&self.keys.server_integrity, &record.chunk, &record.tag) {
            return RecordOutcome::Dropped(RecordRejection::MacMismatch {
                sequence: record.sequence,
            });
        }

        self.output.extend_from_slice(&record.chunk);
        self.expected_sequence += 1;
        RecordOutcome::Accepted {
            sequence: record.sequence,
            len: record.chunk.len(),
        }
    }

    /// Counts a frame whose type byte could not be parsed.
    pub fn note_unknown_type(&mut self, byte: u8) -> RecordOutcome {
        let outcome = RecordOutcome::Dropped(RecordRejection::UnknownType(byte));
        self.stats.record(&outcome);
        outcome
    }

    /// Next sequence number that will be accepted.
    #[must_use]
    pub const fn expected_sequence(&self) -> u64 {
        self.expected_sequence
    }

    /// Returns `true` once sequence `u32::MAX` has been accepted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.expected_sequence > u32::MAX as u64
    }

    /// Bytes reassembled so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Consumes the session, returning the reassembled bytes.
    #[must_use]
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Processing counters.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

// ============================================
// RecordReader
// ============================================

/// How the record phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The server closed the connection between frames.
    Closed,
    /// The server sent an `Error` frame.
    PeerError(String),
    /// The connection closed inside a frame.
    Truncated {
        /// Bytes the frame announced
        expected: usize,
        /// Bytes received
        actual: usize,
    },
    /// Every sequence number has been used.
    SequenceExhausted,
    /// The stream failed or sent an oversized frame.
    Failed(String),
}

impl EndReason {
    /// Returns `true` unless the stream ended cleanly.
    #[must_use]
    pub const fn is_abnormal(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Pulls frames off a stream and feeds them to a [`Session`].
pub struct RecordReader<'a, R, C: ?Sized> {
    frames: FrameReader<R>,
    crypto: &'a C,
}

impl<'a, R: Read, C: RecordCrypto + ?Sized> RecordReader<'a, R, C> {
    /// Creates a reader over `stream`.
    pub fn new(stream: R, crypto: &'a C) -> Self {
        Self {
            frames: FrameReader::new(stream),
            crypto,
        }
    }

    /// Lowers the accepted payload size.
    #[must_use]
    pub fn with_max_payload_len(mut self, max: usize) -> Self {
        self.frames = self.frames.with_max_payload_len(max);
        self
    }

    /// Reads records until the stream ends.
    ///
    /// Socket failures and oversized frames end the loop with
    /// [`EndReason::Failed`]; output gathered so far stays in `session`.
    ///
    /// # Errors
    /// Returns `Core` for any other frame decoding failure.
    pub fn run(&mut self, session: &mut Session) -> Result<EndReason> {
        loop {
            if session.is_exhausted() {
                warn!("Sequence space exhausted, stopping");
                return Ok(EndReason::SequenceExhausted);
            }

            match self.frames.read_frame() {
                Ok(None) => {
                    debug!(
                        frames = self.frames.frames_read(),
                        bytes = self.frames.bytes_read(),
                        "Server closed the stream"
                    );
                    return Ok(EndReason::Closed);
                }
                Ok(Some(frame)) if frame.message_type == MessageType::Error => {
                    let message = frame.error_message();
                    warn!(%message, "Server reported an error");
                    return Ok(EndReason::PeerError(message));
                }
                Ok(Some(frame)) => match session.process_frame(self.crypto, &frame) {
                    RecordOutcome::Accepted { sequence, len } => {
                        trace!(sequence, len, "Record accepted");
                    }
                    RecordOutcome::Dropped(reason) => {
                        debug!(%reason, expected = session.expected_sequence(), "Record dropped");
                    }
                },
                Err(CoreError::UnknownMessageType(byte)) => {
                    let outcome = session.note_unknown_type(byte);
                    debug!(?outcome, "Record dropped");
                }
                Err(CoreError::TruncatedFrame { expected, actual }) => {
                    warn!(expected, actual, "Stream ended inside a frame");
                    return Ok(EndReason::Truncated { expected, actual });
                }
                Err(e @ (CoreError::Transport(_) | CoreError::MessageTooLarge { .. })) => {
                    warn!(error = %e, "Record phase failed");
                    return Ok(EndReason::Failed(e.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Frames read so far.
    #[must_use]
    pub const fn frames_read(&self) -> u64 {
        self.frames.frames_read()
    }
}

/// Logs a summary line for a finished session.
pub fn log_summary(session: &Session, end: &EndReason) {
    let stats = session.stats();
    info!(
        bytes = session.output().len(),
        accepted = stats.accepted,
        dropped = stats.dropped(),
        next_sequence = session.expected_sequence(),
        end = ?end,
        "Record phase finished"
    );
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use stls_core::crypto::DefaultRecordCrypto;
    use stls_core::protocol::decode_frame;

    use super::*;
    use crate::test_support::*;

    fn keys() -> KeySchedule {
        scripted_handshake(stls_core::protocol::FrameLayout::Canonical).keys
    }

    fn process(session: &mut Session, wire: &[u8]) -> RecordOutcome {
        let frame = decode_frame(wire).unwrap();
        session.process_frame(&DefaultRecordCrypto::new(), &frame)
    }

    #[test]
    fn test_in_order_records() {
        let keys = keys();
        let mut session = Session::new(keys.clone());

        for (seq, chunk) in [(0u32, &b"abc"[..]), (1, &b"def"[..]), (2, &b""[..])] {
            let outcome = process(&mut session, &data_frame(&keys, seq, chunk));
            assert_eq!(outcome, RecordOutcome::Accepted { sequence: seq, len: chunk.len() });
        }
        assert_eq!(session.output(), b"abcdef");
        assert_eq!(session.expected_sequence(), 3);
    }

    #[test]
    fn test_out_of_order_and_forged() {
        let keys = keys();
        let mut session = Session::new(keys.clone());

        assert!(matches!(
            process(&mut session, &data_frame(&keys, 0, b"A")),
            RecordOutcome::Accepted { sequence: 0, .. }
        ));
        assert_eq!(
            process(&mut session, &forged_data_frame(&keys, 0, b"X")),
            RecordOutcome::Dropped(RecordRejection::SequenceMismatch { expected: 1, got: 0 })
        );
        assert_eq!(
            process(&mut session, &forged_data_frame(&keys, 1, b"X")),
            RecordOutcome::Dropped(RecordRejection::MacMismatch { sequence: 1 })
        );
        assert_eq!(
            process(&mut session, &data_frame(&keys, 2, b"C")),
            RecordOutcome::Dropped(RecordRejection::SequenceMismatch { expected: 1, got: 2 })
        );
        assert!(matches!(
            process(&mut session, &data_frame(&keys, 1, b"B")),
            RecordOutcome::Accepted { sequence: 1, .. }
        ));

        assert_eq!(session.output(), b"AB");
        assert_eq!(session.expected_sequence(), 2);
        assert_eq!(session.stats().accepted, 2);
        assert_eq!(session.stats().dropped(), 3);
    }

    #[test]
    fn test_duplicate_record_idempotent() {
        let keys = keys();
        let mut session = Session::new(keys.clone());
        let wire = data_frame(&keys, 0, b"once");

        process(&mut session, &wire);
        let output = session.output().to_vec();
        let counter = session.expected_sequence();

        assert!(matches!(process(&mut session, &wire), RecordOutcome::Dropped(_)));
        assert_eq!(session.output(), output.as_slice());
        assert_eq!(session.expected_sequence(), counter);
    }

    #[test]
    fn test_noise_is_dropped() {
        let keys = keys();
        let mut session = Session::new(keys.clone());

        // Garbage that fails AEAD authentication
        assert_eq!(
            process(&mut session, &frame(MessageType::Data, &[0u8; 64])),
            RecordOutcome::Dropped(RecordRejection::Undecryptable)
        );

        // Authentic ciphertext but too short to hold sequence + tag
        let short = DefaultRecordCrypto::new()
            .encrypt(&keys.server_encryption, &[0u8; 10])
            .unwrap();
        assert_eq!(
            process(&mut session, &frame(MessageType::Data, &short)),
            RecordOutcome::Dropped(RecordRejection::Malformed { len: 10 })
        );

        // Handshake message during the record phase
        assert_eq!(
            process(&mut session, &frame(MessageType::Hash, &[0u8; 32])),
            RecordOutcome::Dropped(RecordRejection::UnexpectedType(MessageType::Hash))
        );

        // Encrypted with the wrong direction's key
        let mut swapped = keys.clone();
        swapped.server_encryption = keys.client_encryption.clone();
        assert_eq!(
            process(&mut session, &data_frame(&swapped, 0, b"x")),
            RecordOutcome::Dropped(RecordRejection::Undecryptable)
        );

        assert!(session.output().is_empty());
        assert_eq!(session.expected_sequence(), 0);
        assert_eq!(session.stats().dropped(), 4);
    }

    #[test]
    fn test_reader_until_close() {
        let keys = keys();
        let mut wire = data_frame(&keys, 0, b"hello ");
        wire.extend_from_slice(&[0x42, 0x00, 0x00, 0x01, 0xEE]);
        wire.extend_from_slice(&data_frame(&keys, 1, b"world"));

        let crypto = DefaultRecordCrypto::new();
        let mut session = Session::new(keys);
        let end = RecordReader::new(Cursor::new(wire), &crypto)
            .run(&mut session)
            .unwrap();

        assert_eq!(end, EndReason::Closed);
        assert!(!end.is_abnormal());
        assert_eq!(session.output(), b"hello world");
        assert_eq!(session.stats().unexpected_type, 1);
    }

    #[test]
    fn test_reader_peer_error_keeps_output() {
        let keys = keys();
        let mut wire = data_frame(&keys, 0, b"partial");
        wire.extend_from_slice(&frame(MessageType::Error, b"disk full"));
        wire.extend_from_slice(&data_frame(&keys, 1, b"never read"));

        let crypto = DefaultRecordCrypto::new();
        let mut session = Session::new(keys);
        let end = RecordReader::new(Cursor::new(wire), &crypto)
            .run(&mut session)
            .unwrap();

        assert_eq!(end, EndReason::PeerError("disk full".into()));
        assert_eq!(session.output(), b"partial");
    }

    #[test]
    fn test_reader_oversized_frame_keeps_output() {
        let keys = keys();
        let mut wire = data_frame(&keys, 0, b"small");
        wire.extend_from_slice(&data_frame(&keys, 1, &[0x55; 2048]));

        let crypto = DefaultRecordCrypto::new();
        let mut session = Session::new(keys);
        let end = RecordReader::new(Cursor::new(wire), &crypto)
            .with_max_payload_len(1024)
            .run(&mut session)
            .unwrap();

        assert!(matches!(end, EndReason::Failed(_)));
        assert_eq!(session.output(), b"small");
    }

    #[test]
    fn test_reader_truncated_tail() {
        let keys = keys();
        let mut wire = data_frame(&keys, 0, b"kept");
        let next = data_frame(&keys, 1, b"lost");
        wire.extend_from_slice(&next[..next.len() - 3]);

        let crypto = DefaultRecordCrypto::new();
        let mut session = Session::new(keys);
        let end = RecordReader::new(Cursor::new(wire), &crypto)
            .run(&mut session)
            .unwrap();

        assert!(matches!(end, EndReason::Truncated { .. }));
        assert!(end.is_abnormal());
        assert_eq!(session.output(), b"kept");
    }
}
