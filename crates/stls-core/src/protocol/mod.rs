// ============================================
// File: crates/stls-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the stls wire protocol: message types, frame layout, the
//! frame codec and the handshake transcript.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`messages`]: Message types, frame and record structures
//! - [`codec`]: Header encoding/decoding and the blocking frame reader
//! - [`transcript`]: Byte-exact record of the handshake messages
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │                                                             │
//! │  Client ──────── Hello (empty) ─────────────────────► Server│
//! │  Client ◄─────── Certificate (N_s ‖ cert) ─────────── Server│
//! │  Client ──────── EncryptedNonce (Enc_pk(N_c)) ──────► Server│
//! │  Client ◄─────── Hash (server tag) ────────────────── Server│
//! │  Client ──────── Hash (client tag) ─────────────────► Server│
//! │                                                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Record Phase                             │
//! │                                                             │
//! │  Client ◄══════ Data (AEAD(seq ‖ chunk ‖ tag)) ══════ Server│
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format Principles
//! - Every frame: 1 type byte + 24-bit big-endian payload length
//! - Sequence numbers are 32-bit big-endian
//! - The greeting carries no payload, so its header reads identically as
//!   a bare little-endian 4-byte type marker
//!
//! ## ⚠️ Important Note for Next Developer
//! - The transcript MUST hold the exact bytes sent and received
//! - [`FrameLayout::Legacy`] exists only to interoperate with peers that
//!   parse the encrypted-nonce length little-endian. Do not extend it.
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod messages;
pub mod transcript;

// Re-export primary types
pub use codec::{decode_frame, decode_header, encode_frame, encode_header, FrameLayout, FrameReader};
pub use messages::{
    Frame, FrameHeader, MessageType, Record, ServerHello, HEADER_SIZE, MAC_TAG_SIZE,
    MAX_PAYLOAD_LEN, MIN_RECORD_SIZE, NONCE_SIZE, SEQUENCE_SIZE,
};
pub use transcript::{HandshakeTranscript, Transcript};
