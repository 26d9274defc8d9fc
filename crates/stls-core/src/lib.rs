// ============================================
// File: crates/stls-core/src/lib.rs
// ============================================
//! # stls Core - Protocol & Cryptography Library
//!
//! ## Creation Reason
//! Provides the wire protocol and the cryptographic building blocks for
//! the stls secure transport: a four-message handshake that authenticates
//! a server by certificate, followed by a stream of encrypted,
//! MAC-authenticated, sequenced data records.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - Message types and frame structures
//! - Frame codec (type byte + 24-bit length header) and stream reader
//! - Handshake transcript used as MAC input
//!
//! ### Crypto Module ([`crypto`])
//! - Nonces, symmetric keys and the four-key schedule
//! - Key derivation (HKDF-SHA256)
//! - Leaf certificate format and validation
//! - Nonce sealing to the certificate key (X25519 + ChaCha20-Poly1305)
//! - Record encryption (ChaCha20-Poly1305) and integrity tags (HMAC-SHA256)
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              stls-client                │
//! │                   │                     │
//! │                   ▼                     │
//! │              stls-core  ◄── You are here│
//! │                   │                     │
//! │                   ▼                     │
//! │             stls-common                 │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//! - **Server authentication**: certificate key + transcript tag
//! - **Confidentiality**: ChaCha20-Poly1305 on every data record
//! - **Integrity**: HMAC-SHA256 tag on every record chunk
//! - **Ordering**: explicit 32-bit sequence numbers checked by the reader
//!
//! Not provided: forward secrecy, certificate chains, revocation.
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL primitives come from RustCrypto / dalek crates
//! - ALL secret key types implement Zeroize
//! - Certificate validation trusts a single self-signed leaf. This is the
//!   weakest point of the design and must stay documented as such.
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{
    DefaultHandshakeCrypto, DefaultRecordCrypto, HandshakeCrypto, KeySchedule, Nonce,
    RecordCrypto, ServerPublicKey, SymmetricKey,
};
pub use error::{CoreError, Result};
pub use protocol::{Frame, FrameLayout, FrameReader, MessageType, Transcript};
