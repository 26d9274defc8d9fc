// ============================================
// File: crates/stls-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes all cryptographic operations of the stls transport,
//! using audited RustCrypto and dalek implementations.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`keys`]: Nonces, symmetric keys, key schedule, Ed25519 identity
//! - [`kdf`]: Key schedule derivation (HKDF-SHA256)
//! - [`mac`]: HMAC-SHA256 tags with constant-time verification
//! - [`certificate`]: Self-signed leaf certificate format
//! - [`handshake`]: Certificate validation and nonce sealing
//! - [`transport`]: Record encryption (ChaCha20-Poly1305)
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │  Client                                        Server       │
//! │    │ ◄──────────────────── N_s ‖ certificate      │         │
//! │    │  validate certificate → X25519 key pk        │         │
//! │    │  SealedBox_pk(N_c) ─────────────────────────►│         │
//! │    │                                              │         │
//! │    │   HKDF-SHA256(N_c ‖ N_s) ──► four keys       │         │
//! │    │                                              │         │
//! │    │ ◄──────────── HMAC(server_integrity, T)      │         │
//! │    │  HMAC(client_integrity, T) ─────────────────►│         │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Record Phase                             │
//! │                                                             │
//! │   seq ‖ chunk ‖ HMAC(server_integrity, chunk)               │
//! │        ──► ChaCha20-Poly1305(server_encryption)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL implementations use RustCrypto / dalek
//! - NEVER roll your own crypto
//! - ALL secret keys implement Zeroize
//! - The client keys are derived but unused by the one-way record phase
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod certificate;
pub mod handshake;
pub mod kdf;
pub mod keys;
pub mod mac;
pub mod transport;

// Re-export primary types at module level
pub use certificate::{Certificate, ServerPublicKey};
pub use handshake::{
    open_nonce, seal_nonce, DefaultHandshakeCrypto, HandshakeCrypto, ServerIdentity,
};
pub use kdf::derive_key_schedule;
pub use keys::{IdentityKeyPair, IdentityPublicKey, KeySchedule, Nonce, SymmetricKey};
pub use transport::{parse_record, seal_record, DefaultRecordCrypto, RecordCrypto};

// ============================================
// Constants
// ============================================

/// Size of Ed25519 public key in bytes.
pub const ED25519_PUBLIC_KEY_SIZE: usize = 32;

/// Size of Ed25519 signature in bytes.
pub const ED25519_SIGNATURE_SIZE: usize = 64;

/// Size of X25519 public key in bytes.
pub const X25519_PUBLIC_KEY_SIZE: usize = 32;

/// Size of every derived symmetric key in bytes.
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Size of ChaCha20-Poly1305 nonce in bytes.
pub const CHACHA20_NONCE_SIZE: usize = 12;

/// Size of Poly1305 authentication tag in bytes.
pub const POLY1305_TAG_SIZE: usize = 16;

/// HKDF salt for the key schedule.
pub const HKDF_SALT: &[u8] = b"stls-v1";

/// HKDF info labels, one per derived key.
pub const LABEL_CLIENT_ENCRYPTION: &[u8] = b"stls client encryption";
/// See [`LABEL_CLIENT_ENCRYPTION`].
pub const LABEL_CLIENT_INTEGRITY: &[u8] = b"stls client integrity";
/// See [`LABEL_CLIENT_ENCRYPTION`].
pub const LABEL_SERVER_ENCRYPTION: &[u8] = b"stls server encryption";
/// See [`LABEL_CLIENT_ENCRYPTION`].
pub const LABEL_SERVER_INTEGRITY: &[u8] = b"stls server integrity";

/// HKDF info prefix for the nonce sealing key.
pub const LABEL_NONCE_SEAL: &[u8] = b"stls nonce seal";
