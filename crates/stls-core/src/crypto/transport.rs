// ============================================
// File: crates/stls-core/src/crypto/transport.rs
// ============================================
//! # Record Encryption
//!
//! ## Creation Reason
//! Provides the symmetric layer of the record phase: authenticated
//! encryption of whole records plus the per-chunk integrity tag.
//!
//! ## Main Functionality
//! - `RecordCrypto`: Trait for record encryption, decryption and tagging
//! - `DefaultRecordCrypto`: ChaCha20-Poly1305 + HMAC-SHA256
//! - `seal_record` / `parse_record`: Build and split record plaintexts
//!
//! ## Data Frame Payload
//! ```text
//! ┌──────────────────────┬─────────────────────────────────────┐
//! │ AEAD nonce (12B)     │ ChaCha20-Poly1305 ciphertext + tag  │
//! └──────────────────────┴─────────────────────────────────────┘
//!                          plaintext = seq (4B) ‖ chunk ‖ HMAC (32B)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The AEAD nonce is random per record. Never derive it from the
//!   sequence number: duplicates are legal on the wire.
//! - Decryption failures are noise to the reader, not fatal errors
//!
//! ## Last Modified
//! v0.1.0 - Initial record crypto implementation

use bytes::Bytes;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce as AeadNonce,
};
use rand::{rngs::OsRng, RngCore};

use super::keys::{KeySchedule, SymmetricKey};
use super::mac::{hmac_sha256, tags_equal};
use super::{CHACHA20_NONCE_SIZE, POLY1305_TAG_SIZE};
use crate::error::{CoreError, Result};
use crate::protocol::{Record, MAC_TAG_SIZE};

// ============================================
// Constants
// ============================================

/// Bytes added to a record plaintext by encryption.
pub const ENCRYPTION_OVERHEAD: usize = CHACHA20_NONCE_SIZE + POLY1305_TAG_SIZE;

// ============================================
// RecordCrypto Trait
// ============================================

/// Symmetric operations of the record phase.
///
/// # Purpose
/// Lets tests and alternative cipher suites replace the primitives
/// without touching the reader's ordering logic.
pub trait RecordCrypto: Send + Sync {
    /// Encrypts a record plaintext.
    ///
    /// # Errors
    /// Returns `Encryption` on failure.
    fn encrypt(&self, key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts a data frame payload.
    ///
    /// # Errors
    /// Returns `Decryption` if the payload is too short or fails
    /// authentication.
    fn decrypt(&self, key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Computes the integrity tag of `data`.
    ///
    /// # Errors
    /// Returns `KeyDerivation` if the MAC cannot be keyed.
    fn mac(&self, key: &SymmetricKey, data: &[u8]) -> Result<[u8; MAC_TAG_SIZE]> {
        hmac_sha256(key, data)
    }

    /// Checks a tag in constant time.
    fn verify_mac(&self, key: &SymmetricKey, data: &[u8], tag: &[u8]) -> bool {
        self.mac(key, data)
            .map(|expected| tags_equal(&expected, tag))
            .unwrap_or(false)
    }
}

// ============================================
// DefaultRecordCrypto
// ============================================

/// Default implementation using ChaCha20-Poly1305 with a random nonce prefix.
#[derive(Debug, Default, Clone)]
pub struct DefaultRecordCrypto;

impl DefaultRecordCrypto {
    /// Creates a new instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RecordCrypto for DefaultRecordCrypto {
    fn encrypt(&self, key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| CoreError::encryption("Failed to create cipher"))?;

        let mut nonce = [0u8; CHACHA20_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(AeadNonce::from_slice(&nonce), plaintext)
            .map_err(|_| CoreError::encryption("ChaCha20-Poly1305 encryption failed"))?;

        let mut output = Vec::with_capacity(CHACHA20_NONCE_SIZE + ciphertext.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    fn decrypt(&self, key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < ENCRYPTION_OVERHEAD {
            return Err(CoreError::Decryption);
        }

        let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| CoreError::Decryption)?;
        let (nonce, body) = ciphertext.split_at(CHACHA20_NONCE_SIZE);

        cipher
            .decrypt(AeadNonce::from_slice(nonce), body)
            .map_err(|_| CoreError::Decryption)
    }
}

// ============================================
// Record Helpers
// ============================================

/// Builds the payload of a data frame, as a server would.
///
/// # Errors
/// Returns `Encryption` or `KeyDerivation` if a primitive fails.
pub fn seal_record<C: RecordCrypto + ?Sized>(
    crypto: &C,
    keys: &KeySchedule,
    sequence: u32,
    chunk: &[u8],
) -> Result<Vec<u8>> {
    let record = Record {
        sequence,
        chunk: Bytes::copy_from_slice(chunk),
        tag: crypto.mac(&keys.server_integrity, chunk)?,
    };
    crypto.encrypt(&keys.server_encryption, &record.to_plaintext())
}

/// Splits a decrypted record. `None` if it is too short.
#[must_use]
pub fn parse_record(plaintext: &[u8]) -> Option<Record> {
    Record::parse(plaintext)
}

// ============================================
// Tests
// ============================================
