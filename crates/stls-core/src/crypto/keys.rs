// ============================================
// File: crates/stls-core/src/crypto/keys.rs
// ============================================
//! # Cryptographic Key Types
//!
//! ## Creation Reason
//! Defines key types used by the stls protocol with proper security
//! properties (Zeroize on drop, constant-time comparison, redacted Debug).
//!
//! ## Main Functionality
//! - `Nonce`: 32-byte random contribution from either side
//! - `SymmetricKey`: One derived 32-byte key
//! - `KeySchedule`: The four keys of a session
//! - `IdentityKeyPair`: Ed25519 key that signs certificates
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  Client Nonce (Per-session)                                │
//! │  ├─ Generated fresh from the OS RNG                        │
//! │  ├─ Sent only in sealed form                               │
//! │  └─ Zeroed once the key schedule is derived                │
//! │                                                            │
//! │  KeySchedule (Per-session)                                 │
//! │  ├─ Derived from both nonces                               │
//! │  ├─ Integrity keys tag the transcript and records          │
//! │  └─ Zeroed when the session ends or the handshake aborts   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL key types MUST implement Zeroize
//! - Keys and the client nonce must NEVER be logged
//!
//! ## Last Modified
//! v0.1.0 - Initial key type definitions

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{ED25519_PUBLIC_KEY_SIZE, ED25519_SIGNATURE_SIZE, SYMMETRIC_KEY_SIZE};
use crate::error::{CoreError, Result};
use crate::protocol::NONCE_SIZE;

// ============================================
// Nonce
// ============================================

/// A 32-byte handshake nonce.
///
/// # Example
/// ```
/// use stls_core::crypto::Nonce;
///
/// let a = Nonce::generate();
/// let b = Nonce::generate();
/// assert_ne!(a.as_bytes(), b.as_bytes());
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Generates a nonce from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wraps existing bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a nonce from a slice.
    ///
    /// # Errors
    /// Returns `InvalidLength` if the slice is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; NONCE_SIZE] = bytes.try_into().map_err(|_| {
            CoreError::Common(stls_common::CommonError::invalid_length(
                NONCE_SIZE,
                bytes.len(),
            ))
        })?;
        Ok(Self(array))
    }

    /// Returns the nonce bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl PartialEq for Nonce {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Nonce {}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nonce([REDACTED])")
    }
}

// ============================================
// SymmetricKey
// ============================================

/// One 32-byte key of the key schedule.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    ///
    /// # Security Warning
    /// Handle the returned reference with care. Never log it.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

// ============================================
// KeySchedule
// ============================================

/// The four session keys.
///
/// All four are always derived; the record phase only uses the server pair.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeySchedule {
    /// Client → server encryption (unused by the one-way record phase)
    pub client_encryption: SymmetricKey,
    /// Tags the client's handshake message
    pub client_integrity: SymmetricKey,
    /// Server → client record encryption
    pub server_encryption: SymmetricKey,
    /// Tags the server's handshake message and every record chunk
    pub server_integrity: SymmetricKey,
}

impl fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeySchedule([REDACTED])")
    }
}

// ============================================
// IdentityKeyPair (Ed25519)
// ============================================

/// Ed25519 key pair that signs certificates.
///
/// # Example
/// ```
/// use stls_core::crypto::IdentityKeyPair;
///
/// let identity = IdentityKeyPair::generate();
/// let signature = identity.sign(b"hello");
/// assert!(identity.public_key().verify(b"hello", &signature).is_ok());
/// ```
pub struct IdentityKeyPair {
    signing_key: SigningKey,
}

impl IdentityKeyPair {
    /// Generates a new random identity key pair.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Creates an identity key pair from a 32-byte seed.
    ///
    /// # Errors
    /// Returns `InvalidLength` if the seed is not 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut seed: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::Common(stls_common::CommonError::invalid_length(32, bytes.len()))
        })?;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Ok(Self { signing_key })
    }

    /// Returns the public key component.
    #[must_use]
    pub fn public_key(&self) -> IdentityPublicKey {
        IdentityPublicKey(self.signing_key.verifying_key())
    }

    /// Signs a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; ED25519_SIGNATURE_SIZE] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        f.debug_struct("IdentityKeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

// ============================================
// IdentityPublicKey
// ============================================

/// Public half of an [`IdentityKeyPair`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdentityPublicKey(VerifyingKey);

impl IdentityPublicKey {
    /// Creates a public key from raw bytes.
    ///
    /// # Errors
    /// Returns `InvalidCertificate` if the bytes are not a valid point.
    pub fn from_bytes(bytes: &[u8; ED25519_PUBLIC_KEY_SIZE]) -> Result<Self> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CoreError::invalid_certificate("signing key is not a valid Ed25519 point"))
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; ED25519_PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Verifies a signature.
    ///
    /// # Errors
    /// Returns `InvalidCertificate` if verification fails.
    pub fn verify(&self, message: &[u8], signature: &[u8; ED25519_SIGNATURE_SIZE]) -> Result<()> {
        let signature = Signature::from_bytes(signature);
        self.0
            .verify(message, &signature)
            .map_err(|_| CoreError::invalid_certificate("signature does not verify"))
    }

    /// Base64 form for logs.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.as_bytes())
    }
}

impl fmt::Debug for IdentityPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityPublicKey({})", self.to_base64())
    }
}

// ============================================
// Tests
// ============================================
