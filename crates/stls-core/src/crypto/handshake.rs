// ============================================
// File: crates/stls-core/src/crypto/handshake.rs
// ============================================
//! # Handshake Cryptography
//!
//! ## Creation Reason
//! Provides the cryptographic operations the client performs during the
//! handshake, behind a trait so the state machine can be driven by stubs.
//!
//! ## Main Functionality
//! - `HandshakeCrypto`: Certificate validation, nonce sealing, transcript tags
//! - `DefaultHandshakeCrypto`: Production implementation
//! - `open_nonce` / `ServerIdentity`: The server side, for peers and tests
//!
//! ## Nonce Sealing
//! ```text
//! e, E      = fresh X25519 key pair
//! shared    = X25519(e, pk)
//! key       = HKDF-SHA256(salt "stls-v1", shared, "stls nonce seal" ‖ E ‖ pk)
//! sealed    = E ‖ ChaCha20-Poly1305(key, nonce = 0, N_c)
//! ```
//! The sealing key is used exactly once, so the zero AEAD nonce is safe.
//!
//! ## ⚠️ Important Note for Next Developer
//! - The sealed client nonce is the only secret the key schedule has.
//!   Anyone holding the certificate's X25519 secret can derive every key.
//!
//! ## Last Modified
//! v0.1.0 - Initial handshake crypto implementation

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce as AeadNonce,
};
use rand::rngs::OsRng;
use tracing::{debug, info};
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use stls_common::time::Timestamp;

use super::certificate::{decode_and_validate, Certificate, ServerPublicKey};
use super::kdf::hkdf_expand;
use super::keys::{IdentityKeyPair, Nonce, SymmetricKey};
use super::mac::hmac_sha256;
use super::{
    HKDF_SALT, LABEL_NONCE_SEAL, POLY1305_TAG_SIZE, SYMMETRIC_KEY_SIZE, X25519_PUBLIC_KEY_SIZE,
};
use crate::error::{CoreError, Result};
use crate::protocol::{MAC_TAG_SIZE, NONCE_SIZE};

/// Size of a sealed client nonce.
pub const SEALED_NONCE_SIZE: usize = X25519_PUBLIC_KEY_SIZE + NONCE_SIZE + POLY1305_TAG_SIZE;

// ============================================
// HandshakeCrypto Trait
// ============================================

/// Cryptographic operations used by the client handshake.
pub trait HandshakeCrypto: Send + Sync {
    /// Decodes and validates a certificate blob.
    ///
    /// # Errors
    /// Returns `InvalidCertificate` if the blob is not acceptable.
    fn validate_certificate(&self, certificate: &[u8]) -> Result<ServerPublicKey>;

    /// Encrypts the client nonce to the validated certificate key.
    ///
    /// # Errors
    /// Returns `Encryption` on failure.
    fn encrypt_nonce(&self, server_key: &ServerPublicKey, nonce: &Nonce) -> Result<Vec<u8>>;

    /// Tags the handshake transcript.
    ///
    /// # Errors
    /// Returns `KeyDerivation` if the MAC cannot be keyed.
    fn transcript_tag(&self, key: &SymmetricKey, transcript: &[u8]) -> Result<[u8; MAC_TAG_SIZE]> {
        hmac_sha256(key, transcript)
    }
}

// ============================================
// DefaultHandshakeCrypto
// ============================================

/// Production handshake crypto: STC1 certificates and X25519 sealed nonces.
#[derive(Debug, Default, Clone)]
pub struct DefaultHandshakeCrypto;

impl DefaultHandshakeCrypto {
    /// Creates a new instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HandshakeCrypto for DefaultHandshakeCrypto {
    fn validate_certificate(&self, certificate: &[u8]) -> Result<ServerPublicKey> {
        let certificate = decode_and_validate(certificate)?;
        info!(
            subject = %certificate.subject(),
            signer = %certificate.signing_key().to_base64(),
            fingerprint = %certificate.fingerprint(),
            "Server certificate accepted"
        );
        Ok(certificate.encryption_key())
    }

    fn encrypt_nonce(&self, server_key: &ServerPublicKey, nonce: &Nonce) -> Result<Vec<u8>> {
        seal_nonce(server_key, nonce)
    }
}

// ============================================
// Sealed Box
// ============================================

/// Seals a nonce to an X25519 public key.
///
/// # Errors
/// Returns `Encryption` for a low-order recipient key or AEAD failure.
pub fn seal_nonce(server_key: &ServerPublicKey, nonce: &Nonce) -> Result<Vec<u8>> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral);
    let recipient = X25519PublicKey::from(*server_key.as_bytes());

    let shared = ephemeral.diffie_hellman(&recipient);
    if !shared.was_contributory() {
        return Err(CoreError::encryption("server key is a low-order point"));
    }

    let cipher = seal_cipher(shared.as_bytes(), ephemeral_public.as_bytes(), recipient.as_bytes())?;
    let ciphertext = cipher
        .encrypt(&AeadNonce::default(), nonce.as_bytes().as_slice())
        .map_err(|_| CoreError::encryption("nonce sealing failed"))?;

    let mut sealed = Vec::with_capacity(SEALED_NONCE_SIZE);
    sealed.extend_from_slice(ephemeral_public.as_bytes());
    sealed.extend_from_slice(&ciphertext);
    debug!(len = sealed.len(), "Client nonce sealed");
    Ok(sealed)
}

/// Opens a sealed nonce with the recipient's static secret.
///
/// # Errors
/// Returns `Decryption` if the input has the wrong size or fails
/// authentication.
pub fn open_nonce(secret: &StaticSecret, sealed: &[u8]) -> Result<Nonce> {
    if sealed.len() != SEALED_NONCE_SIZE {
        return Err(CoreError::Decryption);
    }
    let mut ephemeral = [0u8; X25519_PUBLIC_KEY_SIZE];
    ephemeral.copy_from_slice(&sealed[..X25519_PUBLIC_KEY_SIZE]);
    let ephemeral = X25519PublicKey::from(ephemeral);
    let recipient = X25519PublicKey::from(secret);

    let shared = secret.diffie_hellman(&ephemeral);
    if !shared.was_contributory() {
        return Err(CoreError::Decryption);
    }

    let cipher = seal_cipher(shared.as_bytes(), ephemeral.as_bytes(), recipient.as_bytes())?;
    let mut plaintext = cipher
        .decrypt(&AeadNonce::default(), &sealed[X25519_PUBLIC_KEY_SIZE..])
        .map_err(|_| CoreError::Decryption)?;

    let nonce = Nonce::from_slice(&plaintext);
    plaintext.zeroize();
    nonce
}

fn seal_cipher(
    shared: &[u8; 32],
    ephemeral_public: &[u8; X25519_PUBLIC_KEY_SIZE],
    recipient: &[u8; X25519_PUBLIC_KEY_SIZE],
) -> Result<ChaCha20Poly1305> {
    let mut info = Vec::with_capacity(LABEL_NONCE_SEAL.len() + 2 * X25519_PUBLIC_KEY_SIZE);
    info.extend_from_slice(LABEL_NONCE_SEAL);
    info.extend_from_slice(ephemeral_public);
    info.extend_from_slice(recipient);

    let mut key = hkdf_expand(shared, HKDF_SALT, &info, SYMMETRIC_KEY_SIZE)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key).map_err(|_| CoreError::KeyDerivation {
        reason: "bad sealing key length".into(),
    });
    key.zeroize();
    cipher
}

// ============================================
// Server Side
// ============================================

/// Everything a server needs to answer the handshake.
pub struct ServerIdentity {
    encryption_secret: StaticSecret,
    certificate: Certificate,
}

impl ServerIdentity {
    /// Generates fresh keys and a self-signed certificate.
    ///
    /// # Errors
    /// Returns `InvalidCertificate` if the subject or window is invalid.
    pub fn generate(
        subject: impl Into<String>,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> Result<Self> {
        let identity = IdentityKeyPair::generate();
        let encryption_secret = StaticSecret::random_from_rng(OsRng);
        let encryption_key =
            ServerPublicKey::from_bytes(X25519PublicKey::from(&encryption_secret).to_bytes());
        let certificate =
            Certificate::issue(&identity, encryption_key, subject, not_before, not_after)?;
        Ok(Self {
            encryption_secret,
            certificate,
        })
    }

    /// The issued certificate.
    #[must_use]
    pub const fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Opens a sealed client nonce.
    ///
    /// # Errors
    /// See [`open_nonce`].
    pub fn open_nonce(&self, sealed: &[u8]) -> Result<Nonce> {
        open_nonce(&self.encryption_secret, sealed)
    }
}

impl fmt::Debug for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerIdentity")
            .field("certificate", &self.certificate)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
