// ============================================
// File: crates/stls-core/src/crypto/certificate.rs
// ============================================
//! # Server Certificate
//!
//! ## Creation Reason
//! The server proves its identity with a certificate carrying the public
//! key the client seals its nonce to. This module defines that
//! certificate and the single validation primitive the client relies on.
//!
//! ## Main Functionality
//! - `ServerPublicKey`: X25519 key the client nonce is sealed to
//! - `Certificate`: Decode, encode, issue and verify
//! - `decode_and_validate`: Decode + self-signature + validity window
//!
//! ## Wire Format (big-endian)
//! ```text
//! ┌──────────────┬────────────────┬──────────────────────┐
//! │ "STC1" (4B)  │ Subject len 2B │ Subject (UTF-8)      │
//! ├──────────────┴───────┬────────┴──────────────────────┤
//! │ not_before (8B, i64) │ not_after (8B, i64)           │
//! ├──────────────────────┴───────────────────────────────┤
//! │ Encryption key (32B, X25519)                         │
//! ├──────────────────────────────────────────────────────┤
//! │ Signing key (32B, Ed25519)                           │
//! ├──────────────────────────────────────────────────────┤
//! │ Signature (64B) over every preceding byte            │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - There is no chain and no revocation. Any well-formed, self-signed
//!   leaf inside its validity window is accepted. An active attacker can
//!   present their own certificate. Pinning the signing key is the
//!   obvious next step if this ever guards anything real.
//!
//! ## Last Modified
//! v0.1.0 - Initial certificate format

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::{Buf, BufMut, BytesMut};
use sha2::{Digest, Sha256};
use tracing::debug;

use stls_common::time::Timestamp;

use super::keys::{IdentityKeyPair, IdentityPublicKey};
use super::{ED25519_PUBLIC_KEY_SIZE, ED25519_SIGNATURE_SIZE, X25519_PUBLIC_KEY_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Leading bytes of every certificate.
pub const CERTIFICATE_MAGIC: [u8; 4] = *b"STC1";

/// Size of a certificate with an empty subject.
pub const MIN_CERTIFICATE_SIZE: usize = CERTIFICATE_MAGIC.len()
    + 2
    + 8
    + 8
    + X25519_PUBLIC_KEY_SIZE
    + ED25519_PUBLIC_KEY_SIZE
    + ED25519_SIGNATURE_SIZE;

// ============================================
// ServerPublicKey
// ============================================

/// X25519 public key taken from a validated certificate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerPublicKey([u8; X25519_PUBLIC_KEY_SIZE]);

impl ServerPublicKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; X25519_PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; X25519_PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Base64 form for logs.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl fmt::Debug for ServerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerPublicKey({})", self.to_base64())
    }
}

// ============================================
// Certificate
// ============================================

/// A self-signed leaf certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    subject: String,
    not_before: Timestamp,
    not_after: Timestamp,
    encryption_key: ServerPublicKey,
    signing_key: IdentityPublicKey,
    signature: [u8; ED25519_SIGNATURE_SIZE],
}

impl Certificate {
    /// Issues a certificate signed by `identity`.
    ///
    /// # Errors
    /// Returns `InvalidCertificate` if the subject is longer than 65535
    /// bytes or the window ends before it starts.
    pub fn issue(
        identity: &IdentityKeyPair,
        encryption_key: ServerPublicKey,
        subject: impl Into<String>,
        not_before: Timestamp,
        not_after: Timestamp,
    ) -> Result<Self> {
        let subject = subject.into();
        if subject.len() > usize::from(u16::MAX) {
            return Err(CoreError::invalid_certificate("subject too long"));
        }
        if not_after < not_before {
            return Err(CoreError::invalid_certificate("validity window is empty"));
        }

        let mut certificate = Self {
            subject,
            not_before,
            not_after,
            encryption_key,
            signing_key: identity.public_key(),
            signature: [0u8; ED25519_SIGNATURE_SIZE],
        };
        certificate.signature = identity.sign(&certificate.signed_bytes());
        Ok(certificate)
    }

    /// Decodes a certificate without validating it.
    ///
    /// # Errors
    /// Returns `InvalidCertificate` for bad magic, truncation, trailing
    /// bytes, a non-UTF-8 subject or an invalid signing key.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_CERTIFICATE_SIZE {
            return Err(CoreError::invalid_certificate(format!(
                "too short: {} bytes",
                bytes.len()
            )));
        }

        let mut buf = bytes;
        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        if magic != CERTIFICATE_MAGIC {
            return Err(CoreError::invalid_certificate("bad magic"));
        }

        let subject_len = usize::from(buf.get_u16());
        if buf.remaining() != MIN_CERTIFICATE_SIZE - 6 + subject_len {
            return Err(CoreError::invalid_certificate(format!(
                "length mismatch: subject of {subject_len} bytes in a {} byte certificate",
                bytes.len()
            )));
        }
        let subject = std::str::from_utf8(&buf[..subject_len])
            .map_err(|_| CoreError::invalid_certificate("subject is not UTF-8"))?
            .to_owned();
        buf.advance(subject_len);

        let not_before = Timestamp::from_secs(buf.get_i64());
        let not_after = Timestamp::from_secs(buf.get_i64());

        let mut encryption_key = [0u8; X25519_PUBLIC_KEY_SIZE];
        buf.copy_to_slice(&mut encryption_key);
        let mut signing_key = [0u8; ED25519_PUBLIC_KEY_SIZE];
        buf.copy_to_slice(&mut signing_key);
        let mut signature = [0u8; ED25519_SIGNATURE_SIZE];
        buf.copy_to_slice(&mut signature);

        Ok(Self {
            subject,
            not_before,
            not_after,
            encryption_key: ServerPublicKey::from_bytes(encryption_key),
            signing_key: IdentityPublicKey::from_bytes(&signing_key)?,
            signature,
        })
    }

    /// Encodes the certificate.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.signed_bytes();
        buf.extend_from_slice(&self.signature);
        buf
    }

    /// Every byte covered by the signature.
    fn signed_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(MIN_CERTIFICATE_SIZE + self.subject.len());
        buf.put_slice(&CERTIFICATE_MAGIC);
        // issue() and decode() both bound the subject to u16
        buf.put_u16(self.subject.len() as u16);
        buf.put_slice(self.subject.as_bytes());
        buf.put_i64(self.not_before.as_secs());
        buf.put_i64(self.not_after.as_secs());
        buf.put_slice(self.encryption_key.as_bytes());
        buf.put_slice(&self.signing_key.to_bytes());
        buf.to_vec()
    }

    /// Checks the self-signature.
    ///
    /// # Errors
    /// Returns `InvalidCertificate` if the signature does not verify.
    pub fn verify_signature(&self) -> Result<()> {
        self.signing_key.verify(&self.signed_bytes(), &self.signature)
    }

    /// Checks the self-signature and that `now` lies inside the window.
    ///
    /// # Errors
    /// Returns `InvalidCertificate` naming the failed check.
    pub fn verify_at(&self, now: Timestamp) -> Result<()> {
        self.verify_signature()?;
        if !now.is_within(self.not_before, self.not_after) {
            return Err(CoreError::invalid_certificate(format!(
                "outside validity window {}..{} at {}",
                self.not_before, self.not_after, now
            )));
        }
        Ok(())
    }

    /// Subject name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Start of the validity window.
    #[must_use]
    pub const fn not_before(&self) -> Timestamp {
        self.not_before
    }

    /// End of the validity window.
    #[must_use]
    pub const fn not_after(&self) -> Timestamp {
        self.not_after
    }

    /// Key the client nonce is sealed to.
    #[must_use]
    pub const fn encryption_key(&self) -> ServerPublicKey {
        self.encryption_key
    }

    /// Key that signed this certificate.
    #[must_use]
    pub const fn signing_key(&self) -> IdentityPublicKey {
        self.signing_key
    }

    /// Hex SHA-256 of the encoded certificate, for logs and pinning.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.to_bytes()))
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .field("encryption_key", &self.encryption_key)
            .finish_non_exhaustive()
    }
}

/// Decodes a certificate and validates it against the current time.
///
/// # Errors
/// Returns `InvalidCertificate` if decoding or validation fails.
pub fn decode_and_validate(bytes: &[u8]) -> Result<Certificate> {
    let certificate = Certificate::decode(bytes)?;
    certificate.verify_at(Timestamp::now())?;
    debug!(
        subject = %certificate.subject(),
        not_after = %certificate.not_after(),
        "Certificate validated"
    );
    Ok(certificate)
}

// ============================================
// Tests
// ============================================
