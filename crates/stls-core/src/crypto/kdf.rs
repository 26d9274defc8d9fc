// ============================================
// File: crates/stls-core/src/crypto/kdf.rs
// ============================================
//! # Key Derivation Functions
//!
//! ## Creation Reason
//! Turns the two handshake nonces into the four session keys.
//!
//! ## Main Functionality
//! - `derive_key_schedule`: HKDF-SHA256 over `N_c ‖ N_s`
//! - `hkdf_expand`: Generic extract-and-expand helper
//!
//! ## Derivation
//! ```text
//! PRK = HKDF-Extract(salt = "stls-v1", IKM = N_c ‖ N_s)
//! client_encryption = HKDF-Expand(PRK, "stls client encryption", 32)
//! client_integrity  = HKDF-Expand(PRK, "stls client integrity", 32)
//! server_encryption = HKDF-Expand(PRK, "stls server encryption", 32)
//! server_integrity  = HKDF-Expand(PRK, "stls server integrity", 32)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Labels and salt are part of the wire contract with the server
//! - Argument order matters: swapping the nonces yields different keys
//!
//! ## Last Modified
//! v0.1.0 - Initial key schedule

use hkdf::Hkdf;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroize;

use super::keys::{KeySchedule, Nonce, SymmetricKey};
use super::{
    HKDF_SALT, LABEL_CLIENT_ENCRYPTION, LABEL_CLIENT_INTEGRITY, LABEL_SERVER_ENCRYPTION,
    LABEL_SERVER_INTEGRITY, SYMMETRIC_KEY_SIZE,
};
use crate::error::{CoreError, Result};
use crate::protocol::NONCE_SIZE;

// ============================================
// Key Derivation
// ============================================

/// Derives the session key schedule from both nonces.
///
/// # Arguments
/// * `client_nonce` - The client's secret nonce
/// * `server_nonce` - The server's public nonce
///
/// # Errors
/// Returns `KeyDerivation` if HKDF expansion fails.
pub fn derive_key_schedule(client_nonce: &Nonce, server_nonce: &Nonce) -> Result<KeySchedule> {
    let mut ikm = [0u8; NONCE_SIZE * 2];
    ikm[..NONCE_SIZE].copy_from_slice(client_nonce.as_bytes());
    ikm[NONCE_SIZE..].copy_from_slice(server_nonce.as_bytes());

    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), &ikm);
    ikm.zeroize();

    let expand = |label: &[u8]| -> Result<SymmetricKey> {
        let mut okm = [0u8; SYMMETRIC_KEY_SIZE];
        hk.expand(label, &mut okm).map_err(|_| CoreError::KeyDerivation {
            reason: "HKDF expansion failed".into(),
        })?;
        let key = SymmetricKey::from_bytes(okm);
        okm.zeroize();
        Ok(key)
    };

    let schedule = KeySchedule {
        client_encryption: expand(LABEL_CLIENT_ENCRYPTION)?,
        client_integrity: expand(LABEL_CLIENT_INTEGRITY)?,
        server_encryption: expand(LABEL_SERVER_ENCRYPTION)?,
        server_integrity: expand(LABEL_SERVER_INTEGRITY)?,
    };

    debug!("Key schedule derived");
    Ok(schedule)
}

/// Extract-and-expand to `output_len` bytes.
///
/// # Errors
/// Returns `KeyDerivation` if `output_len` exceeds 255 * 32 bytes.
pub fn hkdf_expand(ikm: &[u8], salt: &[u8], info: &[u8], output_len: usize) -> Result<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);

    let mut output = vec![0u8; output_len];
    hk.expand(info, &mut output)
        .map_err(|_| CoreError::KeyDerivation {
            reason: format!("HKDF expansion failed for {output_len} bytes"),
        })?;

    Ok(output)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn nonces() -> (Nonce, Nonce) {
        (Nonce::from_bytes([0x00; 32]), Nonce::from_bytes([0xFF; 32]))
    }

    #[test]
    fn test_derive_deterministic() {
        let (client, server) = nonces();
        let first = derive_key_schedule(&client, &server).unwrap();
        let second = derive_key_schedule(&client, &server).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_derive_keys_distinct() {
        let (client, server) = nonces();
        let keys = derive_key_schedule(&client, &server).unwrap();

        let all = [
            keys.client_encryption.as_bytes(),
            keys.client_integrity.as_bytes(),
            keys.server_encryption.as_bytes(),
            keys.server_integrity.as_bytes(),
        ];
        for (i, a) in all.iter().enumerate() {
            assert_ne!(*a, &[0u8; 32]);
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_derive_order_sensitive() {
        let (client, server) = nonces();
        let forward = derive_key_schedule(&client, &server).unwrap();
        let swapped = derive_key_schedule(&server, &client).unwrap();
        assert_ne!(forward.server_integrity, swapped.server_integrity);
    }

    #[test]
    fn test_derive_matches_generic_expand() {
        let (client, server) = nonces();
        let keys = derive_key_schedule(&client, &server).unwrap();

        let mut ikm = Vec::new();
        ikm.extend_from_slice(client.as_bytes());
        ikm.extend_from_slice(server.as_bytes());
        let expected = hkdf_expand(&ikm, HKDF_SALT, LABEL_SERVER_INTEGRITY, 32).unwrap();
        assert_eq!(keys.server_integrity.as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_hkdf_expand_limit() {
        assert!(hkdf_expand(b"ikm", b"salt", b"info", 255 * 32).is_ok());
        assert!(hkdf_expand(b"ikm", b"salt", b"info", 255 * 32 + 1).is_err());
    }
}
