// ============================================
// File: crates/stls-core/src/crypto/mac.rs
// ============================================
//! HMAC-SHA256 tags for the handshake transcript and record chunks.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::keys::SymmetricKey;
use crate::error::{CoreError, Result};
use crate::protocol::MAC_TAG_SIZE;

type HmacSha256 = Hmac<Sha256>;

/// Computes `HMAC-SHA256(key, data)`.
///
/// # Errors
/// Returns `KeyDerivation` if the MAC cannot be keyed.
pub fn hmac_sha256(key: &SymmetricKey, data: &[u8]) -> Result<[u8; MAC_TAG_SIZE]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.as_bytes()).map_err(|_| {
        CoreError::KeyDerivation {
            reason: "invalid HMAC key length".into(),
        }
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Compares two tags in constant time. Length mismatch is unequal.
#[must_use]
pub fn tags_equal(expected: &[u8], received: &[u8]) -> bool {
    expected.ct_eq(received).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_matches_reference() {
        let key = SymmetricKey::from_bytes([0x0b; 32]);
        let tag = hmac_sha256(&key, b"Hi There").unwrap();

        let mut reference = <HmacSha256 as Mac>::new_from_slice(&[0x0b; 32]).unwrap();
        reference.update(b"Hi There");
        assert!(reference.verify_slice(&tag).is_ok());
    }

    #[test]
    fn test_hmac_key_sensitive() {
        let a = hmac_sha256(&SymmetricKey::from_bytes([1; 32]), b"data").unwrap();
        let b = hmac_sha256(&SymmetricKey::from_bytes([2; 32]), b"data").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tags_equal() {
        assert!(tags_equal(&[1, 2, 3], &[1, 2, 3]));
        assert!(!tags_equal(&[1, 2, 3], &[1, 2, 4]));
        assert!(!tags_equal(&[1, 2, 3], &[1, 2]));
    }
}
