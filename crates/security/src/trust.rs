//! Trusted token signer decoding.
//!
//! Signers arrive from the settings source as hex strings. Each must decode
//! to exactly one ed25519 public key; anything else aborts the build.

use ed25519_dalek::PUBLIC_KEY_LENGTH;

use crate::error::{SecurityError, SecurityResult};

/// Raw ed25519 public key bytes of a trusted token signer.
pub type SignerKey = [u8; PUBLIC_KEY_LENGTH];

/// Decode a single hex encoded ed25519 public key.
///
/// # Errors
/// `InvalidKeyEncoding` when `signer` is not hex, `InvalidKeySize` when it
/// does not decode to 32 bytes.
pub fn decode_signer(signer: &str) -> SecurityResult<SignerKey> {
    let pk = hex::decode(signer).map_err(|source| SecurityError::InvalidKeyEncoding {
        key: signer.to_string(),
        source,
    })?;

    let size = pk.len();
    pk.try_into().map_err(|_| SecurityError::InvalidKeySize {
        key: signer.to_string(),
        size,
    })
}

/// Decode every signer in order, stopping at the first bad one.
///
/// Order and duplicates are preserved.
pub fn decode_signers<S: AsRef<str>>(signers: &[S]) -> SecurityResult<Vec<SignerKey>> {
    signers.iter().map(|s| decode_signer(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    #[test]
    fn test_decodes_valid_key() {
        let key = decode_signer(KEY_HEX).unwrap();
        assert_eq!(key.len(), 32);
        assert_eq!(hex::encode(key), KEY_HEX);
    }

    #[test]
    fn test_accepts_uppercase_hex() {
        let key = decode_signer(&KEY_HEX.to_uppercase()).unwrap();
        assert_eq!(hex::encode(key), KEY_HEX);
    }

    #[test]
    fn test_rejects_non_hex() {
        for bad in ["zz", "deadbeeg", "abc", " deadbeef"] {
            match decode_signer(bad) {
                Err(SecurityError::InvalidKeyEncoding { key, .. }) => assert_eq!(key, bad),
                other => panic!("expected InvalidKeyEncoding for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_wrong_size() {
        for (bad, len) in [("", 0), ("deadbeef", 4), (&KEY_HEX[..62], 31), (&format!("{KEY_HEX}00")[..], 33)] {
            match decode_signer(bad) {
                Err(SecurityError::InvalidKeySize { key, size }) => {
                    assert_eq!(key, bad);
                    assert_eq!(size, len);
                }
                other => panic!("expected InvalidKeySize for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        let other = "00".repeat(32);
        let keys = decode_signers(&[KEY_HEX, other.as_str(), KEY_HEX]).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], keys[2]);
        assert_eq!(keys[1], [0u8; 32]);
    }

    #[test]
    fn test_stops_at_first_bad_signer() {
        let err = decode_signers(&[KEY_HEX, "zz", "deadbeef"]).unwrap_err();
        assert!(matches!(err, SecurityError::InvalidKeyEncoding { ref key, .. } if key == "zz"));
    }
}
