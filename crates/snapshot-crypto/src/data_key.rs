//! Data-key buffers and nonce generation.
//!
//! The key service hands back a plaintext data key of 16 or 32 bytes. It is
//! copied into a fixed 32-byte slot, zero-padding whatever the key does not
//! fill, so both key sizes seal and open with the same cipher.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::types::{KEY_LENGTH, NONCE_LENGTH};

/// A 256-bit symmetric key, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LENGTH]);

impl SymmetricKey {
    /// Build the cipher key from a plaintext data key.
    ///
    /// # Arguments
    /// * `data_key` - Plaintext key bytes from the key service (1..=32 bytes)
    ///
    /// # Returns
    /// 32-byte key: `[data_key][zero padding]`
    pub fn from_data_key(data_key: &[u8]) -> Result<Self, CryptoError> {
        if data_key.is_empty() || data_key.len() > KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                max: KEY_LENGTH,
                got: data_key.len(),
            });
        }
        let mut key = [0u8; KEY_LENGTH];
        key[..data_key.len()].copy_from_slice(data_key);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Generate a random 24-byte XChaCha20 nonce from the OS CSPRNG.
pub fn generate_nonce() -> Result<[u8; NONCE_LENGTH], CryptoError> {
    let mut nonce = [0u8; NONCE_LENGTH];
    getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(nonce)
}

/// Interpret a byte slice as a nonce, checking its length.
pub fn nonce_from_slice(bytes: &[u8]) -> Result<[u8; NONCE_LENGTH], CryptoError> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidNonceLength {
            expected: NONCE_LENGTH,
            got: bytes.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_key_is_zero_padded() {
        let key = SymmetricKey::from_data_key(&[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "0102030000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn legacy_128_bit_key_fills_low_half() {
        let key = SymmetricKey::from_data_key(&[0xab; 16]).unwrap();
        assert_eq!(&key.as_bytes()[..16], &[0xab; 16]);
        assert_eq!(&key.as_bytes()[16..], &[0u8; 16]);
    }

    #[test]
    fn full_length_key_is_copied_verbatim() {
        let data_key: Vec<u8> = (0u8..32).collect();
        let key = SymmetricKey::from_data_key(&data_key).unwrap();
        assert_eq!(key.as_bytes().as_slice(), data_key.as_slice());
    }

    #[test]
    fn empty_key_rejected() {
        assert!(matches!(
            SymmetricKey::from_data_key(&[]),
            Err(CryptoError::InvalidKeyLength { got: 0, .. })
        ));
    }

    #[test]
    fn oversized_key_rejected() {
        assert!(matches!(
            SymmetricKey::from_data_key(&[0u8; 33]),
            Err(CryptoError::InvalidKeyLength { got: 33, .. })
        ));
    }

    #[test]
    fn debug_does_not_print_key() {
        let key = SymmetricKey::from_data_key(&[0x42; 32]).unwrap();
        assert_eq!(format!("{:?}", key), "SymmetricKey(..)");
    }

    #[test]
    fn nonces_are_unique() {
        let n1 = generate_nonce().unwrap();
        let n2 = generate_nonce().unwrap();
        assert_eq!(n1.len(), NONCE_LENGTH);
        assert_ne!(n1, n2);
    }

    #[test]
    fn nonce_from_slice_checks_length() {
        assert!(nonce_from_slice(&[0u8; 24]).is_ok());
        assert!(matches!(
            nonce_from_slice(&[0u8; 12]),
            Err(CryptoError::InvalidNonceLength {
                expected: 24,
                got: 12
            })
        ));
    }
}
