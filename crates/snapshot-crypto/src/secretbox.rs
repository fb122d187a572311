//! XChaCha20-Poly1305 sealing for snapshot payloads.
//!
//! Output of `seal` is `[ciphertext][tag:16]`; the nonce travels separately
//! in the sealed payload.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

use crate::data_key::SymmetricKey;
use crate::error::CryptoError;
use crate::types::{NONCE_LENGTH, TAG_LENGTH};

/// Encrypt and authenticate `plaintext` under `key` and `nonce`.
pub fn seal(
    key: &SymmetricKey,
    nonce: &[u8; NONCE_LENGTH],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .encrypt(XNonce::from_slice(nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Verify and decrypt `ciphertext`.
///
/// Returns the plaintext only when the tag verifies; any mismatch in key,
/// nonce, or ciphertext yields `DecryptionFailed` and no output.
pub fn open(
    key: &SymmetricKey,
    nonce: &[u8; NONCE_LENGTH],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < TAG_LENGTH {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext too short: {} bytes",
            ciphertext.len()
        )));
    }
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
