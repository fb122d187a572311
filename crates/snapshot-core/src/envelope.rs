//! Envelope encryption for snapshots.
//!
//! Seal:  GenerateDataKey(key_id) → pad key to 32 bytes → random nonce →
//!        XChaCha20-Poly1305(plaintext) → SealedPayload{wrapped key, nonce, ciphertext}
//! Open:  Unwrap(wrapped key) → pad key to 32 bytes → verify + decrypt

use snapshot_crypto::{generate_nonce, open, seal, DataKeySpec, SymmetricKey};
use tracing::debug;

use crate::error::SnapshotError;
use crate::payload::{decode_payload, encode_payload};
use crate::traits::KeyService;
use crate::types::SealedPayload;

/// Seals plaintext under a fresh data key from the key service.
pub struct EnvelopeEncryptor<'a> {
    key_service: &'a dyn KeyService,
    key_spec: DataKeySpec,
}

impl<'a> EnvelopeEncryptor<'a> {
    pub fn new(key_service: &'a dyn KeyService, key_spec: DataKeySpec) -> Self {
        Self {
            key_service,
            key_spec,
        }
    }

    /// Encrypt `plaintext` under a new data key generated for `key_id`.
    ///
    /// Makes exactly one key-service call. The returned payload carries the
    /// wrapped data key; the plaintext key is wiped before returning.
    pub async fn encrypt(
        &self,
        plaintext: &[u8],
        key_id: &str,
    ) -> Result<SealedPayload, SnapshotError> {
        let data_key = self
            .key_service
            .generate_data_key(key_id, self.key_spec)
            .await
            .map_err(SnapshotError::KeyService)?;
        debug!(
            key_spec = %self.key_spec,
            wrapped_len = data_key.wrapped.len(),
            "generated data key"
        );

        let key = SymmetricKey::from_data_key(&data_key.plaintext)?;
        let nonce = generate_nonce()?;
        let ciphertext = seal(&key, &nonce, plaintext)?;

        Ok(SealedPayload {
            wrapped_key: data_key.wrapped,
            nonce,
            ciphertext,
        })
    }

    /// Encrypt and encode in one step.
    pub async fn seal(&self, plaintext: &[u8], key_id: &str) -> Result<Vec<u8>, SnapshotError> {
        let payload = self.encrypt(plaintext, key_id).await?;
        encode_payload(&payload)
    }
}

/// Opens payloads produced by [`EnvelopeEncryptor`].
pub struct EnvelopeDecryptor<'a> {
    key_service: &'a dyn KeyService,
}

impl<'a> EnvelopeDecryptor<'a> {
    pub fn new(key_service: &'a dyn KeyService) -> Self {
        Self { key_service }
    }

    /// Decrypt a sealed payload.
    ///
    /// Fails with `AuthenticationFailed` if the tag does not verify; no
    /// plaintext is returned in that case.
    pub async fn decrypt(&self, payload: &SealedPayload) -> Result<Vec<u8>, SnapshotError> {
        let plaintext_key = self
            .key_service
            .unwrap_key(&payload.wrapped_key)
            .await
            .map_err(SnapshotError::KeyService)?;

        let key = SymmetricKey::from_data_key(&plaintext_key)?;
        let plaintext = open(&key, &payload.nonce, &payload.ciphertext)?;
        debug!(size = plaintext.len(), "opened sealed payload");
        Ok(plaintext)
    }

    /// Decode and decrypt in one step.
    pub async fn open(&self, encoded: &[u8]) -> Result<Vec<u8>, SnapshotError> {
        let payload = decode_payload(encoded)?;
        self.decrypt(&payload).await
    }
}
