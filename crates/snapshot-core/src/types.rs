use snapshot_crypto::NONCE_LENGTH;
use zeroize::Zeroizing;

/// An envelope-encrypted snapshot: the wrapped data key, the nonce, and the
/// AEAD ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// Data key as wrapped by the key service. Only the key service can
    /// turn this back into the plaintext key.
    pub wrapped_key: Vec<u8>,
    pub nonce: [u8; NONCE_LENGTH],
    pub ciphertext: Vec<u8>,
}

/// Raw store snapshot plus the store's last index at the time it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub data: Vec<u8>,
    pub index: u64,
}

/// Data key returned by the key service: plaintext for local use, wrapped
/// for storage next to the ciphertext.
pub struct DataKey {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub wrapped: Vec<u8>,
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey")
            .field("plaintext", &"..")
            .field("wrapped", &self.wrapped.len())
            .finish()
    }
}
