/// Symmetric key length in bytes (XChaCha20-Poly1305 uses a 256-bit key).
pub const KEY_LENGTH: usize = 32;

/// XChaCha20 nonce length in bytes.
pub const NONCE_LENGTH: usize = 24;

/// Poly1305 authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Size of the data key requested from the key service.
///
/// `Aes128` reproduces the legacy behaviour of asking for 16 bytes and
/// zero-padding them into the 32-byte key slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataKeySpec {
    Aes128,
    #[default]
    Aes256,
}

impl DataKeySpec {
    /// Number of plaintext key bytes the key service returns for this spec.
    pub fn key_len(self) -> usize {
        match self {
            DataKeySpec::Aes128 => 16,
            DataKeySpec::Aes256 => 32,
        }
    }

    /// Name used by the key service API (`AES_128` / `AES_256`).
    pub fn as_str(self) -> &'static str {
        match self {
            DataKeySpec::Aes128 => "AES_128",
            DataKeySpec::Aes256 => "AES_256",
        }
    }
}

impl std::fmt::Display for DataKeySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
