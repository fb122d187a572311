use snapshot_crypto::CryptoError;
use thiserror::Error;

/// Failure reported by an external collaborator (key service, blob store,
/// snapshot store). Wraps whatever the transport layer produced.
#[derive(Debug, Clone)]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Snapshot store error: {0}")]
    Store(#[source] ServiceError),

    #[error("Key service error: {0}")]
    KeyService(#[source] ServiceError),

    #[error("Randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    #[error("Malformed sealed payload: {0}")]
    MalformedPayload(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Authentication failed: sealed payload could not be verified")]
    AuthenticationFailed,

    #[error("Blob store error: {0}")]
    BlobStore(#[source] ServiceError),
}

impl SnapshotError {
    /// Short name of the failing stage, used in operator diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            SnapshotError::Configuration(_) => "configuration",
            SnapshotError::Store(_) => "snapshot store",
            SnapshotError::KeyService(_) => "key service",
            SnapshotError::RandomnessUnavailable(_) => "randomness",
            SnapshotError::MalformedPayload(_) => "payload decode",
            SnapshotError::Encryption(_) => "encryption",
            SnapshotError::AuthenticationFailed => "decryption",
            SnapshotError::BlobStore(_) => "blob store",
        }
    }
}

impl From<CryptoError> for SnapshotError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::RngFailed(msg) => SnapshotError::RandomnessUnavailable(msg),
            CryptoError::DecryptionFailed(_) => SnapshotError::AuthenticationFailed,
            CryptoError::InvalidNonceLength { .. } => {
                SnapshotError::MalformedPayload(err.to_string())
            }
            CryptoError::EncryptionFailed(msg) => SnapshotError::Encryption(msg),
            CryptoError::InvalidKeyLength { .. } => {
                SnapshotError::KeyService(ServiceError::new(err.to_string()))
            }
        }
    }
}
