//! Capability interfaces for the external collaborators: the key service,
//! the blob store, and the snapshot-producing store.
//!
//! Production adapters talk to KMS, S3, and Consul; `crate::memory` has
//! in-process versions for tests.

use async_trait::async_trait;
use snapshot_crypto::DataKeySpec;
use tokio::io::AsyncWrite;
use zeroize::Zeroizing;

use crate::error::ServiceError;
use crate::types::{DataKey, Snapshot};

// ============================================================================
// KeyService: data-key generation and unwrapping
// ============================================================================

#[async_trait]
pub trait KeyService: Send + Sync {
    /// Generate a fresh data key under the master key `key_id`.
    async fn generate_data_key(
        &self,
        key_id: &str,
        spec: DataKeySpec,
    ) -> Result<DataKey, ServiceError>;

    /// Recover the plaintext of a data key previously returned by
    /// `generate_data_key`.
    async fn unwrap_key(&self, wrapped_key: &[u8]) -> Result<Zeroizing<Vec<u8>>, ServiceError>;
}

// ============================================================================
// BlobStore: object storage keyed by path
// ============================================================================

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `body` under `key`.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str)
        -> Result<(), ServiceError>;

    /// Stream the object at `key` into `dest`. Returns the number of bytes
    /// written. On error `dest` may hold a partial object.
    async fn get(
        &self,
        key: &str,
        dest: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ServiceError>;

    /// Human-readable location of `key`, e.g. `bucket/key`.
    fn location(&self, key: &str) -> String {
        key.to_string()
    }
}

// ============================================================================
// SnapshotStore: the store being backed up
// ============================================================================

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Take a snapshot of the store's current state.
    async fn save(&self) -> Result<Snapshot, ServiceError>;

    /// Replace the store's state with `snapshot`.
    async fn restore(&self, snapshot: Vec<u8>) -> Result<(), ServiceError>;
}
