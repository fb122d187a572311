//! In-memory implementations of the capability traits.
//!
//! `MemoryKeyService` wraps data keys with AES-KW under a master key that
//! never leaves the process. `MemoryBlobStore` and `MemorySnapshotStore` keep
//! everything in `HashMap`s / buffers behind `parking_lot::Mutex`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use aes_kw::KekAes256;
use async_trait::async_trait;
use parking_lot::Mutex;
use snapshot_crypto::DataKeySpec;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use zeroize::Zeroizing;

use crate::error::ServiceError;
use crate::traits::{BlobStore, KeyService, SnapshotStore};
use crate::types::{DataKey, Snapshot};

/// AES-KW adds one 8-byte semiblock to the wrapped key.
const AES_KW_OVERHEAD: usize = 8;

// ============================================================================
// MemoryKeyService
// ============================================================================

/// Key service backed by a single in-process master key.
pub struct MemoryKeyService {
    master: Zeroizing<[u8; 32]>,
    key_ids: HashSet<String>,
    generate_calls: AtomicUsize,
    unwrap_calls: AtomicUsize,
}

impl MemoryKeyService {
    /// Create a key service with a random master key that accepts the given
    /// key ids.
    pub fn new<I, S>(key_ids: I) -> Result<Self, ServiceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut master = [0u8; 32];
        getrandom::getrandom(&mut master)
            .map_err(|e| ServiceError::new(format!("master key generation failed: {}", e)))?;
        Ok(Self::with_master_key(key_ids, master))
    }

    pub fn with_master_key<I, S>(key_ids: I, master: [u8; 32]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            master: Zeroizing::new(master),
            key_ids: key_ids.into_iter().map(Into::into).collect(),
            generate_calls: AtomicUsize::new(0),
            unwrap_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate_data_key` calls made so far.
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::Relaxed)
    }

    /// Number of `unwrap_key` calls made so far.
    pub fn unwrap_calls(&self) -> usize {
        self.unwrap_calls.load(Ordering::Relaxed)
    }

    fn kek(&self) -> KekAes256 {
        KekAes256::from(*self.master)
    }
}

#[async_trait]
impl KeyService for MemoryKeyService {
    async fn generate_data_key(
        &self,
        key_id: &str,
        spec: DataKeySpec,
    ) -> Result<DataKey, ServiceError> {
        self.generate_calls.fetch_add(1, Ordering::Relaxed);
        if !self.key_ids.contains(key_id) {
            return Err(ServiceError::new(format!(
                "NotFoundException: key '{}' does not exist",
                key_id
            )));
        }

        let mut plaintext = Zeroizing::new(vec![0u8; spec.key_len()]);
        getrandom::getrandom(&mut plaintext)
            .map_err(|e| ServiceError::new(format!("data key generation failed: {}", e)))?;

        let mut wrapped = vec![0u8; plaintext.len() + AES_KW_OVERHEAD];
        self.kek()
            .wrap(&plaintext, &mut wrapped)
            .map_err(|e| ServiceError::new(format!("AES-KW wrap failed: {:?}", e)))?;

        Ok(DataKey { plaintext, wrapped })
    }

    async fn unwrap_key(&self, wrapped_key: &[u8]) -> Result<Zeroizing<Vec<u8>>, ServiceError> {
        self.unwrap_calls.fetch_add(1, Ordering::Relaxed);
        if wrapped_key.len() < 3 * AES_KW_OVERHEAD || wrapped_key.len() % AES_KW_OVERHEAD != 0 {
            return Err(ServiceError::new(format!(
                "InvalidCiphertextException: wrapped key of {} bytes",
                wrapped_key.len()
            )));
        }

        let mut plaintext = Zeroizing::new(vec![0u8; wrapped_key.len() - AES_KW_OVERHEAD]);
        self.kek()
            .unwrap(wrapped_key, &mut plaintext)
            .map_err(|e| {
                ServiceError::new(format!("InvalidCiphertextException: {:?}", e))
            })?;
        Ok(plaintext)
    }
}

// ============================================================================
// MemoryBlobStore
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Blob store holding objects in a map keyed by path.
#[derive(Default)]
pub struct MemoryBlobStore {
    bucket: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    get_calls: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Seed an object directly.
    pub fn insert(&self, key: impl Into<String>, body: Vec<u8>, content_type: impl Into<String>) {
        self.objects.lock().insert(
            key.into(),
            StoredObject {
                body,
                content_type: content_type.into(),
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ServiceError> {
        self.insert(key, body, content_type);
        Ok(())
    }

    async fn get(
        &self,
        key: &str,
        dest: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ServiceError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        let body = self
            .object(key)
            .map(|o| o.body)
            .ok_or_else(|| ServiceError::new(format!("NoSuchKey: {}", key)))?;
        dest.write_all(&body)
            .await
            .map_err(|e| ServiceError::new(format!("write failed: {}", e)))?;
        dest.flush()
            .await
            .map_err(|e| ServiceError::new(format!("flush failed: {}", e)))?;
        Ok(body.len() as u64)
    }

    fn location(&self, key: &str) -> String {
        format!("{}/{}", self.bucket, key)
    }
}

// ============================================================================
// MemorySnapshotStore
// ============================================================================

/// Store that serves a fixed snapshot and records what gets restored.
pub struct MemorySnapshotStore {
    snapshot: Snapshot,
    restored: Mutex<Vec<Vec<u8>>>,
    save_calls: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new(data: Vec<u8>, index: u64) -> Self {
        Self {
            snapshot: Snapshot { data, index },
            restored: Mutex::new(Vec::new()),
            save_calls: AtomicUsize::new(0),
        }
    }

    /// Every snapshot passed to `restore`, oldest first.
    pub fn restored(&self) -> Vec<Vec<u8>> {
        self.restored.lock().clone()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self) -> Result<Snapshot, ServiceError> {
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.snapshot.clone())
    }

    async fn restore(&self, snapshot: Vec<u8>) -> Result<(), ServiceError> {
        self.restored.lock().push(snapshot);
        Ok(())
    }
}
