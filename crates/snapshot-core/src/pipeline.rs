//! Save and restore pipelines.
//!
//! Save:    store snapshot → [seal] → blob put
//! Restore: blob get (staged to a temp file) → [open] → store restore
//!
//! Whether a blob is sealed is decided by the key id on save and by the
//! object key suffix on restore.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use snapshot_crypto::DataKeySpec;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::envelope::{EnvelopeDecryptor, EnvelopeEncryptor};
use crate::error::{ServiceError, SnapshotError};
use crate::naming::{object_key, ObjectFormat};
use crate::traits::{BlobStore, KeyService, SnapshotStore};

/// Prefix for staged downloads.
const STAGING_FILE_PREFIX: &str = "snap-restore";

#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Prepended verbatim to the object key.
    pub prefix: String,
    /// Master key id; when set the snapshot is sealed before upload.
    pub key_id: Option<String>,
    pub key_spec: DataKeySpec,
}

#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// Object key of the snapshot to restore.
    pub path: String,
    /// Directory for the temporary download file.
    pub staging_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub key: String,
    pub location: String,
    pub index: u64,
    pub format: ObjectFormat,
    /// Bytes uploaded.
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub key: String,
    pub location: String,
    pub format: ObjectFormat,
    /// Bytes handed to the store.
    pub size: usize,
}

/// Take a snapshot and upload it.
///
/// # Arguments
/// * `store` - Store to snapshot
/// * `blobs` - Destination blob store
/// * `key_service` - Key service, required when `options.key_id` is set
/// * `options` - Prefix, key id and data-key size
/// * `taken_at` - Timestamp embedded in the object key
pub async fn save(
    store: &dyn SnapshotStore,
    blobs: &dyn BlobStore,
    key_service: Option<&dyn KeyService>,
    options: &SaveOptions,
    taken_at: NaiveDateTime,
) -> Result<SaveReport, SnapshotError> {
    let sealing = match (options.key_id.as_deref(), key_service) {
        (Some(key_id), Some(key_service)) => Some((
            key_id,
            EnvelopeEncryptor::new(key_service, options.key_spec),
        )),
        (Some(_), None) => {
            return Err(SnapshotError::Configuration(
                "a KMS region is required when a KMS key is given".to_string(),
            ))
        }
        (None, _) => None,
    };

    let snapshot = store.save().await.map_err(SnapshotError::Store)?;
    debug!(
        index = snapshot.index,
        size = snapshot.data.len(),
        "took store snapshot"
    );

    let (format, body) = match sealing {
        Some((key_id, encryptor)) => {
            info!(key_id, "KMS enabled");
            let sealed = encryptor.seal(&snapshot.data, key_id).await?;
            (ObjectFormat::Encrypted, sealed)
        }
        None => {
            info!("KMS not enabled");
            (ObjectFormat::Plain, snapshot.data)
        }
    };

    let key = object_key(&options.prefix, snapshot.index, taken_at, format);
    let size = body.len();
    blobs
        .put(&key, body, format.content_type())
        .await
        .map_err(SnapshotError::BlobStore)?;

    let location = blobs.location(&key);
    info!(%location, size, "uploaded snapshot");

    Ok(SaveReport {
        key,
        location,
        index: snapshot.index,
        format,
        size,
    })
}

/// Download a snapshot and restore it into the store.
///
/// An encrypted object without a key service fails before any download.
/// The staged download file is removed on every return path.
pub async fn restore(
    store: &dyn SnapshotStore,
    blobs: &dyn BlobStore,
    key_service: Option<&dyn KeyService>,
    options: &RestoreOptions,
) -> Result<RestoreReport, SnapshotError> {
    let format = ObjectFormat::from_key(&options.path);
    let decryptor = match (format, key_service) {
        (ObjectFormat::Encrypted, Some(key_service)) => Some(EnvelopeDecryptor::new(key_service)),
        (ObjectFormat::Encrypted, None) => {
            return Err(SnapshotError::Configuration(
                "a KMS region is required to restore an encrypted snapshot".to_string(),
            ))
        }
        (ObjectFormat::Plain, _) => None,
    };

    let location = blobs.location(&options.path);
    let downloaded = download(blobs, &options.path, &options.staging_dir).await?;
    debug!(%location, size = downloaded.len(), "downloaded snapshot");

    let snapshot = match decryptor {
        Some(decryptor) => decryptor.open(&downloaded).await?,
        None => downloaded,
    };

    let size = snapshot.len();
    store
        .restore(snapshot)
        .await
        .map_err(SnapshotError::Store)?;
    info!(%location, size, "restored snapshot");

    Ok(RestoreReport {
        key: options.path.clone(),
        location,
        format,
        size,
    })
}

/// Fetch `key` through a temp file in `staging_dir` and return its bytes.
async fn download(
    blobs: &dyn BlobStore,
    key: &str,
    staging_dir: &Path,
) -> Result<Vec<u8>, SnapshotError> {
    // Removed when `staged` drops, whichever way this function returns.
    let staged = tempfile::Builder::new()
        .prefix(STAGING_FILE_PREFIX)
        .tempfile_in(staging_dir)
        .map_err(|e| staging_error(staging_dir, "create", e))?;

    let handle = staged
        .reopen()
        .map_err(|e| staging_error(staged.path(), "open", e))?;
    let mut file = tokio::fs::File::from_std(handle);

    let written = blobs
        .get(key, &mut file)
        .await
        .map_err(SnapshotError::BlobStore)?;
    file.flush()
        .await
        .map_err(|e| staging_error(staged.path(), "flush", e))?;
    drop(file);
    debug!(path = %staged.path().display(), written, "staged download");

    tokio::fs::read(staged.path())
        .await
        .map_err(|e| staging_error(staged.path(), "read", e))
}

fn staging_error(path: &Path, action: &str, err: std::io::Error) -> SnapshotError {
    SnapshotError::BlobStore(ServiceError::new(format!(
        "failed to {} staging file {}: {}",
        action,
        path.display(),
        err
    )))
}
