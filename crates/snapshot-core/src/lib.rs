//! Snapshot core: payload encoding, envelope encryption, object naming, and
//! the save/restore pipelines over pluggable key, blob, and store services.

pub mod envelope;
pub mod error;
pub mod memory;
pub mod naming;
pub mod payload;
pub mod pipeline;
pub mod traits;
pub mod types;

pub use envelope::{EnvelopeDecryptor, EnvelopeEncryptor};
pub use error::{ServiceError, SnapshotError};
pub use memory::{MemoryBlobStore, MemoryKeyService, MemorySnapshotStore};
pub use naming::{object_key, ObjectFormat};
pub use payload::{decode_payload, encode_payload, PAYLOAD_FORMAT_VERSION};
pub use pipeline::{restore, save, RestoreOptions, RestoreReport, SaveOptions, SaveReport};
pub use snapshot_crypto::DataKeySpec;
pub use traits::{BlobStore, KeyService, SnapshotStore};
pub use types::{DataKey, SealedPayload, Snapshot};
