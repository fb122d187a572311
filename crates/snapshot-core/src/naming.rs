//! Object naming for stored snapshots.
//!
//! `{prefix}{index}-{YYYYMMDD-HHMMSS}{suffix}`, where the suffix is `.enc`
//! for sealed payloads and `.zip` for raw store snapshots. The suffix is the
//! only thing restore looks at to decide whether to decrypt.

use chrono::NaiveDateTime;

/// strftime pattern for the timestamp component.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

pub const ENCRYPTED_SUFFIX: &str = ".enc";
pub const PLAIN_SUFFIX: &str = ".zip";

pub const ENCRYPTED_CONTENT_TYPE: &str = "application/octet-stream";
pub const PLAIN_CONTENT_TYPE: &str = "application/gzip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFormat {
    /// Envelope-encrypted SealedPayload.
    Encrypted,
    /// Store snapshot bytes as produced by the store.
    Plain,
}

impl ObjectFormat {
    /// Infer the format from an object key.
    pub fn from_key(key: &str) -> Self {
        if key.ends_with(ENCRYPTED_SUFFIX) {
            ObjectFormat::Encrypted
        } else {
            ObjectFormat::Plain
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ObjectFormat::Encrypted => ENCRYPTED_SUFFIX,
            ObjectFormat::Plain => PLAIN_SUFFIX,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ObjectFormat::Encrypted => ENCRYPTED_CONTENT_TYPE,
            ObjectFormat::Plain => PLAIN_CONTENT_TYPE,
        }
    }

    pub fn is_encrypted(self) -> bool {
        self == ObjectFormat::Encrypted
    }
}

/// Build the object key for a snapshot taken at `taken_at`.
pub fn object_key(prefix: &str, index: u64, taken_at: NaiveDateTime, format: ObjectFormat) -> String {
    format!(
        "{}{}-{}{}",
        prefix,
        index,
        taken_at.format(TIMESTAMP_FORMAT),
        format.suffix()
    )
}
