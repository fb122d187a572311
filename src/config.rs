//! Resolved configuration for one run, built from the parsed command line.

use std::time::Duration;

use snapshot_core::{RestoreOptions, SaveOptions, SnapshotError};

use crate::cli::{CommonArgs, RestoreArgs, SaveArgs};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Timeout and retry budget shared by every remote client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub request_timeout: Duration,
    pub max_attempts: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsulOptions {
    /// `host:port` or a full URL.
    pub address: String,
    pub token: Option<String>,
    pub datacenter: Option<String>,
    /// Scheme used when `address` has none.
    pub use_tls: bool,
    /// Allow a non-leader server to answer snapshot requests.
    pub stale: bool,
}

impl Default for ConsulOptions {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8500".to_string(),
            token: None,
            datacenter: None,
            use_tls: false,
            stale: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Options {
    pub bucket: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct SaveConfig {
    pub s3: S3Options,
    /// KMS is only contacted when this is set.
    pub kms_region: Option<String>,
    pub consul: ConsulOptions,
    pub client: ClientOptions,
    pub options: SaveOptions,
}

#[derive(Debug, Clone)]
pub struct RestoreConfig {
    pub s3: S3Options,
    pub kms_region: Option<String>,
    pub consul: ConsulOptions,
    pub client: ClientOptions,
    pub options: RestoreOptions,
}

/// Empty flag values count as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(flag: &str, value: String) -> Result<String, SnapshotError> {
    if value.trim().is_empty() {
        return Err(SnapshotError::Configuration(format!("--{} must not be empty", flag)));
    }
    Ok(value)
}

fn require_set(flag: &str, value: Option<String>) -> Result<String, SnapshotError> {
    match value {
        Some(value) => require(flag, value),
        None => Err(SnapshotError::Configuration(format!("--{} is required", flag))),
    }
}

struct Common {
    s3: S3Options,
    kms_region: Option<String>,
    consul: ConsulOptions,
    client: ClientOptions,
}

fn resolve_common(args: CommonArgs, stale: bool) -> Result<Common, SnapshotError> {
    if args.request_timeout_secs == 0 {
        return Err(SnapshotError::Configuration(
            "--request-timeout-secs must be at least 1".to_string(),
        ));
    }
    Ok(Common {
        s3: S3Options {
            bucket: require_set("s3-bucket", args.s3_bucket)?,
            region: require_set("s3-region", args.s3_region)?,
        },
        kms_region: non_empty(args.kms_region),
        consul: ConsulOptions {
            address: require("consul-addr", args.consul_addr)?,
            token: non_empty(args.consul_token),
            datacenter: non_empty(args.consul_datacenter),
            use_tls: args.consul_ssl,
            stale,
        },
        client: ClientOptions {
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            max_attempts: args.max_attempts.max(1),
        },
    })
}

impl SaveConfig {
    pub fn resolve(common: CommonArgs, args: SaveArgs) -> Result<Self, SnapshotError> {
        let common = resolve_common(common, args.consul_stale)?;
        Ok(Self {
            s3: common.s3,
            kms_region: common.kms_region,
            consul: common.consul,
            client: common.client,
            options: SaveOptions {
                prefix: args.s3_prefix,
                key_id: non_empty(args.kms_key_arn),
                key_spec: args.kms_data_key_spec.into(),
            },
        })
    }
}

impl RestoreConfig {
    pub fn resolve(common: CommonArgs, args: RestoreArgs) -> Result<Self, SnapshotError> {
        let common = resolve_common(common, false)?;
        Ok(Self {
            s3: common.s3,
            kms_region: common.kms_region,
            consul: common.consul,
            client: common.client,
            options: RestoreOptions {
                path: require("s3-path", args.s3_path)?,
                staging_dir: args.staging_dir,
            },
        })
    }
}
