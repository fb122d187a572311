//! Command-line interface.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use snapshot_core::DataKeySpec;

/// Save and restore consul snapshots to s3.
#[derive(Parser, Debug)]
#[command(name = "consul-s3-snapshot")]
#[command(about = "Save and restore consul snapshots to s3", version)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Snapshot and upload to s3
    Save(SaveArgs),
    /// Restore a snapshot from s3
    Restore(RestoreArgs),
}

/// Flags shared by both subcommands, accepted before or after the
/// subcommand name. Globals cannot be `required`, so the S3 flags are
/// checked when the config is resolved.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// S3 bucket name (required)
    #[arg(long, global = true)]
    pub s3_bucket: Option<String>,

    /// S3 bucket region (required)
    #[arg(long, global = true)]
    pub s3_region: Option<String>,

    /// KMS region
    #[arg(long, global = true)]
    pub kms_region: Option<String>,

    /// Consul HTTP API address, with or without scheme
    #[arg(
        long,
        global = true,
        env = "CONSUL_HTTP_ADDR",
        default_value = "127.0.0.1:8500"
    )]
    pub consul_addr: String,

    /// Consul ACL token
    #[arg(long, global = true, env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    pub consul_token: Option<String>,

    /// Consul datacenter (defaults to the agent's)
    #[arg(long, global = true, env = "CONSUL_DATACENTER")]
    pub consul_datacenter: Option<String>,

    /// Use https when the consul address has no scheme
    #[arg(long, global = true, env = "CONSUL_HTTP_SSL", action = ArgAction::SetTrue)]
    pub consul_ssl: bool,

    /// Per-request timeout for consul and AWS calls, in seconds
    #[arg(long, global = true, default_value_t = 300)]
    pub request_timeout_secs: u64,

    /// Attempts for idempotent remote calls
    #[arg(
        long,
        global = true,
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,
}

#[derive(Args, Debug, Clone)]
pub struct SaveArgs {
    /// S3 bucket prefix
    #[arg(long)]
    pub s3_prefix: String,

    /// KMS key arn
    #[arg(long)]
    pub kms_key_arn: Option<String>,

    /// Size of the KMS data key
    #[arg(long, value_enum, default_value_t = KeySpecArg::Aes256)]
    pub kms_data_key_spec: KeySpecArg,

    /// Let any consul server answer the snapshot request, not just the leader
    #[arg(long)]
    pub consul_stale: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RestoreArgs {
    /// S3 bucket path
    #[arg(long)]
    pub s3_path: String,

    /// Directory for the temporary download
    #[arg(long, default_value = ".")]
    pub staging_dir: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpecArg {
    #[value(name = "aes-128")]
    Aes128,
    #[value(name = "aes-256")]
    Aes256,
}

impl From<KeySpecArg> for DataKeySpec {
    fn from(arg: KeySpecArg) -> Self {
        match arg {
            KeySpecArg::Aes128 => DataKeySpec::Aes128,
            KeySpecArg::Aes256 => DataKeySpec::Aes256,
        }
    }
}
