//! consul-s3-snapshot: save consul snapshots to S3 and restore them, with
//! optional KMS envelope encryption.
//!
//! The pipelines and the payload format live in `snapshot-core`; this crate
//! supplies the command line and the consul, S3 and KMS adapters.

pub mod app;
pub mod aws;
pub mod cli;
pub mod config;
pub mod consul;
pub mod logging;
