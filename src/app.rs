//! Wires the production adapters into the save and restore pipelines.

use chrono::Local;
use snapshot_core::{
    restore, save, KeyService, RestoreReport, SaveReport, SnapshotError,
};
use tracing::info;

use crate::aws::{load_sdk_config, KmsKeyService, S3BlobStore};
use crate::cli::{Cli, Command};
use crate::config::{ClientOptions, ConsulOptions, RestoreConfig, SaveConfig};
use crate::consul::ConsulSnapshotStore;

/// Run the parsed command. The final location goes to stdout.
pub async fn run(cli: Cli) -> Result<(), SnapshotError> {
    match cli.command {
        Command::Save(args) => {
            let config = SaveConfig::resolve(cli.common, args)?;
            let report = run_save(&config).await?;
            println!("Uploaded to {}", report.location);
        }
        Command::Restore(args) => {
            let config = RestoreConfig::resolve(cli.common, args)?;
            let report = run_restore(&config).await?;
            println!("Restored from {}", report.location);
        }
    }
    Ok(())
}

/// One-line operator diagnostic for a failed run.
pub fn diagnostic(err: &SnapshotError) -> String {
    format!("error: {} failed: {}", err.stage(), err)
}

fn consul_store(
    consul: &ConsulOptions,
    client: &ClientOptions,
) -> Result<ConsulSnapshotStore, SnapshotError> {
    ConsulSnapshotStore::new(consul, client)
        .map_err(|e| SnapshotError::Configuration(e.message))
}

async fn key_service(
    kms_region: Option<&str>,
    client: &ClientOptions,
) -> Option<KmsKeyService> {
    match kms_region {
        Some(region) => Some(KmsKeyService::new(&load_sdk_config(region, client).await)),
        None => None,
    }
}

pub async fn run_save(config: &SaveConfig) -> Result<SaveReport, SnapshotError> {
    let store = consul_store(&config.consul, &config.client)?;
    let s3_config = load_sdk_config(&config.s3.region, &config.client).await;
    let blobs = S3BlobStore::new(&s3_config, config.s3.bucket.as_str());
    let kms = key_service(config.kms_region.as_deref(), &config.client).await;

    info!(bucket = %config.s3.bucket, prefix = %config.options.prefix, "saving snapshot");
    save(
        &store,
        &blobs,
        kms.as_ref().map(|k| k as &dyn KeyService),
        &config.options,
        Local::now().naive_local(),
    )
    .await
}

pub async fn run_restore(config: &RestoreConfig) -> Result<RestoreReport, SnapshotError> {
    let store = consul_store(&config.consul, &config.client)?;
    let s3_config = load_sdk_config(&config.s3.region, &config.client).await;
    let blobs = S3BlobStore::new(&s3_config, config.s3.bucket.as_str());
    let kms = key_service(config.kms_region.as_deref(), &config.client).await;

    info!(bucket = %config.s3.bucket, path = %config.options.path, "restoring snapshot");
    restore(
        &store,
        &blobs,
        kms.as_ref().map(|k| k as &dyn KeyService),
        &config.options,
    )
    .await
}
