//! Configuration gates fire before any remote call. The consul address points
//! at a closed port, so reaching the store would fail with a different error.

use std::path::PathBuf;
use std::time::Duration;

use consul_s3_snapshot::app::{diagnostic, run_restore, run_save};
use consul_s3_snapshot::config::{
    ClientOptions, ConsulOptions, RestoreConfig, S3Options, SaveConfig,
};
use snapshot_core::{DataKeySpec, RestoreOptions, SaveOptions, SnapshotError};

fn offline() -> (S3Options, ConsulOptions, ClientOptions) {
    (
        S3Options {
            bucket: "backups".to_string(),
            region: "eu-west-1".to_string(),
        },
        ConsulOptions {
            address: "127.0.0.1:1".to_string(),
            ..ConsulOptions::default()
        },
        ClientOptions {
            request_timeout: Duration::from_secs(1),
            max_attempts: 1,
        },
    )
}

#[tokio::test]
async fn save_with_key_but_no_kms_region_is_a_configuration_error() {
    let (s3, consul, client) = offline();
    let config = SaveConfig {
        s3,
        kms_region: None,
        consul,
        client,
        options: SaveOptions {
            prefix: "consul/".to_string(),
            key_id: Some("arn:aws:kms:eu-west-1:111122223333:key/abc".to_string()),
            key_spec: DataKeySpec::Aes256,
        },
    };

    let err = run_save(&config).await.unwrap_err();
    assert!(matches!(err, SnapshotError::Configuration(_)), "{}", err);
}

#[tokio::test]
async fn restore_encrypted_without_kms_region_is_a_configuration_error() {
    let staging = tempfile::tempdir().unwrap();
    let (s3, consul, client) = offline();
    let config = RestoreConfig {
        s3,
        kms_region: None,
        consul,
        client,
        options: RestoreOptions {
            path: "consul/42-20240101-120000.enc".to_string(),
            staging_dir: PathBuf::from(staging.path()),
        },
    };

    let err = run_restore(&config).await.unwrap_err();
    assert!(matches!(err, SnapshotError::Configuration(_)), "{}", err);
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn save_reports_unreachable_consul_as_store_error() {
    let (s3, consul, client) = offline();
    let config = SaveConfig {
        s3,
        kms_region: None,
        consul,
        client,
        options: SaveOptions {
            prefix: "consul/".to_string(),
            ..SaveOptions::default()
        },
    };

    let err = run_save(&config).await.unwrap_err();
    assert!(matches!(err, SnapshotError::Store(_)), "{}", err);
    assert_eq!(err.stage(), "snapshot store");

    let line = diagnostic(&err);
    assert!(line.starts_with("error: snapshot store failed: "), "{}", line);
    assert!(!line.contains('\n'), "{}", line);
}
