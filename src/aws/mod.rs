//! AWS adapters: KMS for data keys, S3 for snapshot objects.

mod kms;
mod s3;

pub use kms::KmsKeyService;
pub use s3::S3BlobStore;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::config::ClientOptions;

/// Load shared SDK config for `region`.
///
/// Credentials come from the default provider chain (environment, profile,
/// instance/task role). Retries use the SDK's standard mode, which already
/// restricts itself to transient failures.
pub async fn load_sdk_config(region: &str, client: &ClientOptions) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .retry_config(RetryConfig::standard().with_max_attempts(client.max_attempts))
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(client.request_timeout)
                .build(),
        )
        .load()
        .await
}
