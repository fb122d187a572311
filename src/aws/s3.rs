use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use snapshot_core::{BlobStore, ServiceError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// One S3 bucket as the snapshot blob store.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(config: &SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: Client::new(config),
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), ServiceError> {
        let len = body.len();
        debug!(bucket = %self.bucket, key, len, "PutObject");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(len as i64)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| ServiceError::new(format!("PutObject {}: {}", self.location(key), DisplayErrorContext(&e))))?;
        Ok(())
    }

    async fn get(
        &self,
        key: &str,
        dest: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ServiceError> {
        debug!(bucket = %self.bucket, key, "GetObject");
        let mut output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ServiceError::new(format!("GetObject {}: {}", self.location(key), DisplayErrorContext(&e))))?;

        let mut written = 0u64;
        while let Some(chunk) = output
            .body
            .try_next()
            .await
            .map_err(|e| ServiceError::new(format!("GetObject {} body: {}", self.location(key), e)))?
        {
            dest.write_all(&chunk)
                .await
                .map_err(|e| ServiceError::new(format!("writing {}: {}", key, e)))?;
            written += chunk.len() as u64;
        }
        dest.flush()
            .await
            .map_err(|e| ServiceError::new(format!("writing {}: {}", key, e)))?;
        Ok(written)
    }

    fn location(&self, key: &str) -> String {
        format!("{}/{}", self.bucket, key)
    }
}
