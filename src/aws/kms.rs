use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::DataKeySpec as KmsDataKeySpec;
use aws_sdk_kms::Client;
use snapshot_core::{DataKey, DataKeySpec, KeyService, ServiceError};
use tracing::debug;
use zeroize::Zeroizing;

/// AWS KMS as the data-key service.
#[derive(Debug, Clone)]
pub struct KmsKeyService {
    client: Client,
}

impl KmsKeyService {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn kms_key_spec(spec: DataKeySpec) -> KmsDataKeySpec {
    match spec {
        DataKeySpec::Aes128 => KmsDataKeySpec::Aes128,
        DataKeySpec::Aes256 => KmsDataKeySpec::Aes256,
    }
}

#[async_trait]
impl KeyService for KmsKeyService {
    async fn generate_data_key(
        &self,
        key_id: &str,
        spec: DataKeySpec,
    ) -> Result<DataKey, ServiceError> {
        debug!(key_id, %spec, "GenerateDataKey");
        let output = self
            .client
            .generate_data_key()
            .key_id(key_id)
            .key_spec(kms_key_spec(spec))
            .send()
            .await
            .map_err(|e| ServiceError::new(format!("GenerateDataKey: {}", DisplayErrorContext(&e))))?;

        let plaintext = output
            .plaintext()
            .ok_or_else(|| ServiceError::new("GenerateDataKey returned no plaintext key"))?;
        let wrapped = output
            .ciphertext_blob()
            .ok_or_else(|| ServiceError::new("GenerateDataKey returned no ciphertext blob"))?;

        Ok(DataKey {
            plaintext: Zeroizing::new(plaintext.as_ref().to_vec()),
            wrapped: wrapped.as_ref().to_vec(),
        })
    }

    async fn unwrap_key(&self, wrapped_key: &[u8]) -> Result<Zeroizing<Vec<u8>>, ServiceError> {
        debug!(len = wrapped_key.len(), "Decrypt");
        let output = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(wrapped_key.to_vec()))
            .send()
            .await
            .map_err(|e| ServiceError::new(format!("Decrypt: {}", DisplayErrorContext(&e))))?;

        let plaintext = output
            .plaintext()
            .ok_or_else(|| ServiceError::new("Decrypt returned no plaintext key"))?;
        Ok(Zeroizing::new(plaintext.as_ref().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_spec_mapping() {
        assert_eq!(kms_key_spec(DataKeySpec::Aes128), KmsDataKeySpec::Aes128);
        assert_eq!(kms_key_spec(DataKeySpec::Aes256), KmsDataKeySpec::Aes256);
        assert_eq!(kms_key_spec(DataKeySpec::default()).as_str(), "AES_256");
    }
}
