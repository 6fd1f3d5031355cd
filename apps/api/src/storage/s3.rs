use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use crate::storage::{validate_path, DocumentStorage};

/// Object storage backend. Storage paths map one-to-one onto object keys.
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl DocumentStorage for S3Storage {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        validate_path(path)?;
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Ok(None);
                }
                return Err(anyhow!("S3 download failed: {service_error}"));
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("S3 body read failed: {e}"))?;
        Ok(Some(body.into_bytes().to_vec()))
    }

    async fn save(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        validate_path(path)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;
        Ok(())
    }
}
