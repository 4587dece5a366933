/// S3 object operations
use crate::config::S3Config;
use crate::S3Error;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Check whether the configured bucket exists
    pub async fn bucket_exists(&self) -> Result<bool, S3Error> {
        match self
            .client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().map(|se| se.is_not_found()).unwrap_or(false) {
                    Ok(false)
                } else {
                    Err(Box::new(e))
                }
            }
        }
    }

    /// Create the configured bucket
    pub async fn create_bucket(&self) -> Result<(), S3Error> {
        self.client
            .create_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await?;

        tracing::info!(bucket = %self.config.bucket, "created bucket");
        Ok(())
    }

    /// Upload bytes under `key` and return the public URL
    pub async fn upload_file(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, S3Error> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await?;

        Ok(self.config.object_url(key))
    }
}
