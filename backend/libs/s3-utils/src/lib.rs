/// Shared S3 utilities
///
/// Provides the S3 client wrapper, configuration and the handful of object
/// operations the services need. Works against AWS S3 and S3-compatible
/// stores such as MinIO (set an endpoint and path-style addressing).
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use std::sync::Arc;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::S3Operations;

/// Boxed error returned by every S3 helper
pub type S3Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Create new S3 client with custom configuration
    ///
    /// Credentials come from the standard AWS provider chain. When
    /// `config.endpoint` is set the client talks to that endpoint instead of
    /// AWS, which is how MinIO deployments are reached.
    pub async fn with_config(config: S3Config) -> Result<Self, S3Error> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::debug!(bucket = %config.bucket, endpoint = ?config.endpoint, "s3 client configured");

        Ok(Self {
            client: Arc::new(Client::from_conf(builder.build())),
            config,
        })
    }

    /// Object operations bound to the configured bucket
    pub fn operations(&self) -> S3Operations {
        S3Operations::new(self.client.clone(), self.config.clone())
    }
}
