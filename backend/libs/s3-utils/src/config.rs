/// S3 configuration shared across services
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name
    pub bucket: String,
    /// AWS region (MinIO ignores it but the SDK requires one)
    pub region: String,
    /// Custom endpoint, e.g. `http://localhost:9002` for MinIO
    pub endpoint: Option<String>,
    /// Base URL clients use to retrieve objects
    pub public_base_url: String,
    /// Whether to use path-style URLs (false = virtual-hosted-style)
    pub path_style: bool,
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        let endpoint = std::env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty());
        let public_base_url = std::env::var("S3_PUBLIC_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| endpoint.clone())
            .unwrap_or_else(|| "https://s3.amazonaws.com".to_string());

        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "ticket-files".to_string()),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint,
            public_base_url,
            path_style: std::env::var("S3_PATH_STYLE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    /// Build the public retrieval URL for an object key.
    ///
    /// The key is used verbatim; callers encode it first.
    pub fn object_url(&self, key: &str) -> String {
        let base = self.public_base_url.trim_end_matches('/');
        if self.path_style {
            format!("{}/{}/{}", base, self.bucket, key)
        } else {
            format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
        }
    }
}
