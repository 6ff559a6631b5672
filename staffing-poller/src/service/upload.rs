//! Upload service
//!
//! Puts export files into object storage. The object key is decided by the
//! caller; this service only moves bytes.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use staffing_core::domain::export::{ExportArtifact, ObjectKey};
use tracing::info;

use crate::error::RunError;

/// Content type of every export
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Service trait for storing export files
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Uploads `artifact` to `key`
    async fn upload(&self, artifact: &ExportArtifact, key: &ObjectKey) -> Result<(), RunError>;
}

/// S3 implementation of UploadService
pub struct S3UploadService {
    client: aws_sdk_s3::Client,
}

impl S3UploadService {
    /// Creates a client from the default AWS credential chain for `region`
    pub async fn from_env(region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl UploadService for S3UploadService {
    async fn upload(&self, artifact: &ExportArtifact, key: &ObjectKey) -> Result<(), RunError> {
        let upload_error = |message: String| RunError::Upload {
            key: key.to_string(),
            message,
        };

        info!("Uploading {} to {}", artifact.path.display(), key);

        let body = ByteStream::from_path(&artifact.path)
            .await
            .map_err(|e| upload_error(e.to_string()))?;

        self.client
            .put_object()
            .bucket(key.bucket())
            .key(key.key())
            .content_type(CSV_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| upload_error(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
