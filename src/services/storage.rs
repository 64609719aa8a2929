use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object already exists: {bucket}/{key}")]
    AlreadyExists { bucket: String, key: String },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Bucket unavailable: {0}")]
    BucketUnavailable(String),
}

/// Per-object write policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Freshness window in seconds, e.g. "3600"
    pub cache_control: String,
    /// Replace an existing object at the same key instead of failing
    pub upsert: bool,
    pub content_type: String,
}

/// Result of a successful write. `path` is the store's canonical path of the
/// object inside its bucket and may differ from the requested key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError>;

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError>;

    /// Succeeds when `bucket` exists and is reachable.
    async fn check_bucket(&self, bucket: &str) -> Result<(), StorageError>;
}

/// S3-compatible object store. Each logical bucket maps to the S3 bucket of
/// the same name.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError> {
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(&options.content_type)
            .cache_control(format!("max-age={}", options.cache_control))
            .body(ByteStream::from(data));

        if !options.upsert {
            request = request.if_none_match("*");
        }

        match request.send().await {
            Ok(_) => Ok(StoredObject {
                path: key.to_string(),
            }),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.code() == Some("PreconditionFailed") {
                    return Err(StorageError::AlreadyExists {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }
                tracing::error!(
                    "S3 put_object failed: bucket={}, key={}, error={:?}",
                    bucket,
                    key,
                    service_error
                );
                Err(StorageError::UploadFailed(service_error.to_string()))
            }
        }
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.into_service_error().to_string()))?;
        Ok(())
    }

    async fn check_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::BucketUnavailable(format!("{}: {}", bucket, e.into_service_error()))
            })?;
        Ok(())
    }
}
