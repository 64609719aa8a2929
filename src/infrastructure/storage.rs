use crate::config::UploadConfig;
use crate::services::storage::S3ObjectStore;
use anyhow::Context;
use aws_sdk_s3::config::Region;
use std::env;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &UploadConfig) -> anyhow::Result<Arc<S3ObjectStore>> {
    let endpoint_url = env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?;
    let access_key = env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?;
    let secret_key = env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?;
    let region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());

    info!(
        "☁️  S3 Storage: {} (Buckets: {}, {})",
        endpoint_url, config.songs_bucket, config.images_bucket
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&endpoint_url)
        .region(Region::new(region))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key, secret_key, None, None, "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    for bucket in [&config.songs_bucket, &config.images_bucket] {
        match s3_client.head_bucket().bucket(bucket).send().await {
            Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
            Err(_) => {
                info!("🪣 Bucket '{}' not found, creating...", bucket);
                if let Err(e) = s3_client.create_bucket().bucket(bucket).send().await {
                    tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
                } else {
                    info!("✅ Bucket '{}' created successfully", bucket);
                }
            }
        }
    }

    Ok(Arc::new(S3ObjectStore::new(s3_client)))
}
