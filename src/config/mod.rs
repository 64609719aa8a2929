use std::env;

/// Upload workflow configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Bucket receiving song files (default: "songs")
    pub songs_bucket: String,

    /// Bucket receiving cover images (default: "images")
    pub images_bucket: String,

    /// Cache-Control freshness window in seconds, sent as a string (default: "3600")
    pub cache_control: String,

    /// Delete already-uploaded objects when a later step fails (default: false)
    pub cleanup_orphans: bool,

    /// Maximum accepted size per uploaded file in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// JWT secret used to validate session tokens
    pub jwt_secret: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            songs_bucket: "songs".to_string(),
            images_bucket: "images".to_string(),
            cache_control: "3600".to_string(),
            cleanup_orphans: false,
            max_file_size: 50 * 1024 * 1024, // 50 MB
            jwt_secret: "secret".to_string(),
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            songs_bucket: env::var("SONGS_BUCKET").unwrap_or(default.songs_bucket),

            images_bucket: env::var("IMAGES_BUCKET").unwrap_or(default.images_bucket),

            cache_control: env::var("CACHE_CONTROL_SECS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .map(|secs| secs.to_string())
                .unwrap_or(default.cache_control),

            cleanup_orphans: env::var("CLEANUP_ORPHANS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.cleanup_orphans),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),
        }
    }
}
