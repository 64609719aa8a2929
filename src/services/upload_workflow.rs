use crate::config::UploadConfig;
use crate::entities::songs;
use crate::models::{FileUpload, NewSong, SessionUser, UploadForm};
use crate::services::keys::{KeyGenerator, ObjectKeys};
use crate::services::song_table::SongTable;
use crate::services::storage::{ObjectStore, StorageError, UploadOptions};
use crate::utils::validation::{ValidationError, validate_image_file, validate_song_file};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use validator::Validate;

/// Progress of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Idle,
    Validating,
    UploadingSong,
    UploadingImage,
    Inserting,
    Success,
    Failed,
}

/// Why a submission attempt ended without a song record.
///
/// `Display` is the user-facing message. Upload variants keep the transport
/// error as their source for logs but never show it.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Missing Fields")]
    MissingFields,

    #[error("{}", .0.message)]
    RejectedFile(ValidationError),

    #[error("Failed Song Upload.")]
    SongUpload(#[source] StorageError),

    #[error("Failed image Upload.")]
    ImageUpload(#[source] StorageError),

    #[error("{0}")]
    Insert(String),

    #[error("Something Went Wrong")]
    Unexpected(String),
}

/// Validates the form, uploads the song then the image, then inserts the
/// metadata record. Each step runs only after the previous one succeeded.
///
/// Objects uploaded before a later failure are left in place unless
/// `cleanup_orphans` is set, in which case deletion is attempted once and
/// failures are only logged.
pub struct UploadWorkflow {
    storage: Arc<dyn ObjectStore>,
    table: Arc<dyn SongTable>,
    keys: Arc<dyn KeyGenerator>,
    config: UploadConfig,
}

impl UploadWorkflow {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        table: Arc<dyn SongTable>,
        keys: Arc<dyn KeyGenerator>,
        config: UploadConfig,
    ) -> Self {
        Self {
            storage,
            table,
            keys,
            config,
        }
    }

    pub async fn submit(
        &self,
        form: &UploadForm,
        user: Option<&SessionUser>,
    ) -> Result<songs::Model, UploadError> {
        let (stage, _) = watch::channel(UploadStage::Idle);
        self.submit_with_progress(form, user, &stage).await
    }

    /// Same as [`submit`](Self::submit), publishing each stage transition.
    pub async fn submit_with_progress(
        &self,
        form: &UploadForm,
        user: Option<&SessionUser>,
        stage: &watch::Sender<UploadStage>,
    ) -> Result<songs::Model, UploadError> {
        let result = self.run(form, user, stage).await;
        stage.send_replace(match &result {
            Ok(_) => UploadStage::Success,
            Err(_) => UploadStage::Failed,
        });
        result
    }

    async fn run(
        &self,
        form: &UploadForm,
        user: Option<&SessionUser>,
        stage: &watch::Sender<UploadStage>,
    ) -> Result<songs::Model, UploadError> {
        stage.send_replace(UploadStage::Validating);

        let (song, image, user) = match (form.song.as_ref(), form.image.as_ref(), user) {
            (Some(song), Some(image), Some(user)) if form.validate().is_ok() => (song, image, user),
            _ => {
                warn!(
                    "Upload rejected: song={}, image={}, user={}, fields_ok={}",
                    form.song.is_some(),
                    form.image.is_some(),
                    user.is_some(),
                    form.validate().is_ok()
                );
                return Err(UploadError::MissingFields);
            }
        };

        validate_song_file(song, self.config.max_file_size).map_err(UploadError::RejectedFile)?;
        validate_image_file(image, self.config.max_file_size)
            .map_err(UploadError::RejectedFile)?;

        let keys = ObjectKeys::new(&form.title, &self.keys.next_key());

        stage.send_replace(UploadStage::UploadingSong);
        let song_object = self
            .storage
            .upload(
                &self.config.songs_bucket,
                &keys.song,
                song.data.clone(),
                &self.options_for(song),
            )
            .await
            .map_err(|e| {
                error!("❌ Song upload failed for key {}: {}", keys.song, e);
                UploadError::SongUpload(e)
            })?;

        stage.send_replace(UploadStage::UploadingImage);
        let image_object = match self
            .storage
            .upload(
                &self.config.images_bucket,
                &keys.image,
                image.data.clone(),
                &self.options_for(image),
            )
            .await
        {
            Ok(object) => object,
            Err(e) => {
                error!("❌ Image upload failed for key {}: {}", keys.image, e);
                self.discard_orphans(&[(&self.config.songs_bucket, &song_object.path)])
                    .await;
                return Err(UploadError::ImageUpload(e));
            }
        };

        stage.send_replace(UploadStage::Inserting);
        let record = NewSong {
            user_id: user.id.clone(),
            title: form.title.clone(),
            author: form.author.clone(),
            song_path: song_object.path.clone(),
            image_path: image_object.path.clone(),
        };

        match self.table.insert(record).await {
            Ok(saved) => {
                info!(
                    "✅ Song {} added for user {} (song={}, image={})",
                    saved.id, saved.user_id, saved.song_path, saved.image_path
                );
                Ok(saved)
            }
            Err(e) => {
                error!("❌ Song insert failed: {}", e.message);
                self.discard_orphans(&[
                    (&self.config.songs_bucket, &song_object.path),
                    (&self.config.images_bucket, &image_object.path),
                ])
                .await;
                Err(UploadError::Insert(e.message))
            }
        }
    }

    fn options_for(&self, file: &FileUpload) -> UploadOptions {
        UploadOptions {
            cache_control: self.config.cache_control.clone(),
            upsert: false,
            content_type: file.resolved_content_type(),
        }
    }

    async fn discard_orphans(&self, objects: &[(&String, &String)]) {
        if !self.config.cleanup_orphans {
            for (bucket, path) in objects {
                warn!("⚠️ Leaving orphaned object {}/{}", bucket, path);
            }
            return;
        }

        for (bucket, path) in objects {
            match self.storage.delete(bucket, path).await {
                Ok(()) => info!("🧹 Removed orphaned object {}/{}", bucket, path),
                Err(e) => warn!("⚠️ Could not remove orphaned object {}/{}: {}", bucket, path, e),
            }
        }
    }
}
