use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A single file picked in the form.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// Declared MIME type, else sniffed from the leading bytes, else octet-stream.
    pub fn resolved_content_type(&self) -> String {
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .map(str::to_string)
            .or_else(|| infer::get(&self.data).map(|kind| kind.mime_type().to_string()))
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Form state of the upload modal. `Default` is the empty form.
#[derive(Debug, Clone, Default, Validate)]
pub struct UploadForm {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub author: String,
    pub song: Option<FileUpload>,
    pub image: Option<FileUpload>,
}

impl UploadForm {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.author.is_empty() && self.song.is_none() && self.image.is_none()
    }
}

/// The authenticated user as seen by the upload workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
}

impl SessionUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Record handed to the metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub song_path: String,
    pub image_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}
