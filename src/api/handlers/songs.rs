use crate::AppState;
use crate::api::error::AppError;
use crate::entities::songs;
use crate::models::{FileUpload, UploadForm};
use crate::services::notify::ViewRefresher;
use crate::services::upload_modal::SONG_ADDED;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

/// Multipart body accepted by `POST /songs` (documentation only).
#[derive(ToSchema)]
pub struct SongUploadForm {
    pub title: String,
    pub author: String,
    /// `.mp3` file
    #[schema(value_type = String, format = Binary)]
    pub song: Vec<u8>,
    /// Any `image/*` file
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct SongResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub song_path: String,
    pub image_path: String,
    pub created_at: Option<chrono::DateTime<Utc>>,
}

impl From<songs::Model> for SongResponse {
    fn from(song: songs::Model) -> Self {
        Self {
            id: song.id,
            user_id: song.user_id,
            title: song.title,
            author: song.author,
            song_path: song.song_path,
            image_path: song.image_path,
            created_at: song.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SongUploadResponse {
    pub message: String,
    pub song: SongResponse,
}

fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

#[utoipa::path(
    post,
    path = "/songs",
    request_body(content = SongUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Song uploaded and recorded", body = SongUploadResponse),
        (status = 400, description = "Missing fields or unsupported file"),
        (status = 502, description = "Object storage rejected an upload"),
        (status = 500, description = "Metadata insert failed")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "songs"
)]
pub async fn upload_song(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SongUploadResponse>), AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "title" => form.title = field.text().await.map_err(multipart_error)?,
            "author" => form.author = field.text().await.map_err(multipart_error)?,
            "song" | "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(multipart_error)?;

                // An untouched file input is submitted as an empty, unnamed part.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }

                let file = FileUpload::new(file_name, content_type, data);
                if name == "song" {
                    form.song = Some(file);
                } else {
                    form.image = Some(file);
                }
            }
            other => tracing::debug!("Ignoring unknown form field '{}'", other),
        }
    }

    let user = claims.map(|Extension(claims)| claims.session_user());
    let song = state.workflow.submit(&form, user.as_ref()).await?;

    if let Some(user) = &user {
        state.song_cache.refresh(user);
    }

    Ok((
        StatusCode::CREATED,
        Json(SongUploadResponse {
            message: SONG_ADDED.to_string(),
            song: song.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/songs",
    responses(
        (status = 200, description = "Songs uploaded by the caller", body = Vec<SongResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "songs"
)]
pub async fn list_songs(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
) -> Result<Json<Vec<SongResponse>>, AppError> {
    let Some(Extension(claims)) = claims else {
        return Err(AppError::Unauthorized("Sign in to see your songs".to_string()));
    };

    let songs = state.song_cache.songs_for(&claims.session_user()).await?;
    Ok(Json(
        songs.iter().cloned().map(SongResponse::from).collect(),
    ))
}
