pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::song_cache::SongListCache;
use crate::services::storage::ObjectStore;
use crate::services::upload_workflow::{UploadError, UploadWorkflow};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::songs::upload_song,
        api::handlers::songs::list_songs,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::songs::SongUploadForm,
            api::handlers::songs::SongUploadResponse,
            api::handlers::songs::SongResponse,
            api::handlers::health::HealthResponse,
            api::handlers::health::BucketStatus,
        )
    ),
    tags(
        (name = "songs", description = "Song upload endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn ObjectStore>,
    pub workflow: Arc<UploadWorkflow>,
    pub song_cache: Arc<SongListCache>,
    pub config: UploadConfig,
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    tracing::error!("💥 Request handler panicked: {}", detail);
    api::error::AppError::Upload(UploadError::Unexpected(detail)).into_response()
}

pub fn create_app(state: AppState) -> Router {
    // Two files plus text fields and multipart overhead.
    let body_limit = state.config.max_file_size * 2 + 1024 * 1024;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/songs",
            get(api::handlers::songs::list_songs)
                .post(api::handlers::songs::upload_song)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::session::session_middleware,
        ))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
        .with_state(state)
}
