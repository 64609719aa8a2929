use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct BucketStatus {
    pub name: String,
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when the database and both buckets are reachable, "degraded" otherwise
    pub status: String,
    pub database: String,
    pub songs_bucket: BucketStatus,
    pub images_bucket: BucketStatus,
    pub version: String,
}

async fn bucket_status(state: &AppState, bucket: &str) -> BucketStatus {
    let status = match state.storage.check_bucket(bucket).await {
        Ok(()) => "ready",
        Err(e) => {
            tracing::warn!("⚠️ Health check: {}", e);
            "unavailable"
        }
    };
    BucketStatus {
        name: bucket.to_string(),
        status: status.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database and both buckets reachable", body = HealthResponse),
        (status = 503, description = "A dependency is unreachable", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.db.ping().await.is_ok();
    let songs_bucket = bucket_status(&state, &state.config.songs_bucket).await;
    let images_bucket = bucket_status(&state, &state.config.images_bucket).await;

    let healthy = db_ok && songs_bucket.status == "ready" && images_bucket.status == "ready";
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            database: if db_ok { "connected" } else { "disconnected" }.to_string(),
            songs_bucket,
            images_bucket,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
