use crate::AppState;
use crate::utils::auth::validate_jwt;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct SessionQuery {
    token: Option<String>,
}

/// Attaches the session claims when the request carries a valid token.
/// Requests without one pass through anonymously; handlers decide what a
/// missing session means.
pub async fn session_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| {
            let query = req.uri().query().unwrap_or_default();
            serde_urlencoded::from_str::<SessionQuery>(query)
                .ok()
                .and_then(|q| q.token)
        });

    if let Some(token) = token {
        match validate_jwt(&token, &state.config.jwt_secret) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(e) => tracing::debug!("Ignoring invalid session token: {}", e),
        }
    }

    next.run(req).await
}
