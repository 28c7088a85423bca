pub mod health;
pub mod photos;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use vanish_vault::SecretStore;

use crate::config::UploadConfig;

/// Headroom above the file size limit for multipart framing and text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The one-time photo protocol.
    pub vault: Arc<SecretStore>,
    /// Limits checked on upload before the vault sees the payload.
    pub upload: Arc<UploadConfig>,
}

/// Build the axum router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .upload
        .max_file_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health))
        .route("/photos/upload", post(photos::upload))
        .route(
            "/photos/receipt/{receipt_id}/status",
            get(photos::receipt_status),
        )
        .route("/photos/{id}", get(photos::fetch).delete(photos::burn))
        .route("/photos/{id}/status", get(photos::status))
        .route("/photos/{id}/unlock", post(photos::unlock))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
