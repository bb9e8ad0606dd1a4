//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for image upload and deletion
//! - JSON error responses

pub mod error;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use inkpot_core::storage::{BYTES_PER_MB, UploadGateway};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Image upload gateway.
    pub gateway: Arc<UploadGateway>,
}

/// Request body limit for a given file size limit.
///
/// Leaves room for files up to twice the limit so they reach the gateway and
/// get a descriptive size error instead of a bare 413.
#[must_use]
pub fn upload_body_limit(max_size_bytes: u64) -> usize {
    let limit = max_size_bytes.saturating_mul(2).saturating_add(BYTES_PER_MB);
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = upload_body_limit(state.gateway.policy().max_size_bytes());

    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
