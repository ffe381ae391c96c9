pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/search-requests", post(handlers::handle_create))
        .route("/api/v1/search-requests/:id", get(handlers::handle_get))
        .route(
            "/api/v1/search-requests/:id/retry",
            post(handlers::handle_retry),
        )
        .route(
            "/api/v1/search-requests/:id/cancel",
            post(handlers::handle_cancel),
        )
        .with_state(state)
}
