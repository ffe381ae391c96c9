use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and which backends this instance runs with.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "searchgen",
        "store": if config.database_url.is_some() { "postgres" } else { "memory" },
        "generation": if config.anthropic_api_key.is_some() { "model" } else { "fallback" },
    }))
}
