//! Axum route handlers for the Search Request API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::search_request::{InputSource, QueryType, RequestSource, SearchRequestView};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Enum fields arrive as plain strings so unknown values become a 400 with
/// our error body rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateSearchRequest {
    pub query_type: String,
    pub input_source: String,
    pub input_text: Option<String>,
    pub input_url: Option<String>,
    pub document_reference: Option<String>,
}

impl CreateSearchRequest {
    fn validate(&self) -> Result<(QueryType, RequestSource), AppError> {
        let query_type: QueryType = self.query_type.parse()?;
        let input_source: InputSource = self.input_source.parse()?;
        let source = RequestSource::from_parts(
            input_source,
            self.input_text.as_deref(),
            self.input_url.as_deref(),
            self.document_reference.as_deref(),
        )?;
        Ok((query_type, source))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/search-requests
///
/// Stores the request and starts generation in the background.
/// Returns 202 with the request already in `processing`.
pub async fn handle_create(
    State(state): State<AppState>,
    Json(body): Json<CreateSearchRequest>,
) -> Result<(StatusCode, Json<SearchRequestView>), AppError> {
    let (query_type, source) = body.validate()?;
    let request = state.orchestrator.create(query_type, source).await?;
    Ok((StatusCode::ACCEPTED, Json(SearchRequestView::from(&request))))
}

/// GET /api/v1/search-requests/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SearchRequestView>, AppError> {
    let request = state.orchestrator.get(id).await?;
    Ok(Json(SearchRequestView::from(&request)))
}

/// POST /api/v1/search-requests/:id/retry
///
/// 409 unless failed, canceled or completed; 410 when the document is gone.
pub async fn handle_retry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SearchRequestView>), AppError> {
    let request = state.orchestrator.retry(id).await?;
    Ok((StatusCode::ACCEPTED, Json(SearchRequestView::from(&request))))
}

/// POST /api/v1/search-requests/:id/cancel
///
/// Idempotent: an already-terminal request is returned as is.
pub async fn handle_cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SearchRequestView>, AppError> {
    let request = state.orchestrator.cancel(id).await?;
    Ok(Json(SearchRequestView::from(&request)))
}
