use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::search_request::{
    RequestStatus, SearchRequest, SearchRequestRow, Transition,
};
use crate::store::{RequestStore, StoreError};

/// Postgres-backed lifecycle store. Conditional transitions are single
/// `UPDATE ... WHERE status = ANY(..) RETURNING *` statements.
#[derive(Clone)]
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_request(row: SearchRequestRow) -> Result<SearchRequest, StoreError> {
    let id = row.id;
    SearchRequest::try_from(row).map_err(|e| StoreError::CorruptRecord {
        id,
        reason: e.to_string(),
    })
}

/// SET clause for a transition and the value bound to `$4`, if it needs one.
/// Mirrors `SearchRequest::apply`.
fn assignments(transition: &Transition) -> (&'static str, Option<&str>) {
    match transition {
        Transition::StartRun => (
            "status = 'processing', progress = 0, generated_query = NULL, \
             error_message = NULL, attempt = attempt + 1",
            None,
        ),
        Transition::Complete { query } => (
            "status = 'completed', progress = 100, generated_query = $4, error_message = NULL",
            Some(query.as_str()),
        ),
        Transition::Fail { message } => (
            "status = 'failed', generated_query = NULL, error_message = $4",
            Some(message.as_str()),
        ),
        Transition::Cancel => (
            "status = 'canceled', generated_query = NULL, error_message = NULL",
            None,
        ),
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn create(&self, request: &SearchRequest) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO search_requests
                (id, query_type, input_source, input_text, input_url, document_reference,
                 generated_query, status, progress, error_message, attempt, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(request.id)
        .bind(request.query_type.as_str())
        .bind(request.input_source().as_str())
        .bind(request.source.input_text())
        .bind(request.source.input_url())
        .bind(request.source.document_reference())
        .bind(request.generated_query.as_deref())
        .bind(request.status.as_str())
        .bind(request.progress as i16)
        .bind(request.error_message.as_deref())
        .bind(request.attempt)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate(request.id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SearchRequest>, StoreError> {
        sqlx::query_as::<_, SearchRequestRow>("SELECT * FROM search_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(into_request)
            .transpose()
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: &[RequestStatus],
        attempt: Option<i32>,
        transition: &Transition,
    ) -> Result<Option<SearchRequest>, StoreError> {
        let (set_clause, value) = assignments(transition);
        let sql = format!(
            "UPDATE search_requests SET {set_clause}, updated_at = now() \
             WHERE id = $1 AND status = ANY($2) AND ($3::INTEGER IS NULL OR attempt = $3) \
             RETURNING *"
        );
        let statuses: Vec<String> = expected.iter().map(|s| s.as_str().to_string()).collect();

        let mut query = sqlx::query_as::<_, SearchRequestRow>(&sql)
            .bind(id)
            .bind(statuses)
            .bind(attempt);
        if let Some(value) = value {
            query = query.bind(value);
        }

        query
            .fetch_optional(&self.pool)
            .await?
            .map(into_request)
            .transpose()
    }

    async fn set_progress(
        &self,
        id: Uuid,
        attempt: i32,
        progress: u8,
    ) -> Result<Option<SearchRequest>, StoreError> {
        sqlx::query_as::<_, SearchRequestRow>(
            r#"
            UPDATE search_requests
            SET progress = $3, updated_at = now()
            WHERE id = $1 AND attempt = $2 AND status = 'processing' AND progress <= $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(attempt)
        .bind(progress.min(100) as i16)
        .fetch_optional(&self.pool)
        .await?
        .map(into_request)
        .transpose()
    }
}
