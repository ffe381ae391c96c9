//! Lifecycle Store: durable record of every request's status, progress and result.
//!
//! The store is the only state shared between processing runs. Every write that
//! ends or advances a run is conditional on the status (and run number) the
//! writer expects, so concurrent completion and cancellation cannot clobber
//! each other.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::search_request::{RequestStatus, SearchRequest, Transition};

pub mod memory;
pub mod pg;

pub use memory::InMemoryRequestStore;
pub use pg::PgRequestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Search request {0} already exists")]
    Duplicate(Uuid),

    #[error("Corrupt search request {id}: {reason}")]
    CorruptRecord { id: Uuid, reason: String },
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn create(&self, request: &SearchRequest) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<SearchRequest>, StoreError>;

    /// Applies `transition` only if the record's status is one of `expected`
    /// and, when given, its attempt equals `attempt`. Returns the updated
    /// record, or `None` when the guard did not match.
    async fn transition(
        &self,
        id: Uuid,
        expected: &[RequestStatus],
        attempt: Option<i32>,
        transition: &Transition,
    ) -> Result<Option<SearchRequest>, StoreError>;

    /// Records progress for run `attempt`. Ignored unless the request is still
    /// processing that run and `progress` does not go backwards.
    async fn set_progress(
        &self,
        id: Uuid,
        attempt: i32,
        progress: u8,
    ) -> Result<Option<SearchRequest>, StoreError>;
}
