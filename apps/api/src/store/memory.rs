use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::search_request::{RequestStatus, SearchRequest, Transition};
use crate::store::{RequestStore, StoreError};

/// Process-local store used when no database is configured, and in tests.
/// The write lock makes each conditional transition atomic.
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<Uuid, SearchRequest>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn create(&self, request: &SearchRequest) -> Result<(), StoreError> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id) {
            return Err(StoreError::Duplicate(request.id));
        }
        requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SearchRequest>, StoreError> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: &[RequestStatus],
        attempt: Option<i32>,
        transition: &Transition,
    ) -> Result<Option<SearchRequest>, StoreError> {
        let mut requests = self.requests.write().await;
        let Some(request) = requests.get_mut(&id) else {
            return Ok(None);
        };

        let status_matches = expected.contains(&request.status);
        let attempt_matches = attempt.map_or(true, |a| a == request.attempt);
        if !status_matches || !attempt_matches {
            return Ok(None);
        }

        request.apply(transition);
        Ok(Some(request.clone()))
    }

    async fn set_progress(
        &self,
        id: Uuid,
        attempt: i32,
        progress: u8,
    ) -> Result<Option<SearchRequest>, StoreError> {
        let progress = progress.min(100);
        let mut requests = self.requests.write().await;
        let Some(request) = requests.get_mut(&id) else {
            return Ok(None);
        };

        if request.status != RequestStatus::Processing
            || request.attempt != attempt
            || request.progress > progress
        {
            return Ok(None);
        }

        request.progress = progress;
        request.updated_at = Utc::now();
        Ok(Some(request.clone()))
    }
}
