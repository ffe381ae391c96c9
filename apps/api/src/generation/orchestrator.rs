//! Generation Orchestrator — drives a search request through its lifecycle.
//!
//! Flow per run: start (progress 0) → extract (25 → 50) → generate (75) →
//!       complete (100) | fail | canceled.
//!
//! Each run is an independent tokio task. The store is the only shared state:
//! every write is conditional on the request still processing the same run, so
//! a cancel that lands first wins and a stale run can never overwrite a newer
//! one. Model errors never fail a run; the fallback synthesizer takes over.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::{AppError, FailureKind};
use crate::extraction::ContentExtractor;
use crate::generation::prompts::build_prompt;
use crate::llm_client::prompts::QUERY_ONLY_SYSTEM;
use crate::llm_client::CompletionModel;
use crate::models::search_request::{
    QueryType, RequestSource, RequestStatus, SearchRequest, Transition,
};
use crate::notify::StatusNotifier;
use crate::store::{RequestStore, StoreError};
use crate::synthesis::synthesize;

/// Progress checkpoints within a run.
const PROGRESS_EXTRACTING: u8 = 25;
const PROGRESS_EXTRACTED: u8 = 50;
const PROGRESS_GENERATING: u8 = 75;

/// A request that entered `processing`, plus the task running it.
#[derive(Debug)]
pub struct Submission {
    pub request: SearchRequest,
    pub handle: JoinHandle<()>,
}

impl Submission {
    /// Lets the run continue in the background and returns the started request.
    pub fn detach(self) -> SearchRequest {
        drop(self.handle);
        self.request
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn RequestStore>,
    extractor: ContentExtractor,
    /// `None` when no model credential is configured: every run uses the fallback.
    model: Option<Arc<dyn CompletionModel>>,
    notifier: Arc<dyn StatusNotifier>,
    llm_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RequestStore>,
        extractor: ContentExtractor,
        model: Option<Arc<dyn CompletionModel>>,
        notifier: Arc<dyn StatusNotifier>,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            store,
            extractor,
            model,
            notifier,
            llm_timeout,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Client-facing operations
    // ────────────────────────────────────────────────────────────────────────

    /// Persists a new request and starts its first run without waiting for it.
    pub async fn create(
        &self,
        query_type: QueryType,
        source: RequestSource,
    ) -> Result<SearchRequest, AppError> {
        self.submit(query_type, source).await.map(Submission::detach)
    }

    /// Starts a new run on the same record. Allowed from failed, canceled and
    /// completed. A request whose document is gone is rejected before it
    /// re-enters processing.
    pub async fn retry(&self, id: Uuid) -> Result<SearchRequest, AppError> {
        self.resubmit(id).await.map(Submission::detach)
    }

    pub async fn submit(
        &self,
        query_type: QueryType,
        source: RequestSource,
    ) -> Result<Submission, AppError> {
        let request = SearchRequest::new(query_type, source);
        self.store.create(&request).await?;
        info!(
            "Created search request {} ({}, {})",
            request.id,
            request.query_type.as_str(),
            request.input_source()
        );

        // a request must not stay in `new` without a run
        let started = match self
            .store
            .transition(request.id, &[RequestStatus::New], None, &Transition::StartRun)
            .await
        {
            Ok(Some(started)) => started,
            Ok(None) => {
                return Err(AppError::Conflict(format!(
                    "Search request {} was already started",
                    request.id
                )))
            }
            Err(e) => {
                self.abandon(request.id, &e).await;
                return Err(e.into());
            }
        };

        self.notifier.notify(&started).await;
        Ok(self.spawn(started))
    }

    pub async fn get(&self, id: Uuid) -> Result<SearchRequest, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Search request {id} not found")))
    }

    pub async fn resubmit(&self, id: Uuid) -> Result<Submission, AppError> {
        let current = self.get(id).await?;
        if !RequestStatus::RETRYABLE.contains(&current.status) {
            return Err(AppError::Conflict(format!(
                "Search request {id} is {} and cannot be retried",
                current.status
            )));
        }

        if current.failure_kind() == Some(FailureKind::SourceUnavailable) {
            return Err(source_unavailable(id));
        }
        if let RequestSource::Document(reference) = &current.source {
            let exists = self
                .extractor
                .documents()
                .exists(reference)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            if !exists {
                warn!("Retry of search request {id} rejected: document '{reference}' is gone");
                return Err(source_unavailable(id));
            }
        }

        let started = self
            .store
            .transition(id, &RequestStatus::RETRYABLE, None, &Transition::StartRun)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!("Search request {id} changed status concurrently"))
            })?;

        info!("Retrying search request {id} (attempt {})", started.attempt);
        self.notifier.notify(&started).await;
        Ok(self.spawn(started))
    }

    /// Cancels a processing request. Terminal requests are returned unchanged.
    pub async fn cancel(&self, id: Uuid) -> Result<SearchRequest, AppError> {
        let current = self.get(id).await?;
        if current.status.is_terminal() {
            return Ok(current);
        }
        if current.status == RequestStatus::New {
            return Err(AppError::Conflict(format!(
                "Search request {id} has not started processing"
            )));
        }

        let canceled = self
            .store
            .transition(id, &[RequestStatus::Processing], None, &Transition::Cancel)
            .await?;

        match canceled {
            Some(canceled) => {
                info!("Canceled search request {id} (attempt {})", canceled.attempt);
                self.notifier.notify(&canceled).await;
                Ok(canceled)
            }
            None => {
                // the run finished first; report whatever it persisted
                let latest = self.get(id).await?;
                if latest.status.is_terminal() {
                    Ok(latest)
                } else {
                    Err(AppError::Conflict(format!(
                        "Search request {id} changed status concurrently"
                    )))
                }
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Processing run
    // ────────────────────────────────────────────────────────────────────────

    /// Records a request whose first run could not be started as failed.
    /// If that write fails too the request stays in `new` and is logged.
    async fn abandon(&self, id: Uuid, cause: &StoreError) {
        error!("Could not start search request {id}: {cause}");
        let failure = Transition::Fail {
            message: FailureKind::InternalError
                .message(format!("could not start processing: {cause}")),
        };
        match self
            .store
            .transition(id, &[RequestStatus::New], None, &failure)
            .await
        {
            Ok(Some(failed)) => self.notifier.notify(&failed).await,
            Ok(None) => {}
            Err(e) => error!("Search request {id} left in new: {e}"),
        }
    }

    fn spawn(&self, request: SearchRequest) -> Submission {
        let orchestrator = self.clone();
        let run = request.clone();
        let handle = tokio::spawn(async move { orchestrator.run(run).await });
        Submission { request, handle }
    }

    /// Outer boundary of a run. Errors and panics inside the pipeline are
    /// recorded as `InternalError` so no request stays stuck in processing.
    async fn run(self, request: SearchRequest) {
        let id = request.id;
        let attempt = request.attempt;

        let pipeline = self.clone();
        let outcome = tokio::spawn(async move { pipeline.process(&request).await }).await;

        let detail = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => format!("{e:#}"),
            Err(join_error) => match join_error.try_into_panic() {
                Ok(payload) => panic_message(payload),
                Err(join_error) => join_error.to_string(),
            },
        };

        error!("Search request {id} attempt {attempt} aborted: {detail}");
        let failure = Transition::Fail {
            message: FailureKind::InternalError.message(detail),
        };
        if let Err(e) = self.finish(id, attempt, failure).await {
            error!("Failed to record failure for search request {id}: {e}");
        }
    }

    async fn process(&self, request: &SearchRequest) -> anyhow::Result<()> {
        let id = request.id;
        let attempt = request.attempt;
        info!(
            "Processing search request {id} attempt {attempt} (source: {})",
            request.input_source()
        );

        if !self.report_progress(id, attempt, PROGRESS_EXTRACTING).await? {
            return Ok(());
        }

        let text = match self.extractor.extract(&request.source).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Extraction failed for search request {id}: {e}");
                let failure = Transition::Fail {
                    message: e.user_message(),
                };
                self.finish(id, attempt, failure).await?;
                return Ok(());
            }
        };

        // cancellation point between extraction and generation
        if !self.report_progress(id, attempt, PROGRESS_EXTRACTED).await? {
            info!("Search request {id} attempt {attempt} stopped after extraction");
            return Ok(());
        }
        if !self.report_progress(id, attempt, PROGRESS_GENERATING).await? {
            return Ok(());
        }

        let query = self.generate(request, &text).await;
        self.finish(id, attempt, Transition::Complete { query }).await?;
        Ok(())
    }

    /// Model first, fallback synthesizer on any model problem.
    async fn generate(&self, request: &SearchRequest, text: &str) -> String {
        if let Some(model) = &self.model {
            let prompt = build_prompt(request.query_type, text);
            let call = model.complete(&prompt, QUERY_ONLY_SYSTEM);
            match tokio::time::timeout(self.llm_timeout, call).await {
                Ok(Ok(query)) if !query.trim().is_empty() => {
                    info!("Search request {} query generated by {}", request.id, model.name());
                    return query.trim().to_string();
                }
                Ok(Ok(_)) => warn!(
                    "Model returned an empty query for search request {}, using fallback",
                    request.id
                ),
                Ok(Err(e)) => warn!(
                    "Model generation failed for search request {}: {e}, using fallback",
                    request.id
                ),
                Err(_) => warn!(
                    "Model generation timed out after {}s for search request {}, using fallback",
                    self.llm_timeout.as_secs(),
                    request.id
                ),
            }
        }

        synthesize(text, request.query_type)
    }

    /// Writes progress for the run. `false` means the run is no longer current
    /// (canceled, or superseded by a retry) and must stop.
    async fn report_progress(&self, id: Uuid, attempt: i32, progress: u8) -> Result<bool, StoreError> {
        match self.store.set_progress(id, attempt, progress).await? {
            Some(updated) => {
                debug!("Search request {id} attempt {attempt} progress {progress}");
                self.notifier.notify(&updated).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Ends the run if it is still current. Loses quietly to a cancel.
    async fn finish(
        &self,
        id: Uuid,
        attempt: i32,
        transition: Transition,
    ) -> Result<Option<SearchRequest>, StoreError> {
        let target = transition.target_status();
        let updated = self
            .store
            .transition(id, &[RequestStatus::Processing], Some(attempt), &transition)
            .await?;

        match &updated {
            Some(request) => {
                info!("Search request {id} attempt {attempt} -> {target}");
                self.notifier.notify(request).await;
            }
            None => info!(
                "Search request {id} attempt {attempt} is no longer processing, {target} discarded"
            ),
        }
        Ok(updated)
    }
}

fn source_unavailable(id: Uuid) -> AppError {
    AppError::SourceUnavailable(format!(
        "The document for search request {id} no longer exists. \
         Create a new request and upload the document again."
    ))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("processing panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("processing panicked: {message}")
    } else {
        "processing panicked".to_string()
    }
}
