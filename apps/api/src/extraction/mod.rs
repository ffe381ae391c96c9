//! Content Extractor — reduces a request source to one clean text blob.
//!
//! Text passes through, websites are fetched (one page) and parsed, documents
//! are read from storage. Extraction either yields the whole blob or fails;
//! there is no partial result.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::errors::FailureKind;
use crate::models::search_request::RequestSource;

pub mod documents;
pub mod fetcher;
pub mod html;
pub mod rules;

use documents::{DocumentError, DocumentStore};
use fetcher::{FetchError, PageFetcher};
use rules::ExtractionRules;

/// Inputs with fewer non-whitespace characters than this are rejected.
pub const MIN_CONTENT_CHARS: usize = 20;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("found {found} non-whitespace characters, at least {required} required")]
    InsufficientContent { found: usize, required: usize },

    #[error("document '{0}' is no longer available")]
    SourceUnavailable(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Parse(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl ExtractionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractionError::InsufficientContent { .. } => FailureKind::InsufficientContent,
            ExtractionError::SourceUnavailable(_) => FailureKind::SourceUnavailable,
            ExtractionError::Fetch(_) => FailureKind::FetchError,
            ExtractionError::Parse(_) | ExtractionError::Document(_) => {
                FailureKind::ExtractionError
            }
        }
    }

    /// The `error_message` persisted on the failed request.
    pub fn user_message(&self) -> String {
        let kind = self.kind();
        match self {
            ExtractionError::InsufficientContent { found, required } => kind.message(format!(
                "The input is too short to build a meaningful search query \
                 ({found} of at least {required} characters). \
                 Add more detail to the input and submit it again."
            )),
            ExtractionError::SourceUnavailable(reference) => kind.message(format!(
                "The uploaded document '{reference}' no longer exists. \
                 Please create a new request and upload the document again."
            )),
            other => kind.message(other),
        }
    }
}

#[derive(Clone)]
pub struct ContentExtractor {
    fetcher: Arc<dyn PageFetcher>,
    documents: Arc<dyn DocumentStore>,
    rules: Arc<ExtractionRules>,
}

impl ContentExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        documents: Arc<dyn DocumentStore>,
        rules: ExtractionRules,
    ) -> Self {
        Self {
            fetcher,
            documents,
            rules: Arc::new(rules),
        }
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    pub async fn extract(&self, source: &RequestSource) -> Result<String, ExtractionError> {
        let text = match source {
            RequestSource::Text(text) => text.trim().to_string(),
            RequestSource::Website(url) => {
                let page = self.fetcher.fetch(url).await?;
                let text = html::extract_relevant_text(&page.body, &self.rules)?;
                info!("Extracted {} chars from {}", text.len(), page.url);
                text
            }
            RequestSource::Document(reference) => self
                .documents
                .fetch_text(reference)
                .await?
                .ok_or_else(|| ExtractionError::SourceUnavailable(reference.clone()))?,
        };

        ensure_sufficient(&text)?;
        Ok(text)
    }
}

pub fn ensure_sufficient(text: &str) -> Result<(), ExtractionError> {
    let found = text.chars().filter(|c| !c.is_whitespace()).count();
    if found < MIN_CONTENT_CHARS {
        return Err(ExtractionError::InsufficientContent {
            found,
            required: MIN_CONTENT_CHARS,
        });
    }
    Ok(())
}

/// Collapses every whitespace run to a single space and trims.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
