//! SearchRequest, the persisted unit of work and its lifecycle transitions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::errors::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Recruiting,
    LeadGeneration,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Recruiting => "recruiting",
            QueryType::LeadGeneration => "lead_generation",
        }
    }
}

impl FromStr for QueryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recruiting" => Ok(QueryType::Recruiting),
            "lead_generation" => Ok(QueryType::LeadGeneration),
            other => Err(ValidationError::UnknownValue {
                field: "query_type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Text,
    Website,
    Document,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::Text => "text",
            InputSource::Website => "website",
            InputSource::Document => "document",
        }
    }

    /// Name of the request field that carries the payload for this source.
    pub fn field_name(&self) -> &'static str {
        match self {
            InputSource::Text => "input_text",
            InputSource::Website => "input_url",
            InputSource::Document => "document_reference",
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(InputSource::Text),
            "website" => Ok(InputSource::Website),
            "document" => Ok(InputSource::Document),
            other => Err(ValidationError::UnknownValue {
                field: "input_source",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    New,
    Processing,
    Completed,
    Failed,
    Canceled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::Processing => "processing",
            RequestStatus::Completed => "completed",
            RequestStatus::Failed => "failed",
            RequestStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Failed | RequestStatus::Canceled
        )
    }

    /// Statuses a retry (or manual re-generation) may start from.
    pub const RETRYABLE: [RequestStatus; 3] = [
        RequestStatus::Failed,
        RequestStatus::Canceled,
        RequestStatus::Completed,
    ];
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(RequestStatus::New),
            "processing" => Ok(RequestStatus::Processing),
            "completed" => Ok(RequestStatus::Completed),
            "failed" => Ok(RequestStatus::Failed),
            "canceled" => Ok(RequestStatus::Canceled),
            other => Err(ValidationError::UnknownValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },

    #[error("input_source '{input_source}' requires a non-empty {field}")]
    MissingInput {
        input_source: InputSource,
        field: &'static str,
    },

    #[error("{field} must not be set when input_source is '{input_source}'")]
    UnexpectedInput {
        input_source: InputSource,
        field: &'static str,
    },

    #[error("invalid website URL '{0}'")]
    InvalidUrl(String),

    #[error("website URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("progress {0} is outside 0..=100")]
    InvalidProgress(i16),
}

/// The request payload, validated so that exactly one input kind is present
/// and it matches the declared `InputSource`.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestSource {
    Text(String),
    Website(Url),
    /// Object key of an uploaded document.
    Document(String),
}

impl RequestSource {
    pub fn from_parts(
        source: InputSource,
        input_text: Option<&str>,
        input_url: Option<&str>,
        document_reference: Option<&str>,
    ) -> Result<Self, ValidationError> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.trim().is_empty())
        }

        let fields = [
            (InputSource::Text, present(input_text)),
            (InputSource::Website, present(input_url)),
            (InputSource::Document, present(document_reference)),
        ];
        if let Some((other, _)) = fields
            .iter()
            .find(|(kind, value)| *kind != source && value.is_some())
        {
            return Err(ValidationError::UnexpectedInput {
                input_source: source,
                field: other.field_name(),
            });
        }

        let value = fields
            .iter()
            .find(|(kind, _)| *kind == source)
            .and_then(|(_, value)| *value)
            .ok_or(ValidationError::MissingInput {
                input_source: source,
                field: source.field_name(),
            })?;

        match source {
            InputSource::Text => Ok(RequestSource::Text(value.to_string())),
            InputSource::Website => parse_website_url(value).map(RequestSource::Website),
            InputSource::Document => Ok(RequestSource::Document(value.trim().to_string())),
        }
    }

    pub fn input_source(&self) -> InputSource {
        match self {
            RequestSource::Text(_) => InputSource::Text,
            RequestSource::Website(_) => InputSource::Website,
            RequestSource::Document(_) => InputSource::Document,
        }
    }

    pub fn input_text(&self) -> Option<&str> {
        match self {
            RequestSource::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn input_url(&self) -> Option<&str> {
        match self {
            RequestSource::Website(url) => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn document_reference(&self) -> Option<&str> {
        match self {
            RequestSource::Document(reference) => Some(reference),
            _ => None,
        }
    }
}

fn parse_website_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|_| ValidationError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ValidationError::UnsupportedScheme(scheme.to_string())),
    }
}

/// A lifecycle change. Field effects live in `SearchRequest::apply`; the
/// Postgres store mirrors them in SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    StartRun,
    Complete { query: String },
    Fail { message: String },
    Cancel,
}

impl Transition {
    pub fn target_status(&self) -> RequestStatus {
        match self {
            Transition::StartRun => RequestStatus::Processing,
            Transition::Complete { .. } => RequestStatus::Completed,
            Transition::Fail { .. } => RequestStatus::Failed,
            Transition::Cancel => RequestStatus::Canceled,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub id: Uuid,
    pub query_type: QueryType,
    pub source: RequestSource,
    pub generated_query: Option<String>,
    pub status: RequestStatus,
    pub progress: u8,
    pub error_message: Option<String>,
    /// Number of processing runs started so far. Identifies the current run.
    pub attempt: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SearchRequest {
    pub fn new(query_type: QueryType, source: RequestSource) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            query_type,
            source,
            generated_query: None,
            status: RequestStatus::New,
            progress: 0,
            error_message: None,
            attempt: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn input_source(&self) -> InputSource {
        self.source.input_source()
    }

    pub fn apply(&mut self, transition: &Transition) {
        self.status = transition.target_status();
        match transition {
            Transition::StartRun => {
                self.progress = 0;
                self.generated_query = None;
                self.error_message = None;
                self.attempt += 1;
            }
            Transition::Complete { query } => {
                self.progress = 100;
                self.generated_query = Some(query.clone());
                self.error_message = None;
            }
            Transition::Fail { message } => {
                self.generated_query = None;
                self.error_message = Some(message.clone());
            }
            Transition::Cancel => {
                self.generated_query = None;
                self.error_message = None;
            }
        }
        self.updated_at = Utc::now();
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error_message
            .as_deref()
            .and_then(FailureKind::from_message)
    }
}

/// Raw database row. Converted into `SearchRequest` at the store boundary.
#[derive(Debug, Clone, FromRow)]
pub struct SearchRequestRow {
    pub id: Uuid,
    pub query_type: String,
    pub input_source: String,
    pub input_text: Option<String>,
    pub input_url: Option<String>,
    pub document_reference: Option<String>,
    pub generated_query: Option<String>,
    pub status: String,
    pub progress: i16,
    pub error_message: Option<String>,
    pub attempt: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SearchRequestRow> for SearchRequest {
    type Error = ValidationError;

    fn try_from(row: SearchRequestRow) -> Result<Self, Self::Error> {
        let input_source: InputSource = row.input_source.parse()?;
        let source = RequestSource::from_parts(
            input_source,
            row.input_text.as_deref(),
            row.input_url.as_deref(),
            row.document_reference.as_deref(),
        )?;
        let progress = u8::try_from(row.progress)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or(ValidationError::InvalidProgress(row.progress))?;

        Ok(SearchRequest {
            id: row.id,
            query_type: row.query_type.parse()?,
            source,
            generated_query: row.generated_query,
            status: row.status.parse()?,
            progress,
            error_message: row.error_message,
            attempt: row.attempt,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Client-facing representation of a request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequestView {
    pub id: Uuid,
    pub query_type: QueryType,
    pub input_source: InputSource,
    pub input_text: Option<String>,
    pub input_url: Option<String>,
    pub document_reference: Option<String>,
    pub generated_query: Option<String>,
    pub status: RequestStatus,
    pub progress: u8,
    pub error_message: Option<String>,
    pub error_kind: Option<FailureKind>,
    /// Whether the UI should offer a retry action.
    pub retryable: bool,
    pub attempt: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SearchRequest> for SearchRequestView {
    fn from(request: &SearchRequest) -> Self {
        let error_kind = request.failure_kind();
        let retryable = request.status.is_terminal()
            && error_kind.map_or(true, |kind| kind.is_retryable());

        SearchRequestView {
            id: request.id,
            query_type: request.query_type,
            input_source: request.input_source(),
            input_text: request.source.input_text().map(String::from),
            input_url: request.source.input_url().map(String::from),
            document_reference: request.source.document_reference().map(String::from),
            generated_query: request.generated_query.clone(),
            status: request.status,
            progress: request.progress,
            error_message: request.error_message.clone(),
            error_kind,
            retryable,
            attempt: request.attempt,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_request() -> SearchRequest {
        SearchRequest::new(
            QueryType::Recruiting,
            RequestSource::Text("Senior Java Developer Berlin".to_string()),
        )
    }

    #[test]
    fn test_from_parts_accepts_matching_text() {
        let source =
            RequestSource::from_parts(InputSource::Text, Some("Rust engineer"), None, None)
                .unwrap();
        assert_eq!(source, RequestSource::Text("Rust engineer".to_string()));
        assert_eq!(source.input_source(), InputSource::Text);
    }

    #[test]
    fn test_from_parts_rejects_missing_payload() {
        let err = RequestSource::from_parts(InputSource::Website, None, Some("  "), None)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingInput {
                input_source: InputSource::Website,
                field: "input_url"
            }
        );
    }

    #[test]
    fn test_from_parts_rejects_second_payload() {
        let err = RequestSource::from_parts(
            InputSource::Text,
            Some("Rust engineer"),
            Some("https://example.com/jobs/1"),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnexpectedInput {
                field: "input_url",
                ..
            }
        ));
    }

    #[test]
    fn test_from_parts_validates_url_scheme() {
        let err = RequestSource::from_parts(
            InputSource::Website,
            None,
            Some("ftp://example.com/job.html"),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedScheme("ftp".to_string()));

        let err = RequestSource::from_parts(InputSource::Website, None, Some("not a url"), None)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidUrl(_)));
    }

    #[test]
    fn test_new_request_starts_in_new_state() {
        let request = text_request();
        assert_eq!(request.status, RequestStatus::New);
        assert_eq!(request.progress, 0);
        assert_eq!(request.attempt, 0);
        assert!(request.generated_query.is_none());
        assert!(request.error_message.is_none());
    }

    #[test]
    fn test_start_run_resets_previous_outcome() {
        let mut request = text_request();
        request.apply(&Transition::StartRun);
        request.apply(&Transition::Fail {
            message: FailureKind::FetchError.message("HTTP 503"),
        });
        assert_eq!(request.status, RequestStatus::Failed);

        request.apply(&Transition::StartRun);
        assert_eq!(request.status, RequestStatus::Processing);
        assert_eq!(request.progress, 0);
        assert_eq!(request.attempt, 2);
        assert!(request.error_message.is_none());
    }

    #[test]
    fn test_complete_sets_query_and_clears_error() {
        let mut request = text_request();
        request.apply(&Transition::StartRun);
        request.apply(&Transition::Complete {
            query: "(\"Java\") AND (\"Resume\" OR \"CV\")".to_string(),
        });
        assert_eq!(request.status, RequestStatus::Completed);
        assert_eq!(request.progress, 100);
        assert!(request.generated_query.is_some());
        assert!(request.error_message.is_none());
    }

    #[test]
    fn test_fail_and_cancel_never_keep_a_query() {
        let mut request = text_request();
        request.apply(&Transition::StartRun);
        request.apply(&Transition::Complete {
            query: "(\"Java\")".to_string(),
        });
        request.apply(&Transition::StartRun);
        request.apply(&Transition::Cancel);
        assert_eq!(request.status, RequestStatus::Canceled);
        assert!(request.generated_query.is_none());
        assert!(request.error_message.is_none());
    }

    #[test]
    fn test_row_with_mismatched_input_is_rejected() {
        let now = Utc::now();
        let row = SearchRequestRow {
            id: Uuid::new_v4(),
            query_type: "recruiting".to_string(),
            input_source: "website".to_string(),
            input_text: Some("Rust engineer wanted".to_string()),
            input_url: None,
            document_reference: None,
            generated_query: None,
            status: "new".to_string(),
            progress: 0,
            error_message: None,
            attempt: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(SearchRequest::try_from(row).is_err());
    }

    #[test]
    fn test_row_round_trips_into_request() {
        let now = Utc::now();
        let row = SearchRequestRow {
            id: Uuid::new_v4(),
            query_type: "lead_generation".to_string(),
            input_source: "document".to_string(),
            input_text: None,
            input_url: None,
            document_reference: Some("uploads/brochure.pdf".to_string()),
            generated_query: None,
            status: "failed".to_string(),
            progress: 50,
            error_message: Some("SourceUnavailable: gone".to_string()),
            attempt: 1,
            created_at: now,
            updated_at: now,
        };
        let request = SearchRequest::try_from(row).unwrap();
        assert_eq!(request.query_type, QueryType::LeadGeneration);
        assert_eq!(request.status, RequestStatus::Failed);
        assert_eq!(request.failure_kind(), Some(FailureKind::SourceUnavailable));
    }

    #[test]
    fn test_view_marks_source_unavailable_as_not_retryable() {
        let mut request = SearchRequest::new(
            QueryType::Recruiting,
            RequestSource::Document("uploads/cv.pdf".to_string()),
        );
        request.apply(&Transition::StartRun);
        request.apply(&Transition::Fail {
            message: FailureKind::SourceUnavailable.message("document was deleted"),
        });
        let view = SearchRequestView::from(&request);
        assert_eq!(view.error_kind, Some(FailureKind::SourceUnavailable));
        assert!(!view.retryable);

        let mut request = text_request();
        request.apply(&Transition::StartRun);
        request.apply(&Transition::Fail {
            message: FailureKind::FetchError.message("HTTP 404"),
        });
        assert!(SearchRequestView::from(&request).retryable);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&QueryType::LeadGeneration).unwrap();
        assert_eq!(json, "\"lead_generation\"");
        let status: RequestStatus = "canceled".parse().unwrap();
        assert_eq!(status, RequestStatus::Canceled);
    }
}
