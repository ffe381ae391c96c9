//! Uploaded documents, resolved by object key.
//!
//! Uploading is handled elsewhere; this side only reads what is already stored
//! and turns it into text.

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::normalize_whitespace;

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document storage error: {0}")]
    Storage(String),

    #[error("could not read document '{reference}': {reason}")]
    Decode { reference: String, reason: String },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the document's text, or `None` if it no longer exists.
    async fn fetch_text(&self, reference: &str) -> Result<Option<String>, DocumentError>;

    async fn exists(&self, reference: &str) -> Result<bool, DocumentError>;
}

pub struct S3DocumentStore {
    client: S3Client,
    bucket: String,
}

impl S3DocumentStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn fetch_text(&self, reference: &str) -> Result<Option<String>, DocumentError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(reference)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(DocumentError::Storage(err.to_string()));
            }
        };

        let body: Bytes = output
            .body
            .collect()
            .await
            .map_err(|e| DocumentError::Storage(e.to_string()))?
            .into_bytes();
        debug!("Downloaded document {reference} ({} bytes)", body.len());

        let owned_reference = reference.to_string();
        let text = tokio::task::spawn_blocking(move || decode_document(&owned_reference, &body))
            .await
            .map_err(|e| DocumentError::Storage(format!("document decoding task failed: {e}")))??;

        Ok(Some(text))
    }

    async fn exists(&self, reference: &str) -> Result<bool, DocumentError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(reference)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(DocumentError::Storage(err.to_string()))
                }
            }
        }
    }
}

/// Used when no document storage is configured: every reference is unavailable.
pub struct UnconfiguredDocumentStore;

#[async_trait]
impl DocumentStore for UnconfiguredDocumentStore {
    async fn fetch_text(&self, reference: &str) -> Result<Option<String>, DocumentError> {
        warn!("Document storage not configured; cannot resolve {reference}");
        Ok(None)
    }

    async fn exists(&self, _reference: &str) -> Result<bool, DocumentError> {
        Ok(false)
    }
}

/// PDFs go through `pdf-extract`; anything else is read as UTF-8 text.
pub fn decode_document(reference: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    let text = if bytes.starts_with(PDF_MAGIC) {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocumentError::Decode {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };
    Ok(normalize_whitespace(&text))
}
