//! Single-page website fetcher. No link following.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not an HTML page (content type: {content_type})")]
    NotHtml { url: String, content_type: String },

    #[error("timed out fetching {0}")]
    Timeout(String),

    #[error("could not reach {url}: {reason}")]
    Transport { url: String, reason: String },
}

impl FetchError {
    fn from_reqwest(url: &Url, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(url.to_string())
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub body: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Fetches pages over HTTP with a bounded timeout and a descriptive user agent.
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.5"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("de-DE,de;q=0.9,en;q=0.8"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        debug!("Fetching {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("missing")
            .to_string();
        if !is_html_content_type(&content_type) {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!("Fetched {} bytes from {final_url}", body.len());

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }
}

pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        http::{header, HeaderMap},
        routing::get,
        Router,
    };

    use super::*;

    #[test]
    fn test_html_content_types() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("TEXT/HTML;charset=ISO-8859-1"));
        assert!(is_html_content_type("application/xhtml+xml"));
    }

    #[test]
    fn test_non_html_content_types() {
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("application/json"));
        assert!(!is_html_content_type("missing"));
        assert!(!is_html_content_type(""));
    }

    #[test]
    fn test_status_error_message_names_code() {
        let err = FetchError::Status {
            url: "https://example.com/jobs/42".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "https://example.com/jobs/42 returned HTTP 404");
    }

    #[test]
    fn test_client_builds_with_custom_user_agent() {
        let fetcher = HttpPageFetcher::new("searchgen-test/0.1", Duration::from_secs(15));
        assert!(fetcher.is_ok());
    }

    // ── against a local server ─────────────────────────────────────────────

    async fn serve() -> SocketAddr {
        let router = Router::new()
            .route(
                "/jobs/42",
                get(|headers: HeaderMap| async move {
                    let agent = headers
                        .get(header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    (
                        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                        format!("<html><body><p>Lagerist (m/w/d)</p><p>{agent}</p></body></html>"),
                    )
                }),
            )
            .route(
                "/brochure.pdf",
                get(|| async { ([(header::CONTENT_TYPE, "application/pdf")], "%PDF-1.4") }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    ([(header::CONTENT_TYPE, "text/html")], "<p>too late</p>")
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn local(addr: SocketAddr, path: &str) -> Url {
        Url::parse(&format!("http://{addr}{path}")).unwrap()
    }

    fn fetcher() -> HttpPageFetcher {
        HttpPageFetcher::new("searchgen-test/0.1", Duration::from_millis(300)).unwrap()
    }

    #[tokio::test]
    async fn test_fetches_html_with_user_agent() {
        let addr = serve().await;
        let page = fetcher().fetch(&local(addr, "/jobs/42")).await.unwrap();
        assert_eq!(page.url, local(addr, "/jobs/42"));
        assert!(page.body.contains("Lagerist (m/w/d)"));
        assert!(page.body.contains("searchgen-test/0.1"));
    }

    #[tokio::test]
    async fn test_pdf_response_is_not_html() {
        let addr = serve().await;
        let err = fetcher().fetch(&local(addr, "/brochure.pdf")).await.unwrap_err();
        assert!(
            matches!(&err, FetchError::NotHtml { content_type, .. } if content_type == "application/pdf"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_missing_page_is_status_error() {
        let addr = serve().await;
        let err = fetcher().fetch(&local(addr, "/jobs/404")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_slow_page_times_out() {
        let addr = serve().await;
        let err = fetcher().fetch(&local(addr, "/slow")).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)), "{err:?}");
    }
}
