mod config;
mod db;
mod errors;
mod extraction;
mod generation;
mod llm_client;
mod models;
mod notify;
mod routes;
mod state;
mod store;
mod synthesis;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, S3Config};
use crate::db::{create_pool, init_schema};
use crate::extraction::documents::{DocumentStore, S3DocumentStore, UnconfiguredDocumentStore};
use crate::extraction::fetcher::HttpPageFetcher;
use crate::extraction::rules::ExtractionRules;
use crate::extraction::ContentExtractor;
use crate::generation::orchestrator::Orchestrator;
use crate::llm_client::{CompletionModel, LlmClient};
use crate::notify::{NoopNotifier, RedisNotifier, StatusNotifier};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{InMemoryRequestStore, PgRequestStore, RequestStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting searchgen v{}", env!("CARGO_PKG_VERSION"));

    // Lifecycle store: Postgres when configured, otherwise process memory
    let store: Arc<dyn RequestStore> = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            init_schema(&pool).await?;
            Arc::new(PgRequestStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set: search requests are kept in memory and lost on restart");
            Arc::new(InMemoryRequestStore::new())
        }
    };

    // Status notifications
    let notifier: Arc<dyn StatusNotifier> = match &config.redis_url {
        Some(redis_url) => Arc::new(
            RedisNotifier::connect(redis_url)
                .await
                .context("Failed to connect to Redis")?,
        ),
        None => {
            info!("REDIS_URL not set: status notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    // Document storage (S3 / MinIO)
    let documents: Arc<dyn DocumentStore> = match &config.s3 {
        Some(s3_config) => {
            let client = build_s3_client(s3_config).await;
            info!("S3 document store initialized (bucket: {})", s3_config.bucket);
            Arc::new(S3DocumentStore::new(client, s3_config.bucket.clone()))
        }
        None => {
            info!("S3_BUCKET not set: document sources are unavailable");
            Arc::new(UnconfiguredDocumentStore)
        }
    };

    // Content extraction
    let fetcher = HttpPageFetcher::new(&config.fetch_user_agent, config.fetch_timeout)
        .context("Failed to build page fetcher")?;
    let rules = ExtractionRules::from_optional_path(config.extraction_rules_path.as_deref())?;
    let extractor = ContentExtractor::new(Arc::new(fetcher), documents, rules);

    // Language model (optional)
    let model: Option<Arc<dyn CompletionModel>> = match &config.anthropic_api_key {
        Some(api_key) => {
            let llm = LlmClient::new(api_key.clone()).context("Failed to build LLM client")?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(llm))
        }
        None => {
            info!("ANTHROPIC_API_KEY not set: using the fallback query synthesizer");
            None
        }
    };

    let orchestrator = Orchestrator::new(store, extractor, model, notifier, config.llm_timeout);

    let state = AppState {
        orchestrator,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "searchgen-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint)
        .load()
        .await;

    // MinIO serves buckets under the path, not a subdomain
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
