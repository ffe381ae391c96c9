use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Schema statements, run one at a time. Each is safe to re-run.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS search_requests (
        id                 UUID PRIMARY KEY,
        query_type         TEXT NOT NULL CHECK (query_type IN ('recruiting', 'lead_generation')),
        input_source       TEXT NOT NULL CHECK (input_source IN ('text', 'website', 'document')),
        input_text         TEXT,
        input_url          TEXT,
        document_reference TEXT,
        generated_query    TEXT,
        status             TEXT NOT NULL
                           CHECK (status IN ('new', 'processing', 'completed', 'failed', 'canceled')),
        progress           SMALLINT NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
        error_message      TEXT,
        attempt            INTEGER NOT NULL DEFAULT 0,
        created_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
        CHECK (generated_query IS NULL OR status = 'completed'),
        CHECK (error_message IS NULL OR status = 'failed')
    )
    "#,
    "CREATE INDEX IF NOT EXISTS search_requests_status_idx ON search_requests (status)",
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Brings the schema up to date. Called once at startup; idempotent.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to initialize search_requests schema")?;
    }
    info!("Database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_are_idempotent() {
        for statement in SCHEMA {
            assert!(statement.contains("IF NOT EXISTS"), "{statement}");
        }
    }
}
