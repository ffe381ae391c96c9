//! Status notifications. Clients may poll the request or subscribe to its
//! channel; every persisted change is published after the store write.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::search_request::{SearchRequest, SearchRequestView};

/// Channel a request's updates are published on.
pub fn channel_for(id: Uuid) -> String {
    format!("search_requests:{id}")
}

#[async_trait]
pub trait StatusNotifier: Send + Sync {
    /// Must not fail the caller; delivery problems are the notifier's concern.
    async fn notify(&self, request: &SearchRequest);
}

pub struct NoopNotifier;

#[async_trait]
impl StatusNotifier for NoopNotifier {
    async fn notify(&self, _request: &SearchRequest) {}
}

/// Publishes the request view as JSON over Redis pub/sub.
pub struct RedisNotifier {
    connection: MultiplexedConnection,
}

impl RedisNotifier {
    /// Opens the connection and checks it with PING so a bad `REDIS_URL`
    /// fails startup instead of the first publish.
    pub async fn connect(redis_url: &str) -> redis::RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let mut connection = client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut connection).await?;
        info!("Redis connection established ({pong})");
        Ok(Self { connection })
    }
}

#[async_trait]
impl StatusNotifier for RedisNotifier {
    async fn notify(&self, request: &SearchRequest) {
        let payload = match serde_json::to_string(&SearchRequestView::from(request)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize status update for {}: {e}", request.id);
                return;
            }
        };

        let channel = channel_for(request.id);
        let mut connection = self.connection.clone();
        let published: redis::RedisResult<i64> = connection.publish(&channel, payload).await;
        match published {
            Ok(receivers) => debug!(
                "Published {} update on {channel} to {receivers} subscriber(s)",
                request.status
            ),
            Err(e) => warn!("Failed to publish status update on {channel}: {e}"),
        }
    }
}
