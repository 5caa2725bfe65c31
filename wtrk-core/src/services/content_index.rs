use super::ContentIndex;
use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Failure reported by a non-Redis index
    #[error("index backend error: {0}")]
    Backend(String),
}

/// Reads content references from Redis sorted sets.
///
/// The multiplexed connection is cloned per call; clones share one socket.
#[derive(Clone)]
pub struct RedisContentIndex {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisContentIndex {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self { conn }
    }

    pub async fn connect(client: &redis::Client) -> Result<Self, IndexError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl ContentIndex for RedisContentIndex {
    #[tracing::instrument(skip(self), err, name = "REDIS:ZRANGE")]
    async fn range(&self, key: &str) -> Result<Vec<String>, IndexError> {
        let mut conn = self.conn.clone();
        let refs: Vec<String> = conn.zrange(key, 0, -1).await?;
        Ok(refs)
    }
}
