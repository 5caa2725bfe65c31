//! Pull-based change-notification sources.

use super::types::{ChangeNotification, NotificationKind};
use async_trait::async_trait;
use futures_util::StreamExt;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur while establishing a subscription.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// A feed of change notifications the listener pulls from.
///
/// `next_notification` returns `None` once the feed has ended. `close`
/// releases the subscription; it is called exactly once, after the last
/// notification has been handled.
#[async_trait]
pub trait NotificationSource: Send {
    async fn next_notification(&mut self) -> Option<ChangeNotification>;

    async fn close(&mut self);
}

/// Pattern subscription to Redis keyspace notifications.
pub struct RedisKeyspaceSource {
    pubsub: redis::aio::PubSub,
    pattern: String,
}

impl RedisKeyspaceSource {
    /// Open a dedicated pub/sub connection and `PSUBSCRIBE` to `pattern`.
    pub async fn subscribe(
        client: &redis::Client,
        pattern: impl Into<String>,
    ) -> Result<Self, SubscriptionError> {
        let pattern = pattern.into();
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.psubscribe(&pattern).await?;
        info!(pattern = %pattern, "Subscribed to keyspace notifications");
        Ok(Self { pubsub, pattern })
    }

    /// Turn on keyspace notifications on the server (`CONFIG SET
    /// notify-keyspace-events`).
    ///
    /// Only needed when the server is not already configured to emit them.
    pub async fn enable_keyspace_events(
        client: &redis::Client,
        flags: &str,
    ) -> Result<(), SubscriptionError> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = redis::cmd("CONFIG")
            .arg("SET")
            .arg("notify-keyspace-events")
            .arg(flags)
            .query_async(&mut conn)
            .await?;
        info!(flags = flags, "Enabled keyspace notifications");
        Ok(())
    }
}

fn from_redis_msg(msg: &redis::Msg) -> ChangeNotification {
    let kind = if msg.from_pattern() {
        NotificationKind::PatternMessage
    } else {
        NotificationKind::Message
    };
    let payload = msg.get_payload::<String>().unwrap_or_default();
    ChangeNotification::new(kind, msg.get_channel_name(), payload)
}

#[async_trait]
impl NotificationSource for RedisKeyspaceSource {
    async fn next_notification(&mut self) -> Option<ChangeNotification> {
        let msg = self.pubsub.on_message().next().await?;
        Some(from_redis_msg(&msg))
    }

    async fn close(&mut self) {
        match self.pubsub.punsubscribe(&self.pattern).await {
            Ok(()) => info!(pattern = %self.pattern, "Unsubscribed from keyspace notifications"),
            Err(e) => warn!(pattern = %self.pattern, error = %e, "Failed to unsubscribe"),
        }
    }
}
