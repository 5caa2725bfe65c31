//! Mail transports.
//!
//! Both transports carry the same JSON [`NotificationMessage`]; the mailer
//! behind them owns SMTP. A send is one transport call and is never retried
//! here.

use super::NotificationSender;
use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;
use wtrk_sdk::objects::NotificationMessage;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Relay rejected the message
    #[error("mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// AMQP error
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// Broker did not confirm the publish
    #[error("broker refused message on queue {0}")]
    Nacked(String),

    /// Payload serialization error
    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other transport failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Posts notifications as JSON to a mail relay endpoint.
pub struct HttpMailSender {
    endpoint: Url,
    http_client: reqwest::Client,
}

impl HttpMailSender {
    /// Create a new HttpMailSender.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - URL the message is POSTed to
    /// * `timeout` - Per-request timeout
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        Self {
            endpoint,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl NotificationSender for HttpMailSender {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(recipient = %message.recipient, "Mail relay accepted message");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Publishes notifications to a RabbitMQ queue consumed by a mailer.
///
/// The channel runs in confirm mode, so `send` succeeds only once the broker
/// has acknowledged the message.
pub struct AmqpMailSender {
    _connection: Connection,
    channel: Channel,
    queue: String,
}

impl AmqpMailSender {
    /// Connect, open a confirm-mode channel, and declare `queue`.
    pub async fn connect(amqp_url: &str, queue: &str) -> Result<Self, NotifyError> {
        let connection = Connection::connect(amqp_url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        info!(queue = queue, "Connected to AMQP broker for mail delivery");

        Ok(Self {
            _connection: connection,
            channel,
            queue: queue.to_string(),
        })
    }
}

#[async_trait]
impl NotificationSender for AmqpMailSender {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let payload = message.to_json_bytes()?;

        let confirmation = self
            .channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_content_type("application/json".into()),
            )
            .await?
            .await?;

        if confirmation.is_nack() {
            return Err(NotifyError::Nacked(self.queue.clone()));
        }

        debug!(queue = %self.queue, recipient = %message.recipient, "Published mail message");
        Ok(())
    }
}
