//! Outbound notification payload.
//!
//! This is the body posted to the mail relay, or published to the mail queue,
//! for every newly recorded transaction.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Unix timestamp (seconds) at which the message was produced.
    pub timestamp: i64,
}

impl NotificationMessage {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
