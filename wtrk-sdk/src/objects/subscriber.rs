//! Subscriber registration request and response types.

use serde::{Deserialize, Serialize};

/// Request body for `POST /subscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub wallet_address: String,
    pub email: String,
}

impl SubscribeRequest {
    /// Both fields must carry something other than whitespace.
    pub fn is_complete(&self) -> bool {
        !self.wallet_address.trim().is_empty() && !self.email.trim().is_empty()
    }
}

/// A registered subscriber as returned by `GET /subscribers/{wallet_address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberResponse {
    pub wallet_address: String,
    pub email: String,
}
