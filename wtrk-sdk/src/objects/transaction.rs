//! Transaction record request and response types.

use serde::{Deserialize, Serialize};

/// Request body for `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub wallet_address: String,
    pub contract_address: String,
    pub transaction_hash: String,
}

impl CreateTransactionRequest {
    pub fn is_complete(&self) -> bool {
        [
            &self.wallet_address,
            &self.contract_address,
            &self.transaction_hash,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// A stored transaction record.
///
/// `created_at` is a unix timestamp in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub wallet_address: String,
    pub contract_address: String,
    pub transaction_hash: String,
    pub created_at: i64,
}
