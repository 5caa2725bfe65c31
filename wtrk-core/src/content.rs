//! Parsing of fetched content items.

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while turning fetched bytes into a [`ContentItem`].
#[derive(Debug, Error)]
pub enum ContentParseError {
    #[error("invalid content JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("content field `{0}` is empty")]
    EmptyField(&'static str),
}

/// The part of a finalized wallet-tracking snapshot the pipeline acts on.
///
/// Unknown fields are ignored. The hash is accepted under both
/// `transaction_hash` and `transactionHash`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentItem {
    pub contract_address: String,
    #[serde(alias = "transactionHash")]
    pub transaction_hash: String,
}

impl ContentItem {
    pub fn parse(bytes: &[u8]) -> Result<Self, ContentParseError> {
        let item: ContentItem = serde_json::from_slice(bytes)?;
        if item.contract_address.trim().is_empty() {
            return Err(ContentParseError::EmptyField("contract_address"));
        }
        if item.transaction_hash.trim().is_empty() {
            return Err(ContentParseError::EmptyField("transaction_hash"));
        }
        Ok(item)
    }
}
