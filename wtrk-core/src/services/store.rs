//! PostgreSQL-backed subscriber directory and record store.

use super::{InsertOutcome, RecordStore, SubscriberDirectory};
use crate::config::DedupMode;
use crate::entities::subscriber::{GetSubscriberByWallet, InsertSubscriber};
use crate::entities::transaction_record::{
    GetTransactionRecordsByHash, InsertTransactionRecord, InsertTransactionRecordIfAbsent,
};
use crate::entities::{StoredTransactionRecord, Subscriber, TransactionRecord};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use thiserror::Error;

/// Errors raised by the subscriber and record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Any other backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

pub struct PgSubscriberDirectory {
    processor: DatabaseProcessor,
}

impl PgSubscriberDirectory {
    pub fn new(processor: DatabaseProcessor) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl SubscriberDirectory for PgSubscriberDirectory {
    async fn lookup(&self, wallet_address: &str) -> Result<Option<Subscriber>, StoreError> {
        let subscriber = self
            .processor
            .process(GetSubscriberByWallet {
                wallet_address: wallet_address.to_string(),
            })
            .await?;
        Ok(subscriber)
    }

    async fn register(&self, subscriber: Subscriber) -> Result<bool, StoreError> {
        let created = self
            .processor
            .process(InsertSubscriber {
                wallet_address: subscriber.wallet_address,
                email: subscriber.email,
            })
            .await?;
        Ok(created)
    }
}

pub struct PgRecordStore {
    processor: DatabaseProcessor,
}

impl PgRecordStore {
    pub fn new(processor: DatabaseProcessor) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(
        &self,
        record: TransactionRecord,
        mode: DedupMode,
    ) -> Result<InsertOutcome, StoreError> {
        let inserted = match mode {
            DedupMode::Unconditional => {
                self.processor
                    .process(InsertTransactionRecord { record })
                    .await?
            }
            DedupMode::Strict => {
                self.processor
                    .process(InsertTransactionRecordIfAbsent { record })
                    .await?
            }
        };
        Ok(if inserted > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Duplicate
        })
    }

    async fn find_by_hash(
        &self,
        transaction_hash: &str,
    ) -> Result<Vec<StoredTransactionRecord>, StoreError> {
        let records = self
            .processor
            .process(GetTransactionRecordsByHash {
                transaction_hash: transaction_hash.to_string(),
            })
            .await?;
        Ok(records)
    }
}
