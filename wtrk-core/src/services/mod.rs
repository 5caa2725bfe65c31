//! Collaborators of the notification pipeline.
//!
//! Each collaborator is a trait so the pipeline and the HTTP handlers receive
//! explicitly constructed clients and tests can substitute in-memory ones:
//!
//! - [`SubscriberDirectory`]: registered wallets (PostgreSQL)
//! - [`ContentIndex`]: content references per lookup key (Redis sorted sets)
//! - [`ContentFetcher`]: raw content by CID (IPFS gateway)
//! - [`RecordStore`]: transaction records (PostgreSQL)
//! - [`NotificationSender`]: outbound mail (HTTP relay or AMQP queue)

pub mod content_fetcher;
pub mod content_index;
pub mod notifier;
pub mod store;

pub use content_fetcher::{FetchError, IpfsGatewayFetcher};
pub use content_index::{IndexError, RedisContentIndex};
pub use notifier::{AmqpMailSender, HttpMailSender, NotifyError};
pub use store::{PgRecordStore, PgSubscriberDirectory, StoreError};

use crate::config::DedupMode;
use crate::entities::{StoredTransactionRecord, Subscriber, TransactionRecord};
use async_trait::async_trait;
use bytes::Bytes;
use wtrk_sdk::objects::NotificationMessage;

/// Read access to registered subscribers, plus registration for the
/// subscribe endpoint.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    /// Exact-match lookup by wallet address.
    async fn lookup(&self, wallet_address: &str) -> Result<Option<Subscriber>, StoreError>;

    /// Register a subscriber. Returns `false` if the wallet is already known.
    async fn register(&self, subscriber: Subscriber) -> Result<bool, StoreError>;
}

/// Ordered content references stored under a lookup key.
#[async_trait]
pub trait ContentIndex: Send + Sync {
    /// The full range of references, lowest score first.
    async fn range(&self, key: &str) -> Result<Vec<String>, IndexError>;
}

/// Retrieval of immutable content by identifier.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the raw bytes of `cid` with a single request.
    ///
    /// An empty body is reported as [`FetchError::Empty`].
    async fn fetch(&self, cid: &str) -> Result<Bytes, FetchError>;
}

/// Outcome of a record insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertOutcome {
    Inserted,
    /// Strict mode found an existing record with the same natural key.
    Duplicate,
}

/// Persistence of transaction records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(
        &self,
        record: TransactionRecord,
        mode: DedupMode,
    ) -> Result<InsertOutcome, StoreError>;

    async fn find_by_hash(
        &self,
        transaction_hash: &str,
    ) -> Result<Vec<StoredTransactionRecord>, StoreError>;
}

/// Delivery of one notification through an external transport.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError>;
}
