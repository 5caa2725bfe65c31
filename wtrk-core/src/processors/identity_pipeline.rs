//! IdentityPipeline processor.
//!
//! The IdentityPipeline is responsible for, given one `LookupKey`:
//! - Resolving the wallet to a registered subscriber
//! - Reading every content reference stored under the key
//! - Fetching and parsing each reference into a `ContentItem`
//! - Writing a `TransactionRecord` per item (unconditional or strict insert)
//! - Sending one notification per inserted record
//!
//! Every step returns a typed result. A failing item is recorded in the
//! `BatchReport` and the batch moves on to the next reference; nothing here
//! is returned as an error to the listener.

use crate::config::{PipelineConfig, SharedPipelineConfig};
use crate::content::{ContentItem, ContentParseError};
use crate::entities::{Subscriber, TransactionRecord};
use crate::events::LookupKey;
use crate::services::{
    ContentFetcher, ContentIndex, FetchError, IndexError, InsertOutcome, NotificationSender,
    NotifyError, RecordStore, StoreError, SubscriberDirectory,
};
use futures_util::StreamExt;
use kanau::processor::Processor;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use wtrk_sdk::objects::NotificationMessage;

/// Collaborators used by the pipeline.
#[derive(Clone)]
pub struct PipelineDeps {
    pub subscribers: Arc<dyn SubscriberDirectory>,
    pub index: Arc<dyn ContentIndex>,
    pub fetcher: Arc<dyn ContentFetcher>,
    pub records: Arc<dyn RecordStore>,
    pub notifier: Arc<dyn NotificationSender>,
}

/// Result of processing a single content reference.
#[derive(Debug)]
pub enum ItemOutcome {
    /// Record inserted and notification sent.
    Notified,
    /// Strict mode found the record already stored; nothing sent.
    Duplicate,
    FetchFailed(FetchError),
    ParseFailed(ContentParseError),
    InsertFailed(StoreError),
    /// Record inserted but the notification could not be delivered.
    NotifyFailed(NotifyError),
}

impl ItemOutcome {
    /// Whether the item got far enough to attempt an insert.
    pub fn attempted_insert(&self) -> bool {
        !matches!(self, ItemOutcome::FetchFailed(_) | ItemOutcome::ParseFailed(_))
    }

    /// Whether a notification send was attempted for this item.
    pub fn attempted_notify(&self) -> bool {
        matches!(self, ItemOutcome::Notified | ItemOutcome::NotifyFailed(_))
    }
}

/// Per-reference outcomes of one batch.
///
/// With `item_concurrency > 1` the entries are in completion order, not in
/// range order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<(String, ItemOutcome)>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn notified(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Notified))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Duplicate))
    }

    pub fn inserts_attempted(&self) -> usize {
        self.count(ItemOutcome::attempted_insert)
    }

    pub fn notifications_attempted(&self) -> usize {
        self.count(ItemOutcome::attempted_notify)
    }

    pub fn skipped(&self) -> usize {
        self.len() - self.inserts_attempted()
    }

    /// Outcome for `cid`, if it was part of the batch.
    pub fn outcome(&self, cid: &str) -> Option<&ItemOutcome> {
        self.items.iter().find(|(c, _)| c == cid).map(|(_, o)| o)
    }

    fn count(&self, f: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|(_, o)| f(o)).count()
    }
}

/// Result of processing one lookup key.
#[derive(Debug)]
pub enum IdentityOutcome {
    /// The wallet is not registered; nothing was read or written.
    UnknownSubscriber,
    LookupFailed(StoreError),
    /// The key holds no content references.
    NoContent,
    RangeQueryFailed(IndexError),
    Processed(BatchReport),
}

impl IdentityOutcome {
    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            IdentityOutcome::Processed(report) => Some(report),
            _ => None,
        }
    }
}

/// Build the notification for a newly recorded transaction.
pub fn notification_for(record: &TransactionRecord, recipient: &str) -> NotificationMessage {
    let subject = format!(
        "New transaction detected for wallet {}",
        record.wallet_address
    );
    let body = format!(
        "Wallet {} interacted with contract {}.\nTransaction hash: {}\n",
        record.wallet_address, record.contract_address, record.transaction_hash
    );
    NotificationMessage::new(recipient, subject, body)
}

/// Runs the fetch → parse → insert → notify sequence for one wallet.
pub struct IdentityPipeline {
    deps: PipelineDeps,
    config: SharedPipelineConfig,
}

impl IdentityPipeline {
    /// Create a new IdentityPipeline.
    ///
    /// # Arguments
    ///
    /// * `deps` - Collaborators for lookups, fetches, inserts, and delivery
    /// * `config` - Pipeline settings, re-read at the start of every batch
    pub fn new(deps: PipelineDeps, config: SharedPipelineConfig) -> Self {
        Self { deps, config }
    }

    /// Process every content reference stored under `key`.
    pub async fn process_key(&self, key: &LookupKey) -> IdentityOutcome {
        let subscriber = match self.deps.subscribers.lookup(&key.wallet).await {
            Ok(Some(subscriber)) => subscriber,
            Ok(None) => {
                info!(wallet = %key.wallet, "Wallet is not registered, skipping");
                return IdentityOutcome::UnknownSubscriber;
            }
            Err(e) => {
                error!(wallet = %key.wallet, error = %e, "Subscriber lookup failed");
                return IdentityOutcome::LookupFailed(e);
            }
        };

        let refs = match self.deps.index.range(&key.raw).await {
            Ok(refs) => refs,
            Err(e) => {
                error!(key = %key, error = %e, "Range query failed");
                return IdentityOutcome::RangeQueryFailed(e);
            }
        };
        if refs.is_empty() {
            info!(key = %key, "No content references under key");
            return IdentityOutcome::NoContent;
        }

        let settings = self.config.read().await.clone();
        debug!(
            wallet = %key.wallet,
            references = refs.len(),
            dedup = %settings.dedup,
            "Processing content references"
        );

        let report = self.process_batch(&subscriber, refs, &settings).await;
        info!(
            wallet = %key.wallet,
            total = report.len(),
            notified = report.notified(),
            duplicates = report.duplicates(),
            skipped = report.skipped(),
            "Batch processed"
        );
        IdentityOutcome::Processed(report)
    }

    async fn process_batch(
        &self,
        subscriber: &Subscriber,
        refs: Vec<String>,
        settings: &PipelineConfig,
    ) -> BatchReport {
        let concurrency = settings.item_concurrency.max(1);
        let items = if concurrency == 1 {
            let mut items = Vec::with_capacity(refs.len());
            for cid in refs {
                let outcome = self.process_item(subscriber, &cid, settings).await;
                items.push((cid, outcome));
            }
            items
        } else {
            futures_util::stream::iter(refs)
                .map(|cid| async move {
                    let outcome = self.process_item(subscriber, &cid, settings).await;
                    (cid, outcome)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await
        };
        BatchReport { items }
    }

    async fn process_item(
        &self,
        subscriber: &Subscriber,
        cid: &str,
        settings: &PipelineConfig,
    ) -> ItemOutcome {
        let bytes = match self.deps.fetcher.fetch(cid).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(cid = cid, error = %e, "Content fetch failed, skipping item");
                return ItemOutcome::FetchFailed(e);
            }
        };

        let item = match ContentItem::parse(&bytes) {
            Ok(item) => item,
            Err(e) => {
                warn!(cid = cid, error = %e, "Malformed content, skipping item");
                return ItemOutcome::ParseFailed(e);
            }
        };

        let record = TransactionRecord {
            wallet_address: subscriber.wallet_address.clone(),
            contract_address: item.contract_address,
            transaction_hash: item.transaction_hash,
        };

        match self.deps.records.insert(record.clone(), settings.dedup).await {
            Ok(InsertOutcome::Inserted) => {}
            Ok(InsertOutcome::Duplicate) => {
                debug!(
                    cid = cid,
                    transaction_hash = %record.transaction_hash,
                    "Transaction already recorded, not notifying"
                );
                return ItemOutcome::Duplicate;
            }
            Err(e) => {
                error!(
                    cid = cid,
                    transaction_hash = %record.transaction_hash,
                    error = %e,
                    "Failed to insert transaction record"
                );
                return ItemOutcome::InsertFailed(e);
            }
        }

        let recipient = settings
            .recipient_override
            .as_deref()
            .unwrap_or(&subscriber.email);
        let message = notification_for(&record, recipient);

        match self.deps.notifier.send(&message).await {
            Ok(()) => {
                info!(
                    wallet = %record.wallet_address,
                    transaction_hash = %record.transaction_hash,
                    "Notification sent"
                );
                ItemOutcome::Notified
            }
            Err(e) => {
                warn!(
                    wallet = %record.wallet_address,
                    transaction_hash = %record.transaction_hash,
                    error = %e,
                    "Notification delivery failed"
                );
                ItemOutcome::NotifyFailed(e)
            }
        }
    }
}

impl Processor<LookupKey> for IdentityPipeline {
    type Output = IdentityOutcome;
    type Error = Infallible;
    async fn process(&self, key: LookupKey) -> Result<IdentityOutcome, Infallible> {
        Ok(self.process_key(&key).await)
    }
}
