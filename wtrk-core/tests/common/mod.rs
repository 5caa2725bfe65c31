//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use wtrk_core::config::{self, DedupMode, PipelineConfig, SharedPipelineConfig};
use wtrk_core::entities::{StoredTransactionRecord, Subscriber, TransactionRecord};
use wtrk_core::processors::{IdentityPipeline, PipelineDeps};
use wtrk_core::services::{
    ContentFetcher, ContentIndex, FetchError, IndexError, InsertOutcome, NotificationSender,
    NotifyError, RecordStore, StoreError, SubscriberDirectory,
};
use wtrk_sdk::objects::NotificationMessage;

pub const KEY: &str = "projectID:eth:walletTracker:0xAB_0xCD:wallettracking:finalizedData";
pub const PREFIX: &str = "__keyspace@1__:";

#[derive(Default)]
pub struct MemoryDirectory {
    pub subscribers: Mutex<HashMap<String, Subscriber>>,
    pub lookups: AtomicUsize,
    pub fail: bool,
}

impl MemoryDirectory {
    pub fn with(wallet: &str, email: &str) -> Self {
        let dir = Self::default();
        dir.subscribers.lock().unwrap().insert(
            wallet.to_string(),
            Subscriber {
                wallet_address: wallet.to_string(),
                email: email.to_string(),
            },
        );
        dir
    }
}

#[async_trait]
impl SubscriberDirectory for MemoryDirectory {
    async fn lookup(&self, wallet_address: &str) -> Result<Option<Subscriber>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Backend("directory unavailable".to_string()));
        }
        Ok(self.subscribers.lock().unwrap().get(wallet_address).cloned())
    }

    async fn register(&self, subscriber: Subscriber) -> Result<bool, StoreError> {
        let mut subscribers = self.subscribers.lock().unwrap();
        if subscribers.contains_key(&subscriber.wallet_address) {
            return Ok(false);
        }
        subscribers.insert(subscriber.wallet_address.clone(), subscriber);
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemoryIndex {
    pub sets: HashMap<String, Vec<String>>,
    pub queries: AtomicUsize,
    pub fail: bool,
}

impl MemoryIndex {
    pub fn with(key: &str, refs: &[&str]) -> Self {
        let mut sets = HashMap::new();
        sets.insert(key.to_string(), refs.iter().map(|r| r.to_string()).collect());
        Self {
            sets,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ContentIndex for MemoryIndex {
    async fn range(&self, key: &str) -> Result<Vec<String>, IndexError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(IndexError::Backend("index unavailable".to_string()));
        }
        Ok(self.sets.get(key).cloned().unwrap_or_default())
    }
}

/// Holds every fetch until released.
#[derive(Default)]
pub struct FetchGate {
    pub entered: Notify,
    pub release: Notify,
}

/// Serves fixed bodies; unknown CIDs fail as a gateway 404.
#[derive(Default)]
pub struct MemoryFetcher {
    pub bodies: HashMap<String, Vec<u8>>,
    pub fetches: AtomicUsize,
    pub gate: Option<Arc<FetchGate>>,
}

impl MemoryFetcher {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            bodies: entries
                .iter()
                .map(|(cid, body)| (cid.to_string(), body.as_bytes().to_vec()))
                .collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ContentFetcher for MemoryFetcher {
    async fn fetch(&self, cid: &str) -> Result<Bytes, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        match self.bodies.get(cid) {
            Some(body) if body.is_empty() => Err(FetchError::Empty(cid.to_string())),
            Some(body) => Ok(Bytes::from(body.clone())),
            None => Err(FetchError::Status {
                cid: cid.to_string(),
                status: 404,
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryRecords {
    pub rows: Mutex<Vec<TransactionRecord>>,
    pub attempts: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl RecordStore for MemoryRecords {
    async fn insert(
        &self,
        record: TransactionRecord,
        mode: DedupMode,
    ) -> Result<InsertOutcome, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Backend("insert failed".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        if mode == DedupMode::Strict
            && rows.iter().any(|r| {
                r.wallet_address == record.wallet_address
                    && r.transaction_hash == record.transaction_hash
            })
        {
            return Ok(InsertOutcome::Duplicate);
        }
        rows.push(record);
        Ok(InsertOutcome::Inserted)
    }

    async fn find_by_hash(
        &self,
        transaction_hash: &str,
    ) -> Result<Vec<StoredTransactionRecord>, StoreError> {
        let now = time::OffsetDateTime::now_utc();
        let created_at = time::PrimitiveDateTime::new(now.date(), now.time());
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.transaction_hash == transaction_hash)
            .map(|(i, r)| StoredTransactionRecord {
                id: i as i64 + 1,
                wallet_address: r.wallet_address.clone(),
                contract_address: r.contract_address.clone(),
                transaction_hash: r.transaction_hash.clone(),
                created_at,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryNotifier {
    pub sent: Mutex<Vec<NotificationMessage>>,
    pub attempts: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl NotificationSender for MemoryNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotifyError::Transport("smtp relay down".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Every collaborator of one pipeline, kept so tests can inspect them.
pub struct Harness {
    pub directory: Arc<MemoryDirectory>,
    pub index: Arc<MemoryIndex>,
    pub fetcher: Arc<MemoryFetcher>,
    pub records: Arc<MemoryRecords>,
    pub notifier: Arc<MemoryNotifier>,
    pub config: SharedPipelineConfig,
}

impl Harness {
    pub fn new(
        directory: MemoryDirectory,
        index: MemoryIndex,
        fetcher: MemoryFetcher,
        records: MemoryRecords,
        notifier: MemoryNotifier,
    ) -> Self {
        Self {
            directory: Arc::new(directory),
            index: Arc::new(index),
            fetcher: Arc::new(fetcher),
            records: Arc::new(records),
            notifier: Arc::new(notifier),
            config: config::shared(PipelineConfig::default()),
        }
    }

    /// Registered `0xAB`, `KEY` holding `refs`, and the given bodies.
    pub fn registered(refs: &[&str], bodies: &[(&str, &str)]) -> Self {
        Self::new(
            MemoryDirectory::with("0xAB", "owner@example.com"),
            MemoryIndex::with(KEY, refs),
            MemoryFetcher::with(bodies),
            MemoryRecords::default(),
            MemoryNotifier::default(),
        )
    }

    pub fn pipeline(&self) -> IdentityPipeline {
        IdentityPipeline::new(
            PipelineDeps {
                subscribers: self.directory.clone(),
                index: self.index.clone(),
                fetcher: self.fetcher.clone(),
                records: self.records.clone(),
                notifier: self.notifier.clone(),
            },
            self.config.clone(),
        )
    }

    pub async fn set_config(&self, config: PipelineConfig) {
        *self.config.write().await = config;
    }

    pub fn rows(&self) -> Vec<TransactionRecord> {
        self.records.rows.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<NotificationMessage> {
        self.notifier.sent.lock().unwrap().clone()
    }

    pub fn insert_attempts(&self) -> usize {
        self.records.attempts.load(Ordering::SeqCst)
    }

    pub fn notify_attempts(&self) -> usize {
        self.notifier.attempts.load(Ordering::SeqCst)
    }

    /// Total calls made to any collaborator.
    pub fn downstream_calls(&self) -> usize {
        self.directory.lookups.load(Ordering::SeqCst)
            + self.index.queries.load(Ordering::SeqCst)
            + self.fetcher.fetches.load(Ordering::SeqCst)
            + self.insert_attempts()
            + self.notify_attempts()
    }
}

pub fn item(contract: &str, hash: &str) -> String {
    format!(r#"{{"contract_address":"{contract}","transactionHash":"{hash}"}}"#)
}
