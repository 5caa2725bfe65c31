//! Runtime configuration shared between the server and the pipeline.
//!
//! Loading and validation live in the server crate. The `[pipeline]` section
//! is held behind a lock so it can be swapped on SIGHUP without restarting
//! the listener.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// How the pipeline writes transaction records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupMode {
    /// Insert every processed item. Re-delivered notifications produce
    /// duplicate records and duplicate emails.
    #[default]
    Unconditional,
    /// Insert only when no record with the same wallet and transaction hash
    /// exists. Duplicates are skipped without a notification.
    Strict,
}

impl std::fmt::Display for DedupMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupMode::Unconditional => write!(f, "unconditional"),
            DedupMode::Strict => write!(f, "strict"),
        }
    }
}

/// Settings read by [`IdentityPipeline`](crate::processors::IdentityPipeline)
/// at the start of every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub dedup: DedupMode,
    /// Maximum number of content references processed at once within one
    /// batch. `1` processes them strictly one after another.
    pub item_concurrency: usize,
    /// Send every notification here instead of to the subscriber's email.
    pub recipient_override: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dedup: DedupMode::Unconditional,
            item_concurrency: 1,
            recipient_override: None,
        }
    }
}

/// Pipeline configuration behind a shared lock.
pub type SharedPipelineConfig = Arc<RwLock<PipelineConfig>>;

pub fn shared(config: PipelineConfig) -> SharedPipelineConfig {
    Arc::new(RwLock::new(config))
}
