//! Application state shared across all request handlers.

use std::sync::Arc;
use wtrk_core::config::SharedPipelineConfig;
use wtrk_core::services::{RecordStore, SubscriberDirectory};

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
/// The stores are the same instances the pipeline writes through.
#[derive(Clone)]
pub struct AppState {
    pub subscribers: Arc<dyn SubscriberDirectory>,
    pub records: Arc<dyn RecordStore>,
    /// Pipeline settings (can be reloaded via SIGHUP).
    pub pipeline_config: SharedPipelineConfig,
}

impl AppState {
    pub fn new(
        subscribers: Arc<dyn SubscriberDirectory>,
        records: Arc<dyn RecordStore>,
        pipeline_config: SharedPipelineConfig,
    ) -> Self {
        Self {
            subscribers,
            records,
            pipeline_config,
        }
    }
}
