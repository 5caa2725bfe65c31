//! Processors driving the notification pipeline.
//!
//! - `KeyEventListener`: pulls `ChangeNotification`s, parses their keys, and
//!   hands each `LookupKey` to the pipeline
//! - `IdentityPipeline`: for one wallet, fetches every content reference and
//!   records and notifies each new transaction

pub mod identity_pipeline;
pub mod key_event_listener;

pub use identity_pipeline::{
    BatchReport, IdentityOutcome, IdentityPipeline, ItemOutcome, PipelineDeps, notification_for,
};
pub use key_event_listener::{
    KeyEventListener, ListenerStats, NotificationOutcome, handle_notification,
};
