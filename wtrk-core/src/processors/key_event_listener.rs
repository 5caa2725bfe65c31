//! KeyEventListener processor.
//!
//! The KeyEventListener is responsible for:
//! - Pulling `ChangeNotification`s from a `NotificationSource`, one at a time
//! - Ignoring anything that is not a (pattern) message
//! - Parsing the key into a `LookupKey`, discarding malformed keys
//! - Running the `IdentityPipeline` to completion for every accepted key
//! - Closing the source once shutdown is signaled or the feed ends
//!
//! Shutdown is only observed between notifications, so a batch that has
//! started always finishes.

use super::identity_pipeline::{IdentityOutcome, IdentityPipeline};
use crate::events::{ChangeNotification, KeyParseError, LookupKey, NotificationSource};
use kanau::processor::Processor;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What the listener did with one notification.
#[derive(Debug)]
pub enum NotificationOutcome {
    /// Not a message (e.g. a subscribe acknowledgement).
    Ignored,
    /// The key could not be parsed; nothing downstream was called.
    Malformed(KeyParseError),
    Handled(IdentityOutcome),
}

/// Counters accumulated over the listener's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub received: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub handled: u64,
}

/// Single consumer of the change-notification feed.
pub struct KeyEventListener<S: NotificationSource> {
    source: S,
    pipeline: IdentityPipeline,
    keyspace_prefix: String,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: NotificationSource> KeyEventListener<S> {
    /// Create a new KeyEventListener.
    ///
    /// # Arguments
    ///
    /// * `source` - Feed of change notifications
    /// * `pipeline` - Per-identity processing
    /// * `keyspace_prefix` - Channel prefix stripped to recover the key
    /// * `shutdown_rx` - Receiver for shutdown signal
    pub fn new(
        source: S,
        pipeline: IdentityPipeline,
        keyspace_prefix: impl Into<String>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            pipeline,
            keyspace_prefix: keyspace_prefix.into(),
            shutdown_rx,
        }
    }

    /// Run the KeyEventListener until shutdown or until the feed ends.
    pub async fn run(self) -> ListenerStats {
        let Self {
            mut source,
            pipeline,
            keyspace_prefix,
            mut shutdown_rx,
        } = self;
        let mut stats = ListenerStats::default();

        info!("KeyEventListener started");

        loop {
            tokio::select! {
                biased;

                // Check for shutdown
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("KeyEventListener received shutdown signal");
                        break;
                    }
                }

                next = source.next_notification() => {
                    let Some(notification) = next else {
                        info!("Notification feed closed");
                        break;
                    };
                    stats.received += 1;
                    match handle_notification(&pipeline, &keyspace_prefix, notification).await {
                        NotificationOutcome::Ignored => stats.ignored += 1,
                        NotificationOutcome::Malformed(_) => stats.malformed += 1,
                        NotificationOutcome::Handled(_) => stats.handled += 1,
                    }
                }
            }
        }

        source.close().await;

        info!(
            received = stats.received,
            handled = stats.handled,
            malformed = stats.malformed,
            ignored = stats.ignored,
            "KeyEventListener shutdown complete"
        );
        stats
    }
}

/// Handle one notification: filter, parse, and run the pipeline.
pub async fn handle_notification(
    pipeline: &IdentityPipeline,
    keyspace_prefix: &str,
    notification: ChangeNotification,
) -> NotificationOutcome {
    if !notification.is_message() {
        debug!(
            kind = %notification.kind,
            channel = %notification.channel,
            "Ignoring non-message event"
        );
        return NotificationOutcome::Ignored;
    }

    let key = notification.key(keyspace_prefix);
    let lookup = match LookupKey::parse(key) {
        Ok(lookup) => lookup,
        Err(e) => {
            warn!(key = key, error = %e, "Discarding notification with malformed key");
            return NotificationOutcome::Malformed(e);
        }
    };

    debug!(wallet = %lookup.wallet, key = %lookup, event = %notification.payload, "Key changed");
    match pipeline.process(lookup).await {
        Ok(outcome) => NotificationOutcome::Handled(outcome),
        Err(never) => match never {},
    }
}
