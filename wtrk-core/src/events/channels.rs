//! In-process notification feed.
//!
//! [`ChannelSource`] adapts a tokio mpsc receiver to [`NotificationSource`],
//! so the listener can be driven by any producer, not only Redis.

use super::source::NotificationSource;
use super::types::ChangeNotification;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Default buffer size for notification channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle feeding a [`ChannelSource`].
pub type ChangeNotificationSender = mpsc::Sender<ChangeNotification>;

/// Notification source backed by an mpsc channel.
///
/// The feed ends once every sender has been dropped and the buffer drained.
pub struct ChannelSource {
    rx: mpsc::Receiver<ChangeNotification>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<ChangeNotification>) -> Self {
        Self { rx }
    }
}

/// Create a new notification channel.
///
/// Returns a (sender, source) pair.
pub fn notification_channel() -> (ChangeNotificationSender, ChannelSource) {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_BUFFER);
    (tx, ChannelSource::new(rx))
}

#[async_trait]
impl NotificationSource for ChannelSource {
    async fn next_notification(&mut self) -> Option<ChangeNotification> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}
