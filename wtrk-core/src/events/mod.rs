//! Change-notification feed consumed by the key event listener.
//!
//! # Event Flow
//!
//! 1. A wallet-tracking sorted set is written in Redis
//! 2. Redis emits a keyspace notification on `__keyspace@<db>__:<key>`
//! 3. A [`NotificationSource`] yields it as a [`ChangeNotification`]
//! 4. `KeyEventListener` parses the key into a [`LookupKey`] and hands it to
//!    `IdentityPipeline`
//!
//! Notifications are ephemeral and carry only the key. The pipeline re-reads
//! the sorted set for every notification it accepts.

pub mod channels;
pub mod source;
pub mod types;

pub use channels::{
    ChangeNotificationSender, ChannelSource, DEFAULT_CHANNEL_BUFFER, notification_channel,
};
pub use source::{NotificationSource, RedisKeyspaceSource, SubscriptionError};
pub use types::{
    ChangeNotification, DEFAULT_KEY_PATTERN, KeyParseError, LookupKey, NotificationKind,
    keyspace_pattern, keyspace_prefix,
};
