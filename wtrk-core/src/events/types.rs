//! Notification and key types.

use thiserror::Error;

/// Key pattern of finalized wallet-tracking snapshots, without the keyspace
/// channel prefix.
pub const DEFAULT_KEY_PATTERN: &str = "*:walletTracker:*:wallettracking:finalizedData";

/// Minimum number of `:`-separated segments in a usable key.
const MIN_KEY_SEGMENTS: usize = 4;

/// Position of the `<wallet>_<contract>` segment.
const WALLET_SEGMENT: usize = 3;

/// Channel prefix Redis puts in front of every keyspace notification for `db`.
pub fn keyspace_prefix(db: u32) -> String {
    format!("__keyspace@{db}__:")
}

/// Full channel pattern to `PSUBSCRIBE` to.
pub fn keyspace_pattern(db: u32, key_pattern: &str) -> String {
    format!("{}{}", keyspace_prefix(db), key_pattern)
}

/// Kind of a pub/sub event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Acknowledgement of a (p)subscribe call. Carries no key.
    Subscribe,
    /// Message on a directly subscribed channel.
    Message,
    /// Message delivered through a pattern subscription.
    PatternMessage,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Subscribe => write!(f, "subscribe"),
            NotificationKind::Message => write!(f, "message"),
            NotificationKind::PatternMessage => write!(f, "pmessage"),
        }
    }
}

/// An event received from the change-notification feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub kind: NotificationKind,
    /// Channel name, e.g. `__keyspace@1__:<key>`.
    pub channel: String,
    /// For keyspace notifications this is the command name (`zadd`, `del`, ...).
    pub payload: String,
}

impl ChangeNotification {
    pub fn new(
        kind: NotificationKind,
        channel: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            channel: channel.into(),
            payload: payload.into(),
        }
    }

    /// Whether this event carries a key worth processing.
    pub fn is_message(&self) -> bool {
        matches!(
            self.kind,
            NotificationKind::Message | NotificationKind::PatternMessage
        )
    }

    /// The changed key: the channel with `prefix` removed.
    ///
    /// A channel without the prefix is taken as the key itself.
    pub fn key<'a>(&'a self, prefix: &str) -> &'a str {
        self.channel
            .strip_prefix(prefix)
            .unwrap_or(self.channel.as_str())
    }
}

/// Reasons a key cannot be turned into a [`LookupKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("key has {found} segments, expected at least 4")]
    TooFewSegments { found: usize },

    #[error("key has an empty wallet segment")]
    EmptyWallet,
}

/// Identity recovered from a wallet-tracking key.
///
/// `raw` is the full key (the sorted set holding the content references) and
/// `wallet` is the part of segment 3 before the first `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub raw: String,
    pub wallet: String,
}

impl LookupKey {
    pub fn parse(key: &str) -> Result<Self, KeyParseError> {
        let segments: Vec<&str> = key.split(':').collect();
        if segments.len() < MIN_KEY_SEGMENTS {
            return Err(KeyParseError::TooFewSegments {
                found: segments.len(),
            });
        }

        let wallet = segments[WALLET_SEGMENT]
            .split('_')
            .next()
            .unwrap_or_default();
        if wallet.is_empty() {
            return Err(KeyParseError::EmptyWallet);
        }

        Ok(Self {
            raw: key.to_string(),
            wallet: wallet.to_string(),
        })
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
