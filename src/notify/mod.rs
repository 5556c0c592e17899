//! Notification delivery: every coaching event is recorded in the persisted
//! feed unconditionally; a system-level notification is attempted only when
//! the user allows it and the relevant cooldown has elapsed.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::{Delivery, FeedItem};
use crate::storage::Storage;

/// Default minimum wall-clock interval between system notifications of the
/// same tier.
pub const NOTIFICATION_COOLDOWN_MS: i64 = 120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Granted,
    Denied,
    Unknown,
}

/// Platform notification surface. Implementations wrap whatever the host
/// environment offers; a `show` returning `false` means the platform
/// accepted the call but displayed nothing.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn permission_level(&self) -> PermissionLevel;
    async fn show(&self, id: &str, title: &str, message: &str, priority: u8) -> Result<bool>;
}

/// Cooldown check: true iff more than `cooldown_ms` elapsed since `last_ms`.
/// Plain wall-clock comparison, so no timers need scheduling or cancelling.
pub fn should_notify(now_ms: i64, last_ms: i64, cooldown_ms: i64) -> bool {
    now_ms - last_ms > cooldown_ms
}

/// What actually happened to a system-notification attempt.
#[derive(Debug)]
pub enum ShowOutcome {
    Shown,
    Blocked(String),
    Failed(String),
}

impl ShowOutcome {
    pub fn delivered(&self) -> bool {
        matches!(self, ShowOutcome::Shown)
    }
}

/// Shared delivery plumbing: feed persistence plus the system notification
/// channel. Cooldown clocks stay with the coordinator; this type only
/// executes a decision already made.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    storage: Storage,
    max_feed_items: usize,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, storage: Storage, max_feed_items: usize) -> Self {
        Self {
            sink,
            storage,
            max_feed_items,
        }
    }

    pub async fn permission_level(&self) -> PermissionLevel {
        self.sink.permission_level().await
    }

    /// Prepends an item to the persisted feed, trimming to the ring size.
    /// Persistence failures are logged and swallowed.
    pub async fn append_feed_item(&self, item: FeedItem) {
        let result = async {
            let mut feed = self.storage.get_live_coaching_feed().await?;
            feed.insert(0, item);
            feed.truncate(self.max_feed_items);
            self.storage.save_live_coaching_feed(&feed).await
        }
        .await;

        if let Err(err) = result {
            warn!("Failed to append live coaching item: {err:#}");
        }
    }

    /// Attempts a system notification for an already-localized item. When
    /// `record_to_feed` is set the outcome also lands in the feed with the
    /// matching delivery tag; callers that have already recorded an in-app
    /// entry pass `false`.
    pub async fn show(&self, item: &FeedItem, priority: u8, record_to_feed: bool) -> ShowOutcome {
        if self.sink.permission_level().await == PermissionLevel::Denied {
            if record_to_feed {
                let mut entry = item.clone();
                entry.delivery = Delivery::Blocked;
                self.append_feed_item(entry).await;
            }
            return ShowOutcome::Blocked(
                "System notifications are blocked for this application".to_string(),
            );
        }

        let outcome = match self
            .sink
            .show(&item.id, &item.title, &item.message, priority)
            .await
        {
            Ok(true) => ShowOutcome::Shown,
            Ok(false) => ShowOutcome::Failed("Notification was not displayed".to_string()),
            Err(err) => ShowOutcome::Failed(format!("{err:#}")),
        };

        if record_to_feed {
            let mut entry = item.clone();
            entry.delivery = match outcome {
                ShowOutcome::Shown => Delivery::Shown,
                _ => Delivery::Failed,
            };
            self.append_feed_item(entry).await;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_gates_on_strict_elapsed_time() {
        assert!(should_notify(200_000, 0, 120_000));
        assert!(!should_notify(120_000, 0, 120_000));
        assert!(!should_notify(100_000, 99_000, 120_000));
        // A clock that never fired (epoch zero) passes immediately.
        assert!(should_notify(NOTIFICATION_COOLDOWN_MS + 1, 0, NOTIFICATION_COOLDOWN_MS));
    }
}
