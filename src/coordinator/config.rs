use tokio::time::Duration;

use crate::analysis::classify::CONSECUTIVE_WARNINGS;
use crate::analysis::suggestions::DEFAULT_SUGGESTION_LIMIT;
use crate::notify::NOTIFICATION_COOLDOWN_MS;

/// Ring size of the persisted live-coaching feed, newest first.
pub const LIVE_COACHING_MAX_ITEMS: usize = 50;

/// Liveness bound on the external analysis call. A stalled provider counts
/// as a transport failure for that frame instead of blocking the queue.
const ANALYSIS_TIMEOUT_SECS: u64 = 45;

/// Engine tunables with production defaults. Tests shrink the cooldowns.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub notification_cooldown_ms: i64,
    pub consecutive_warnings: u32,
    pub suggestion_limit: usize,
    pub max_feed_items: usize,
    pub analysis_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            notification_cooldown_ms: NOTIFICATION_COOLDOWN_MS,
            consecutive_warnings: CONSECUTIVE_WARNINGS,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            max_feed_items: LIVE_COACHING_MAX_ITEMS,
            analysis_timeout: Duration::from_secs(ANALYSIS_TIMEOUT_SECS),
        }
    }
}
