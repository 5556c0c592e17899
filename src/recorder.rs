//! Best-effort frame mirroring to a local recorder. The side channel runs as
//! an independently spawned task per frame: its failures are logged and
//! surfaced as feed notices, never awaited or propagated by the analysis
//! transition that triggered it.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use tokio::sync::Mutex;

use crate::models::{Delivery, FeedCategory, FeedItem};
use crate::notify::{should_notify, Notifier};

#[async_trait]
pub trait FrameRecorder: Send + Sync {
    async fn record(&self, frame: &str, session_id: &str, timestamp: DateTime<Utc>) -> Result<()>;
}

struct RecorderState {
    connected: bool,
    last_error_notice_ms: i64,
}

/// Wraps a [`FrameRecorder`] with offline/restored tracking: the first
/// failure after a healthy stretch posts an offline notice (rate-limited by
/// its own cooldown clock), and the first success after failures posts a
/// restored notice.
pub struct RecorderChannel {
    recorder: Arc<dyn FrameRecorder>,
    state: Mutex<RecorderState>,
    cooldown_ms: i64,
}

impl RecorderChannel {
    pub fn new(recorder: Arc<dyn FrameRecorder>, cooldown_ms: i64) -> Self {
        Self {
            recorder,
            state: Mutex::new(RecorderState {
                connected: true,
                last_error_notice_ms: 0,
            }),
            cooldown_ms,
        }
    }

    /// Fire-and-forget mirror of one frame.
    pub fn spawn_record(
        self: Arc<Self>,
        frame: String,
        session_id: String,
        timestamp: DateTime<Utc>,
        notifier: Notifier,
    ) {
        tokio::spawn(async move {
            self.record_once(&frame, &session_id, timestamp, &notifier)
                .await;
        });
    }

    async fn record_once(
        &self,
        frame: &str,
        session_id: &str,
        timestamp: DateTime<Utc>,
        notifier: &Notifier,
    ) {
        match self.recorder.record(frame, session_id, timestamp).await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                if state.connected {
                    return;
                }
                state.connected = true;
                drop(state);

                notifier
                    .append_feed_item(FeedItem::new(
                        "frame-recorder-restored",
                        "Frame Recorder Connected",
                        "Captured frames are being mirrored to the local recorder again.",
                        FeedCategory::System,
                        timestamp,
                        Delivery::InApp,
                    ))
                    .await;
            }
            Err(err) => {
                warn!("Local frame recorder unavailable: {err:#}");

                let now_ms = timestamp.timestamp_millis();
                let mut state = self.state.lock().await;
                if !should_notify(now_ms, state.last_error_notice_ms, self.cooldown_ms) {
                    return;
                }
                state.last_error_notice_ms = now_ms;
                state.connected = false;
                drop(state);

                notifier
                    .append_feed_item(FeedItem::new(
                        "frame-recorder-error",
                        "Frame Recorder Offline",
                        "Captured frames are not being mirrored; check the local recorder.",
                        FeedCategory::System,
                        timestamp,
                        Delivery::InApp,
                    ))
                    .await;
            }
        }
    }
}
