//! The session coordinator: a single actor task owning all session state.
//! Inbound lifecycle signals and frames are serialized through one queue, so
//! no two transitions ever interleave mutations on the same session.

mod actor;
mod config;

pub use config::{EngineConfig, LIVE_COACHING_MAX_ITEMS};

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::{AnalysisRuntime, ApiProvider};
use crate::notify::{Notifier, NotificationSink, PermissionLevel};
use crate::provider::AnalysisProvider;
use crate::recorder::{FrameRecorder, RecorderChannel};
use crate::storage::Storage;

use actor::SessionActor;

const EVENT_QUEUE_DEPTH: usize = 32;

/// Inbound events accepted by the coordinator.
pub enum Event {
    MeetingStarted {
        timestamp: DateTime<Utc>,
    },
    FrameAnalysis {
        frame: String,
        timestamp: DateTime<Utc>,
    },
    MeetingEnded {
        timestamp: DateTime<Utc>,
    },
    MonitoringToggle {
        enabled: bool,
    },
    /// Re-localize the stored feed after the display language changed.
    RelocalizeFeed,
    StatusQuery {
        reply: oneshot::Sender<StatusReport>,
    },
}

/// Snapshot answered to status queries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub active: bool,
    pub session_id: Option<String>,
    pub analysis_count: usize,
    pub api_configured: bool,
    pub api_provider: ApiProvider,
    pub monitoring_enabled: bool,
    pub notifications_enabled: bool,
    pub notification_permission: PermissionLevel,
    pub analysis_runtime: AnalysisRuntime,
}

/// Cloneable handle to the coordinator actor. Dropping every handle closes
/// the queue and ends the actor; `shutdown` ends it explicitly.
#[derive(Clone)]
pub struct SessionCoordinator {
    events: mpsc::Sender<Event>,
    cancel_token: CancellationToken,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionCoordinator {
    /// Spawns the actor task. Any previously active session is restored from
    /// storage before the first event is processed.
    pub fn spawn(
        storage: Storage,
        provider: Arc<dyn AnalysisProvider>,
        sink: Arc<dyn NotificationSink>,
        recorder: Option<Arc<dyn FrameRecorder>>,
        config: EngineConfig,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        let notifier = Notifier::new(sink, storage.clone(), config.max_feed_items);
        let recorder_channel = recorder
            .map(|recorder| Arc::new(RecorderChannel::new(recorder, config.notification_cooldown_ms)));

        let actor = SessionActor::new(storage, provider, notifier, recorder_channel, config);
        let handle = tokio::spawn(actor.run(events_rx, cancel_token.clone()));

        Self {
            events: events_tx,
            cancel_token,
            worker: Arc::new(Mutex::new(Some(handle))),
        }
    }

    pub async fn meeting_started(&self, timestamp: DateTime<Utc>) -> Result<()> {
        self.send(Event::MeetingStarted { timestamp }).await
    }

    pub async fn analyze_frame(&self, frame: String, timestamp: DateTime<Utc>) -> Result<()> {
        self.send(Event::FrameAnalysis { frame, timestamp }).await
    }

    pub async fn meeting_ended(&self, timestamp: DateTime<Utc>) -> Result<()> {
        self.send(Event::MeetingEnded { timestamp }).await
    }

    pub async fn set_monitoring(&self, enabled: bool) -> Result<()> {
        self.send(Event::MonitoringToggle { enabled }).await
    }

    pub async fn relocalize_feed(&self) -> Result<()> {
        self.send(Event::RelocalizeFeed).await
    }

    pub async fn status(&self) -> Result<StatusReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Event::StatusQuery { reply: reply_tx }).await?;
        reply_rx
            .await
            .context("coordinator dropped the status reply")
    }

    /// Stops the actor after the event it is currently processing.
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel_token.cancel();
        if let Some(handle) = self.worker.lock().await.take() {
            handle.await.context("coordinator task failed to join")?;
        }
        Ok(())
    }

    async fn send(&self, event: Event) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow!("coordinator event queue closed"))
    }
}
