use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::analysis::{build_encouragement, classify, extract_top, validate, WarningTracker};
use crate::coordinator::{EngineConfig, Event, StatusReport};
use crate::i18n::{Language, Localizer};
use crate::models::{
    AnalysisResult, AnalysisRuntime, Delivery, FeedCategory, FeedItem, Session, Settings,
};
use crate::notify::{should_notify, Notifier, ShowOutcome};
use crate::provider::{is_rate_limit_message, AnalysisProvider};
use crate::recorder::RecorderChannel;
use crate::storage::Storage;

/// Owns every piece of mutable session state. Runs on one task; events are
/// handled strictly one at a time.
pub(crate) struct SessionActor {
    storage: Storage,
    provider: Arc<dyn AnalysisProvider>,
    notifier: Notifier,
    recorder: Option<Arc<RecorderChannel>>,
    config: EngineConfig,

    current_session: Option<Session>,
    warning_tracker: WarningTracker,
    runtime: AnalysisRuntime,
    last_notification_time: i64,
    last_error_notification_time: i64,
    last_encouragement_time: i64,
    session_restored: bool,
}

impl SessionActor {
    pub(crate) fn new(
        storage: Storage,
        provider: Arc<dyn AnalysisProvider>,
        notifier: Notifier,
        recorder: Option<Arc<RecorderChannel>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            notifier,
            recorder,
            config,
            current_session: None,
            warning_tracker: WarningTracker::new(),
            runtime: AnalysisRuntime::default(),
            last_notification_time: 0,
            last_error_notification_time: 0,
            last_encouragement_time: 0,
            session_restored: false,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut events: mpsc::Receiver<Event>,
        cancel_token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Session coordinator shutting down");
                    break;
                }
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            self.restore_session().await;
                            self.handle(event).await;
                        }
                        None => break,
                    }
                }
            }
        }
    }

    async fn handle(&mut self, event: Event) {
        match event {
            Event::MeetingStarted { timestamp } => self.handle_meeting_started(timestamp).await,
            Event::FrameAnalysis { frame, timestamp } => {
                self.handle_frame_analysis(frame, timestamp).await
            }
            Event::MeetingEnded { timestamp } => self.handle_meeting_ended(timestamp).await,
            Event::MonitoringToggle { enabled } => self.handle_monitoring_toggle(enabled).await,
            Event::RelocalizeFeed => self.handle_relocalize_feed().await,
            Event::StatusQuery { reply } => {
                let _ = reply.send(self.build_status().await);
            }
        }
    }

    /// One-shot restore of a session that was active when the process last
    /// went down. Runs before the first event only.
    async fn restore_session(&mut self) {
        if self.session_restored {
            return;
        }
        self.session_restored = true;

        match self.storage.get_current_session().await {
            Ok(Some(session)) if self.current_session.is_none() => {
                info!("Restored active session {}", session.id);
                self.current_session = Some(session);
            }
            Ok(_) => {}
            Err(err) => warn!("Failed to restore session from storage: {err:#}"),
        }
    }

    async fn handle_meeting_started(&mut self, timestamp: DateTime<Utc>) {
        if self.current_session.is_some() {
            return;
        }

        let settings = self.settings().await;
        if !settings.monitoring_enabled {
            return;
        }

        // A fresh meeting invalidates whatever summary the last one left.
        if let Err(err) = self.storage.clear_summary_session().await {
            warn!("Failed to clear summary session: {err:#}");
        }

        let session = Session::begin(timestamp);
        info!("Meeting started: {}", session.id);
        self.current_session = Some(session);
        self.runtime = AnalysisRuntime::default();
        self.warning_tracker = WarningTracker::new();
        self.persist_current_session().await;

        let mut item = FeedItem::new(
            "meeting-start",
            "Meeting Monitoring Started",
            "Live coaching is now tracking your meeting.",
            FeedCategory::System,
            timestamp,
            Delivery::InApp,
        );
        Localizer::new(self.provider.as_ref(), &settings)
            .localize(&mut item, Language::EnCa)
            .await;
        self.notifier.append_feed_item(item).await;
    }

    async fn handle_frame_analysis(&mut self, frame: String, timestamp: DateTime<Utc>) {
        if self.current_session.is_none() {
            self.handle_meeting_started(timestamp).await;
        }
        // Monitoring disabled makes the synthesized start a no-op.
        if self.current_session.is_none() {
            return;
        }

        let settings = self.settings().await;
        if !settings.monitoring_enabled {
            return;
        }

        self.runtime.mark_attempt(Utc::now());

        if !settings.api_configured() {
            self.handle_missing_api_key(timestamp, &settings).await;
            return;
        }

        if let (Some(channel), Some(session)) = (&self.recorder, &self.current_session) {
            Arc::clone(channel).spawn_record(
                frame.clone(),
                session.id.clone(),
                timestamp,
                self.notifier.clone(),
            );
        }

        let analyze = self.provider.analyze(
            &frame,
            &settings.api_key,
            settings.api_provider,
            settings.language,
        );
        let mut raw = match tokio::time::timeout(self.config.analysis_timeout, analyze).await {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                self.handle_analysis_failure(format!("{err:#}"), &settings).await;
                return;
            }
            Err(_) => {
                let message = format!(
                    "Analysis timed out after {}s",
                    self.config.analysis_timeout.as_secs()
                );
                self.handle_analysis_failure(message, &settings).await;
                return;
            }
        };

        if !validate(&mut raw) {
            self.handle_analysis_failure(
                "Invalid analysis response structure".to_string(),
                &settings,
            )
            .await;
            return;
        }
        let mut analysis = match AnalysisResult::from_value(raw) {
            Ok(analysis) => analysis,
            Err(err) => {
                self.handle_analysis_failure(
                    format!("Invalid analysis response structure: {err:#}"),
                    &settings,
                )
                .await;
                return;
            }
        };
        analysis.timestamp = Some(timestamp);

        let now = Utc::now();
        self.runtime.mark_success(now);
        if let Some(session) = self.current_session.as_mut() {
            session.analyses.push(analysis.clone());
        }
        self.persist_current_session().await;

        self.check_for_issues(&analysis, &settings, now).await;
    }

    /// Missing credential: one "setup required" notification per session,
    /// tracked on the session itself so a restart does not re-nag.
    async fn handle_missing_api_key(&mut self, timestamp: DateTime<Utc>, settings: &Settings) {
        self.runtime
            .mark_failure(Utc::now(), "API key missing in saved settings");

        let already_warned = self
            .current_session
            .as_ref()
            .map(|session| session.no_key_warning_shown)
            .unwrap_or(true);
        if already_warned {
            return;
        }

        let mut item = FeedItem::new(
            "coach",
            "Setup Required",
            "Add your API key in the coach settings to enable analysis.",
            FeedCategory::Error,
            timestamp,
            Delivery::InApp,
        );
        Localizer::new(self.provider.as_ref(), settings)
            .localize(&mut item, Language::EnCa)
            .await;
        self.show_notice(&item, 1, true).await;

        if let Some(session) = self.current_session.as_mut() {
            session.no_key_warning_shown = true;
        }
        self.persist_current_session().await;
    }

    /// Transport and validation failures share one path: count, log, and
    /// notify under the error cooldown. Rate-limited providers stay silent.
    async fn handle_analysis_failure(&mut self, message: String, settings: &Settings) {
        error!("Frame analysis error: {message}");

        let now = Utc::now();
        self.runtime.mark_failure(now, message.clone());

        if is_rate_limit_message(&message) {
            return;
        }

        let now_ms = now.timestamp_millis();
        if !should_notify(
            now_ms,
            self.last_error_notification_time,
            self.config.notification_cooldown_ms,
        ) {
            return;
        }
        self.last_error_notification_time = now_ms;

        let mut item = FeedItem::new(
            "coach",
            "Analysis Error",
            "Failed to analyze frame. Check your API key, provider, and network connection.",
            FeedCategory::Error,
            now,
            Delivery::InApp,
        );
        Localizer::new(self.provider.as_ref(), settings)
            .localize(&mut item, Language::EnCa)
            .await;
        self.show_notice(&item, 1, true).await;
    }

    async fn check_for_issues(
        &mut self,
        analysis: &AnalysisResult,
        settings: &Settings,
        now: DateTime<Utc>,
    ) {
        let classification = classify(
            analysis,
            settings.sensitivity,
            self.config.consecutive_warnings,
            &mut self.warning_tracker,
        );

        let now_ms = now.timestamp_millis();
        let cooldown_expired = should_notify(
            now_ms,
            self.last_notification_time,
            self.config.notification_cooldown_ms,
        );

        // Critical issues take priority: warnings from the same pass are not
        // separately escalated.
        if !classification.critical.is_empty() {
            let suggestions =
                extract_top(analysis, &classification.critical, self.config.suggestion_limit);
            let message = if suggestions.is_empty() {
                "Critical body language issue detected.".to_string()
            } else {
                suggestions.join("; ")
            };

            let mut item = FeedItem::new(
                "critical",
                "Critical Body Language Alert",
                message,
                FeedCategory::Critical,
                now,
                Delivery::InApp,
            );
            Localizer::new(self.provider.as_ref(), settings)
                .localize(&mut item, settings.language)
                .await;
            self.notifier.append_feed_item(item.clone()).await;

            if !settings.notifications_enabled || !cooldown_expired {
                return;
            }
            if self.show_notice(&item, 2, false).await {
                self.last_notification_time = now_ms;
            }
            return;
        }

        if !classification.warnings.is_empty() {
            let suggestions =
                extract_top(analysis, &classification.warnings, self.config.suggestion_limit);
            let message = if suggestions.is_empty() {
                "Body language needs improvement.".to_string()
            } else {
                suggestions.join("; ")
            };

            let mut item = FeedItem::new(
                "warning",
                "Body Language Tip",
                message,
                FeedCategory::Warning,
                now,
                Delivery::InApp,
            );
            Localizer::new(self.provider.as_ref(), settings)
                .localize(&mut item, settings.language)
                .await;
            self.notifier.append_feed_item(item.clone()).await;

            if !settings.notifications_enabled || !cooldown_expired {
                return;
            }
            if self.show_notice(&item, 1, false).await {
                self.last_notification_time = now_ms;
            }
            return;
        }

        // All clear: feed-only positive reinforcement on its own clock.
        if let Some(text) = build_encouragement(analysis) {
            if should_notify(
                now_ms,
                self.last_encouragement_time,
                self.config.notification_cooldown_ms,
            ) {
                self.last_encouragement_time = now_ms;
                let mut item = FeedItem::new(
                    "encourage",
                    "Positive Check-in",
                    text,
                    FeedCategory::Info,
                    now,
                    Delivery::InApp,
                );
                Localizer::new(self.provider.as_ref(), settings)
                    .localize(&mut item, Language::EnCa)
                    .await;
                self.notifier.append_feed_item(item).await;
            }
        }
    }

    async fn handle_meeting_ended(&mut self, timestamp: DateTime<Utc>) {
        let Some(mut session) = self.current_session.take() else {
            return;
        };
        session.end_time = Some(timestamp);

        let settings = self.settings().await;
        let has_data = session.has_data();

        self.archive_session(&session, has_data, &settings).await;
        if let Err(err) = self.storage.clear_current_session().await {
            warn!("Failed to clear current session: {err:#}");
        }
        self.warning_tracker = WarningTracker::new();

        if has_data {
            let message = format!(
                "{} minutes monitored. Summary report is ready.",
                session.duration_minutes()
            );
            let mut item = FeedItem::new(
                "summary-ready",
                "Meeting Ended",
                message,
                FeedCategory::System,
                timestamp,
                Delivery::InApp,
            );
            Localizer::new(self.provider.as_ref(), &settings)
                .localize(&mut item, Language::EnCa)
                .await;
            self.show_notice(&item, 1, true).await;
        }

        let mut end_item = FeedItem::new(
            "meeting-end",
            "Meeting Monitoring Ended",
            if has_data {
                "Summary report is ready."
            } else {
                "No analyzable frames captured this session."
            },
            FeedCategory::System,
            timestamp,
            Delivery::InApp,
        );
        Localizer::new(self.provider.as_ref(), &settings)
            .localize(&mut end_item, Language::EnCa)
            .await;
        self.notifier.append_feed_item(end_item).await;

        info!("Meeting ended: {} ({} analyses)", session.id, session.analyses.len());
    }

    async fn handle_monitoring_toggle(&mut self, enabled: bool) {
        let mut settings = self.settings().await;
        settings.monitoring_enabled = enabled;
        if let Err(err) = self.storage.save_settings(&settings).await {
            warn!("Failed to persist monitoring setting: {err:#}");
        }

        let now = Utc::now();
        if enabled {
            let mut item = FeedItem::new(
                "monitoring-on",
                "Monitoring Turned On",
                "Join a meeting to resume live coaching.",
                FeedCategory::System,
                now,
                Delivery::InApp,
            );
            Localizer::new(self.provider.as_ref(), &settings)
                .localize(&mut item, Language::EnCa)
                .await;
            self.notifier.append_feed_item(item).await;
            return;
        }

        self.stop_session_silently(now, &settings).await;
        let mut item = FeedItem::new(
            "monitoring-off",
            "Monitoring Turned Off",
            "Live coaching is paused until you turn it back on.",
            FeedCategory::System,
            now,
            Delivery::InApp,
        );
        Localizer::new(self.provider.as_ref(), &settings)
            .localize(&mut item, Language::EnCa)
            .await;
        self.notifier.append_feed_item(item).await;
    }

    /// Same closing logic as a meeting end, minus every user-facing
    /// meeting-ended notice.
    async fn stop_session_silently(&mut self, timestamp: DateTime<Utc>, settings: &Settings) {
        let Some(mut session) = self.current_session.take() else {
            if let Err(err) = self.storage.clear_current_session().await {
                warn!("Failed to clear current session: {err:#}");
            }
            return;
        };
        session.end_time = Some(timestamp);

        let has_data = session.has_data();
        self.archive_session(&session, has_data, settings).await;
        if let Err(err) = self.storage.clear_current_session().await {
            warn!("Failed to clear current session: {err:#}");
        }
        self.warning_tracker = WarningTracker::new();
    }

    /// Persists a closed session: summary slot always (when data exists),
    /// permanent history + retention sweep unless ephemeral mode is on.
    async fn archive_session(&self, session: &Session, has_data: bool, settings: &Settings) {
        if !has_data {
            if let Err(err) = self.storage.clear_summary_session().await {
                warn!("Failed to clear summary session: {err:#}");
            }
            return;
        }

        if let Err(err) = self.storage.save_summary_session(session).await {
            warn!("Failed to save summary session: {err:#}");
        }
        if settings.ephemeral_mode {
            return;
        }
        if let Err(err) = self.storage.add_session(session).await {
            warn!("Failed to append session history: {err:#}");
        }
        self.apply_data_retention(settings.data_retention_days).await;
    }

    /// Drops historical sessions whose end time is older than the retention
    /// window. A zero-day setting disables the sweep.
    async fn apply_data_retention(&self, retention_days: u32) {
        if retention_days == 0 {
            return;
        }

        let sessions = match self.storage.get_sessions().await {
            Ok(sessions) => sessions,
            Err(err) => {
                warn!("Failed to load session history for retention sweep: {err:#}");
                return;
            }
        };

        let cutoff = Utc::now() - chrono::Duration::days(retention_days as i64);
        let kept: Vec<Session> = sessions
            .iter()
            .filter(|session| session.end_time.map(|end| end >= cutoff).unwrap_or(false))
            .cloned()
            .collect();

        if kept.len() != sessions.len() {
            info!(
                "Retention sweep dropped {} of {} sessions",
                sessions.len() - kept.len(),
                sessions.len()
            );
            if let Err(err) = self.storage.save_sessions(&kept).await {
                warn!("Failed to save swept session history: {err:#}");
            }
        }
    }

    async fn handle_relocalize_feed(&mut self) {
        let settings = self.settings().await;
        let mut feed = match self.storage.get_live_coaching_feed().await {
            Ok(feed) => feed,
            Err(err) => {
                warn!("Failed to load feed for re-localization: {err:#}");
                return;
            }
        };

        let changed = Localizer::new(self.provider.as_ref(), &settings)
            .relocalize_feed(&mut feed)
            .await;
        if changed > 0 {
            if let Err(err) = self.storage.save_live_coaching_feed(&feed).await {
                warn!("Failed to save re-localized feed: {err:#}");
            }
        }
    }

    async fn build_status(&mut self) -> StatusReport {
        let settings = self.settings().await;
        StatusReport {
            active: settings.monitoring_enabled && self.current_session.is_some(),
            session_id: self.current_session.as_ref().map(|s| s.id.clone()),
            analysis_count: self
                .current_session
                .as_ref()
                .map(|s| s.analyses.len())
                .unwrap_or(0),
            api_configured: settings.api_configured(),
            api_provider: settings.api_provider,
            monitoring_enabled: settings.monitoring_enabled,
            notifications_enabled: settings.notifications_enabled,
            notification_permission: self.notifier.permission_level().await,
            analysis_runtime: self.runtime.clone(),
        }
    }

    /// Attempts the system notification and folds the outcome into the
    /// runtime error slot. Returns whether it was actually displayed.
    async fn show_notice(&mut self, item: &FeedItem, priority: u8, record_to_feed: bool) -> bool {
        let outcome = self.notifier.show(item, priority, record_to_feed).await;
        match &outcome {
            ShowOutcome::Blocked(message) => {
                self.runtime.last_error = Some(message.clone());
            }
            ShowOutcome::Failed(message) => {
                self.runtime.last_error = Some(format!("Notification failed: {message}"));
            }
            ShowOutcome::Shown => {}
        }
        outcome.delivered()
    }

    async fn persist_current_session(&self) {
        if let Some(session) = &self.current_session {
            if let Err(err) = self.storage.save_current_session(session).await {
                warn!("Failed to persist current session: {err:#}");
            }
        }
    }

    /// Settings snapshot for the current event. A failed read is a
    /// persistence error: logged, and defaults keep the event moving.
    async fn settings(&self) -> Settings {
        match self.storage.get_settings().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Failed to load settings, using defaults: {err:#}");
                Settings::default()
            }
        }
    }
}
