//! End-to-end coverage of the session coordinator: the actor is driven
//! through its public handle against fake provider/sink collaborators and a
//! temp-dir-backed store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

use meetcoach::coordinator::{EngineConfig, SessionCoordinator};
use meetcoach::i18n::Language;
use meetcoach::models::{ApiProvider, Delivery, FeedCategory, Session, Settings};
use meetcoach::notify::{NotificationSink, PermissionLevel};
use meetcoach::provider::AnalysisProvider;
use meetcoach::recorder::FrameRecorder;
use meetcoach::storage::Storage;

#[derive(Default)]
struct FakeProvider {
    responses: Mutex<VecDeque<Result<Value, String>>>,
    translate_fails: AtomicBool,
}

impl FakeProvider {
    fn push_analysis(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    fn fail_translations(&self) {
        self.translate_fails.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnalysisProvider for FakeProvider {
    async fn analyze(
        &self,
        _frame: &str,
        _api_key: &str,
        _provider: ApiProvider,
        _language: Language,
    ) -> Result<Value> {
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted analysis response")),
        }
    }

    async fn translate(
        &self,
        text: &str,
        _api_key: &str,
        _provider: ApiProvider,
        target: Language,
    ) -> Result<String> {
        if self.translate_fails.load(Ordering::SeqCst) {
            bail!("translator offline");
        }
        Ok(format!("[{}] {}", target.code(), text))
    }
}

struct FakeSink {
    permission: Mutex<PermissionLevel>,
    shown: Mutex<Vec<(String, String, u8)>>,
}

impl FakeSink {
    fn new() -> Self {
        Self {
            permission: Mutex::new(PermissionLevel::Granted),
            shown: Mutex::new(Vec::new()),
        }
    }

    fn deny(&self) {
        *self.permission.lock().unwrap() = PermissionLevel::Denied;
    }

    fn shown_titles(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|(_, title, _)| title.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for FakeSink {
    async fn permission_level(&self) -> PermissionLevel {
        *self.permission.lock().unwrap()
    }

    async fn show(&self, id: &str, title: &str, _message: &str, priority: u8) -> Result<bool> {
        self.shown
            .lock()
            .unwrap()
            .push((id.to_string(), title.to_string(), priority));
        Ok(true)
    }
}

struct FakeRecorder {
    fail: AtomicBool,
    recorded: Mutex<Vec<String>>,
}

impl FakeRecorder {
    fn new(fail: bool) -> Self {
        Self {
            fail: AtomicBool::new(fail),
            recorded: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FrameRecorder for FakeRecorder {
    async fn record(
        &self,
        frame: &str,
        _session_id: &str,
        _timestamp: chrono::DateTime<Utc>,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("recorder endpoint unreachable");
        }
        self.recorded.lock().unwrap().push(frame.to_string());
        Ok(())
    }
}

fn good_analysis() -> Value {
    json!({
        "posture": {"score": 9, "issue": null, "suggestion": null},
        "facial": {"score": 9, "issue": null, "suggestion": null},
        "hands": {"score": 8, "issue": null, "suggestion": null},
        "appearance": {"score": 10, "issue": null, "suggestion": null},
    })
}

fn critical_analysis() -> Value {
    json!({
        "posture": {"score": 3, "issue": "severe slouch", "suggestion": "Sit upright now"},
        "facial": {"score": 8, "issue": null, "suggestion": null},
        "hands": {"score": 8, "issue": null, "suggestion": null},
        "appearance": {"score": 8, "issue": null, "suggestion": null},
    })
}

fn warning_analysis() -> Value {
    json!({
        "posture": {"score": 6, "issue": "mild slouch", "suggestion": "Straighten your back"},
        "facial": {"score": 8, "issue": null, "suggestion": null},
        "hands": {"score": 8, "issue": null, "suggestion": null},
        "appearance": {"score": 8, "issue": null, "suggestion": null},
    })
}

struct Harness {
    _temp: TempDir,
    storage: Storage,
    provider: Arc<FakeProvider>,
    sink: Arc<FakeSink>,
    coordinator: SessionCoordinator,
}

async fn spawn_harness(recorder: Option<Arc<dyn FrameRecorder>>) -> Harness {
    let temp = TempDir::new().unwrap();
    let storage = Storage::open(temp.path().join("coach.sqlite3")).unwrap();

    let mut settings = Settings::default();
    settings.api_key = "sk-test".to_string();
    storage.save_settings(&settings).await.unwrap();

    let provider = Arc::new(FakeProvider::default());
    let sink = Arc::new(FakeSink::new());
    let coordinator = SessionCoordinator::spawn(
        storage.clone(),
        provider.clone(),
        sink.clone(),
        recorder,
        EngineConfig::default(),
    );

    Harness {
        _temp: temp,
        storage,
        provider,
        sink,
        coordinator,
    }
}

#[tokio::test]
async fn full_session_lifecycle_persists_history_and_clears_current() {
    let harness = spawn_harness(None).await;
    let start = Utc::now();

    harness.coordinator.meeting_started(start).await.unwrap();
    for i in 0..3 {
        harness.provider.push_analysis(good_analysis());
        harness
            .coordinator
            .analyze_frame(format!("frame-{i}"), start + Duration::seconds(30 * i))
            .await
            .unwrap();
    }
    harness
        .coordinator
        .meeting_ended(start + Duration::minutes(5))
        .await
        .unwrap();

    // Status round-trips through the queue, so everything above is handled.
    let status = harness.coordinator.status().await.unwrap();
    assert!(!status.active);
    assert_eq!(status.analysis_runtime.succeeded, 3);

    let history = harness.storage.get_sessions().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].analyses.len(), 3);
    assert!(history[0].end_time.is_some());

    assert!(harness.storage.get_current_session().await.unwrap().is_none());
    let summary = harness.storage.get_summary_session().await.unwrap().unwrap();
    assert_eq!(summary.id, history[0].id);

    // Ending again with no active session is a no-op.
    harness
        .coordinator
        .meeting_ended(start + Duration::minutes(6))
        .await
        .unwrap();
    let status = harness.coordinator.status().await.unwrap();
    assert!(!status.active);
    assert_eq!(harness.storage.get_sessions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn meeting_started_is_idempotent() {
    let harness = spawn_harness(None).await;
    let start = Utc::now();

    harness.coordinator.meeting_started(start).await.unwrap();
    let first = harness.coordinator.status().await.unwrap();
    harness
        .coordinator
        .meeting_started(start + Duration::seconds(5))
        .await
        .unwrap();
    let second = harness.coordinator.status().await.unwrap();

    assert_eq!(first.session_id, second.session_id);
}

#[tokio::test]
async fn critical_issues_within_cooldown_notify_once_but_feed_twice() {
    let harness = spawn_harness(None).await;
    let start = Utc::now();

    harness.provider.push_analysis(critical_analysis());
    harness.provider.push_analysis(critical_analysis());
    harness
        .coordinator
        .analyze_frame("frame-a".to_string(), start)
        .await
        .unwrap();
    harness
        .coordinator
        .analyze_frame("frame-b".to_string(), start + Duration::seconds(1))
        .await
        .unwrap();
    harness.coordinator.status().await.unwrap();

    let critical_shown = harness
        .sink
        .shown_titles()
        .iter()
        .filter(|title| *title == "Critical Body Language Alert")
        .count();
    assert_eq!(critical_shown, 1);

    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    let critical_items: Vec<_> = feed
        .iter()
        .filter(|item| item.category == FeedCategory::Critical)
        .collect();
    assert_eq!(critical_items.len(), 2);
    // The message carries the suggestion text from the analysis.
    assert!(critical_items[0].message.contains("Sit upright now"));
}

#[tokio::test]
async fn warnings_need_a_sustained_streak_before_notifying() {
    let harness = spawn_harness(None).await;
    let start = Utc::now();

    for i in 0..3 {
        harness.provider.push_analysis(warning_analysis());
        harness
            .coordinator
            .analyze_frame(format!("frame-{i}"), start + Duration::seconds(i))
            .await
            .unwrap();
    }
    harness.coordinator.status().await.unwrap();

    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    let warning_items = feed
        .iter()
        .filter(|item| item.category == FeedCategory::Warning)
        .count();
    // Streak length 2: fires on the second dip, third restarts the count.
    assert_eq!(warning_items, 1);
    assert_eq!(
        harness
            .sink
            .shown_titles()
            .iter()
            .filter(|title| *title == "Body Language Tip")
            .count(),
        1
    );
}

#[tokio::test]
async fn all_clear_frames_produce_a_single_encouragement_entry() {
    let harness = spawn_harness(None).await;
    let start = Utc::now();

    for i in 0..3 {
        harness.provider.push_analysis(good_analysis());
        harness
            .coordinator
            .analyze_frame(format!("frame-{i}"), start + Duration::seconds(i))
            .await
            .unwrap();
    }
    harness.coordinator.status().await.unwrap();

    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    let encouragements: Vec<_> = feed
        .iter()
        .filter(|item| item.category == FeedCategory::Info)
        .collect();
    assert_eq!(encouragements.len(), 1);
    assert!(encouragements[0].message.contains("Keep it up"));
    // Feed-only reinforcement, never a system notification.
    assert!(harness.sink.shown_titles().is_empty());
}

#[tokio::test]
async fn missing_api_key_warns_once_per_session() {
    let harness = spawn_harness(None).await;
    let mut settings = harness.storage.get_settings().await.unwrap();
    settings.api_key = String::new();
    harness.storage.save_settings(&settings).await.unwrap();

    let start = Utc::now();
    for i in 0..3 {
        harness
            .coordinator
            .analyze_frame(format!("frame-{i}"), start + Duration::seconds(i))
            .await
            .unwrap();
    }
    let status = harness.coordinator.status().await.unwrap();

    assert!(!status.api_configured);
    assert_eq!(status.analysis_runtime.attempted, 3);
    assert_eq!(status.analysis_runtime.failed, 3);
    assert_eq!(
        harness
            .sink
            .shown_titles()
            .iter()
            .filter(|title| *title == "Setup Required")
            .count(),
        1
    );

    // The per-session flag survives a restart via the persisted session.
    let persisted = harness
        .storage
        .get_current_session()
        .await
        .unwrap()
        .unwrap();
    assert!(persisted.no_key_warning_shown);
}

#[tokio::test]
async fn transport_errors_notify_under_cooldown_but_rate_limits_stay_silent() {
    let harness = spawn_harness(None).await;
    let start = Utc::now();

    harness.provider.push_error("Claude API error: Rate limit exceeded");
    harness
        .coordinator
        .analyze_frame("frame-a".to_string(), start)
        .await
        .unwrap();
    let status = harness.coordinator.status().await.unwrap();
    assert_eq!(status.analysis_runtime.failed, 1);
    assert!(harness.sink.shown_titles().is_empty());

    harness.provider.push_error("Claude API error: connection reset");
    harness
        .coordinator
        .analyze_frame("frame-b".to_string(), start + Duration::seconds(1))
        .await
        .unwrap();
    let status = harness.coordinator.status().await.unwrap();
    assert_eq!(status.analysis_runtime.failed, 2);
    assert_eq!(
        harness
            .sink
            .shown_titles()
            .iter()
            .filter(|title| *title == "Analysis Error")
            .count(),
        1
    );
}

#[tokio::test]
async fn malformed_analysis_counts_as_a_failed_frame() {
    let harness = spawn_harness(None).await;

    harness.provider.push_analysis(json!({
        "posture": {"score": "n/a"},
        "facial": {"score": 9},
        "hands": {"score": 9},
        "appearance": {"score": 9},
    }));
    harness
        .coordinator
        .analyze_frame("frame".to_string(), Utc::now())
        .await
        .unwrap();

    let status = harness.coordinator.status().await.unwrap();
    assert_eq!(status.analysis_runtime.failed, 1);
    assert_eq!(status.analysis_runtime.succeeded, 0);
    // The session survives and stays empty.
    assert_eq!(status.analysis_count, 0);
    assert!(status.active);
}

#[tokio::test]
async fn blocked_permission_records_feed_entry_instead_of_notifying() {
    let harness = spawn_harness(None).await;
    harness.sink.deny();

    let start = Utc::now();
    harness.provider.push_analysis(good_analysis());
    harness
        .coordinator
        .analyze_frame("frame".to_string(), start)
        .await
        .unwrap();
    harness
        .coordinator
        .meeting_ended(start + Duration::minutes(2))
        .await
        .unwrap();
    harness.coordinator.status().await.unwrap();

    assert!(harness.sink.shown_titles().is_empty());
    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    let blocked: Vec<_> = feed
        .iter()
        .filter(|item| item.delivery == Delivery::Blocked)
        .collect();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].title, "Meeting Ended");
}

#[tokio::test]
async fn retention_sweep_drops_only_expired_history() {
    let harness = spawn_harness(None).await;

    let now = Utc::now();
    let mut stale = Session::begin(now - Duration::days(9));
    stale.end_time = Some(now - Duration::days(8));
    let mut fresh = Session::begin(now - Duration::days(7));
    fresh.end_time = Some(now - Duration::days(6));
    harness
        .storage
        .save_sessions(&[stale.clone(), fresh.clone()])
        .await
        .unwrap();

    harness.provider.push_analysis(good_analysis());
    harness
        .coordinator
        .analyze_frame("frame".to_string(), now)
        .await
        .unwrap();
    harness
        .coordinator
        .meeting_ended(now + Duration::minutes(1))
        .await
        .unwrap();
    harness.coordinator.status().await.unwrap();

    let history = harness.storage.get_sessions().await.unwrap();
    let ids: Vec<_> = history.iter().map(|s| s.id.as_str()).collect();
    assert!(!ids.contains(&stale.id.as_str()));
    assert!(ids.contains(&fresh.id.as_str()));
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn ephemeral_mode_keeps_summary_but_skips_history() {
    let harness = spawn_harness(None).await;
    let mut settings = harness.storage.get_settings().await.unwrap();
    settings.ephemeral_mode = true;
    harness.storage.save_settings(&settings).await.unwrap();

    let start = Utc::now();
    harness.provider.push_analysis(good_analysis());
    harness
        .coordinator
        .analyze_frame("frame".to_string(), start)
        .await
        .unwrap();
    harness
        .coordinator
        .meeting_ended(start + Duration::minutes(1))
        .await
        .unwrap();
    harness.coordinator.status().await.unwrap();

    assert!(harness.storage.get_sessions().await.unwrap().is_empty());
    assert!(harness
        .storage
        .get_summary_session()
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn monitoring_toggle_off_closes_the_session_silently() {
    let harness = spawn_harness(None).await;
    let start = Utc::now();

    harness.provider.push_analysis(good_analysis());
    harness
        .coordinator
        .analyze_frame("frame".to_string(), start)
        .await
        .unwrap();
    harness.coordinator.set_monitoring(false).await.unwrap();
    let status = harness.coordinator.status().await.unwrap();

    assert!(!status.active);
    assert!(!status.monitoring_enabled);
    // Closed with data, but without the meeting-ended notification.
    assert_eq!(harness.storage.get_sessions().await.unwrap().len(), 1);
    assert!(harness
        .sink
        .shown_titles()
        .iter()
        .all(|title| title != "Meeting Ended"));

    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    assert!(feed.iter().any(|item| item.title == "Monitoring Turned Off"));

    // While disabled, new frames are ignored entirely.
    harness
        .coordinator
        .analyze_frame("frame-2".to_string(), start + Duration::seconds(30))
        .await
        .unwrap();
    let status = harness.coordinator.status().await.unwrap();
    assert!(status.session_id.is_none());
}

#[tokio::test]
async fn active_session_is_restored_from_storage_once() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::open(temp.path().join("coach.sqlite3")).unwrap();
    let mut settings = Settings::default();
    settings.api_key = "sk-test".to_string();
    storage.save_settings(&settings).await.unwrap();

    let mut interrupted = Session::begin(Utc::now() - Duration::minutes(10));
    interrupted.no_key_warning_shown = true;
    storage.save_current_session(&interrupted).await.unwrap();

    let provider = Arc::new(FakeProvider::default());
    let sink = Arc::new(FakeSink::new());
    let coordinator = SessionCoordinator::spawn(
        storage.clone(),
        provider,
        sink,
        None,
        EngineConfig::default(),
    );

    let status = coordinator.status().await.unwrap();
    assert!(status.active);
    assert_eq!(status.session_id.as_deref(), Some(interrupted.id.as_str()));
}

#[tokio::test]
async fn feed_items_carry_both_languages_via_the_translator() {
    let harness = spawn_harness(None).await;

    harness.provider.push_analysis(critical_analysis());
    harness
        .coordinator
        .analyze_frame("frame".to_string(), Utc::now())
        .await
        .unwrap();
    harness.coordinator.status().await.unwrap();

    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    let item = feed
        .iter()
        .find(|item| item.category == FeedCategory::Critical)
        .unwrap();
    assert_eq!(item.source_language, Some(Language::EnCa));
    let french = item.title_by_language.get(&Language::FrFr).unwrap();
    assert_eq!(french, "[fr-FR] Critical Body Language Alert");
    assert!(item.fully_localized());
}

#[tokio::test]
async fn failed_translation_falls_back_to_source_text_verbatim() {
    let harness = spawn_harness(None).await;
    harness.provider.fail_translations();

    harness.provider.push_analysis(critical_analysis());
    harness
        .coordinator
        .analyze_frame("frame".to_string(), Utc::now())
        .await
        .unwrap();
    harness.coordinator.status().await.unwrap();

    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    let item = feed
        .iter()
        .find(|item| item.category == FeedCategory::Critical)
        .unwrap();
    assert_eq!(
        item.title_by_language.get(&Language::FrFr),
        item.title_by_language.get(&Language::EnCa)
    );
}

#[tokio::test]
async fn feed_is_capped_at_the_ring_size() {
    let temp = TempDir::new().unwrap();
    let storage = Storage::open(temp.path().join("coach.sqlite3")).unwrap();
    let mut settings = Settings::default();
    settings.api_key = "sk-test".to_string();
    storage.save_settings(&settings).await.unwrap();

    let provider = Arc::new(FakeProvider::default());
    let sink = Arc::new(FakeSink::new());
    let config = EngineConfig {
        max_feed_items: 4,
        notification_cooldown_ms: 0,
        ..EngineConfig::default()
    };
    let coordinator =
        SessionCoordinator::spawn(storage.clone(), provider.clone(), sink, None, config);

    let start = Utc::now();
    for i in 0..8 {
        provider.push_analysis(critical_analysis());
        coordinator
            .analyze_frame(format!("frame-{i}"), start + Duration::seconds(i))
            .await
            .unwrap();
    }
    coordinator.status().await.unwrap();

    let feed = storage.get_live_coaching_feed().await.unwrap();
    assert_eq!(feed.len(), 4);
    // Newest first.
    assert!(feed[0].timestamp >= feed[1].timestamp);
}

#[tokio::test]
async fn recorder_failures_surface_as_feed_notices_without_blocking_analysis() {
    let recorder = Arc::new(FakeRecorder::new(true));
    let harness = spawn_harness(Some(recorder.clone() as Arc<dyn FrameRecorder>)).await;

    harness.provider.push_analysis(good_analysis());
    harness
        .coordinator
        .analyze_frame("frame".to_string(), Utc::now())
        .await
        .unwrap();
    let status = harness.coordinator.status().await.unwrap();
    assert_eq!(status.analysis_runtime.succeeded, 1);

    // The side channel is fire-and-forget; give its task a moment.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    assert!(feed
        .iter()
        .any(|item| item.title == "Frame Recorder Offline"));

    // Recovery posts the restored notice.
    recorder.fail.store(false, Ordering::SeqCst);
    harness.provider.push_analysis(good_analysis());
    harness
        .coordinator
        .analyze_frame("frame-2".to_string(), Utc::now())
        .await
        .unwrap();
    harness.coordinator.status().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    assert!(feed
        .iter()
        .any(|item| item.title == "Frame Recorder Connected"));
    assert_eq!(recorder.recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn relocalize_updates_display_text_after_language_switch() {
    let harness = spawn_harness(None).await;

    harness.provider.push_analysis(critical_analysis());
    harness
        .coordinator
        .analyze_frame("frame".to_string(), Utc::now())
        .await
        .unwrap();
    harness.coordinator.status().await.unwrap();

    let mut settings = harness.storage.get_settings().await.unwrap();
    settings.language = Language::FrFr;
    harness.storage.save_settings(&settings).await.unwrap();
    harness.coordinator.relocalize_feed().await.unwrap();
    harness.coordinator.status().await.unwrap();

    let feed = harness.storage.get_live_coaching_feed().await.unwrap();
    let item = feed
        .iter()
        .find(|item| item.category == FeedCategory::Critical)
        .unwrap();
    assert!(item.title.starts_with("[fr-FR]"));
}
