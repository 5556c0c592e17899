//! Background coordination engine for a meeting body-language coach.
//!
//! The engine turns a stream of periodic, unreliable AI frame analyses into
//! timely, de-duplicated, bilingual coaching notifications while keeping
//! durable session history. Host environments plug in through the
//! collaborator traits ([`provider::AnalysisProvider`],
//! [`notify::NotificationSink`], [`capture::FrameSource`],
//! [`recorder::FrameRecorder`]) and drive the [`coordinator`] with lifecycle
//! events; everything else — issue classification, escalation hysteresis,
//! cooldowns, localization, persistence, retention — happens in here.

pub mod analysis;
pub mod capture;
pub mod coordinator;
pub mod i18n;
pub mod models;
pub mod notify;
pub mod provider;
pub mod recorder;
pub mod storage;
pub mod utils;

pub use capture::{CaptureController, FrameSource, VideoCandidate};
pub use coordinator::{EngineConfig, SessionCoordinator, StatusReport};
pub use i18n::Language;
pub use models::{AnalysisResult, FeedItem, Session, Settings};
pub use notify::NotificationSink;
pub use provider::AnalysisProvider;
pub use recorder::FrameRecorder;
pub use storage::Storage;

/// Initializes logging for host binaries (reads `RUST_LOG`, defaults to
/// info). Library embedders with their own logger skip this.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
