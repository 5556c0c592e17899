pub mod controller;
pub mod loop_worker;
pub mod platforms;
pub mod selection;

pub use controller::CaptureController;
pub use platforms::{platform_for_host, PlatformDescriptor};
pub use selection::{pick_best, score_candidate, SourceScore, TrackInfo, VideoCandidate};

use anyhow::Result;
use async_trait::async_trait;

/// Provider of candidate video surfaces and raw frames. Implementations wrap
/// whatever discovery mechanism the host environment offers (a DOM observer,
/// a platform capture API); the engine only sees candidate snapshots and
/// opaque frame payloads.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Current candidate set. May change between calls as tiles appear and
    /// disappear.
    async fn candidates(&self) -> Vec<VideoCandidate>;

    /// Captures a frame from the candidate picked by the selection pass,
    /// returned as an opaque payload for the analysis provider.
    async fn capture(&self, index: usize) -> Result<String>;
}
