use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::capture::selection::pick_best;
use crate::capture::FrameSource;
use crate::coordinator::SessionCoordinator;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const CAPTURE_INTERVAL_SECS: u64 = 30;
const CAPTURE_TIMEOUT_SECS: u64 = 10;

/// Periodic capture driver: every tick, re-pick the best video source,
/// capture a frame, and enqueue it for analysis. Losing every usable source
/// ends the loop quietly; the coordinator owns session-end semantics.
pub async fn capture_loop(
    source: Arc<dyn FrameSource>,
    coordinator: SessionCoordinator,
    interval: Duration,
    cancel_token: CancellationToken,
    drain_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if *drain_rx.borrow() {
                    log_info!("capture loop draining, no new captures");
                    break;
                }

                if !capture_once(source.as_ref(), &coordinator).await {
                    break;
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("capture loop shutting down");
                break;
            }
        }
    }
}

/// One capture pass. Returns false when the loop should stop (no usable
/// source, or the coordinator is gone).
async fn capture_once(source: &dyn FrameSource, coordinator: &SessionCoordinator) -> bool {
    let candidates = source.candidates().await;
    let picked = match pick_best(&candidates) {
        Some(index) => index,
        None => {
            log_info!(
                "no usable video source among {} candidates, stopping capture",
                candidates.len()
            );
            return false;
        }
    };

    let capture = source.capture(picked);
    let frame = match tokio::time::timeout(Duration::from_secs(CAPTURE_TIMEOUT_SECS), capture).await
    {
        Ok(Ok(frame)) => frame,
        Ok(Err(err)) => {
            log_error!("frame capture failed: {err:?}");
            return true;
        }
        Err(_) => {
            log_warn!("frame capture timeout (> {CAPTURE_TIMEOUT_SECS}s)");
            return true;
        }
    };

    if coordinator.analyze_frame(frame, Utc::now()).await.is_err() {
        log_warn!("coordinator queue closed, stopping capture");
        return false;
    }
    true
}
