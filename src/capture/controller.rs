use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::capture::loop_worker::{capture_loop, CAPTURE_INTERVAL_SECS};
use crate::capture::FrameSource;
use crate::coordinator::SessionCoordinator;

/// Owns the lifecycle of one background capture loop: start, drain, stop.
pub struct CaptureController {
    interval: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    drain_tx: Option<watch::Sender<bool>>,
}

impl CaptureController {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(CAPTURE_INTERVAL_SECS))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
            cancel_token: None,
            drain_tx: None,
        }
    }

    pub fn start_capture(
        &mut self,
        source: Arc<dyn FrameSource>,
        coordinator: SessionCoordinator,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("capture already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        // Drain channel: false = normal operation, true = finish the current
        // capture then exit without starting new ones.
        let (drain_tx, drain_rx) = watch::channel(false);

        let handle = tokio::spawn(capture_loop(
            source,
            coordinator,
            self.interval,
            token_clone,
            drain_rx,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.drain_tx = Some(drain_tx);
        Ok(())
    }

    /// Signal the loop to finish its current capture but start no new ones.
    pub fn drain_capture(&mut self) {
        if let Some(tx) = &self.drain_tx {
            let _ = tx.send(true);
            info!("Drain signal sent to capture loop");
        }
    }

    pub async fn stop_capture(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.drain_tx = None;

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("capture loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for CaptureController {
    fn default() -> Self {
        Self::new()
    }
}
