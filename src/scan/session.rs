//! Continuous camera scan running as an owned, cancellable task

use crate::config::ScanOptions;
use crate::error::{Error, Result};
use crate::qr::FrameDecoder;
use crate::scan::ScanOutcome;
use crate::scan::source::{CameraSource, StreamGuard};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Callback invoked with the decoded text right before `Decoded` is published
pub type DecodedCallback = Box<dyn FnOnce(&str) + Send + 'static>;

/// Builder for a camera scan
pub struct ScanSession {
    source: Arc<dyn CameraSource>,
    decoder: Arc<dyn FrameDecoder>,
    options: ScanOptions,
    on_decoded: Option<DecodedCallback>,
}

impl ScanSession {
    /// Scan frames from `source` with `decoder` using default timing
    pub fn new(source: Arc<dyn CameraSource>, decoder: Arc<dyn FrameDecoder>) -> Self {
        Self {
            source,
            decoder,
            options: ScanOptions::default(),
            on_decoded: None,
        }
    }

    /// Override facing and timing
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Register the completion callback
    pub fn on_decoded(mut self, callback: impl FnOnce(&str) + Send + 'static) -> Self {
        self.on_decoded = Some(Box::new(callback));
        self
    }

    /// Spawn the capture loop on the current tokio runtime
    pub fn start(self) -> ScanHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        tracing::info!(facing = ?self.options.facing, "Starting camera scan");

        let task = tokio::spawn(run(
            self.source,
            self.decoder,
            self.options,
            self.on_decoded,
            cancel_rx,
        ));

        ScanHandle {
            cancel: Some(cancel_tx),
            task: Some(task),
        }
    }
}

/// Owned handle to a running scan.
///
/// Dropping the handle aborts the task, which drops the camera stream.
pub struct ScanHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<ScanOutcome>>>,
}

impl ScanHandle {
    /// Whether the scan task has finished
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Cancel the scan and wait for it to wind down.
    ///
    /// When this returns the camera stream has been released and no further
    /// decode attempt will run. The outcome is `Cancelled` unless a code was
    /// decoded before the cancellation was observed.
    pub async fn stop(&mut self) -> Result<ScanOutcome> {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.wait().await
    }

    /// Wait for the scan to finish on its own.
    ///
    /// Dropping the returned future leaves the scan running, so it can be
    /// raced against other events and stopped afterwards.
    pub async fn wait(&mut self) -> Result<ScanOutcome> {
        let task = self
            .task
            .as_mut()
            .ok_or_else(|| Error::Other("scan task already joined".to_string()))?;
        let joined = task.await;
        self.task = None;
        joined.map_err(|e| Error::Other(format!("scan task failed: {e}")))?
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

enum Attempt {
    NotReady,
    Missed,
    Decoded(String),
}

async fn run(
    source: Arc<dyn CameraSource>,
    decoder: Arc<dyn FrameDecoder>,
    options: ScanOptions,
    on_decoded: Option<DecodedCallback>,
    mut cancel: oneshot::Receiver<()>,
) -> Result<ScanOutcome> {
    let acquired = tokio::select! {
        biased;
        _ = &mut cancel => return Ok(ScanOutcome::Cancelled),
        acquired = source.acquire_stream(options.facing) => acquired,
    };

    let stream = match acquired {
        Ok(stream) => stream,
        Err(Error::CameraDenied(reason)) => {
            tracing::warn!(%reason, "Camera access denied, scan aborted");
            return Ok(ScanOutcome::CameraDenied);
        }
        Err(err) => return Err(err),
    };

    let mut guard = StreamGuard::new(stream);
    let mut ticker = time::interval(options.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempts: u64 = 0;

    let text = loop {
        tokio::select! {
            biased;
            _ = &mut cancel => {
                tracing::info!(attempts, "Camera scan cancelled");
                return Ok(ScanOutcome::Cancelled);
            }
            attempt = next_attempt(&mut ticker, &mut guard, decoder.as_ref()) => match attempt? {
                Attempt::NotReady => {}
                Attempt::Missed => attempts += 1,
                Attempt::Decoded(text) => {
                    attempts += 1;
                    break text;
                }
            },
        }
    };

    drop(guard);
    tracing::info!(attempts, length = text.len(), "QR code decoded from camera");

    tokio::select! {
        biased;
        _ = &mut cancel => tracing::debug!("Settle delay cut short by stop"),
        _ = time::sleep(options.settle_delay()) => {}
    }

    if let Some(callback) = on_decoded {
        callback(&text);
    }

    Ok(ScanOutcome::Decoded { text })
}

async fn next_attempt(
    ticker: &mut Interval,
    guard: &mut StreamGuard,
    decoder: &dyn FrameDecoder,
) -> Result<Attempt> {
    ticker.tick().await;

    let frame = match guard.next_frame().await {
        Ok(frame) => frame,
        Err(Error::Image(reason)) => {
            tracing::debug!(%reason, "Dropping undecodable frame");
            return Ok(Attempt::NotReady);
        }
        Err(err) => return Err(err),
    };
    if !frame.is_ready() {
        tracing::trace!("Video surface not ready, skipping frame");
        return Ok(Attempt::NotReady);
    }

    Ok(match decoder.decode_frame(&frame.pixels, frame.width, frame.height) {
        Some(text) => Attempt::Decoded(text),
        None => Attempt::Missed,
    })
}
