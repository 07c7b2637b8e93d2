//! The per-session capture state machine.
//!
//! A `Shooter` drives one accepted session from request to a terminal
//! state: optional interactive area selection, the joint capture +
//! feedback step, then clipboard delivery. Every suspension point is
//! raced against the session's cancellation token, which the registry
//! cancels when the caller disconnects.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use snapclip_core::{
    CallerId, CaptureError, CaptureMode, ClipboardError, ImageSink, Region, SelectionError,
    ShotError, ShotState, ShotTaken, WindowOptions, IMAGE_PNG,
};

use crate::backend::Backends;
use crate::registry::ShotPermit;

/// Drives one screenshot session to completion.
pub struct Shooter {
    caller: CallerId,
    mode: CaptureMode,
    window: WindowOptions,
    state: ShotState,
    cancel: CancellationToken,
    backends: Arc<Backends>,
}

impl Shooter {
    /// Builds a shooter from the registry's permit.
    pub fn new(permit: ShotPermit, window: WindowOptions, backends: Arc<Backends>) -> Self {
        Self {
            caller: permit.caller,
            mode: permit.mode,
            window,
            state: ShotState::Idle,
            cancel: permit.cancel,
            backends,
        }
    }

    /// Runs the session to a terminal state.
    ///
    /// Returns `Ok(())` from `Done`; any error corresponds to `Failed`.
    /// `ShotError::Aborted` means the caller disconnected and no reply
    /// should be attempted.
    pub async fn run(mut self) -> Result<(), ShotError> {
        let outcome = self.drive().await;

        match outcome {
            Ok(()) => self.set_state(ShotState::Done),
            Err(_) => self.set_state(ShotState::Failed),
        }

        outcome
    }

    async fn drive(&mut self) -> Result<(), ShotError> {
        let region = match self.mode {
            CaptureMode::Area => {
                self.set_state(ShotState::SelectingArea);
                Some(self.select_area().await?)
            }
            CaptureMode::Window => None,
        };

        self.set_state(ShotState::Capturing);
        let sink = ImageSink::new();
        self.capture(region, sink.clone()).await?;

        self.set_state(ShotState::Finalizing);
        self.deliver(&sink).await
    }

    /// Waits for the user to pick a region. May block for unbounded
    /// time; the disconnect watch stays armed throughout.
    async fn select_area(&self) -> Result<Region, ShotError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ShotError::Aborted),
            chosen = self.backends.selector.select_region() => {
                let region = chosen?;
                if region.is_empty() {
                    return Err(SelectionError::EmptyRegion.into());
                }
                Ok(region)
            }
        }
    }

    /// The joint capture + feedback step.
    ///
    /// Two concurrent sub-operations, both required: the capture call
    /// writes encoded bytes into the sink and fires the capture-taken
    /// signal; the feedback arm waits for that signal, then flashes the
    /// captured region and plays the shutter sound. This is a join, not
    /// a race. If either side fails the other is abandoned; the external
    /// subsystem's underlying operation may still complete on its own
    /// and its result is discarded.
    async fn capture(&self, region: Option<Region>, sink: ImageSink) -> Result<(), ShotError> {
        let (taken, taken_rx) = ShotTaken::channel();

        let capture = async {
            match region {
                Some(area) => self.backends.capture.capture_area(area, sink, taken).await,
                None => {
                    self.backends
                        .capture
                        .capture_window(self.window, sink, taken)
                        .await
                }
            }
        };

        let feedback = async {
            let captured = taken_rx.await.map_err(|_| CaptureError::SignalDropped)?;
            self.backends
                .feedback
                .acknowledge(captured)
                .await
                .map_err(CaptureError::from)
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(ShotError::Aborted),
            joined = async { tokio::try_join!(capture, feedback) } => {
                joined?;
                Ok(())
            }
        }
    }

    /// Closes the sink and publishes its bytes to the clipboard. Only
    /// reached after capture succeeded; a disconnect here still skips
    /// delivery, since no reply can be sent.
    async fn deliver(&self, sink: &ImageSink) -> Result<(), ShotError> {
        let bytes = sink.finish().map_err(|_| ClipboardError::NoContent)?;

        tokio::select! {
            _ = self.cancel.cancelled() => Err(ShotError::Aborted),
            published = self.backends.clipboard.set_content(IMAGE_PNG, bytes) => {
                published.map_err(ShotError::from)
            }
        }
    }

    fn set_state(&mut self, next: ShotState) {
        debug!(caller = %self.caller, from = %self.state, to = %next, "shot state");
        self.state = next;
    }
}
