//! Contracts for the external collaborators of the capture core.
//!
//! The session lifecycle and coordination logic lives in the daemon; the
//! actual pixel grabbing, selection UI, feedback rendering, clipboard
//! storage, and presence tracking are pluggable implementations of the
//! traits below. The daemon ships synthetic implementations; compositor
//! integrations live out of tree.

use crate::error::{CaptureError, ClipboardError, FeedbackError, SelectionError};
use crate::{CallerId, ImageSink, Region, WindowOptions};
use async_trait::async_trait;
use tokio::sync::oneshot;

/// One-shot capture-taken signal.
///
/// Fired by the capture backend exactly once per capture, as soon as the
/// pixels have been grabbed, carrying the captured region. The session's
/// feedback arm waits on the receiving side before flashing.
#[derive(Debug)]
pub struct ShotTaken {
    tx: oneshot::Sender<Region>,
}

impl ShotTaken {
    /// Creates the signal and its receiving end.
    pub fn channel() -> (Self, oneshot::Receiver<Region>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Reports the captured region. Consumes the signal; firing is a
    /// no-op if the session has already given up on the capture.
    pub fn fire(self, region: Region) {
        let _ = self.tx.send(region);
    }
}

/// Grabs pixels and writes the encoded image into the session's sink.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Captures the focused window, writing encoded bytes into `sink`
    /// and firing `taken` with the captured region once pixels are
    /// grabbed.
    async fn capture_window(
        &self,
        opts: WindowOptions,
        sink: ImageSink,
        taken: ShotTaken,
    ) -> Result<(), CaptureError>;

    /// Captures the given screen region.
    async fn capture_area(
        &self,
        region: Region,
        sink: ImageSink,
        taken: ShotTaken,
    ) -> Result<(), CaptureError>;
}

/// Interactive region selection.
#[async_trait]
pub trait AreaSelector: Send + Sync {
    /// Resolves with the chosen region, or an error if the user cancels.
    /// May block on user interaction for unbounded time.
    async fn select_region(&self) -> Result<Region, SelectionError>;
}

/// Transient visual flash plus themed sound acknowledging a capture.
#[async_trait]
pub trait FeedbackRenderer: Send + Sync {
    /// Renders the acknowledgment over `region`; resolves when the
    /// flash has run its course.
    async fn acknowledge(&self, region: Region) -> Result<(), FeedbackError>;
}

/// Shared system clipboard. Single writer assumed.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replaces the current clipboard content.
    async fn set_content(&self, media_type: &str, bytes: Vec<u8>) -> Result<(), ClipboardError>;
}

/// Transport-level presence of caller identities.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    /// Resolves when `caller` is no longer reachable. Resolves
    /// immediately for identities the transport does not know.
    async fn vanished(&self, caller: &CallerId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shot_taken_delivers_region() {
        let (taken, rx) = ShotTaken::channel();
        taken.fire(Region::new(1, 2, 3, 4));

        assert_eq!(rx.await.unwrap(), Region::new(1, 2, 3, 4));
    }

    #[tokio::test]
    async fn test_dropped_signal_closes_receiver() {
        let (taken, rx) = ShotTaken::channel();
        drop(taken);

        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_fire_after_receiver_gone_is_silent() {
        let (taken, rx) = ShotTaken::channel();
        drop(rx);

        // Must not panic: the session may have abandoned the capture.
        taken.fire(Region::new(0, 0, 1, 1));
    }
}
