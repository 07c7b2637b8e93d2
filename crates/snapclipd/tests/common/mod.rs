//! Shared test doubles for the collaborator contracts.
//!
//! Per project policy, tests CAN use `.unwrap()` and `.expect()`; the
//! panic-free behavior of production code is verified through
//! assertions.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use snapclip_core::{
    AreaSelector, CaptureBackend, CaptureError, FeedbackError, FeedbackRenderer, ImageSink, Region,
    SelectionError, ShotTaken, WindowOptions,
};
use snapclipd::backend::Backends;
use snapclipd::liveness::LivenessWatcher;
use snapclipd::registry::spawn_registry;
use snapclipd::server::ConnectionPresence;
use snapclipd::service::{ScreenshotService, ServiceConfig};

/// Minimal PNG-looking payload for stub captures.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nstub-image-bytes";

/// Region reported by stub window captures.
pub const STUB_SCREEN: Region = Region::new(0, 0, 800, 600);

// ============================================================================
// Capture stubs
// ============================================================================

/// Configurable capture double: optional latency, optional failure,
/// configurable payload.
pub struct StubCapture {
    bytes: Vec<u8>,
    delay: Duration,
    fail: bool,
}

impl StubCapture {
    /// Succeeds immediately with a fake PNG payload.
    pub fn quick() -> Self {
        Self {
            bytes: FAKE_PNG.to_vec(),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    /// Succeeds after `delay`; used to hold a session in `Capturing`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::quick()
        }
    }

    /// Fails after grabbing nothing.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::quick()
        }
    }

    /// Succeeds but writes no bytes into the sink.
    pub fn empty() -> Self {
        Self {
            bytes: Vec::new(),
            ..Self::quick()
        }
    }

    async fn grab(
        &self,
        region: Region,
        sink: ImageSink,
        taken: ShotTaken,
    ) -> Result<(), CaptureError> {
        sleep(self.delay).await;

        if self.fail {
            return Err(CaptureError::Backend("stub capture failure".to_string()));
        }

        taken.fire(region);
        if !self.bytes.is_empty() {
            sink.write(&self.bytes)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CaptureBackend for StubCapture {
    async fn capture_window(
        &self,
        _opts: WindowOptions,
        sink: ImageSink,
        taken: ShotTaken,
    ) -> Result<(), CaptureError> {
        self.grab(STUB_SCREEN, sink, taken).await
    }

    async fn capture_area(
        &self,
        region: Region,
        sink: ImageSink,
        taken: ShotTaken,
    ) -> Result<(), CaptureError> {
        self.grab(region, sink, taken).await
    }
}

// ============================================================================
// Selector stubs
// ============================================================================

/// Never resolves: the user is "still dragging". Sessions stuck here can
/// only end through abort.
pub struct BlockingSelector;

#[async_trait]
impl AreaSelector for BlockingSelector {
    async fn select_region(&self) -> Result<Region, SelectionError> {
        std::future::pending().await
    }
}

/// The user pressed Escape.
pub struct DecliningSelector;

#[async_trait]
impl AreaSelector for DecliningSelector {
    async fn select_region(&self) -> Result<Region, SelectionError> {
        Err(SelectionError::Cancelled)
    }
}

// ============================================================================
// Feedback stubs
// ============================================================================

/// Completes silently.
pub struct QuietFeedback;

#[async_trait]
impl FeedbackRenderer for QuietFeedback {
    async fn acknowledge(&self, _region: Region) -> Result<(), FeedbackError> {
        Ok(())
    }
}

/// The flash renderer is broken.
pub struct FailingFeedback;

#[async_trait]
impl FeedbackRenderer for FailingFeedback {
    async fn acknowledge(&self, _region: Region) -> Result<(), FeedbackError> {
        Err(FeedbackError("flash renderer unavailable".to_string()))
    }
}

// ============================================================================
// Clipboard stubs
// ============================================================================

/// Rejects every write.
pub struct FailingClipboard;

#[async_trait]
impl snapclip_core::Clipboard for FailingClipboard {
    async fn set_content(
        &self,
        _media_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<(), snapclip_core::ClipboardError> {
        Err(snapclip_core::ClipboardError::Backend(
            "clipboard store unavailable".to_string(),
        ))
    }
}

// ============================================================================
// Wiring helpers
// ============================================================================

/// Spawns a full service over the given backends.
///
/// Returns the presence source too: callers only exist while registered
/// there, so tests register a guard per caller and drop it to simulate
/// a disconnect.
pub fn service_with(backends: Backends) -> (ScreenshotService, ConnectionPresence) {
    let presence = ConnectionPresence::new();
    let watcher = LivenessWatcher::new(Arc::new(presence.clone()));
    let registry = spawn_registry(watcher);
    let service = ScreenshotService::new(registry, Arc::new(backends), ServiceConfig::default());

    (service, presence)
}
