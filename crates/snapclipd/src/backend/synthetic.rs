//! Synthetic collaborators for development and testing.
//!
//! Fully functional implementations of the capture contracts, small by
//! design: the capture backend renders a flat test frame and encodes it
//! as a real PNG, so the clipboard ends up holding genuine `image/png`
//! bytes end to end.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info};

use snapclip_core::{
    AreaSelector, CaptureBackend, CaptureError, Clipboard, ClipboardError, FeedbackError,
    FeedbackRenderer, ImageSink, Region, SelectionError, ShotTaken, WindowOptions,
};

/// Theme sound cue played with the capture flash.
const SHUTTER_SOUND: &str = "screen-capture";

// ============================================================================
// Capture
// ============================================================================

/// Renders a flat RGBA frame of the virtual screen and PNG-encodes it.
pub struct SyntheticCapture {
    /// Bounds of the virtual screen; window shots capture all of it.
    screen: Region,
    /// Fill color for rendered frames (RGBA).
    fill: [u8; 4],
    /// Simulated shutter latency before pixels are "grabbed".
    shutter: Duration,
}

impl SyntheticCapture {
    pub fn new(screen: Region) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    fn render_png(&self, region: Region) -> Result<Vec<u8>, CaptureError> {
        if region.is_empty() {
            return Err(CaptureError::Backend(format!(
                "cannot render empty region {region}"
            )));
        }

        encode_png(region.width, region.height, self.fill)
            .map_err(|e| CaptureError::Backend(e.to_string()))
    }

    async fn grab(
        &self,
        region: Region,
        sink: ImageSink,
        taken: ShotTaken,
    ) -> Result<(), CaptureError> {
        sleep(self.shutter).await;
        let encoded = self.render_png(region)?;

        // Pixels are grabbed: let the feedback arm flash while the
        // encoded bytes land in the sink.
        taken.fire(region);
        sink.write(&encoded)?;

        debug!(region = %region, bytes = encoded.len(), "synthetic capture complete");
        Ok(())
    }
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self {
            screen: Region::new(0, 0, 1280, 720),
            fill: [0x2e, 0x34, 0x36, 0xff],
            shutter: Duration::from_millis(20),
        }
    }
}

#[async_trait]
impl CaptureBackend for SyntheticCapture {
    async fn capture_window(
        &self,
        opts: WindowOptions,
        sink: ImageSink,
        taken: ShotTaken,
    ) -> Result<(), CaptureError> {
        debug!(
            cursor = opts.include_cursor,
            frame = opts.include_frame,
            "window capture requested"
        );
        self.grab(self.screen, sink, taken).await
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

/// Encodes a flat-colored RGBA image.
fn encode_png(width: u32, height: u32, fill: [u8; 4]) -> Result<Vec<u8>, png::EncodingError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        let pixel_count = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&fill);
        }
        writer.write_image_data(&data)?;
    }
    Ok(out)
}

// ============================================================================
// Selection
// ============================================================================

/// Resolves to a preconfigured region after a settling delay, standing
/// in for the interactive selection overlay.
pub struct FixedSelector {
    region: Region,
    settle: Duration,
}

impl FixedSelector {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }
}

impl Default for FixedSelector {
    fn default() -> Self {
        Self {
            region: Region::new(160, 90, 960, 540),
            settle: Duration::from_millis(10),
        }
    }
}

#[async_trait]
impl AreaSelector for FixedSelector {
    async fn select_region(&self) -> Result<Region, SelectionError> {
        sleep(self.settle).await;
        Ok(self.region)
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// Logs the flash and sound cue instead of rendering them.
pub struct LogFeedback {
    flash: Duration,
}

impl Default for LogFeedback {
    fn default() -> Self {
        Self {
            flash: Duration::from_millis(15),
        }
    }
}

#[async_trait]
impl FeedbackRenderer for LogFeedback {
    async fn acknowledge(&self, region: Region) -> Result<(), FeedbackError> {
        info!(region = %region, sound = SHUTTER_SOUND, "screenshot taken");
        sleep(self.flash).await;
        Ok(())
    }
}

// ============================================================================
// Clipboard
// ============================================================================

/// Holds the most recent clipboard content in memory.
#[derive(Default)]
pub struct MemoryClipboard {
    slot: Mutex<Option<(String, Vec<u8>)>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current content, if any. Used by tests to assert delivery.
    pub async fn current(&self) -> Option<(String, Vec<u8>)> {
        self.slot.lock().await.clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn set_content(&self, media_type: &str, bytes: Vec<u8>) -> Result<(), ClipboardError> {
        if bytes.is_empty() {
            return Err(ClipboardError::NoContent);
        }

        debug!(media_type, bytes = bytes.len(), "clipboard updated");
        *self.slot.lock().await = Some((media_type.to_string(), bytes));
        Ok(())
    }
}
