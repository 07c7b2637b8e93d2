//! Collaborator implementations wired into the service.
//!
//! The contracts live in `snapclip-core::backend`; this module bundles
//! them for injection and provides the synthetic implementations the
//! daemon binary runs with. Compositor-specific backends implement the
//! same traits out of tree.

use std::sync::Arc;

use snapclip_core::{AreaSelector, CaptureBackend, Clipboard, FeedbackRenderer};

mod synthetic;

pub use synthetic::{FixedSelector, LogFeedback, MemoryClipboard, SyntheticCapture};

/// The collaborator bundle a service instance runs against.
pub struct Backends {
    pub capture: Arc<dyn CaptureBackend>,
    pub selector: Arc<dyn AreaSelector>,
    pub feedback: Arc<dyn FeedbackRenderer>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl Backends {
    /// The synthetic bundle used by the daemon binary: a rendered test
    /// frame for capture, a fixed selection region, logged feedback, and
    /// an in-memory clipboard.
    pub fn synthetic() -> Self {
        Self {
            capture: Arc::new(SyntheticCapture::default()),
            selector: Arc::new(FixedSelector::default()),
            feedback: Arc::new(LogFeedback::default()),
            clipboard: Arc::new(MemoryClipboard::new()),
        }
    }
}
