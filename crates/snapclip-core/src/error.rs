//! Failure taxonomy for a screenshot session.
//!
//! Every failure is terminal for its session; nothing is retried. `Busy`
//! is rejected before a session exists, and `Aborted` is never surfaced
//! to the caller (there is no caller left to reply to).

use crate::CallerId;
use thiserror::Error;

/// Terminal outcome of a failed screenshot session.
#[derive(Debug, Clone, Error)]
pub enum ShotError {
    /// The caller already has an active session. Rejected at `begin`,
    /// before any resources are allocated.
    #[error("an ongoing screenshot exists for {0}")]
    Busy(CallerId),

    /// Interactive area selection was cancelled or errored.
    #[error("area selection failed: {0}")]
    Selection(#[from] SelectionError),

    /// The capture or feedback sub-operation failed.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// The clipboard publish failed.
    #[error("clipboard delivery failed: {0}")]
    Delivery(#[from] ClipboardError),

    /// The caller disconnected before the session completed.
    #[error("caller disconnected before completion")]
    Aborted,

    /// The registry is gone; the service is shutting down.
    #[error("screenshot service is unavailable")]
    Unavailable,
}

/// Why interactive area selection did not produce a region.
#[derive(Debug, Clone, Error)]
pub enum SelectionError {
    #[error("selection cancelled by the user")]
    Cancelled,

    #[error("selected region is empty")]
    EmptyRegion,

    #[error("selector failed: {0}")]
    Backend(String),
}

/// Why the joint capture + feedback step failed.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("capture backend failed: {0}")]
    Backend(String),

    /// The backend resolved without firing the capture-taken signal.
    #[error("capture-taken signal dropped before firing")]
    SignalDropped,

    #[error(transparent)]
    Feedback(#[from] FeedbackError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// The flash/sound acknowledgment failed to render.
#[derive(Debug, Clone, Error)]
#[error("feedback failed: {0}")]
pub struct FeedbackError(pub String);

/// Why clipboard delivery failed.
#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    #[error("clipboard rejected content: {0}")]
    Backend(String),

    /// The sink held no bytes when the session went to finalize.
    #[error("capture produced no image data")]
    NoContent,
}

/// Misuse of the write-once image sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("image sink already finished")]
    Finished,

    #[error("image sink is empty")]
    Empty,
}
