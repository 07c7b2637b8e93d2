//! Shot modes, session states, and status views.

use crate::CallerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type tag attached to clipboard content.
pub const IMAGE_PNG: &str = "image/png";

/// What kind of screenshot a session captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// The focused window, no interactive step.
    Window,
    /// A user-selected rectangle.
    Area,
}

impl CaptureMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Area => "area",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Options for a window capture.
///
/// Defaults match the shipped behavior: cursor and window frame are both
/// included in the captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowOptions {
    pub include_cursor: bool,
    pub include_frame: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            include_cursor: true,
            include_frame: true,
        }
    }
}

/// State of one screenshot session.
///
/// ```text
/// Idle -> SelectingArea -> Capturing -> Finalizing -> Done
///              |               |             |
///              +----------> Failed <---------+
/// ```
///
/// Window shots skip `SelectingArea`. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotState {
    Idle,
    SelectingArea,
    Capturing,
    Finalizing,
    Done,
    Failed,
}

impl ShotState {
    /// Returns true once the session can make no further progress.
    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for ShotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::SelectingArea => "selecting-area",
            Self::Capturing => "capturing",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// Read-only snapshot of an in-flight session, as reported by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotView {
    pub caller: CallerId,
    pub mode: CaptureMode,
    pub started_at: DateTime<Utc>,
}
