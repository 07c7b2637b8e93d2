//! Snapclip Core - Shared types for the snapclip screenshot daemon
//!
//! This crate provides the domain types shared between the daemon
//! (snapclipd), the wire protocol, and the CLI client:
//! - `caller` - transport-assigned caller identity
//! - `geometry` - screen regions
//! - `shot` - capture modes, session states, shot views
//! - `sink` - the write-once image byte sink
//! - `backend` - contracts for the capture/selection/feedback/clipboard
//!   collaborators and the presence source
//! - `error` - the failure taxonomy for a screenshot session
//!
//! All production code follows the panic-free policy: no `.unwrap()`,
//! `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

pub mod backend;
pub mod caller;
pub mod error;
pub mod geometry;
pub mod shot;
pub mod sink;

// Re-exports for convenience
pub use backend::{
    AreaSelector, CaptureBackend, Clipboard, FeedbackRenderer, PresenceSource, ShotTaken,
};
pub use caller::CallerId;
pub use error::{CaptureError, ClipboardError, FeedbackError, SelectionError, ShotError, SinkError};
pub use geometry::Region;
pub use shot::{CaptureMode, ShotState, ShotView, WindowOptions, IMAGE_PNG};
pub use sink::ImageSink;
