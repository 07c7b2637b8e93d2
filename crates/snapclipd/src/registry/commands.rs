//! Registry actor commands, errors, and the shot permit.

use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use snapclip_core::{CallerId, CaptureMode, ShotView};

/// Commands sent to the registry actor.
///
/// Request/response commands carry a oneshot channel for the reply.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Open a session for `caller` if it does not already have one.
    ///
    /// # Errors
    /// - `RegistryError::Busy` if the caller already owns a live session
    Begin {
        caller: CallerId,
        mode: CaptureMode,
        respond_to: oneshot::Sender<Result<ShotPermit, RegistryError>>,
    },

    /// Close the caller's session, releasing its watch. Idempotent: safe
    /// whether the session ended normally, was aborted, or never existed.
    End {
        caller: CallerId,
        respond_to: oneshot::Sender<()>,
    },

    /// Cancel and remove the caller's session. Sent by the disconnect
    /// watch task; fire-and-forget.
    Abort { caller: CallerId },

    /// Whether the caller currently owns a session.
    IsActive {
        caller: CallerId,
        respond_to: oneshot::Sender<bool>,
    },

    /// Snapshot of all in-flight sessions.
    ActiveShots {
        respond_to: oneshot::Sender<Vec<ShotView>>,
    },
}

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The caller already has an active session.
    #[error("an ongoing screenshot exists for {0}")]
    Busy(CallerId),

    /// The actor has shut down.
    #[error("registry channel closed")]
    ChannelClosed,
}

/// Proof that the registry accepted a session for this caller.
///
/// Carries the session's cancellation token; the token is cancelled when
/// the caller disconnects, and the holder must drive the session to a
/// terminal state and then call `end`.
#[derive(Debug)]
pub struct ShotPermit {
    pub caller: CallerId,
    pub mode: CaptureMode,
    pub cancel: CancellationToken,
}
