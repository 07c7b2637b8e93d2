//! Protocol message types for daemon communication.

use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};
use snapclip_core::{CallerId, ShotView};

/// Requests a client can send to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Opening handshake. The daemon assigns the caller identity.
    Connect,

    /// Capture the focused window to the clipboard.
    WindowShot {
        /// Tag echoed in the reply, for pipelined requests
        seq: u64,
    },

    /// Interactively select an area and capture it to the clipboard.
    SelectShot {
        /// Tag echoed in the reply, for pipelined requests
        seq: u64,
    },

    /// Request the list of in-flight shots.
    ListShots,

    /// Client disconnecting gracefully.
    Disconnect,
}

/// Messages sent from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Protocol version
    pub protocol_version: ProtocolVersion,

    /// Message payload
    #[serde(flatten)]
    pub request: Request,
}

impl ClientMessage {
    /// Creates a new client message with the current protocol version.
    pub fn new(request: Request) -> Self {
        Self {
            protocol_version: ProtocolVersion::CURRENT,
            request,
        }
    }

    /// Creates the opening handshake message.
    pub fn connect() -> Self {
        Self::new(Request::Connect)
    }

    /// Creates a window shot request.
    pub fn window_shot(seq: u64) -> Self {
        Self::new(Request::WindowShot { seq })
    }

    /// Creates a select-area shot request.
    pub fn select_shot(seq: u64) -> Self {
        Self::new(Request::SelectShot { seq })
    }

    /// Creates a shot list request.
    pub fn list_shots() -> Self {
        Self::new(Request::ListShots)
    }

    /// Creates a disconnect message.
    pub fn disconnect() -> Self {
        Self::new(Request::Disconnect)
    }
}

/// Messages sent from daemon to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonMessage {
    /// Handshake accepted; the caller identity is fixed for the life of
    /// the connection.
    Connected {
        protocol_version: ProtocolVersion,
        caller_id: CallerId,
    },

    /// Handshake rejected (version mismatch, bad opening message).
    Rejected {
        reason: String,
        protocol_version: ProtocolVersion,
    },

    /// Terminal outcome of a shot request.
    ShotResult { seq: u64, success: bool },

    /// The caller already has a shot in flight; distinct from a `false`
    /// result.
    Busy { seq: u64, message: String },

    /// Reply to `ListShots`.
    ShotList { shots: Vec<ShotView> },

    /// Error response for malformed or out-of-place messages.
    Error { message: String },
}

impl DaemonMessage {
    /// Creates a connected response.
    pub fn connected(caller_id: CallerId) -> Self {
        Self::Connected {
            protocol_version: ProtocolVersion::CURRENT,
            caller_id,
        }
    }

    /// Creates a rejected response.
    pub fn rejected(reason: &str) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
            protocol_version: ProtocolVersion::CURRENT,
        }
    }

    /// Creates a shot result reply.
    pub fn shot_result(seq: u64, success: bool) -> Self {
        Self::ShotResult { seq, success }
    }

    /// Creates a busy rejection reply.
    pub fn busy(seq: u64, message: &str) -> Self {
        Self::Busy {
            seq,
            message: message.to_string(),
        }
    }

    /// Creates a shot list reply.
    pub fn shot_list(shots: Vec<ShotView>) -> Self {
        Self::ShotList { shots }
    }

    /// Creates an error response.
    pub fn error(message: &str) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}
