//! Daemon connection client for the snapclip CLI.

use std::path::Path;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

use snapclip_core::{CaptureMode, ShotView};
use snapclip_protocol::{ClientMessage, DaemonMessage};

/// Outcome of one shot request, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotReply {
    /// The image is on the clipboard.
    Success,
    /// The shot failed (selection cancelled, capture error, delivery
    /// error).
    Failure,
    /// The daemon already has a shot in flight for this caller.
    Busy(String),
}

/// A connected, handshaken client.
pub struct ShotClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_seq: u64,
}

impl ShotClient {
    /// Connects to the daemon socket and performs the handshake.
    pub async fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| ClientError::Io(e.to_string()))?;
        let (reader, writer) = stream.into_split();

        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
            next_seq: 0,
        };

        client.send(&ClientMessage::connect()).await?;
        match client.read_reply().await? {
            DaemonMessage::Connected { .. } => Ok(client),
            DaemonMessage::Rejected { reason, .. } => Err(ClientError::Rejected(reason)),
            other => Err(ClientError::Protocol(format!(
                "unexpected handshake reply: {other:?}"
            ))),
        }
    }

    /// Issues one shot request and waits for its tagged reply.
    pub async fn request_shot(&mut self, mode: CaptureMode) -> Result<ShotReply, ClientError> {
        self.next_seq += 1;
        let seq = self.next_seq;

        let msg = match mode {
            CaptureMode::Window => ClientMessage::window_shot(seq),
            CaptureMode::Area => ClientMessage::select_shot(seq),
        };
        self.send(&msg).await?;

        loop {
            match self.read_reply().await? {
                DaemonMessage::ShotResult { seq: tag, success } if tag == seq => {
                    return Ok(if success {
                        ShotReply::Success
                    } else {
                        ShotReply::Failure
                    });
                }
                DaemonMessage::Busy { seq: tag, message } if tag == seq => {
                    return Ok(ShotReply::Busy(message));
                }
                DaemonMessage::Error { message } => {
                    return Err(ClientError::Protocol(message));
                }
                // A reply for another pipelined request; not ours.
                _ => continue,
            }
        }
    }

    /// Fetches the daemon's in-flight shot list.
    pub async fn list_shots(&mut self) -> Result<Vec<ShotView>, ClientError> {
        self.send(&ClientMessage::list_shots()).await?;

        loop {
            match self.read_reply().await? {
                DaemonMessage::ShotList { shots } => return Ok(shots),
                DaemonMessage::Error { message } => return Err(ClientError::Protocol(message)),
                _ => continue,
            }
        }
    }

    /// Tells the daemon this client is going away.
    pub async fn disconnect(mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::disconnect()).await
    }

    async fn send(&mut self, msg: &ClientMessage) -> Result<(), ClientError> {
        let json = serde_json::to_string(msg).map_err(|e| ClientError::Protocol(e.to_string()))?;

        self.writer
            .write_all(json.as_bytes())
            .await
            .map_err(|e| ClientError::Io(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| ClientError::Io(e.to_string()))?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<DaemonMessage, ClientError> {
        let mut line = String::new();
        let bytes_read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| ClientError::Io(e.to_string()))?;

        if bytes_read == 0 {
            return Err(ClientError::ConnectionClosed);
        }

        serde_json::from_str(&line).map_err(|e| ClientError::Protocol(e.to_string()))
    }
}

/// Errors talking to the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("daemon closed the connection")]
    ConnectionClosed,

    #[error("connection rejected: {0}")]
    Rejected(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}
