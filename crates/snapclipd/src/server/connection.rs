//! Connection handler for individual clients.
//!
//! Each connection gets a transport-assigned caller identity and a
//! presence registration for its lifetime. Shot requests are handled
//! concurrently with the read loop so a second, pipelined request from
//! the same caller reaches the facade and receives its distinct busy
//! reply while the first is still in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use snapclip_core::{CallerId, CaptureMode, ShotError};
use snapclip_protocol::{ClientMessage, DaemonMessage, ProtocolVersion, Request};

use crate::server::presence::PresenceGuard;
use crate::service::ScreenshotService;

/// Shared writer handle, also held by in-flight request tasks.
pub type ReplyWriter = Arc<Mutex<BufWriter<OwnedWriteHalf>>>;

/// Maximum request line size. Requests are tiny; anything larger is a
/// confused client.
const MAX_MESSAGE_SIZE: usize = 16 * 1024;

/// Write timeout; a peer that cannot take a one-line reply in this long
/// is treated as gone.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection handler for a single client.
///
/// There is deliberately no idle read timeout: a pending area selection
/// legitimately leaves the connection quiet for as long as the user
/// takes, and disconnects are what the presence registration is for.
pub struct ConnectionHandler {
    reader: BufReader<OwnedReadHalf>,
    writer: ReplyWriter,
    service: ScreenshotService,

    /// Identity assigned by the server from its connection counter.
    caller: CallerId,

    /// Held for the connection's lifetime; dropping it (any exit path)
    /// reports this caller as vanished.
    _presence: PresenceGuard,
}

impl ConnectionHandler {
    /// Creates a handler for an accepted connection.
    pub fn new(
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
        service: ScreenshotService,
        caller: CallerId,
        presence: PresenceGuard,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: Arc::new(Mutex::new(BufWriter::new(writer))),
            service,
            caller,
            _presence: presence,
        }
    }

    /// Runs the connection to completion: handshake, then the request
    /// loop. Returns when the client disconnects.
    pub async fn run(mut self) {
        if let Err(e) = self.handle_handshake().await {
            warn!(caller = %self.caller, error = %e, "handshake failed");
            return;
        }

        info!(caller = %self.caller, "client connected");

        if let Err(e) = self.process_requests().await {
            match e {
                ConnectionError::Eof => {}
                other => debug!(caller = %self.caller, error = %other, "connection closed"),
            }
        }

        info!(caller = %self.caller, "client disconnected");
    }

    /// Expects a `Connect` opener and checks protocol compatibility.
    async fn handle_handshake(&mut self) -> Result<(), ConnectionError> {
        let msg = self.read_message().await?;

        let client_version = msg.protocol_version;
        if !client_version.is_compatible_with(&ProtocolVersion::CURRENT) {
            self.send(DaemonMessage::rejected(&format!(
                "protocol version {client_version} not compatible with daemon version {}",
                ProtocolVersion::CURRENT
            )))
            .await?;

            return Err(ConnectionError::VersionMismatch {
                client: client_version,
                daemon: ProtocolVersion::CURRENT,
            });
        }

        match msg.request {
            Request::Connect => {
                self.send(DaemonMessage::connected(self.caller.clone())).await
            }
            other => {
                self.send(DaemonMessage::rejected("expected connect message"))
                    .await?;
                Err(ConnectionError::UnexpectedMessage(format!("{other:?}")))
            }
        }
    }

    /// Reads and dispatches requests until the connection closes.
    async fn process_requests(&mut self) -> Result<(), ConnectionError> {
        loop {
            let msg = self.read_message().await?;

            match msg.request {
                Request::Connect => {
                    self.send(DaemonMessage::error("already connected")).await?;
                }
                Request::WindowShot { seq } => {
                    self.spawn_shot(CaptureMode::Window, seq);
                }
                Request::SelectShot { seq } => {
                    self.spawn_shot(CaptureMode::Area, seq);
                }
                Request::ListShots => {
                    let shots = self.service.active_shots().await;
                    self.send(DaemonMessage::shot_list(shots)).await?;
                }
                Request::Disconnect => {
                    debug!(caller = %self.caller, "client requested disconnect");
                    return Ok(());
                }
            }
        }
    }

    /// Drives one shot request off the read loop.
    ///
    /// Replies are written through the shared writer, tagged with the
    /// request's `seq`. An aborted session writes nothing: the caller it
    /// would answer is the one that vanished.
    fn spawn_shot(&self, mode: CaptureMode, seq: u64) {
        let service = self.service.clone();
        let caller = self.caller.clone();
        let writer = Arc::clone(&self.writer);

        tokio::spawn(async move {
            let outcome = match mode {
                CaptureMode::Window => service.window_shot(caller.clone()).await,
                CaptureMode::Area => service.select_shot(caller.clone()).await,
            };

            let reply = match outcome {
                Ok(()) => Some(DaemonMessage::shot_result(seq, true)),
                Err(ShotError::Busy(_)) => Some(DaemonMessage::busy(
                    seq,
                    "an ongoing screenshot exists for this caller",
                )),
                Err(ShotError::Aborted) => None,
                Err(_) => Some(DaemonMessage::shot_result(seq, false)),
            };

            if let Some(reply) = reply {
                if let Err(e) = write_message(&writer, &reply).await {
                    debug!(caller = %caller, seq, error = %e, "failed to write shot reply");
                }
            }
        });
    }

    /// Reads a single message from the client.
    async fn read_message(&mut self) -> Result<ClientMessage, ConnectionError> {
        let mut line = String::new();

        let bytes_read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| ConnectionError::Io(e.to_string()))?;

        if bytes_read == 0 {
            return Err(ConnectionError::Eof);
        }

        if line.len() > MAX_MESSAGE_SIZE {
            return Err(ConnectionError::MessageTooLarge {
                size: line.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        serde_json::from_str(&line).map_err(|e| ConnectionError::Parse(e.to_string()))
    }

    async fn send(&self, msg: DaemonMessage) -> Result<(), ConnectionError> {
        write_message(&self.writer, &msg).await
    }
}

/// Serializes and writes one reply line through the shared writer.
pub async fn write_message(writer: &ReplyWriter, msg: &DaemonMessage) -> Result<(), ConnectionError> {
    let json = serde_json::to_string(msg).map_err(|e| ConnectionError::Parse(e.to_string()))?;

    let mut writer = writer.lock().await;

    match timeout(WRITE_TIMEOUT, async {
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    })
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
        Err(_) => Err(ConnectionError::WriteTimeout),
    }
}

/// Errors that can occur during connection handling.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("protocol version mismatch: client {client}, daemon {daemon}")]
    VersionMismatch {
        client: ProtocolVersion,
        daemon: ProtocolVersion,
    },

    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("connection closed")]
    Eof,

    #[error("write timeout")]
    WriteTimeout,

    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}
