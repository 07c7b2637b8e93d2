//! Unix socket server for the snapclip daemon.
//!
//! The server:
//! - listens on a Unix socket for client connections
//! - assigns each connection its caller identity and presence guard
//! - spawns a ConnectionHandler per client
//! - supports graceful shutdown via CancellationToken

mod connection;
mod presence;

pub use connection::{ConnectionError, ConnectionHandler};
pub use presence::{ConnectionPresence, PresenceGuard};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use snapclip_core::CallerId;

use crate::service::ScreenshotService;

/// Default socket path
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/snapclip.sock";

/// Unix socket server for the snapclip daemon.
pub struct ShotServer {
    /// Path to the Unix socket
    socket_path: PathBuf,

    /// The screenshot service driven by client requests
    service: ScreenshotService,

    /// Presence source backing the liveness watcher; connections
    /// register here for their lifetime.
    presence: ConnectionPresence,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter; the source of caller identities
    connection_counter: AtomicU64,
}

impl ShotServer {
    /// Creates a new server.
    ///
    /// `presence` must be the same instance the registry's liveness
    /// watcher was built over, or disconnects will never be observed.
    pub fn new(
        socket_path: impl Into<PathBuf>,
        service: ScreenshotService,
        presence: ConnectionPresence,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            socket_path: socket_path.into(),
            service,
            presence,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Runs the server.
    ///
    /// Listens for connections until the cancellation token is
    /// triggered; does not return until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = self.bind()?;
        info!(socket = %self.socket_path.display(), "snapclip server listening");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("server shutdown requested");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let number = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            self.handle_connection(stream, number);
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }
            }
        }

        self.cleanup();
        Ok(())
    }

    /// Binds the listening socket, replacing a stale socket file from a
    /// previous run and creating the parent directory if needed.
    fn bind(&self) -> Result<UnixListener, ServerError> {
        let setup_err = |e: std::io::Error| ServerError::SocketSetup {
            path: self.socket_path.clone(),
            error: e.to_string(),
        };

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(setup_err)?;
        }

        if let Some(parent) = self.socket_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(setup_err)?;
            }
        }

        UnixListener::bind(&self.socket_path).map_err(setup_err)
    }

    /// Assigns the connection its identity and spawns its handler task.
    ///
    /// The presence guard travels with the handler, so whichever way the
    /// task ends, the caller is reported as vanished and any in-flight
    /// session gets aborted by the registry.
    fn handle_connection(&self, stream: tokio::net::UnixStream, number: u64) {
        let (reader, writer) = stream.into_split();
        let caller = CallerId::from_connection(number);
        let guard = self.presence.register(caller.clone());
        let service = self.service.clone();

        tokio::spawn(async move {
            let handler = ConnectionHandler::new(reader, writer, service, caller, guard);
            handler.run().await;
        });
    }

    /// Removes the socket file on shutdown.
    fn cleanup(&self) {
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(
                    socket = %self.socket_path.display(),
                    error = %e,
                    "failed to remove socket file"
                );
            }
        }

        info!("server cleanup complete");
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to set up socket at {path}: {error}")]
    SocketSetup { path: PathBuf, error: String },
}
