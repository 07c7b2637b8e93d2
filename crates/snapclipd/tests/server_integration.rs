//! Integration tests for the Unix socket server.
//!
//! These drive the daemon over a real socket with raw protocol
//! messages: handshake, shot requests, pipelined busy rejection, and
//! the disconnect-abort path.
//!
//! Per project policy, tests CAN use `.unwrap()` and `.expect()`.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use common::{BlockingSelector, QuietFeedback, StubCapture};
use snapclip_core::CallerId;
use snapclip_protocol::{ClientMessage, DaemonMessage};
use snapclipd::backend::{Backends, FixedSelector, MemoryClipboard, SyntheticCapture};
use snapclipd::liveness::LivenessWatcher;
use snapclipd::registry::spawn_registry;
use snapclipd::server::{ConnectionPresence, ShotServer};
use snapclipd::service::{ScreenshotService, ServiceConfig};

// ============================================================================
// Constants
// ============================================================================

/// Maximum time to wait for the server socket to appear
const SOCKET_WAIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Interval between socket existence checks
const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Per-reply read timeout
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Grace period for abort bookkeeping to settle
const SETTLE: Duration = Duration::from_millis(100);

// ============================================================================
// Test harness
// ============================================================================

/// Running server plus the pieces tests assert against.
struct TestServer {
    socket_path: PathBuf,
    clipboard: Arc<MemoryClipboard>,
    cancel_token: CancellationToken,
    _temp_dir: TempDir, // Keep alive for RAII cleanup
}

impl TestServer {
    /// Spawns a server over the given capture/selector doubles.
    async fn spawn(backends: Backends, clipboard: Arc<MemoryClipboard>) -> Self {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let socket_path = temp_dir.path().join("test.sock");

        let presence = ConnectionPresence::new();
        let watcher = LivenessWatcher::new(Arc::new(presence.clone()));
        let registry = spawn_registry(watcher);
        let service =
            ScreenshotService::new(registry, Arc::new(backends), ServiceConfig::default());

        let cancel_token = CancellationToken::new();
        let server = ShotServer::new(
            socket_path.clone(),
            service,
            presence,
            cancel_token.clone(),
        );

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        // Wait for the socket to be ready with timeout
        let start = tokio::time::Instant::now();
        while start.elapsed() < SOCKET_WAIT_TIMEOUT {
            if socket_path.exists() {
                break;
            }
            sleep(SOCKET_POLL_INTERVAL).await;
        }
        assert!(
            socket_path.exists(),
            "server socket did not appear within {SOCKET_WAIT_TIMEOUT:?}"
        );

        Self {
            socket_path,
            clipboard,
            cancel_token,
            _temp_dir: temp_dir,
        }
    }

    /// Spawns a server whose shots succeed quickly.
    async fn spawn_happy() -> Self {
        let clipboard = Arc::new(MemoryClipboard::new());
        let backends = Backends {
            capture: Arc::new(SyntheticCapture::default()),
            selector: Arc::new(FixedSelector::default()),
            feedback: Arc::new(QuietFeedback),
            clipboard: clipboard.clone(),
        };
        Self::spawn(backends, clipboard).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Raw protocol client over an un-split line codec.
struct RawClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl RawClient {
    async fn connect(path: &PathBuf) -> Self {
        let stream = UnixStream::connect(path).await.expect("connect to server");
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn send(&mut self, msg: &ClientMessage) {
        let json = serde_json::to_string(msg).expect("serialize request");
        self.send_raw(&json).await;
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("write request");
        self.writer.write_all(b"\n").await.expect("write newline");
    }

    async fn recv(&mut self) -> DaemonMessage {
        let mut line = String::new();
        let read = timeout(REPLY_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("reply within timeout")
            .expect("read reply");
        assert!(read > 0, "server closed the connection");
        serde_json::from_str(&line).expect("parse reply")
    }

    /// Performs the opening handshake, returning the assigned identity.
    async fn handshake(&mut self) -> CallerId {
        self.send(&ClientMessage::connect()).await;
        match self.recv().await {
            DaemonMessage::Connected { caller_id, .. } => caller_id,
            other => panic!("expected connected reply, got {other:?}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_handshake_assigns_connection_identity() {
    let server = TestServer::spawn_happy().await;

    let mut client = RawClient::connect(&server.socket_path).await;
    let caller = client.handshake().await;
    assert!(caller.as_str().starts_with("conn-"));

    let mut second = RawClient::connect(&server.socket_path).await;
    let other = second.handshake().await;
    assert_ne!(caller, other, "each connection gets its own identity");
}

#[tokio::test]
async fn test_window_shot_end_to_end() {
    let server = TestServer::spawn_happy().await;

    let mut client = RawClient::connect(&server.socket_path).await;
    client.handshake().await;

    client.send(&ClientMessage::window_shot(1)).await;
    match client.recv().await {
        DaemonMessage::ShotResult { seq, success } => {
            assert_eq!(seq, 1);
            assert!(success);
        }
        other => panic!("expected shot result, got {other:?}"),
    }

    let (media, bytes) = server
        .clipboard
        .current()
        .await
        .expect("clipboard should hold the shot");
    assert_eq!(media, "image/png");
    assert!(!bytes.is_empty());
}

#[tokio::test]
async fn test_select_shot_end_to_end() {
    let server = TestServer::spawn_happy().await;

    let mut client = RawClient::connect(&server.socket_path).await;
    client.handshake().await;

    client.send(&ClientMessage::select_shot(9)).await;
    match client.recv().await {
        DaemonMessage::ShotResult { seq, success } => {
            assert_eq!(seq, 9);
            assert!(success);
        }
        other => panic!("expected shot result, got {other:?}"),
    }
    assert!(server.clipboard.current().await.is_some());
}

#[tokio::test]
async fn test_pipelined_second_request_gets_busy() {
    let clipboard = Arc::new(MemoryClipboard::new());
    let backends = Backends {
        capture: Arc::new(StubCapture::slow(Duration::from_millis(300))),
        selector: Arc::new(FixedSelector::default()),
        feedback: Arc::new(QuietFeedback),
        clipboard: clipboard.clone(),
    };
    let server = TestServer::spawn(backends, clipboard).await;

    let mut client = RawClient::connect(&server.socket_path).await;
    client.handshake().await;

    client.send(&ClientMessage::window_shot(1)).await;
    sleep(Duration::from_millis(50)).await;
    client.send(&ClientMessage::window_shot(2)).await;

    // The busy rejection for seq 2 lands first; the success for seq 1
    // arrives when the slow capture completes.
    let mut replies = Vec::new();
    replies.push(client.recv().await);
    replies.push(client.recv().await);

    let busy = replies
        .iter()
        .find_map(|r| match r {
            DaemonMessage::Busy { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("one reply should be busy");
    assert_eq!(busy, 2);

    let result = replies
        .iter()
        .find_map(|r| match r {
            DaemonMessage::ShotResult { seq, success } => Some((*seq, *success)),
            _ => None,
        })
        .expect("one reply should be a shot result");
    assert_eq!(result, (1, true));
}

#[tokio::test]
async fn test_disconnect_mid_selection_cleans_up() {
    let clipboard = Arc::new(MemoryClipboard::new());
    let backends = Backends {
        capture: Arc::new(StubCapture::quick()),
        selector: Arc::new(BlockingSelector),
        feedback: Arc::new(QuietFeedback),
        clipboard: clipboard.clone(),
    };
    let server = TestServer::spawn(backends, clipboard).await;

    let mut watcher = RawClient::connect(&server.socket_path).await;
    watcher.handshake().await;

    {
        let mut client = RawClient::connect(&server.socket_path).await;
        client.handshake().await;
        client.send(&ClientMessage::select_shot(1)).await;

        // Let the session park in area selection, then vanish.
        sleep(Duration::from_millis(80)).await;
        watcher.send(&ClientMessage::list_shots()).await;
        match watcher.recv().await {
            DaemonMessage::ShotList { shots } => {
                assert_eq!(shots.len(), 1, "session should be in flight")
            }
            other => panic!("expected shot list, got {other:?}"),
        }
    }

    // The dropped connection aborts the session and removes the entry;
    // no reply was ever written for it.
    sleep(SETTLE).await;
    watcher.send(&ClientMessage::list_shots()).await;
    match watcher.recv().await {
        DaemonMessage::ShotList { shots } => assert!(shots.is_empty()),
        other => panic!("expected shot list, got {other:?}"),
    }
    assert!(server.clipboard.current().await.is_none());
}

#[tokio::test]
async fn test_incompatible_version_is_rejected() {
    let server = TestServer::spawn_happy().await;

    let mut client = RawClient::connect(&server.socket_path).await;
    client
        .send_raw(r#"{"protocol_version":{"major":99,"minor":0},"type":"connect"}"#)
        .await;

    match client.recv().await {
        DaemonMessage::Rejected { reason, .. } => {
            assert!(reason.contains("99.0"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shot_before_connect_is_rejected() {
    let server = TestServer::spawn_happy().await;

    let mut client = RawClient::connect(&server.socket_path).await;
    client.send(&ClientMessage::window_shot(1)).await;

    match client.recv().await {
        DaemonMessage::Rejected { .. } => {}
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_graceful_disconnect_request() {
    let server = TestServer::spawn_happy().await;

    let mut client = RawClient::connect(&server.socket_path).await;
    client.handshake().await;
    client.send(&ClientMessage::disconnect()).await;

    // The server closes its side; the next read returns EOF.
    let mut line = String::new();
    let read = timeout(REPLY_TIMEOUT, client.reader.read_line(&mut line))
        .await
        .expect("read should resolve")
        .expect("read after disconnect");
    assert_eq!(read, 0);
}
