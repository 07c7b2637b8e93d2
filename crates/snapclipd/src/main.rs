//! Snapclip daemon - screenshot sessions over a Unix socket
//!
//! This binary runs as a background daemon, accepting shot requests from
//! clients and delivering captured images to the clipboard.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (foreground)
//! snapclipd start
//!
//! # Start the daemon (background/daemonized)
//! snapclipd start -d
//!
//! # Stop the daemon
//! snapclipd stop
//!
//! # Check daemon status
//! snapclipd status
//!
//! # Start with custom socket path
//! SNAPCLIP_SOCKET=/run/snapclip.sock snapclipd start
//!
//! # Enable debug logging
//! RUST_LOG=snapclipd=debug snapclipd start
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: graceful shutdown

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use snapclipd::backend::Backends;
use snapclipd::liveness::LivenessWatcher;
use snapclipd::registry::spawn_registry;
use snapclipd::server::{ConnectionPresence, ShotServer, DEFAULT_SOCKET_PATH};
use snapclipd::service::{ScreenshotService, ServiceConfig};

/// How long `stop` waits for the daemon to exit after SIGTERM.
const STOP_WAIT: Duration = Duration::from_secs(5);

/// snapclip daemon - clipboard screenshot service
#[derive(Parser, Debug)]
#[command(name = "snapclipd", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the daemon
    Start {
        /// Run as a background daemon (fork to background)
        #[arg(short = 'd', long)]
        daemon: bool,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
}

/// Per-user state directory holding the pid and log files.
fn state_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("snapclip")
}

fn pid_file() -> PathBuf {
    state_dir().join("snapclipd.pid")
}

fn log_file() -> PathBuf {
    state_dir().join("snapclipd.log")
}

/// PID recorded by a previous `start`, if any.
fn read_pid() -> Option<u32> {
    let contents = fs::read_to_string(pid_file()).ok()?;
    contents.trim().parse().ok()
}

fn write_pid() -> Result<()> {
    fs::create_dir_all(state_dir()).context("Failed to create state directory")?;
    fs::write(pid_file(), process::id().to_string()).context("Failed to write PID file")?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(pid_file());
}

fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{pid}")).exists()
}

/// PID of the live daemon, if one is running. Cleans up a pid file left
/// behind by a crashed daemon.
fn running_daemon() -> Option<u32> {
    let pid = read_pid()?;
    if is_process_running(pid) {
        return Some(pid);
    }
    remove_pid_file();
    None
}

fn send_sigterm(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        if unsafe { libc::kill(pid as i32, libc::SIGTERM) } != 0 {
            bail!("Failed to send SIGTERM to process {}", pid);
        }
    }
    #[cfg(not(unix))]
    {
        bail!("Stop command is only supported on Unix systems");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command.unwrap_or(Command::Start { daemon: false }) {
        Command::Start { daemon } => start(daemon),
        Command::Stop => stop(),
        Command::Status => status(),
    }
}

fn start(daemon: bool) -> Result<()> {
    if let Some(pid) = running_daemon() {
        eprintln!("Daemon is already running (PID {pid})");
        eprintln!("Use 'snapclipd stop' to stop it first.");
        process::exit(1);
    }

    if daemon {
        // Fork before the tokio runtime exists.
        daemonize()?;
    }

    write_pid()?;
    let result = run_daemon();
    remove_pid_file();
    result
}

fn stop() -> Result<()> {
    let Some(pid) = running_daemon() else {
        println!("Daemon is not running.");
        return Ok(());
    };

    println!("Stopping daemon (PID {pid})...");
    send_sigterm(pid)?;

    let poll = Duration::from_millis(100);
    let mut waited = Duration::ZERO;
    while waited < STOP_WAIT {
        if !is_process_running(pid) {
            println!("Daemon stopped.");
            return Ok(());
        }
        std::thread::sleep(poll);
        waited += poll;
    }

    eprintln!("Daemon did not stop within {STOP_WAIT:?}.");
    process::exit(1);
}

fn status() -> Result<()> {
    let Some(pid) = running_daemon() else {
        println!("Daemon is not running.");
        process::exit(1);
    };

    println!("Daemon is running (PID {pid})");

    let socket_path =
        env::var("SNAPCLIP_SOCKET").unwrap_or_else(|_| DEFAULT_SOCKET_PATH.to_string());
    if PathBuf::from(&socket_path).exists() {
        println!("Socket: {socket_path}");
    }

    Ok(())
}

/// Forks to the background, redirecting stdout/stderr to the log file.
fn daemonize() -> Result<()> {
    use daemonize::Daemonize;
    use std::fs::File;

    fs::create_dir_all(state_dir()).context("Failed to create log directory")?;
    let log_path = log_file();

    let stdout = File::create(&log_path).context("Failed to create log file for stdout")?;
    let stderr = File::create(&log_path).context("Failed to create log file for stderr")?;

    Daemonize::new()
        .working_directory("/")
        .stdout(stdout)
        .stderr(stderr)
        .start()
        .context("Failed to daemonize")?;

    Ok(())
}

/// Runs the daemon (async entry point).
#[tokio::main]
async fn run_daemon() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("snapclipd=info".parse()?)
                .add_directive("snapclip_core=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "snapclip daemon starting"
    );

    let socket_path =
        env::var("SNAPCLIP_SOCKET").unwrap_or_else(|_| DEFAULT_SOCKET_PATH.to_string());

    let cancel_token = CancellationToken::new();

    // Signal handling
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "error waiting for shutdown signal");
        }
        info!("shutdown signal received");
        shutdown_token.cancel();
    });

    // Presence is shared between the liveness watcher and the server:
    // dropped connections are how sessions get aborted.
    let presence = ConnectionPresence::new();
    let watcher = LivenessWatcher::new(Arc::new(presence.clone()));

    let registry = spawn_registry(watcher);
    info!("session registry started");

    let service = ScreenshotService::new(
        registry,
        Arc::new(Backends::synthetic()),
        ServiceConfig::default(),
    );

    let server = ShotServer::new(&socket_path, service, presence, cancel_token);

    info!(socket = %socket_path, "starting server");

    if let Err(e) = server.run().await {
        error!(error = %e, "server error");
        return Err(e.into());
    }

    info!("snapclip daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("received Ctrl+C");
    }

    Ok(())
}
