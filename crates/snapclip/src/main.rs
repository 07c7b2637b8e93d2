//! snapclip - CLI client for the snapclip daemon
//!
//! ```bash
//! # Capture the focused window to the clipboard
//! snapclip window
//!
//! # Select an area interactively and capture it
//! snapclip select
//!
//! # Show in-flight shots
//! snapclip list
//! ```
//!
//! Exit codes: 0 on success, 1 on a failed shot, 2 if the daemon is
//! busy with another shot for this connection.

mod client;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use snapclip_core::CaptureMode;

use crate::client::{ShotClient, ShotReply};

const DEFAULT_SOCKET_PATH: &str = "/tmp/snapclip.sock";

/// snapclip - clipboard screenshots
#[derive(Parser, Debug)]
#[command(name = "snapclip", version, about)]
struct Args {
    /// Path to the daemon socket (defaults to $SNAPCLIP_SOCKET, then
    /// /tmp/snapclip.sock)
    #[arg(long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture the focused window to the clipboard
    Window,
    /// Select an area and capture it to the clipboard
    Select,
    /// List in-flight shots
    List,
}

/// Socket path resolution, matching the daemon: flag, then environment,
/// then the compiled-in default.
fn default_socket_path() -> PathBuf {
    env::var("SNAPCLIP_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOCKET_PATH))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let socket = args.socket.unwrap_or_else(default_socket_path);

    let mut client = ShotClient::connect(&socket)
        .await
        .with_context(|| format!("failed to connect to daemon at {}", socket.display()))?;

    let code = match args.command {
        Command::Window => run_shot(&mut client, CaptureMode::Window).await?,
        Command::Select => run_shot(&mut client, CaptureMode::Area).await?,
        Command::List => {
            let shots = client.list_shots().await?;
            if shots.is_empty() {
                println!("No shots in flight.");
            } else {
                for shot in shots {
                    println!("{}  {}  started {}", shot.caller, shot.mode, shot.started_at);
                }
            }
            ExitCode::SUCCESS
        }
    };

    let _ = client.disconnect().await;
    Ok(code)
}

async fn run_shot(client: &mut ShotClient, mode: CaptureMode) -> anyhow::Result<ExitCode> {
    match client.request_shot(mode).await? {
        ShotReply::Success => {
            println!("Screenshot copied to clipboard.");
            Ok(ExitCode::SUCCESS)
        }
        ShotReply::Failure => {
            eprintln!("Screenshot failed.");
            Ok(ExitCode::from(1))
        }
        ShotReply::Busy(message) => {
            eprintln!("Daemon busy: {message}");
            Ok(ExitCode::from(2))
        }
    }
}
