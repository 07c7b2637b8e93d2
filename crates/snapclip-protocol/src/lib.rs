//! Wire protocol for snapclip daemon/client communication.
//!
//! Newline-delimited JSON messages over a Unix socket. Clients open with
//! `Connect` and are assigned their caller identity by the daemon; shot
//! requests carry a `seq` tag so replies can be matched when requests
//! are pipelined on one connection.

pub mod message;
pub mod version;

pub use message::{ClientMessage, DaemonMessage, Request};
pub use version::ProtocolVersion;
