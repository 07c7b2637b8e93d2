//! Snapclip Daemon - per-caller screenshot sessions over a Unix socket
//!
//! This crate provides the infrastructure for the snapclip daemon:
//! - `liveness` - one-shot disconnect watches over a presence source
//! - `registry` - single-flight session registry actor
//! - `shooter` - the per-session capture state machine
//! - `service` - the externally callable screenshot surface
//! - `backend` - synthetic collaborator implementations
//! - `server` - Unix socket transport and connection-backed presence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐      ┌──────────────────┐
//! │   ShotServer    │─────▶│ ScreenshotService │
//! │  (Unix socket)  │      │     (facade)      │
//! └────────┬────────┘      └────────┬─────────┘
//!          │ per-connection         │ begin/end
//!          │ presence guard         ▼
//!          │               ┌──────────────────┐
//!          └──────────────▶│  RegistryActor   │──▶ LivenessWatcher
//!            vanished      │ (caller → shot)  │      (abort on
//!                          └────────┬─────────┘       disconnect)
//!                                   │ permit
//!                                   ▼
//!                          ┌──────────────────┐
//!                          │     Shooter      │──▶ capture + feedback
//!                          │ (state machine)  │    join, clipboard
//!                          └──────────────────┘
//! ```
//!
//! All production code follows the panic-free policy: no `.unwrap()`,
//! `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`; channel
//! operations handle closure gracefully.

pub mod backend;
pub mod liveness;
pub mod registry;
pub mod server;
pub mod service;
pub mod shooter;
