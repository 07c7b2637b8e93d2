//! Single-flight session registry using the actor pattern.
//!
//! The registry is the only owner of the caller → session map. It
//! receives commands via a tokio mpsc channel, which serializes
//! `begin`/`end`/`abort` and gives the single-flight guarantee without a
//! lock around the map. Disconnects detected by the liveness watch come
//! back into the same channel as `Abort` commands.

use tokio::sync::mpsc;

use crate::liveness::LivenessWatcher;

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{RegistryCommand, RegistryError, ShotPermit};
pub use handle::RegistryHandle;

/// Command channel depth. Small: each caller has at most one in-flight
/// session and a couple of control messages.
const COMMAND_BUFFER: usize = 64;

/// Spawns the registry actor and returns a handle for interaction.
///
/// The watcher is consulted on every accepted session to arm the
/// disconnect watch for its caller.
pub fn spawn_registry(watcher: LivenessWatcher) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = RegistryActor::new(cmd_rx, cmd_tx.downgrade(), watcher);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx)
}
