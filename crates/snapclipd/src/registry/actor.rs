//! Registry actor - owns the caller → session map.
//!
//! The actor is the single owner of session bookkeeping. Commands arrive
//! on an mpsc channel and are processed sequentially, so `begin`, `end`,
//! and `abort` are mutually exclusive by construction: no two sessions
//! for the same caller can coexist, and no session outlives its entry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use snapclip_core::{CallerId, CaptureMode, ShotView};

use crate::liveness::{LivenessWatcher, WatchGuard};

use super::commands::{RegistryCommand, RegistryError, ShotPermit};

/// Bookkeeping for one accepted session.
///
/// The watch guard is held for the session's whole life so a caller that
/// disconnects at any point, including while selection blocks on user
/// interaction, gets cleaned up.
struct ActiveShot {
    mode: CaptureMode,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    _watch: WatchGuard,
}

/// The registry actor - owns all session state.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Weak sender cloned into watch tasks so disconnects come back as
    /// `Abort` commands through the same serialized command loop. Weak,
    /// so the actor does not keep its own channel open.
    self_sender: mpsc::WeakSender<RegistryCommand>,

    /// One live session per caller, at most.
    shots: HashMap<CallerId, ActiveShot>,

    /// Arms a disconnect watch per accepted session.
    watcher: LivenessWatcher,
}

impl RegistryActor {
    /// Creates a new registry actor.
    pub fn new(
        receiver: mpsc::Receiver<RegistryCommand>,
        self_sender: mpsc::WeakSender<RegistryCommand>,
        watcher: LivenessWatcher,
    ) -> Self {
        Self {
            receiver,
            self_sender,
            shots: HashMap::new(),
            watcher,
        }
    }

    /// Runs the actor event loop until all handles are dropped.
    pub async fn run(mut self) {
        info!("Session registry starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(sessions = self.shots.len(), "Session registry stopped");
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Begin {
                caller,
                mode,
                respond_to,
            } => {
                let result = self.handle_begin(caller, mode);
                // Ignore send error - client may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::End { caller, respond_to } => {
                self.handle_end(&caller);
                let _ = respond_to.send(());
            }
            RegistryCommand::Abort { caller } => {
                self.handle_abort(&caller);
            }
            RegistryCommand::IsActive { caller, respond_to } => {
                let _ = respond_to.send(self.shots.contains_key(&caller));
            }
            RegistryCommand::ActiveShots { respond_to } => {
                let _ = respond_to.send(self.handle_active_shots());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    /// Accepts a session for `caller` unless one is already live.
    ///
    /// On acceptance, arms a disconnect watch whose callback routes an
    /// `Abort` for this caller back into the command loop.
    fn handle_begin(
        &mut self,
        caller: CallerId,
        mode: CaptureMode,
    ) -> Result<ShotPermit, RegistryError> {
        if self.shots.contains_key(&caller) {
            debug!(caller = %caller, "begin rejected, session already in flight");
            return Err(RegistryError::Busy(caller));
        }

        let cancel = CancellationToken::new();
        let started_at = Utc::now();

        let watch = self.watcher.watch(caller.clone(), {
            let sender = self.self_sender.clone();
            let caller = caller.clone();
            async move {
                // The actor may already be gone during shutdown.
                if let Some(sender) = sender.upgrade() {
                    let _ = sender.send(RegistryCommand::Abort { caller }).await;
                }
            }
        });

        self.shots.insert(
            caller.clone(),
            ActiveShot {
                mode,
                started_at,
                cancel: cancel.clone(),
                _watch: watch,
            },
        );

        info!(
            caller = %caller,
            mode = %mode,
            active = self.shots.len(),
            "Session accepted"
        );

        Ok(ShotPermit {
            caller,
            mode,
            cancel,
        })
    }

    /// Removes the caller's entry. Dropping it releases the watch and the
    /// session bookkeeping; callers without an entry are a no-op.
    fn handle_end(&mut self, caller: &CallerId) {
        if self.shots.remove(caller).is_some() {
            debug!(caller = %caller, active = self.shots.len(), "Session ended");
        }
    }

    /// Cancels the caller's in-flight session and removes its entry.
    ///
    /// Invoked on disconnect: the cancellation token tells the shooter to
    /// fail without attempting finalization, since no reply can reach the
    /// caller anyway.
    fn handle_abort(&mut self, caller: &CallerId) {
        if let Some(shot) = self.shots.remove(caller) {
            shot.cancel.cancel();
            info!(
                caller = %caller,
                mode = %shot.mode,
                "Session aborted, caller disconnected"
            );
        }
    }

    fn handle_active_shots(&self) -> Vec<ShotView> {
        self.shots
            .iter()
            .map(|(caller, shot)| ShotView {
                caller: caller.clone(),
                mode: shot.mode,
                started_at: shot.started_at,
            })
            .collect()
    }
}
