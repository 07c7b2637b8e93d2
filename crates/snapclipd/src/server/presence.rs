//! Connection-backed presence source.
//!
//! The socket server registers each accepted connection here; the RAII
//! guard is held by the connection task, so any way the connection ends
//! (EOF, error, explicit disconnect) marks the caller as vanished. This
//! is the presence subsystem behind the liveness watcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use snapclip_core::{CallerId, PresenceSource};

type PresenceMap = HashMap<CallerId, CancellationToken>;

/// Tracks which caller identities currently have a live connection.
#[derive(Clone, Default)]
pub struct ConnectionPresence {
    inner: Arc<Mutex<PresenceMap>>,
}

impl ConnectionPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `caller` as present until the returned guard is dropped.
    ///
    /// Re-registering an identity marks the previous registration as
    /// vanished first; connection identities are unique by construction,
    /// so this only matters for tests.
    pub fn register(&self, caller: CallerId) -> PresenceGuard {
        let token = CancellationToken::new();

        if let Some(previous) = self.lock().insert(caller.clone(), token.clone()) {
            previous.cancel();
        }

        debug!(caller = %caller, "caller present");
        PresenceGuard {
            caller,
            token,
            map: Arc::clone(&self.inner),
        }
    }

    /// Number of currently present callers.
    #[cfg(test)]
    pub fn present_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, PresenceMap> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl PresenceSource for ConnectionPresence {
    async fn vanished(&self, caller: &CallerId) {
        // Clone the token out so the map lock is not held across await.
        let token = self.lock().get(caller).cloned();

        match token {
            Some(token) => token.cancelled().await,
            // Unknown identity: already gone.
            None => {}
        }
    }
}

/// RAII presence registration; dropping it marks the caller vanished.
pub struct PresenceGuard {
    caller: CallerId,
    token: CancellationToken,
    map: Arc<Mutex<PresenceMap>>,
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        self.token.cancel();

        let mut map = match self.map.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Only remove our own registration; a re-register may have
        // replaced it already.
        if map.get(&self.caller).is_some_and(|t| t.is_cancelled()) {
            map.remove(&self.caller);
        }
        debug!(caller = %self.caller, "caller vanished");
    }
}
