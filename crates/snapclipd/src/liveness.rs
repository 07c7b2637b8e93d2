//! One-shot disconnect watches over a presence source.
//!
//! The watcher decouples session bookkeeping from transport-level
//! presence tracking: the registry arms a watch per accepted session and
//! gets its `on_vanish` future run exactly once if the caller disappears
//! before the watch is released.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use snapclip_core::{CallerId, PresenceSource};

/// Arms per-caller disconnect watches against a [`PresenceSource`].
#[derive(Clone)]
pub struct LivenessWatcher {
    presence: Arc<dyn PresenceSource>,
}

impl LivenessWatcher {
    /// Creates a watcher over the given presence source.
    pub fn new(presence: Arc<dyn PresenceSource>) -> Self {
        Self { presence }
    }

    /// Starts watching `caller`.
    ///
    /// If the caller becomes unreachable while the returned guard is
    /// alive, `on_vanish` runs exactly once. Dropping the guard releases
    /// the watch; dropping it after the callback already ran is a no-op.
    pub fn watch<F>(&self, caller: CallerId, on_vanish: F) -> WatchGuard
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let stop = CancellationToken::new();
        let presence = Arc::clone(&self.presence);
        let stopped = stop.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = stopped.cancelled() => {
                    debug!(caller = %caller, "watch released");
                }
                _ = presence.vanished(&caller) => {
                    debug!(caller = %caller, "caller vanished");
                    on_vanish.await;
                }
            }
        });

        WatchGuard { stop }
    }
}

/// RAII registration of one disconnect watch. Dropping it deregisters
/// the watch.
#[derive(Debug)]
pub struct WatchGuard {
    stop: CancellationToken,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ConnectionPresence;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_vanish_fires_callback_once() {
        let presence = ConnectionPresence::new();
        let watcher = LivenessWatcher::new(Arc::new(presence.clone()));
        let fired = Arc::new(AtomicUsize::new(0));

        let caller = CallerId::new("conn-1");
        let registration = presence.register(caller.clone());
        let _guard = watcher.watch(caller, counting_callback(&fired));

        drop(registration);
        sleep(Duration::from_millis(50)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_released_watch_never_fires() {
        let presence = ConnectionPresence::new();
        let watcher = LivenessWatcher::new(Arc::new(presence.clone()));
        let fired = Arc::new(AtomicUsize::new(0));

        let caller = CallerId::new("conn-2");
        let registration = presence.register(caller.clone());
        let guard = watcher.watch(caller, counting_callback(&fired));

        drop(guard);
        sleep(Duration::from_millis(20)).await;
        drop(registration);
        sleep(Duration::from_millis(50)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_release_after_fire_is_noop() {
        let presence = ConnectionPresence::new();
        let watcher = LivenessWatcher::new(Arc::new(presence.clone()));
        let fired = Arc::new(AtomicUsize::new(0));

        let caller = CallerId::new("conn-3");
        let registration = presence.register(caller.clone());
        let guard = watcher.watch(caller, counting_callback(&fired));

        drop(registration);
        sleep(Duration::from_millis(50)).await;
        drop(guard);
        sleep(Duration::from_millis(20)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_caller_counts_as_vanished() {
        let presence = ConnectionPresence::new();
        let watcher = LivenessWatcher::new(Arc::new(presence.clone()));
        let fired = Arc::new(AtomicUsize::new(0));

        // Never registered with the presence source.
        let _guard = watcher.watch(CallerId::new("conn-ghost"), counting_callback(&fired));
        sleep(Duration::from_millis(50)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
