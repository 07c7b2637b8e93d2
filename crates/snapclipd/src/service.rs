//! The externally callable screenshot surface.
//!
//! Two operations, `window_shot` and `select_shot`, both keyed by the
//! transport-assigned caller identity. Each accepted call drives exactly
//! one session to a terminal state and yields exactly one outcome; a
//! caller with a session already in flight is rejected with `Busy`
//! before any state changes.

use std::sync::Arc;

use tracing::{info, warn};

use snapclip_core::{CallerId, CaptureMode, ShotError, ShotView, WindowOptions};

use crate::backend::Backends;
use crate::registry::{RegistryError, RegistryHandle};
use crate::shooter::Shooter;

/// Service-level configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceConfig {
    /// Options applied to every window shot.
    pub window: WindowOptions,
}

/// The screenshot service facade.
#[derive(Clone)]
pub struct ScreenshotService {
    registry: RegistryHandle,
    backends: Arc<Backends>,
    config: ServiceConfig,
}

impl ScreenshotService {
    /// Creates a service over a running registry and a backend bundle.
    pub fn new(registry: RegistryHandle, backends: Arc<Backends>, config: ServiceConfig) -> Self {
        Self {
            registry,
            backends,
            config,
        }
    }

    /// Captures the focused window to the clipboard.
    pub async fn window_shot(&self, caller: CallerId) -> Result<(), ShotError> {
        self.shoot(caller, CaptureMode::Window).await
    }

    /// Interactively selects an area and captures it to the clipboard.
    pub async fn select_shot(&self, caller: CallerId) -> Result<(), ShotError> {
        self.shoot(caller, CaptureMode::Area).await
    }

    /// Snapshot of all in-flight sessions.
    pub async fn active_shots(&self) -> Vec<ShotView> {
        self.registry.active_shots().await
    }

    /// The registry this service runs against.
    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    async fn shoot(&self, caller: CallerId, mode: CaptureMode) -> Result<(), ShotError> {
        let permit = match self.registry.begin(caller.clone(), mode).await {
            Ok(permit) => permit,
            Err(RegistryError::Busy(caller)) => return Err(ShotError::Busy(caller)),
            Err(RegistryError::ChannelClosed) => return Err(ShotError::Unavailable),
        };

        let shooter = Shooter::new(permit, self.config.window, Arc::clone(&self.backends));
        let outcome = shooter.run().await;

        // The entry may already be gone if the watcher aborted first;
        // end is idempotent either way.
        self.registry.end(caller.clone()).await;

        match &outcome {
            Ok(()) => info!(caller = %caller, mode = %mode, "screenshot delivered"),
            Err(ShotError::Aborted) => {
                info!(caller = %caller, mode = %mode, "screenshot abandoned, caller gone")
            }
            Err(err) => warn!(caller = %caller, mode = %mode, error = %err, "screenshot failed"),
        }

        outcome
    }
}
