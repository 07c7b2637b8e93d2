//! Client interface for interacting with the registry actor.

use tokio::sync::{mpsc, oneshot};

use snapclip_core::{CallerId, CaptureMode, ShotView};

use super::commands::{RegistryCommand, RegistryError, ShotPermit};

/// Cheap-to-clone handle for sending commands to the registry actor.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Creates a new registry handle over the actor's command channel.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Opens a session for `caller`.
    ///
    /// # Errors
    ///
    /// - `RegistryError::Busy` if the caller already owns a live session
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn begin(
        &self,
        caller: CallerId,
        mode: CaptureMode,
    ) -> Result<ShotPermit, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Begin {
                caller,
                mode,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Closes the caller's session. Idempotent; resolves once the entry
    /// is gone so an immediate follow-up request cannot see a stale
    /// `Busy`. Errors from a shut-down actor are ignored: no actor means
    /// no entry to remove.
    pub async fn end(&self, caller: CallerId) {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::End {
                caller,
                respond_to: tx,
            })
            .await
            .is_err()
        {
            return;
        }

        let _ = rx.await;
    }

    /// Cancels and removes the caller's session. Fire-and-forget; used
    /// by the disconnect watch path.
    pub async fn abort(&self, caller: CallerId) {
        let _ = self.sender.send(RegistryCommand::Abort { caller }).await;
    }

    /// Whether the caller currently owns a session. Returns `false` if
    /// the actor has shut down.
    pub async fn is_active(&self, caller: CallerId) -> bool {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::IsActive {
                caller,
                respond_to: tx,
            })
            .await
            .is_err()
        {
            return false;
        }

        rx.await.unwrap_or(false)
    }

    /// Snapshot of all in-flight sessions. Empty if the actor has shut
    /// down.
    pub async fn active_shots(&self) -> Vec<ShotView> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::ActiveShots { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        (RegistryHandle::new(cmd_tx), cmd_rx)
    }

    #[tokio::test]
    async fn test_begin_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let responder = tokio::spawn(async move {
            if let Some(RegistryCommand::Begin {
                caller, respond_to, ..
            }) = rx.recv().await
            {
                assert_eq!(caller.as_str(), "conn-1");
                let _ = respond_to.send(Err(RegistryError::Busy(caller)));
                return true;
            }
            false
        });

        let result = handle
            .begin(CallerId::new("conn-1"), CaptureMode::Window)
            .await;
        assert!(matches!(result, Err(RegistryError::Busy(_))));
        assert!(responder.await.unwrap());
    }

    #[tokio::test]
    async fn test_begin_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle
            .begin(CallerId::new("conn-1"), CaptureMode::Area)
            .await;
        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_end_tolerates_closed_channel() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        // Must not hang or panic.
        handle.end(CallerId::new("conn-1")).await;
    }

    #[tokio::test]
    async fn test_is_active_defaults_false_when_closed() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert!(!handle.is_active(CallerId::new("conn-1")).await);
        assert!(handle.active_shots().await.is_empty());
    }
}
