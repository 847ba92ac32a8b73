//! §4.4 step 1: "Ensure the Builder's private derivation engine is caught
//! up to the L1 tip. If not, wait." The actual catch-up is driven by
//! whatever feeds the private engine (a second `L1EventSource`, owned by
//! the binary); this module only holds the readiness flag that feed
//! publishes and the bounded wait a submit blocks on.
use std::time::Duration;
use tokio::sync::watch;

/// Shared between the private engine's feed task (producer) and any
/// number of concurrent `submit` calls (consumers). Cloning shares the
/// same underlying channel.
#[derive(Clone)]
pub struct SyncGate {
    caught_up: watch::Receiver<bool>,
}

/// The producer half, held by the task that drives the private engine.
pub struct SyncGateHandle {
    caught_up: watch::Sender<bool>,
}

/// Creates a gate starting in the not-caught-up state.
pub fn channel() -> (SyncGateHandle, SyncGate) {
    let (tx, rx) = watch::channel(false);
    (SyncGateHandle { caught_up: tx }, SyncGate { caught_up: rx })
}

impl SyncGateHandle {
    pub fn set_caught_up(&self, caught_up: bool) {
        // A closed receiver side just means every submitter has been
        // dropped; there is nothing to notify.
        let _ = self.caught_up.send(caught_up);
    }
}

impl SyncGate {
    pub fn is_caught_up(&self) -> bool {
        *self.caught_up.borrow()
    }

    /// Blocks until the gate reports caught-up or `timeout` elapses.
    pub async fn wait_until_caught_up(&mut self, timeout: Duration) -> bool {
        if self.is_caught_up() {
            return true;
        }
        let wait = async {
            while !*self.caught_up.borrow() {
                if self.caught_up.changed().await.is_err() {
                    return false;
                }
            }
            true
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_immediately_once_already_caught_up() {
        let (handle, mut gate) = channel();
        handle.set_caught_up(true);
        assert!(gate.wait_until_caught_up(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn wait_times_out_if_never_signaled() {
        let (_handle, mut gate) = channel();
        assert!(!gate.wait_until_caught_up(Duration::from_millis(20)).await);
    }

    #[tokio::test]
    async fn wait_unblocks_once_signaled_from_another_task() {
        let (handle, mut gate) = channel();
        let waiter = tokio::spawn(async move {
            gate.wait_until_caught_up(Duration::from_secs(1)).await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.set_caught_up(true);
        assert!(waiter.await.unwrap());
    }
}
