//! Lifecycle state and shutdown signalling for the polling loop.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::info;

/// Lifecycle of the scheduler: `Idle -> Running -> Stopping -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Shared lifecycle cell read by handles and written by the loop.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    state: Arc<Mutex<LifecycleState>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LifecycleState::Idle)),
        }
    }

    pub(crate) fn get(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Move to `next` unless the loop has already stopped.
    pub(crate) fn transition(&self, next: LifecycleState) {
        let mut state = self.state.lock();
        if *state == LifecycleState::Stopped || *state == next {
            return;
        }
        info!(from = %*state, to = %next, "Scheduler state changed");
        *state = next;
    }
}

/// Handle used to observe and stop a running scheduler.
///
/// Cloning is cheap; any clone may request the stop.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    shutdown: Arc<watch::Sender<bool>>,
    lifecycle: Lifecycle,
}

impl SchedulerHandle {
    pub(crate) fn new(shutdown: watch::Sender<bool>, lifecycle: Lifecycle) -> Self {
        Self {
            shutdown: Arc::new(shutdown),
            lifecycle,
        }
    }

    /// Request the loop to stop.
    ///
    /// Safe to call before the loop has started and safe to call more than
    /// once; only the first call has an effect.
    pub fn stop(&self) {
        let changed = self.shutdown.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        });
        if changed && self.lifecycle.get() == LifecycleState::Running {
            self.lifecycle.transition(LifecycleState::Stopping);
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.get()
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// A receiver for the shutdown signal, for tasks that should end with
    /// the scheduler.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Resolve once shutdown is requested or the signal's sender is gone.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_is_idempotent() {
        let (tx, _rx) = watch::channel(false);
        let handle = SchedulerHandle::new(tx, Lifecycle::new());

        handle.stop();
        handle.stop();

        assert!(handle.is_stop_requested());
        assert_eq!(handle.state(), LifecycleState::Idle);
    }

    #[test]
    fn stopped_is_terminal() {
        let lifecycle = Lifecycle::new();
        lifecycle.transition(LifecycleState::Running);
        lifecycle.transition(LifecycleState::Stopped);
        lifecycle.transition(LifecycleState::Running);

        assert_eq!(lifecycle.get(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn shutdown_requested_resolves_on_signal() {
        let (tx, mut rx) = watch::channel(false);
        let waiter = tokio::spawn(async move { shutdown_requested(&mut rx).await });
        tx.send_replace(true);

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .expect("waiter should not panic");
    }

    #[tokio::test]
    async fn shutdown_requested_resolves_when_sender_dropped() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        tokio::time::timeout(std::time::Duration::from_secs(1), shutdown_requested(&mut rx))
            .await
            .expect("closed channel counts as shutdown");
    }
}
