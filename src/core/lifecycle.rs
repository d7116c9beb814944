//! # Lifecycle state with instance-guarded transitions.
//!
//! Every start gets a new instance number. A transition names the instance it
//! belongs to and only applies while that instance is still current, so a
//! late exit monitor of an old process can never touch the state of a newer
//! one, and `Stopped` is reached at most once per instance.
//!
//! ```text
//! begin(n)         any       ──► Starting   (instance n becomes current)
//! mark_running(n)  Starting  ──► Running    (only if n is current)
//! mark_stopped(n)  Starting | Running ──► Stopped (only if n is current)
//! ```
//! The cell is a `tokio::sync::watch` channel, so readers can await a state.

use tokio::sync::watch;

/// Lifecycle of the supervised worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Stopped,
    Starting,
    Running,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Lifecycle {
    pub instance: u64,
    pub state: LifecycleState,
}

/// Shared lifecycle cell.
#[derive(Debug)]
pub(crate) struct LifecycleCell {
    tx: watch::Sender<Lifecycle>,
}

impl LifecycleCell {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(Lifecycle::default()),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.tx.borrow().state
    }

    pub fn instance(&self) -> u64 {
        self.tx.borrow().instance
    }

    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.tx.subscribe()
    }

    /// Makes `instance` current in `Starting`.
    pub fn begin(&self, instance: u64) {
        self.tx.send_replace(Lifecycle {
            instance,
            state: LifecycleState::Starting,
        });
    }

    /// `Starting → Running` for the current instance. Returns whether it applied.
    pub fn mark_running(&self, instance: u64) -> bool {
        self.tx.send_if_modified(|lc| {
            if lc.instance == instance && lc.state == LifecycleState::Starting {
                lc.state = LifecycleState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Moves the current instance to `Stopped`.
    ///
    /// Returns the state it left, or `None` if `instance` is not current or
    /// already stopped.
    pub fn mark_stopped(&self, instance: u64) -> Option<LifecycleState> {
        let mut left = None;
        self.tx.send_if_modified(|lc| {
            if lc.instance == instance && lc.state != LifecycleState::Stopped {
                left = Some(lc.state);
                lc.state = LifecycleState::Stopped;
                true
            } else {
                false
            }
        });
        left
    }
}
