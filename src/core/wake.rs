//! # Stay-awake resource.
//!
//! The host environment may suspend execution while the worker runs (mobile
//! power management, idle sleep). [`WakeLock`] is the host's hook to prevent
//! that; the supervisor holds it through a [`WakeGuard`] for the lifetime of
//! one process instance. Dropping the guard releases the lock, so every
//! acquisition is released exactly once.

use std::sync::Arc;

/// Host hook that keeps the environment awake.
///
/// `acquire` and `release` are always called in pairs, never nested.
pub trait WakeLock: Send + Sync + 'static {
    fn acquire(&self);
    fn release(&self);
}

/// Stay-awake implementation for hosts that never suspend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn acquire(&self) {}
    fn release(&self) {}
}

/// Held stay-awake lock; released on drop.
pub(crate) struct WakeGuard {
    lock: Arc<dyn WakeLock>,
}

impl WakeGuard {
    pub fn acquire(lock: &Arc<dyn WakeLock>) -> Self {
        lock.acquire();
        tracing::debug!("stay-awake acquired");
        Self {
            lock: Arc::clone(lock),
        }
    }
}

impl Drop for WakeGuard {
    fn drop(&mut self) {
        self.lock.release();
        tracing::debug!("stay-awake released");
    }
}
