//! # Host-application notifier contract.
//!
//! [`WorkerObserver`] is the callback interface a host (UI, service wrapper)
//! implements to follow the worker. It is injected once, at construction,
//! through `SupervisorBuilder::with_observer`, and driven by an
//! [`ObserverSubscriber`] like any other subscriber:
//!
//! ```text
//! StateChanged  { running }                  ──► on_state_change(running)
//! StatusChanged { line, speed, accepted }    ──► on_status_change(line, speed, accepted)
//! StartFailed   { reason }                   ──► on_start_failed(reason)
//! ```
//! Callbacks run on the subscriber's worker task, in publish order.

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Callbacks raised by the supervisor.
pub trait WorkerObserver: Send + Sync + 'static {
    /// Fired on every stopped ↔ running transition.
    fn on_state_change(&self, running: bool);

    /// Fired once per worker output line, with the metrics after that line.
    fn on_status_change(&self, line: &str, speed: &str, accepted: u64);

    /// Fired when a start request fails before the worker is attached.
    fn on_start_failed(&self, _message: &str) {}
}

/// Subscriber that forwards lifecycle and status events to a [`WorkerObserver`].
pub struct ObserverSubscriber {
    observer: Arc<dyn WorkerObserver>,
}

impl ObserverSubscriber {
    pub fn new(observer: Arc<dyn WorkerObserver>) -> Self {
        Self { observer }
    }
}

#[async_trait]
impl Subscribe for ObserverSubscriber {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::StateChanged => {
                if let Some(running) = ev.running {
                    self.observer.on_state_change(running);
                }
            }
            EventKind::StatusChanged => {
                self.observer.on_status_change(
                    ev.line.as_deref().unwrap_or_default(),
                    ev.speed.as_deref().unwrap_or_default(),
                    ev.accepted.unwrap_or_default(),
                );
            }
            EventKind::StartFailed => {
                self.observer
                    .on_start_failed(ev.reason.as_deref().unwrap_or_default());
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "observer"
    }

    fn queue_capacity(&self) -> usize {
        4096
    }
}
