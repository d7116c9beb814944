//! State shared between the supervisor and the loops of the current instance.
//!
//! `RuntimeStats` sits behind one mutex together with the number of the
//! instance that owns it; a loop of an older instance that is still draining
//! after teardown cannot write into the stats of its successor.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::{
    core::lifecycle::{LifecycleCell, LifecycleState},
    events::{Bus, Event},
    parser::LineUpdate,
    stats::{RuntimeStats, StatsSnapshot},
};

struct StatsSlot {
    owner: u64,
    stats: RuntimeStats,
}

/// What `send_input` and `pid` need to reach the current instance.
pub(crate) struct Attachment {
    pub instance: u64,
    pub pid: Option<u32>,
    pub input: mpsc::Sender<String>,
}

pub(crate) struct Shared {
    pub bus: Bus,
    pub lifecycle: LifecycleCell,
    stats: Mutex<StatsSlot>,
    attached: Mutex<Option<Attachment>>,
}

impl Shared {
    pub fn new(bus: Bus, log_max_len: usize, log_prune_offset: usize) -> Self {
        Self {
            bus,
            lifecycle: LifecycleCell::new(),
            stats: Mutex::new(StatsSlot {
                owner: 0,
                stats: RuntimeStats::new(log_max_len, log_prune_offset),
            }),
            attached: Mutex::new(None),
        }
    }

    pub fn attachment(&self) -> MutexGuard<'_, Option<Attachment>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn attach(&self, attachment: Attachment) {
        *self.attachment() = Some(attachment);
    }

    /// Drops the attachment if it still belongs to `instance`.
    pub fn detach(&self, instance: u64) {
        let mut attached = self.attachment();
        if attached.as_ref().is_some_and(|att| att.instance == instance) {
            *attached = None;
        }
    }

    fn slot(&self) -> MutexGuard<'_, StatsSlot> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands the stats to `instance`, cleared.
    pub fn reset_stats(&self, instance: u64) {
        let mut slot = self.slot();
        slot.owner = instance;
        slot.stats.reset();
    }

    /// Records a line for `instance`; returns `(speed, accepted)` after it,
    /// or `None` if `instance` no longer owns the stats.
    pub fn record_line(
        &self,
        instance: u64,
        line: &str,
        update: LineUpdate,
    ) -> Option<(String, u64)> {
        let mut slot = self.slot();
        if slot.owner != instance {
            return None;
        }
        slot.stats.record(line, update);
        Some((slot.stats.speed().to_string(), slot.stats.accepted()))
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.slot().stats.snapshot()
    }

    pub fn accepted(&self) -> u64 {
        self.slot().stats.accepted()
    }

    pub fn speed(&self) -> String {
        self.slot().stats.speed().to_string()
    }

    pub fn log_text(&self) -> String {
        self.slot().stats.log().as_str().to_string()
    }

    /// `Starting → Running` for `instance`, notifying on success.
    pub fn enter_running(&self, instance: u64) -> bool {
        let applied = self.lifecycle.mark_running(instance);
        if applied {
            self.bus
                .publish(Event::state_changed(true).with_instance(instance));
        }
        applied
    }

    /// Moves `instance` to `Stopped`; notifies if it was running.
    pub fn enter_stopped(&self, instance: u64) {
        if self.lifecycle.mark_stopped(instance) == Some(LifecycleState::Running) {
            self.bus
                .publish(Event::state_changed(false).with_instance(instance));
        }
    }
}
