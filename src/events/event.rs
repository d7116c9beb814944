//! # Runtime events emitted by the supervisor and its worker loops.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Start/stop sequence**: request, host resolution, config written, spawn, failure
//! - **Lifecycle**: running state changes and process exit
//! - **Status**: one event per worker output line with the current metrics
//! - **Subscriber diagnostics**: overflow and panic of a subscriber worker
//!
//! The [`Event`] struct carries the metadata (instance number, line, speed,
//! share count, exit code, reason).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use rigvisor::{Event, EventKind};
//!
//! let ev = Event::status("[t] accepted (1/0)", "812.4", 1).with_instance(3);
//!
//! assert_eq!(ev.kind, EventKind::StatusChanged);
//! assert_eq!(ev.accepted, Some(1));
//! assert_eq!(ev.instance, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and cause (`full`, `closed`)
    SubscriberOverflow,

    // === Start / stop sequence ===
    /// A start request was accepted; the previous instance is being torn down.
    ///
    /// Sets:
    /// - `instance`: number of the instance being started
    StartRequested,

    /// Pool host resolved; `$url$` will use the address.
    ///
    /// Sets:
    /// - `instance`
    /// - `reason`: the resolved url
    HostResolved,

    /// Pool host could not be resolved; the literal host is kept.
    ///
    /// Sets:
    /// - `instance`
    /// - `reason`: resolver error
    HostResolutionFailed,

    /// Rendered config written into the staging directory.
    ///
    /// Sets:
    /// - `instance`
    /// - `reason`: path of the written file
    ConfigWritten,

    /// Worker process spawned.
    ///
    /// Sets:
    /// - `instance`
    /// - `pid`: OS process id (when available)
    ProcessSpawned,

    /// The start sequence failed before the worker was attached.
    ///
    /// Sets:
    /// - `instance`
    /// - `reason`: user-facing message (`StartError::as_message`)
    /// - `label`: stable error label (`StartError::as_label`)
    StartFailed,

    /// A stop request was accepted (also issued internally by `start`).
    StopRequested,

    // === Lifecycle ===
    /// The worker switched between stopped and running.
    ///
    /// Sets:
    /// - `instance`
    /// - `running`: new state
    StateChanged,

    /// The worker process terminated.
    ///
    /// Sets:
    /// - `instance`
    /// - `exit_code`: exit code, if the process exited normally
    /// - `reason`: `exited`, `killed` or `lost` (waiting failed)
    ProcessExited,

    // === Status ===
    /// One line of worker output was processed.
    ///
    /// Sets:
    /// - `instance`
    /// - `line`: the raw line
    /// - `speed`: current speed
    /// - `accepted`: current accepted-share count
    StatusChanged,

    /// Text passed to `send_input` could not be queued or written.
    ///
    /// Sets:
    /// - `instance` (if a worker was attached)
    /// - `reason`: why it was dropped
    InputDropped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Process instance number (increments on every start).
    pub instance: Option<u64>,
    /// New running state (for `StateChanged`).
    pub running: Option<bool>,
    /// Raw worker output line.
    pub line: Option<Arc<str>>,
    /// Current speed string.
    pub speed: Option<Arc<str>>,
    /// Current accepted-share count.
    pub accepted: Option<u64>,
    /// OS process id.
    pub pid: Option<u32>,
    /// Worker exit code.
    pub exit_code: Option<i32>,
    /// Stable error label.
    pub label: Option<&'static str>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            instance: None,
            running: None,
            line: None,
            speed: None,
            accepted: None,
            pid: None,
            exit_code: None,
            label: None,
            reason: None,
        }
    }

    /// Creates a `StateChanged` event.
    #[inline]
    pub fn state_changed(running: bool) -> Self {
        let mut ev = Event::new(EventKind::StateChanged);
        ev.running = Some(running);
        ev
    }

    /// Creates a `StatusChanged` event.
    #[inline]
    pub fn status(line: impl Into<Arc<str>>, speed: impl Into<Arc<str>>, accepted: u64) -> Self {
        let mut ev = Event::new(EventKind::StatusChanged);
        ev.line = Some(line.into());
        ev.speed = Some(speed.into());
        ev.accepted = Some(accepted);
        ev
    }

    /// Creates a `StartFailed` event from a start error.
    #[inline]
    pub fn start_failed(err: &crate::StartError) -> Self {
        let mut ev = Event::new(EventKind::StartFailed).with_reason(err.as_message());
        ev.label = Some(err.as_label());
        ev
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }

    /// Attaches the process instance number.
    #[inline]
    pub fn with_instance(mut self, instance: u64) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an OS process id.
    #[inline]
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attaches a worker exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
