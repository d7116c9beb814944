//! # Logging subscriber.
//!
//! [`LogWriter`] renders supervisor events as `tracing` records under the
//! `rigvisor::events` target. Worker output lines are emitted at `debug`,
//! everything else at `info`/`warn`.
//!
//! ## Output (with a `fmt` subscriber)
//! ```text
//! INFO rigvisor::events: start requested instance=1
//! INFO rigvisor::events: worker spawned instance=1 pid=4242
//! INFO rigvisor::events: state changed instance=1 running=true
//! DEBUG rigvisor::events: worker output instance=1 line="[..] speed .." speed=812.4 accepted=3
//! INFO rigvisor::events: worker exited instance=1 exit_code=0
//! ```

use async_trait::async_trait;

use crate::Subscribe;
use crate::events::{Event, EventKind};

/// `tracing`-backed logging subscriber.
///
/// Enabled via the `logging` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let instance = e.instance.unwrap_or_default();
        match e.kind {
            EventKind::StartRequested => {
                tracing::info!(target: "rigvisor::events", instance, "start requested");
            }
            EventKind::HostResolved => {
                tracing::info!(
                    target: "rigvisor::events",
                    instance,
                    url = ?e.reason,
                    "pool host resolved"
                );
            }
            EventKind::HostResolutionFailed => {
                tracing::warn!(
                    target: "rigvisor::events",
                    instance,
                    err = ?e.reason,
                    "pool host not resolved"
                );
            }
            EventKind::ConfigWritten => {
                tracing::info!(
                    target: "rigvisor::events",
                    instance,
                    path = ?e.reason,
                    "config written"
                );
            }
            EventKind::ProcessSpawned => {
                tracing::info!(
                    target: "rigvisor::events",
                    instance,
                    pid = ?e.pid,
                    "worker spawned"
                );
            }
            EventKind::StartFailed => {
                tracing::warn!(
                    target: "rigvisor::events",
                    instance,
                    label = ?e.label,
                    err = ?e.reason,
                    "start failed"
                );
            }
            EventKind::StopRequested => {
                tracing::info!(target: "rigvisor::events", "stop requested");
            }
            EventKind::StateChanged => {
                tracing::info!(
                    target: "rigvisor::events",
                    instance,
                    running = ?e.running,
                    "state changed"
                );
            }
            EventKind::ProcessExited => {
                tracing::info!(
                    target: "rigvisor::events",
                    instance,
                    exit_code = ?e.exit_code,
                    how = ?e.reason,
                    "worker exited"
                );
            }
            EventKind::StatusChanged => {
                tracing::debug!(
                    target: "rigvisor::events",
                    instance,
                    line = ?e.line,
                    speed = ?e.speed,
                    accepted = ?e.accepted,
                    "worker output"
                );
            }
            EventKind::InputDropped => {
                tracing::warn!(
                    target: "rigvisor::events",
                    instance,
                    reason = ?e.reason,
                    "input dropped"
                );
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(
                    target: "rigvisor::events",
                    reason = ?e.reason,
                    "subscriber trouble"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
