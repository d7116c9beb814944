//! # Supervisor: one external worker process, its loops and its lifecycle.
//!
//! The [`Supervisor`] owns the event bus, a [`SubscriberSet`], the stats of the
//! current run and the lifecycle cell. At most one worker process is attached
//! at any time; every `start` first tears down whatever was running before.
//!
//! ## Key responsibilities
//! - render the config template and stage it next to the worker
//! - spawn the worker and attach the output pump, input pump and exit monitor
//! - hold the stay-awake lock for the lifetime of an instance
//! - subscribe to the [`Bus`](crate::events::Bus) and **fan-out** events via [`SubscriberSet`]
//!
//! ## High-level architecture
//! ```text
//! start(params)
//!   ├─ supersede pending start (cancel its token)
//!   ├─ lock slot ──► teardown(previous instance)          [StopRequested]
//!   ├─ instance = n + 1, lifecycle.begin(n + 1)            [StartRequested]
//!   ├─ resolve pool host (best effort, cancellable)        [HostResolved | HostResolutionFailed]
//!   ├─ load template ─► render ─► write config             [ConfigWritten]
//!   ├─ WakeGuard::acquire, reset stats
//!   ├─ spawn <staging_dir>/<executable>                   [ProcessSpawned | StartFailed]
//!   └─ JoinSet: OutputPump, InputPump, ExitMonitor
//!                                   └─ Starting → Running  [StateChanged(true)]
//!
//! Event flow:
//!   loops / supervisor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                                  ┌─────────┬─────────┐
//!                                                                  ▼         ▼         ▼
//!                                                              LogWriter  Observer  custom ...
//!
//! teardown(instance)
//!   ├─ detach input queue, cancel instance token
//!   ├─ join loops within cfg.grace (detach leftovers)
//!   └─ drop WakeGuard, Running → Stopped                   [StateChanged(false)]
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use rigvisor::{LifecycleState, Supervisor, SupervisorConfig, WorkerParameters, WorkerObserver};
//!
//! struct Printer;
//!
//! impl WorkerObserver for Printer {
//!     fn on_state_change(&self, running: bool) {
//!         println!("running: {running}");
//!     }
//!     fn on_status_change(&self, _line: &str, speed: &str, accepted: u64) {
//!         println!("{speed} H/s, {accepted} accepted");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rigvisor::StartError> {
//!     let sup = Supervisor::builder(
//!         SupervisorConfig::with_staging_dir("/opt/worker"),
//!         r#"{"url":"$url$","user":"$username$","pass":"$pass$"}"#,
//!     )
//!     .with_observer(Arc::new(Printer))
//!     .build();
//!
//!     let params = WorkerParameters::builder("xmrig", "xmrig")
//!         .pool("pool.example.org:3333")
//!         .username("wallet")
//!         .cores(4)
//!         .build();
//!
//!     sup.start(params).await?;
//!     sup.wait_for_state(LifecycleState::Stopped).await;
//!     Ok(())
//! }
//! ```

use std::{
    io,
    path::PathBuf,
    process::Stdio,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{
    process::Command,
    sync::mpsc,
    task::{JoinHandle, JoinSet},
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::SupervisorBuilder,
        config::SupervisorConfig,
        lifecycle::LifecycleState,
        pumps::{ExitMonitor, InputPump, OutputPump},
        resolve::{HostResolver, resolve_within, resolved_url},
        shared::{Attachment, Shared},
        wake::{WakeGuard, WakeLock},
    },
    error::StartError,
    events::{Event, EventKind},
    stats::StatsSnapshot,
    subscribers::SubscriberSet,
    template::{TemplateSource, render},
    worker::WorkerParameters,
};

/// One spawned worker and the loops attached to it.
struct Instance {
    id: u64,
    token: CancellationToken,
    loops: JoinSet<()>,
    _wake: WakeGuard,
}

/// Supervises one external worker process.
///
/// Created through [`Supervisor::builder`]. All methods take `&self`; the
/// supervisor is meant to live in an `Arc` shared with the host.
pub struct Supervisor {
    cfg: SupervisorConfig,
    template: TemplateSource,
    shared: Arc<Shared>,
    wake_lock: Arc<dyn WakeLock>,
    resolver: Arc<dyn HostResolver>,

    slot: tokio::sync::Mutex<Option<Instance>>,
    pending: Mutex<CancellationToken>,
    next_instance: AtomicU64,
    listener: JoinHandle<()>,
}

impl Supervisor {
    /// Returns a builder for a supervisor with the given config and template.
    pub fn builder(
        cfg: SupervisorConfig,
        template: impl Into<TemplateSource>,
    ) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg, template.into())
    }

    /// Creates the supervisor and starts forwarding bus events to `subs`.
    ///
    /// Must be called within a tokio runtime.
    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        template: TemplateSource,
        shared: Arc<Shared>,
        subs: Arc<SubscriberSet>,
        wake_lock: Arc<dyn WakeLock>,
        resolver: Arc<dyn HostResolver>,
    ) -> Self {
        let listener = Self::subscriber_listener(&shared, &subs);
        Self {
            cfg,
            template,
            shared,
            wake_lock,
            resolver,
            slot: tokio::sync::Mutex::new(None),
            pending: Mutex::new(CancellationToken::new()),
            next_instance: AtomicU64::new(0),
            listener,
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    fn subscriber_listener(shared: &Shared, subs: &Arc<SubscriberSet>) -> JoinHandle<()> {
        let mut rx = shared.bus.subscribe();
        let set = Arc::clone(subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Starts a worker with `params`, replacing any running one.
    ///
    /// On return the worker is spawned and its loops are attached; the
    /// `Running` transition follows as soon as the exit monitor is scheduled.
    /// Every error other than [`StartError::Canceled`] is also published as
    /// [`EventKind::StartFailed`]. After an error the state is `Stopped` and
    /// the stay-awake lock is not held.
    pub async fn start(&self, params: WorkerParameters) -> Result<(), StartError> {
        let pending = self.supersede_pending();
        let mut slot = self.slot.lock().await;
        if pending.is_cancelled() {
            return Err(StartError::Canceled);
        }

        if let Some(previous) = slot.take() {
            self.shared
                .bus
                .publish(Event::new(EventKind::StopRequested).with_instance(previous.id));
            self.teardown(previous).await;
        }

        let instance = self.next_instance.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.lifecycle.begin(instance);
        self.shared
            .bus
            .publish(Event::new(EventKind::StartRequested).with_instance(instance));

        match self.launch(instance, params, &pending).await {
            Ok(inst) => {
                *slot = Some(inst);
                Ok(())
            }
            Err(err) => {
                self.shared.enter_stopped(instance);
                if !err.is_canceled() {
                    tracing::warn!(
                        instance,
                        label = err.as_label(),
                        err = %err,
                        "worker start failed"
                    );
                    self.shared
                        .bus
                        .publish(Event::start_failed(&err).with_instance(instance));
                }
                Err(err)
            }
        }
    }

    /// Runs [`start`](Self::start) on a spawned task.
    pub fn spawn_start(
        self: &Arc<Self>,
        params: WorkerParameters,
    ) -> JoinHandle<Result<(), StartError>> {
        let sup = Arc::clone(self);
        tokio::spawn(async move { sup.start(params).await })
    }

    /// Stops the current worker, if any, and waits for its teardown.
    ///
    /// Cancels a start that is still resolving or preparing. A no-op when
    /// nothing is running.
    pub async fn stop(&self) {
        self.supersede_pending();
        let mut slot = self.slot.lock().await;
        if let Some(inst) = slot.take() {
            self.shared
                .bus
                .publish(Event::new(EventKind::StopRequested).with_instance(inst.id));
            self.teardown(inst).await;
        }
    }

    /// Queues `text` for the worker's stdin.
    ///
    /// Returns `false` if no worker is attached or the queue is full; the text
    /// is dropped in both cases. A worker that exited on its own is detached.
    pub fn send_input(&self, text: impl Into<String>) -> bool {
        let attached = self.shared.attachment();
        let Some(att) = attached.as_ref() else {
            return false;
        };
        match att.input.try_send(text.into()) {
            Ok(()) => true,
            Err(e) => {
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "input queue full",
                    mpsc::error::TrySendError::Closed(_) => "input closed",
                };
                tracing::debug!(instance = att.instance, reason, "input dropped");
                self.shared.bus.publish(
                    Event::new(EventKind::InputDropped)
                        .with_instance(att.instance)
                        .with_reason(reason),
                );
                false
            }
        }
    }

    /// Current lifecycle state.
    pub fn current_state(&self) -> LifecycleState {
        self.shared.lifecycle.state()
    }

    /// Snapshot of accepted shares, speed and log.
    pub fn current_stats(&self) -> StatsSnapshot {
        self.shared.stats_snapshot()
    }

    pub fn accepted(&self) -> u64 {
        self.shared.accepted()
    }

    pub fn speed(&self) -> String {
        self.shared.speed()
    }

    pub fn log_text(&self) -> String {
        self.shared.log_text()
    }

    /// OS pid of the attached worker; `None` once it has exited.
    pub fn pid(&self) -> Option<u32> {
        self.shared.attachment().as_ref().and_then(|att| att.pid)
    }

    /// Number of the latest instance (0 before the first start).
    pub fn instance(&self) -> u64 {
        self.shared.lifecycle.instance()
    }

    /// Resolves once the lifecycle reaches `want`.
    pub async fn wait_for_state(&self, want: LifecycleState) {
        let mut rx = self.shared.lifecycle.subscribe();
        // The sender lives in `self.shared`, so the channel cannot close here.
        let _ = rx.wait_for(|lc| lc.state == want).await;
    }

    /// Replaces the pending-start token, canceling the previous one.
    fn supersede_pending(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let old = std::mem::replace(&mut *pending, fresh.clone());
        old.cancel();
        fresh
    }

    /// Resolves, stages, spawns and attaches instance `instance`.
    async fn launch(
        &self,
        instance: u64,
        params: WorkerParameters,
        pending: &CancellationToken,
    ) -> Result<Instance, StartError> {
        let params = self.resolve_pool(instance, params, pending).await?;

        let template = self.template.load().await?;
        let rendered = render(&template, &params);
        let config_path = rendered
            .write_to(&self.cfg.staging_dir, &self.cfg.config_file_name)
            .await?;
        self.shared.bus.publish(
            Event::new(EventKind::ConfigWritten)
                .with_instance(instance)
                .with_reason(config_path.display().to_string()),
        );

        if pending.is_cancelled() {
            return Err(StartError::Canceled);
        }

        let wake = WakeGuard::acquire(&self.wake_lock);
        self.shared.reset_stats(instance);

        let dir = self.staging_dir_abs();
        let program = dir.join(params.executable());
        let mut cmd = Command::new(&program);
        cmd.current_dir(&dir)
            .env(&self.cfg.library_path_var, &dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Workers see themselves as started from their own directory.
        #[cfg(unix)]
        cmd.arg0(format!("./{}", params.executable()));
        let mut child = cmd.spawn().map_err(|source| StartError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

        let missing = |stream: &str| StartError::Spawn {
            program: program.display().to_string(),
            source: io::Error::other(format!("{stream} not captured")),
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        let pid = child.id();
        self.shared.bus.publish(
            Event::new(EventKind::ProcessSpawned)
                .with_instance(instance)
                .with_pid(pid),
        );

        let token = CancellationToken::new();
        let (input_tx, input_rx) = mpsc::channel(self.cfg.input_capacity_clamped());
        let grammar = params.variant().grammar();
        let output = OutputPump::new(
            instance,
            grammar,
            self.cfg.line_limit(),
            Arc::clone(&self.shared),
        );
        let input = InputPump::new(instance, Arc::clone(&self.shared));
        let exit = ExitMonitor::new(instance, Arc::clone(&self.shared));

        // Attach before the exit monitor runs so a fast exit can detach it.
        self.shared.attach(Attachment {
            instance,
            pid,
            input: input_tx,
        });
        let mut loops = JoinSet::new();
        loops.spawn(output.run(stdout, stderr, token.clone()));
        loops.spawn(input.run(stdin, input_rx, token.clone()));
        loops.spawn(exit.run(child, token.clone()));

        tracing::info!(
            instance,
            pid,
            variant = %params.variant(),
            program = %program.display(),
            "worker started"
        );

        Ok(Instance {
            id: instance,
            token,
            loops,
            _wake: wake,
        })
    }

    /// Rewrites `$url$` to the resolved pool address when possible.
    async fn resolve_pool(
        &self,
        instance: u64,
        params: WorkerParameters,
        pending: &CancellationToken,
    ) -> Result<WorkerParameters, StartError> {
        if !self.cfg.resolve_pool_host || !params.pool().is_resolvable() {
            return Ok(params);
        }

        let host = params.pool().host().to_string();
        let looked_up = tokio::select! {
            _ = pending.cancelled() => return Err(StartError::Canceled),
            res = resolve_within(&*self.resolver, &host, self.cfg.resolve_deadline()) => res,
        };

        match looked_up {
            Ok(ip) => {
                let url = resolved_url(ip, params.pool().port());
                tracing::debug!(instance, %host, %url, "pool host resolved");
                self.shared.bus.publish(
                    Event::new(EventKind::HostResolved)
                        .with_instance(instance)
                        .with_reason(url.clone()),
                );
                Ok(params.with_url(url))
            }
            Err(reason) => {
                tracing::warn!(
                    instance,
                    %host,
                    %reason,
                    "pool host resolution failed, keeping hostname"
                );
                self.shared.bus.publish(
                    Event::new(EventKind::HostResolutionFailed)
                        .with_instance(instance)
                        .with_reason(reason),
                );
                Ok(params)
            }
        }
    }

    fn staging_dir_abs(&self) -> PathBuf {
        std::path::absolute(&self.cfg.staging_dir)
            .unwrap_or_else(|_| self.cfg.staging_dir.clone())
    }

    /// Cancels the loops of `inst`, kills its process and moves it to `Stopped`.
    async fn teardown(&self, mut inst: Instance) {
        self.shared.detach(inst.id);
        inst.token.cancel();

        match self.cfg.grace_period() {
            Some(grace) => {
                let drained = time::timeout(grace, async {
                    while inst.loops.join_next().await.is_some() {}
                })
                .await;
                if drained.is_err() {
                    tracing::warn!(
                        instance = inst.id,
                        ?grace,
                        "worker loops outlived grace, detaching"
                    );
                    inst.loops.detach_all();
                }
            }
            None => inst.loops.detach_all(),
        }

        let id = inst.id;
        drop(inst);
        self.shared.enter_stopped(id);
        tracing::info!(instance = id, "worker stopped");
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        self.listener.abort();
    }
}
