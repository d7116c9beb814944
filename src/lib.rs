//! # rigvisor
//!
//! **Rigvisor** supervises one external mining worker process for an
//! embedding host application.
//!
//! It renders the worker's JSON config from a template, launches the worker,
//! follows its output to extract hashrate and accepted-share counts, keeps a
//! bounded rolling log, forwards input to it and reports lifecycle and status
//! changes to the host. At most one worker runs at a time.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   host ──► start(WorkerParameters) / stop() / send_input(text)
//!              │
//! ┌────────────▼──────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - TemplateSource ─► render ─► <staging_dir>/config.json          │
//! │  - LifecycleCell  (Stopped → Starting → Running, per instance)    │
//! │  - RuntimeStats   (accepted, speed, LogBuffer)                    │
//! │  - WakeGuard      (stay-awake while an instance is alive)         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌────────────┐    ┌────────────┐    ┌─────────────┐
//!   │ OutputPump │    │ InputPump  │    │ ExitMonitor │
//!   │ stdout+err │    │  ─► stdin  │    │ wait / kill │
//!   └─────┬──────┘    └─────┬──────┘    └──────┬──────┘
//!         │ StatusChanged   │ InputDropped     │ StateChanged, ProcessExited
//!         ▼                 ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SupervisorConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                   LogWriter  ObserverSub.  custom
//!                              (WorkerObserver)
//! ```
//!
//! ### Output classification
//! ```text
//! line ─► Grammar (from WorkerVariant)
//!   Xmrig:  contains "accepted"        ─► accepted += 1
//!           else contains "speed"      ─► speed = token[5] (token[4] if "n/a")
//!   Violet: contains "share accepted"  ─► accepted += 1
//!           else contains "hashrate:"  ─► speed = token[2]
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Start, stop and feed one worker process.                     | [`Supervisor`], [`LifecycleState`]          |
//! | **Parameters**    | Per-start worker settings and derived values.                | [`WorkerParameters`], [`WorkerVariant`]     |
//! | **Templates**     | `$placeholder$` substitution into the worker config.         | [`TemplateSource`], [`render`]              |
//! | **Parsing**       | Hashrate and share extraction from output lines.             | [`classify`], [`Grammar`], [`LineUpdate`]   |
//! | **Statistics**    | Counters and the bounded rolling log.                        | [`RuntimeStats`], [`LogBuffer`]             |
//! | **Subscriber API**| Hook into lifecycle and status events.                       | [`Subscribe`], [`WorkerObserver`]           |
//! | **Errors**        | Typed start failures.                                        | [`StartError`]                              |
//! | **Configuration** | Centralize supervisor settings.                              | [`SupervisorConfig`]                        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] that renders events through `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use rigvisor::{LifecycleState, Supervisor, SupervisorConfig, WorkerParameters};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn rigvisor::Subscribe>> =
//!         vec![Arc::new(rigvisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn rigvisor::Subscribe>> = Vec::new();
//!
//!     let template = std::path::PathBuf::from("/opt/worker/config.template.json");
//!     let sup = Supervisor::builder(SupervisorConfig::with_staging_dir("/opt/worker"), template)
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let params = WorkerParameters::builder("xmrig", "xmrig")
//!         .algo("rx/0")
//!         .pool("pool.example.org:3333")
//!         .username("wallet")
//!         .password("x")
//!         .cores(2)
//!         .build();
//!
//!     sup.start(params).await?;
//!     println!("speed: {} H/s", sup.speed());
//!
//!     sup.stop().await;
//!     assert_eq!(sup.current_state(), LifecycleState::Stopped);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod parser;
mod stats;
mod subscribers;
mod template;
mod worker;

// ---- Public re-exports ----

pub use crate::core::{
    HostResolver, LifecycleState, NoWakeLock, Supervisor, SupervisorBuilder, SupervisorConfig,
    SystemResolver, WakeLock,
};
pub use error::StartError;
pub use events::{Bus, Event, EventKind};
pub use parser::{Grammar, LineUpdate, classify};
pub use stats::{LogBuffer, RuntimeStats, StatsSnapshot};
pub use subscribers::{ObserverSubscriber, Subscribe, SubscriberSet, WorkerObserver};
pub use template::{PLACEHOLDERS, RenderedConfig, TemplateSource, render};
pub use worker::{PoolAddress, WorkerParameters, WorkerParametersBuilder, WorkerVariant, cpu_config};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
