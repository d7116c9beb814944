//! Runtime core: the supervisor and the machinery around one worker instance.
//!
//! The public API from this module is [`Supervisor`] (built through
//! [`SupervisorBuilder`] from a [`SupervisorConfig`]), the [`LifecycleState`]
//! it reports, the [`WakeLock`] hook it holds while a worker is alive and the
//! [`HostResolver`] it asks for the pool address.
//!
//! Internal modules:
//! - [`supervisor`]: start/stop orchestration, staging, spawn and teardown;
//! - [`pumps`]: output pump, input pump and exit monitor of one instance;
//! - [`lifecycle`]: instance-guarded `Stopped → Starting → Running` cell;
//! - [`shared`]: stats and lifecycle shared with the loops;
//! - [`resolve`]: best-effort pool host lookup;
//! - [`wake`]: stay-awake hook and its guard.

mod builder;
mod config;
mod lifecycle;
mod pumps;
mod resolve;
mod shared;
mod supervisor;
mod wake;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use lifecycle::LifecycleState;
pub use resolve::{HostResolver, SystemResolver};
pub use supervisor::Supervisor;
pub use wake::{NoWakeLock, WakeLock};
