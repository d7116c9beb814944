//! # Worker description: variant, pool address and launch parameters.
//!
//! - [`WorkerVariant`] identifies the worker build and selects its log grammar
//! - [`PoolAddress`] is the `host[:port]` split, done once at build time
//! - [`WorkerParameters`] is the full per-start parameter set, built via
//!   [`WorkerParametersBuilder`]
//! - [`cpu_config`] renders the CPU affinity descriptor

mod params;
mod pool;
mod variant;

pub use params::{WorkerParameters, WorkerParametersBuilder, cpu_config};
pub use pool::PoolAddress;
pub use variant::WorkerVariant;
