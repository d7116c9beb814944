//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`], the settings a [`Supervisor`](crate::Supervisor)
//! is built with. Per-start values (pool, credentials, cores) live in
//! [`WorkerParameters`](crate::WorkerParameters) instead.
//!
//! ## Sentinel values
//! - `grace = 0s` → teardown does not wait for the loops to finish
//! - `resolve_timeout = 0s` → host lookup is not time-bounded

use std::path::PathBuf;
use std::time::Duration;

/// Settings of one supervisor.
///
/// ## Field semantics
/// - `staging_dir`: worker working directory, holds the executable and its libraries
/// - `config_file_name`: name of the rendered config inside `staging_dir`
/// - `library_path_var`: env var set to `staging_dir` for the dynamic loader
/// - `log_max_len` / `log_prune_offset`: LogBuffer bounds (bytes)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `input_capacity`: queued `send_input` writes (min 1)
/// - `grace`: best-effort wait for the loops during teardown
/// - `resolve_pool_host` / `resolve_timeout`: DNS lookup of the pool host before spawn
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to sentinel checks.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Directory the worker runs in.
    pub staging_dir: PathBuf,

    /// File name the rendered config is written to (`config.json`).
    pub config_file_name: String,

    /// Dynamic-library search path variable (`LD_LIBRARY_PATH`).
    pub library_path_var: String,

    /// Maximum log length in bytes.
    pub log_max_len: usize,

    /// Offset from which the prune searches the next line separator.
    pub log_prune_offset: usize,

    /// Capacity of the event bus broadcast channel.
    ///
    /// A listener that lags behind more than `bus_capacity` events skips the oldest.
    pub bus_capacity: usize,

    /// Capacity of the queue between `send_input` and the input pump.
    pub input_capacity: usize,

    /// How long teardown waits for the loops to exit.
    ///
    /// The child is killed regardless; loops still running after `grace` are
    /// detached and exit on their own once they observe cancellation.
    pub grace: Duration,

    /// Resolve the pool host to an address before writing the config.
    pub resolve_pool_host: bool,

    /// Upper bound for the host lookup.
    pub resolve_timeout: Duration,
}

impl SupervisorConfig {
    /// Config for a worker staged in `dir`, other fields default.
    pub fn with_staging_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Returns the teardown grace period as an `Option`.
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        (self.grace > Duration::ZERO).then_some(self.grace)
    }

    /// Returns the lookup timeout as an `Option`.
    #[inline]
    pub fn resolve_deadline(&self) -> Option<Duration> {
        (self.resolve_timeout > Duration::ZERO).then_some(self.resolve_timeout)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns an input queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn input_capacity_clamped(&self) -> usize {
        self.input_capacity.max(1)
    }

    /// Longest output line kept whole; longer lines are truncated.
    ///
    /// Tied to `log_max_len` since nothing longer fits in the log.
    #[inline]
    pub fn line_limit(&self) -> usize {
        self.log_max_len.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `staging_dir = "."`, `config_file_name = "config.json"`
    /// - `library_path_var = "LD_LIBRARY_PATH"`
    /// - `log_max_len = 50_000`, `log_prune_offset = 5_000`
    /// - `bus_capacity = 1024`, `input_capacity = 64`
    /// - `grace = 5s`
    /// - `resolve_pool_host = true`, `resolve_timeout = 10s`
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("."),
            config_file_name: "config.json".to_string(),
            library_path_var: "LD_LIBRARY_PATH".to_string(),
            log_max_len: 50_000,
            log_prune_offset: 5_000,
            bus_capacity: 1024,
            input_capacity: 64,
            grace: Duration::from_secs(5),
            resolve_pool_host: true,
            resolve_timeout: Duration::from_secs(10),
        }
    }
}
