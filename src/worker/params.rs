use std::fmt::Write as _;

use super::{PoolAddress, WorkerVariant};

/// Renders the CPU affinity descriptor.
///
/// One `[intensity,core]` pair per core × thread combination, comma-joined and
/// wrapped in an outer bracket pair. Zero cores or threads yield `[]`.
///
/// ```
/// assert_eq!(rigvisor::cpu_config(2, 1, 3), "[[3,0],[3,1]]");
/// assert_eq!(rigvisor::cpu_config(0, 4, 1), "[]");
/// ```
pub fn cpu_config(cores: u32, threads_per_core: u32, intensity: u32) -> String {
    let mut out = String::from("[");
    let mut first = true;
    for core in 0..cores {
        for _ in 0..threads_per_core {
            if !first {
                out.push(',');
            }
            first = false;
            let _ = write!(out, "[{intensity},{core}]");
        }
    }
    out.push(']');
    out
}

/// Parameter set for one start request.
///
/// Built once per start through [`WorkerParameters::builder`]; the derived
/// values (`cpu_config`, legacy scalars, pool split) are computed in
/// [`WorkerParametersBuilder::build`] and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerParameters {
    variant: WorkerVariant,
    executable: String,
    algo: String,
    url: String,
    pool: PoolAddress,
    username: String,
    password: String,
    cores: u32,
    threads_per_core: u32,
    intensity: u32,
    cpu_config: String,
}

impl WorkerParameters {
    /// Starts a builder for the given worker variant and staged executable name.
    pub fn builder(
        variant: impl Into<WorkerVariant>,
        executable: impl Into<String>,
    ) -> WorkerParametersBuilder {
        WorkerParametersBuilder::new(variant.into(), executable.into())
    }

    pub fn variant(&self) -> &WorkerVariant {
        &self.variant
    }

    /// File name of the worker binary inside the staging directory.
    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn algo(&self) -> &str {
        &self.algo
    }

    /// Full pool string substituted for `$url$`.
    ///
    /// Equals the pool as given, unless host resolution replaced the host by its address.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pool(&self) -> &PoolAddress {
        &self.pool
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    pub fn threads_per_core(&self) -> u32 {
        self.threads_per_core
    }

    pub fn intensity(&self) -> u32 {
        self.intensity
    }

    /// CPU affinity descriptor, see [`cpu_config`].
    pub fn cpu_config(&self) -> &str {
        &self.cpu_config
    }

    /// `cores × threads_per_core`.
    pub fn legacy_threads(&self) -> u32 {
        self.cores.saturating_mul(self.threads_per_core)
    }

    pub fn legacy_intensity(&self) -> u32 {
        self.intensity
    }

    /// Replaces the `$url$` value; host/port split is left untouched.
    pub(crate) fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }
}

/// Fluent builder for [`WorkerParameters`].
#[derive(Debug, Clone)]
pub struct WorkerParametersBuilder {
    variant: WorkerVariant,
    executable: String,
    algo: String,
    pool: String,
    username: String,
    password: String,
    cores: u32,
    threads_per_core: u32,
    intensity: u32,
}

impl WorkerParametersBuilder {
    fn new(variant: WorkerVariant, executable: String) -> Self {
        Self {
            variant,
            executable,
            algo: String::new(),
            pool: String::new(),
            username: String::new(),
            password: String::new(),
            cores: 1,
            threads_per_core: 1,
            intensity: 1,
        }
    }

    pub fn algo(mut self, algo: impl Into<String>) -> Self {
        self.algo = algo.into();
        self
    }

    /// Pool as `host[:port]`.
    pub fn pool(mut self, pool: impl Into<String>) -> Self {
        self.pool = pool.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn cores(mut self, cores: u32) -> Self {
        self.cores = cores;
        self
    }

    pub fn threads_per_core(mut self, threads: u32) -> Self {
        self.threads_per_core = threads;
        self
    }

    pub fn intensity(mut self, intensity: u32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Computes the derived values and freezes the parameter set.
    pub fn build(self) -> WorkerParameters {
        let pool = PoolAddress::parse(&self.pool);
        WorkerParameters {
            cpu_config: cpu_config(self.cores, self.threads_per_core, self.intensity),
            url: self.pool,
            pool,
            variant: self.variant,
            executable: self.executable,
            algo: self.algo,
            username: self.username,
            password: self.password,
            cores: self.cores,
            threads_per_core: self.threads_per_core,
            intensity: self.intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_config_has_one_entry_per_core_thread() {
        for cores in 0..6u32 {
            for threads in 0..4u32 {
                let desc = cpu_config(cores, threads, 7);
                assert!(desc.starts_with('[') && desc.ends_with(']'));
                let entries = desc.matches("[7,").count() as u32;
                assert_eq!(entries, cores * threads, "cores={cores} threads={threads}");
                for core in 0..cores {
                    let per_core = desc.matches(&format!("[7,{core}]")).count() as u32;
                    assert_eq!(per_core, threads);
                }
                assert!(!desc.contains(&format!("[7,{cores}]")));
            }
        }
    }

    #[test]
    fn cpu_config_layout() {
        assert_eq!(cpu_config(2, 2, 1), "[[1,0],[1,0],[1,1],[1,1]]");
        assert_eq!(cpu_config(3, 0, 1), "[]");
    }

    #[test]
    fn build_derives_legacy_values_and_pool_split() {
        let p = WorkerParameters::builder("xmrig", "xmrig")
            .algo("rx/0")
            .pool("pool.example.org:4444")
            .username("wallet")
            .password("x")
            .cores(4)
            .threads_per_core(2)
            .intensity(3)
            .build();

        assert_eq!(p.legacy_threads(), 8);
        assert_eq!(p.legacy_intensity(), 3);
        assert_eq!(p.url(), "pool.example.org:4444");
        assert_eq!(p.pool().host(), "pool.example.org");
        assert_eq!(p.pool().port(), Some("4444"));
        assert_eq!(p.cpu_config().matches('[').count(), 8 + 1);
    }

    #[test]
    fn with_url_keeps_split() {
        let p = WorkerParameters::builder("xmrig", "xmrig")
            .pool("pool.example.org:4444")
            .build()
            .with_url("10.0.0.1:4444".into());
        assert_eq!(p.url(), "10.0.0.1:4444");
        assert_eq!(p.pool().host(), "pool.example.org");
    }
}
