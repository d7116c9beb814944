#![allow(dead_code)]

use std::{
    fs,
    net::{IpAddr, Ipv4Addr},
    os::unix::fs::PermissionsExt,
    path::Path,
    sync::{
        Mutex, Once,
        atomic::{AtomicI64, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use rigvisor::{
    Event, EventKind, HostResolver, Subscribe, SupervisorConfig, WakeLock, WorkerObserver,
};
use tempfile::TempDir;
use tokio::sync::Notify;

pub const TEMPLATE: &str = concat!(
    r#"{"algo":"$algo$","url":"$url$","host":"$urlhost$","port":"$urlport$","#,
    r#""user":"$username$","pass":"$pass$","cpu":$cpuconfig$}"#,
);

/// Reports one speed line, one accepted share and a stderr line, then echoes stdin.
pub const MINER: &str = r#"#!/bin/sh
echo "[2019-07-12 10:00:00] speed 10s/60s/15m 101.5 n/a n/a H/s"
echo "[2019-07-12 10:00:01] accepted (1/0) diff 1000 (12 ms)"
echo "warming up" >&2
while read -r line; do
    echo "echo: $line"
done
"#;

/// Prints a speed line and exits with code 3.
pub const QUICK: &str = r#"#!/bin/sh
echo "[2019-07-12 10:00:00] speed 10s/60s/15m 42.0 43.0 n/a H/s"
exit 3
"#;

/// Prints 100 numbered lines and stays alive.
pub const CHATTY: &str = r#"#!/bin/sh
i=0
while [ $i -lt 100 ]; do
    echo "line $i"
    i=$((i + 1))
done
exec sleep 30
"#;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Staging directory holding the given `(name, script)` pairs as executables.
pub fn stage(scripts: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, body) in scripts {
        write_script(dir.path(), name, body);
    }
    dir
}

fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
}

/// Config for `dir` without DNS lookups and with a short grace.
pub fn config(dir: &Path) -> SupervisorConfig {
    let mut cfg = SupervisorConfig::with_staging_dir(dir);
    cfg.resolve_pool_host = false;
    cfg.grace = Duration::from_secs(2);
    cfg
}

/// Polls `cond` every 20ms for up to 5s.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..250 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}

/// Observer recording every notification.
#[derive(Default)]
pub struct RecordingObserver {
    pub states: Mutex<Vec<bool>>,
    pub statuses: Mutex<Vec<(String, String, u64)>>,
    pub failures: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<bool> {
        self.states.lock().unwrap().clone()
    }

    pub fn last_status(&self) -> Option<(String, String, u64)> {
        self.statuses.lock().unwrap().last().cloned()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

impl WorkerObserver for RecordingObserver {
    fn on_state_change(&self, running: bool) {
        self.states.lock().unwrap().push(running);
    }

    fn on_status_change(&self, line: &str, speed: &str, accepted: u64) {
        self.statuses
            .lock()
            .unwrap()
            .push((line.to_string(), speed.to_string(), accepted));
    }

    fn on_start_failed(&self, message: &str) {
        self.failures.lock().unwrap().push(message.to_string());
    }
}

/// Subscriber keeping every bus event.
#[derive(Default)]
pub struct EventLog(pub Mutex<Vec<Event>>);

impl EventLog {
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|ev| ev.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Subscribe for EventLog {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.clone());
    }

    fn name(&self) -> &'static str {
        "event-log"
    }
}

/// Wake lock counting holders and acquisitions.
#[derive(Default)]
pub struct CountingWakeLock {
    pub held: AtomicI64,
    pub acquired: AtomicU64,
}

impl CountingWakeLock {
    pub fn held(&self) -> i64 {
        self.held.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }
}

impl WakeLock for CountingWakeLock {
    fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.held.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.held.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolver that never answers for hosts starting with `slow.` and maps
/// everything else to 127.0.0.1.
#[derive(Default)]
pub struct GatedResolver {
    pub calls: AtomicU64,
    pub entered: Notify,
}

impl GatedResolver {
    /// Waits until a lookup has started.
    pub async fn wait_entered(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.entered.notified())
            .await
            .expect("lookup never started");
    }
}

#[async_trait]
impl HostResolver for GatedResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if host.starts_with("slow.") {
            std::future::pending::<()>().await;
        }
        Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}
