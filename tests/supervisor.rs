#![cfg(unix)]

mod common;

use std::{sync::Arc, time::Duration};

use common::*;
use rigvisor::{
    EventKind, LifecycleState, StartError, Subscribe, Supervisor, TemplateSource, WorkerParameters,
};

fn pooled(pool: &str) -> WorkerParameters {
    WorkerParameters::builder("xmrig", "miner").pool(pool).build()
}

fn miner_params(executable: &str) -> WorkerParameters {
    WorkerParameters::builder("xmrig", executable)
        .algo("rx/0")
        .pool("pool.example.org:3333")
        .username("wallet")
        .password("x")
        .cores(2)
        .build()
}

async fn wait_state(sup: &Supervisor, want: LifecycleState) {
    tokio::time::timeout(Duration::from_secs(5), sup.wait_for_state(want))
        .await
        .unwrap_or_else(|_| panic!("state {want:?} not reached"));
}

fn pid_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn start_runs_worker_and_collects_stats() {
    init_tracing();
    let dir = stage(&[("miner", MINER)]);
    let observer = Arc::new(RecordingObserver::default());
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE)
        .with_observer(observer.clone())
        .build();

    sup.start(miner_params("miner")).await.unwrap();
    wait_state(&sup, LifecycleState::Running).await;
    assert!(sup.pid().is_some());

    assert!(eventually(|| sup.accepted() == 1 && sup.speed() == "101.5").await);
    assert!(eventually(|| sup.log_text().contains("warming up")).await);
    let share_seen = || observer.last_status().is_some_and(|(_, _, accepted)| accepted == 1);
    assert!(eventually(share_seen).await);

    let stats = sup.current_stats();
    assert_eq!(stats.speed, "101.5");
    assert!(stats.log.contains("speed 10s/60s/15m 101.5"));

    sup.stop().await;
    assert_eq!(sup.current_state(), LifecycleState::Stopped);
    assert_eq!(sup.pid(), None);
    assert!(eventually(|| observer.states() == vec![true, false]).await);
}

#[tokio::test]
async fn rendered_config_is_staged_before_spawn() {
    let dir = stage(&[("miner", MINER)]);
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE).build();

    sup.start(miner_params("miner")).await.unwrap();
    let written = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert_eq!(
        written,
        concat!(
            r#"{"algo":"rx/0","url":"pool.example.org:3333","host":"pool.example.org","#,
            r#""port":"3333","user":"wallet","pass":"x","cpu":[[1,0],[1,1]]}"#,
        )
    );
    sup.stop().await;
}

#[tokio::test]
async fn resolved_pool_rewrites_only_url() {
    let dir = stage(&[("miner", MINER)]);
    let events = Arc::new(EventLog::default());
    let mut cfg = config(dir.path());
    cfg.resolve_pool_host = true;
    let sup = Supervisor::builder(cfg, TEMPLATE)
        .with_subscribers(vec![events.clone() as Arc<dyn Subscribe>])
        .build();

    let params = WorkerParameters::builder("xmrig", "miner")
        .pool("localhost:3333")
        .build();
    sup.start(params).await.unwrap();

    let written = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert!(
        written.contains(r#""url":"127.0.0.1:3333""#) || written.contains(r#""url":"[::1]:3333""#),
        "{written}"
    );
    assert!(written.contains(r#""host":"localhost","port":"3333""#));
    assert!(eventually(|| events.of_kind(EventKind::HostResolved).len() == 1).await);
    sup.stop().await;
}

#[tokio::test]
async fn second_start_replaces_first_process() {
    let dir = stage(&[("miner", MINER)]);
    let observer = Arc::new(RecordingObserver::default());
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE)
        .with_observer(observer.clone())
        .build();

    sup.start(miner_params("miner")).await.unwrap();
    assert!(eventually(|| sup.accepted() == 1).await);
    let first = sup.pid().unwrap();

    sup.start(miner_params("miner")).await.unwrap();
    let second = sup.pid().unwrap();
    assert_ne!(first, second);
    assert_eq!(sup.instance(), 2);
    assert!(!pid_alive(first));

    // Stats restart from zero for the new instance.
    assert!(eventually(|| sup.accepted() == 1 && sup.speed() == "101.5").await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sup.accepted(), 1);

    sup.stop().await;
    assert!(!pid_alive(second));
    assert!(eventually(|| observer.states() == vec![true, false, true, false]).await);
}

#[tokio::test]
async fn stop_when_idle_is_noop() {
    let dir = stage(&[]);
    let wake = Arc::new(CountingWakeLock::default());
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE)
        .with_wake_lock(wake.clone())
        .build();

    sup.stop().await;
    sup.stop().await;
    assert_eq!(sup.current_state(), LifecycleState::Stopped);
    assert_eq!(sup.instance(), 0);
    assert_eq!(wake.acquired(), 0);
    assert!(!sup.send_input("ignored\n"));
}

#[tokio::test]
async fn spawn_failure_leaves_supervisor_stopped() {
    let dir = stage(&[]);
    let wake = Arc::new(CountingWakeLock::default());
    let observer = Arc::new(RecordingObserver::default());
    let events = Arc::new(EventLog::default());
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE)
        .with_observer(observer.clone())
        .with_subscribers(vec![events.clone() as Arc<dyn Subscribe>])
        .with_wake_lock(wake.clone())
        .build();

    let err = sup.start(miner_params("missing-worker")).await.unwrap_err();
    assert!(matches!(err, StartError::Spawn { .. }));
    assert_eq!(err.as_label(), "spawn_failed");

    assert_eq!(sup.current_state(), LifecycleState::Stopped);
    assert!(sup.current_stats().is_pristine());
    assert_eq!(wake.acquired(), 1);
    assert_eq!(wake.held(), 0);

    assert!(eventually(|| observer.failures().len() == 1).await);
    assert!(eventually(|| !events.of_kind(EventKind::StartFailed).is_empty()).await);
    let failed = events.of_kind(EventKind::StartFailed);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].label, Some("spawn_failed"));
    assert!(observer.states().is_empty());
}

#[tokio::test]
async fn unreadable_template_fails_before_spawn() {
    let dir = stage(&[("miner", MINER)]);
    let wake = Arc::new(CountingWakeLock::default());
    let template = TemplateSource::File(dir.path().join("no-such-template.json"));
    let sup = Supervisor::builder(config(dir.path()), template)
        .with_wake_lock(wake.clone())
        .build();

    let err = sup.start(miner_params("miner")).await.unwrap_err();
    assert!(matches!(err, StartError::ConfigRead { .. }));
    assert_eq!(sup.current_state(), LifecycleState::Stopped);
    assert_eq!(wake.acquired(), 0);
    assert!(!dir.path().join("config.json").exists());
}

#[tokio::test]
async fn natural_exit_reports_stopped_once() {
    let dir = stage(&[("quick", QUICK)]);
    let wake = Arc::new(CountingWakeLock::default());
    let observer = Arc::new(RecordingObserver::default());
    let events = Arc::new(EventLog::default());
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE)
        .with_observer(observer.clone())
        .with_subscribers(vec![events.clone() as Arc<dyn Subscribe>])
        .with_wake_lock(wake.clone())
        .build();

    sup.start(miner_params("quick")).await.unwrap();
    wait_state(&sup, LifecycleState::Stopped).await;

    assert!(eventually(|| observer.states() == vec![true, false]).await);
    assert!(eventually(|| sup.speed() == "43.0").await);
    assert!(eventually(|| {
        events
            .of_kind(EventKind::ProcessExited)
            .first()
            .is_some_and(|ev| ev.exit_code == Some(3))
    })
    .await);

    // Stats of the finished run stay readable until the next start.
    assert_eq!(sup.current_stats().speed, "43.0");

    sup.stop().await;
    assert_eq!(wake.held(), 0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(observer.states(), vec![true, false]);
}

#[tokio::test]
async fn input_reaches_worker_stdin() {
    let dir = stage(&[("miner", MINER)]);
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE).build();
    assert!(!sup.send_input("too early\n"));

    sup.start(miner_params("miner")).await.unwrap();
    assert!(sup.send_input("hello\n"));
    assert!(eventually(|| sup.log_text().contains("echo: hello")).await);

    sup.stop().await;
    assert!(!sup.send_input("too late\n"));
}

#[tokio::test]
async fn log_stays_bounded() {
    let dir = stage(&[("chatty", CHATTY)]);
    let mut cfg = config(dir.path());
    cfg.log_max_len = 200;
    cfg.log_prune_offset = 20;
    let sup = Supervisor::builder(cfg, TEMPLATE).build();

    sup.start(miner_params("chatty")).await.unwrap();
    assert!(eventually(|| sup.log_text().ends_with("line 99\n")).await);

    let log = sup.log_text();
    assert!(log.len() <= 200, "log grew to {}", log.len());
    assert!(!log.contains("line 0\n"));
    sup.stop().await;
}

#[tokio::test]
async fn spawn_start_runs_in_background() {
    let dir = stage(&[("miner", MINER)]);
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE).build();

    let handle = sup.spawn_start(miner_params("miner"));
    wait_state(&sup, LifecycleState::Running).await;
    handle.await.unwrap().unwrap();

    sup.stop().await;
    assert_eq!(sup.current_state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn exited_worker_is_detached() {
    let dir = stage(&[("quick", QUICK)]);
    let events = Arc::new(EventLog::default());
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE)
        .with_subscribers(vec![events.clone() as Arc<dyn Subscribe>])
        .build();

    sup.start(miner_params("quick")).await.unwrap();
    wait_state(&sup, LifecycleState::Stopped).await;

    assert_eq!(sup.pid(), None);
    assert!(!sup.send_input("after exit\n"));
    // A detached worker has no queue to report as dropped.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events.of_kind(EventKind::InputDropped).is_empty());
}

#[tokio::test]
async fn worker_sees_relative_program_name() {
    let dir = stage(&[]);
    std::os::unix::fs::symlink("/bin/sh", dir.path().join("shell")).unwrap();
    let sup = Supervisor::builder(config(dir.path()), TEMPLATE).build();

    sup.start(miner_params("shell")).await.unwrap();
    assert!(sup.send_input("echo \"argv0=$0\"\n"));
    assert!(
        eventually(|| sup.log_text().contains("argv0=./shell\n")).await,
        "{}",
        sup.log_text()
    );
    sup.stop().await;
}

#[tokio::test]
async fn stop_cancels_start_during_host_lookup() {
    let dir = stage(&[("miner", MINER)]);
    let wake = Arc::new(CountingWakeLock::default());
    let events = Arc::new(EventLog::default());
    let resolver = Arc::new(GatedResolver::default());
    let mut cfg = config(dir.path());
    cfg.resolve_pool_host = true;
    let sup = Supervisor::builder(cfg, TEMPLATE)
        .with_subscribers(vec![events.clone() as Arc<dyn Subscribe>])
        .with_wake_lock(wake.clone())
        .with_resolver(resolver.clone())
        .build();

    let handle = sup.spawn_start(pooled("slow.example.org:3333"));
    resolver.wait_entered().await;
    assert_eq!(sup.current_state(), LifecycleState::Starting);

    sup.stop().await;
    let res = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("start still blocked")
        .unwrap();
    assert!(matches!(res, Err(StartError::Canceled)));

    assert_eq!(sup.current_state(), LifecycleState::Stopped);
    assert_eq!(sup.pid(), None);
    assert_eq!(wake.acquired(), 0);
    assert!(!dir.path().join("config.json").exists());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!events.of_kind(EventKind::StartRequested).is_empty());
    assert!(events.of_kind(EventKind::StartFailed).is_empty());
    assert!(events.of_kind(EventKind::ProcessSpawned).is_empty());
}

#[tokio::test]
async fn newer_start_supersedes_pending_lookup() {
    let dir = stage(&[("miner", MINER)]);
    let wake = Arc::new(CountingWakeLock::default());
    let events = Arc::new(EventLog::default());
    let resolver = Arc::new(GatedResolver::default());
    let mut cfg = config(dir.path());
    cfg.resolve_pool_host = true;
    let sup = Supervisor::builder(cfg, TEMPLATE)
        .with_subscribers(vec![events.clone() as Arc<dyn Subscribe>])
        .with_wake_lock(wake.clone())
        .with_resolver(resolver.clone())
        .build();

    let stalled = sup.spawn_start(pooled("slow.example.org:3333"));
    resolver.wait_entered().await;

    sup.start(pooled("fast.example.org:3333")).await.unwrap();
    let res = tokio::time::timeout(Duration::from_secs(5), stalled)
        .await
        .expect("superseded start still blocked")
        .unwrap();
    assert!(matches!(res, Err(StartError::Canceled)));

    assert_eq!(sup.instance(), 2);
    assert!(sup.pid().is_some());
    assert_eq!(wake.acquired(), 1);
    let written = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert!(written.contains(r#""url":"127.0.0.1:3333","host":"fast.example.org""#), "{written}");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events.of_kind(EventKind::StartFailed).is_empty());
    assert_eq!(events.of_kind(EventKind::ProcessSpawned).len(), 1);
    sup.stop().await;
    assert_eq!(wake.held(), 0);
}
