//! # Example: supervise
//!
//! Runs a worker staged in a directory, prints its status for a while and
//! stops it.
//!
//! Shows how to:
//! - Build a [`Supervisor`] with a config template and a [`WorkerObserver`].
//! - Attach the built-in [`LogWriter`] subscriber.
//! - Start, feed and stop the worker.
//!
//! ## Flow
//! ```text
//! Supervisor::start(params)
//!     ├─► render template ─► <staging_dir>/config.json
//!     ├─► spawn <staging_dir>/<executable>
//!     ├─► OutputPump ─► classify ─► StatusChanged ─► ConsoleObserver
//!     └─► ExitMonitor ─► StateChanged ─► ConsoleObserver
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example supervise --features logging -- \
//!     /opt/worker xmrig xmrig pool.example.org:3333 <wallet>
//! ```

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use rigvisor::{
    LogWriter, Subscribe, Supervisor, SupervisorConfig, WorkerObserver, WorkerParameters,
};

const TEMPLATE: &str = r#"{
    "cpu": { "enabled": true, "huge-pages": true, "rx": $cpuconfig$ },
    "pools": [
        {
            "algo": "$algo$", "url": "$url$",
            "user": "$username$", "pass": "$pass$",
            "keepalive": true
        }
    ]
}"#;

struct ConsoleObserver;

impl WorkerObserver for ConsoleObserver {
    fn on_state_change(&self, running: bool) {
        println!("[observer] running={running}");
    }

    fn on_status_change(&self, _line: &str, speed: &str, accepted: u64) {
        println!("[observer] speed={speed} accepted={accepted}");
    }

    fn on_start_failed(&self, message: &str) {
        eprintln!("[observer] start failed: {message}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let staging = args.next().context("missing staging directory")?;
    let variant = args.next().unwrap_or_else(|| "xmrig".to_string());
    let executable = args.next().unwrap_or_else(|| variant.clone());
    let pool = args.next().unwrap_or_else(|| "127.0.0.1:3333".to_string());
    let wallet = args.next().unwrap_or_default();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let sup = Supervisor::builder(SupervisorConfig::with_staging_dir(staging), TEMPLATE)
        .with_subscribers(subs)
        .with_observer(Arc::new(ConsoleObserver))
        .build();

    let params = WorkerParameters::builder(variant.as_str(), executable)
        .algo("rx/0")
        .pool(pool)
        .username(wallet)
        .password("x")
        .cores(2)
        .build();

    sup.start(params).await.context("worker did not start")?;

    for _ in 0..6 {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let stats = sup.current_stats();
        println!(
            "[main] state={:?} speed={} accepted={}",
            sup.current_state(),
            stats.speed,
            stats.accepted
        );
    }

    // xmrig prints a hashrate report on "h".
    sup.send_input("h\n");
    tokio::time::sleep(Duration::from_secs(1)).await;

    sup.stop().await;
    println!("[main] last log lines:\n{}", tail(&sup.log_text(), 10));
    Ok(())
}

fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
