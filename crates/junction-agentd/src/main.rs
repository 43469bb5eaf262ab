mod arrivals;
mod config;

use std::{path::PathBuf, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use junction_core::{Controller, ObserverHandle};
use junction_observe::{ReleaseLogger, init_local_offset, init_logger};
use junction_prometheus::{Encoder, PrometheusMetrics, TextEncoder};

use crate::config::AgentConfig;

fn main() -> anyhow::Result<()> {
    // Before any thread exists, or local offset detection refuses to run.
    init_local_offset();

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let cfg = AgentConfig::load(path.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cfg))
}

async fn run(cfg: AgentConfig) -> anyhow::Result<()> {
    // 1) logger
    let logger = cfg.logger.clone().with_env_overrides()?;
    init_logger(&logger)?;
    info!(format = %logger.format, level = logger.level.as_str(), "logger initialized");

    // 2) metrics
    let metrics = PrometheusMetrics::new()?;

    // 3) controller
    let controller = Arc::new(
        Controller::builder(cfg.controller.clone())
            .with_observer(Arc::new(ReleaseLogger) as ObserverHandle)
            .with_metrics(Arc::new(metrics.clone()))
            .start()?,
    );

    // 4) traffic
    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();
    if let Some(interval) = cfg.arrivals.interval() {
        tasks.push(tokio::spawn(arrivals::run_arrivals(
            Arc::clone(&controller),
            interval,
            cfg.arrivals.emergency_every,
            cancel.child_token(),
        )));
    }
    if let Some(period) = cfg.arrivals.snapshot_period() {
        tasks.push(tokio::spawn(arrivals::run_snapshots(
            Arc::clone(&controller),
            period,
            cancel.child_token(),
        )));
    }

    // 5) run until ctrl-c
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    cancel.cancel();
    for task in tasks {
        task.await?;
    }
    controller.shutdown().await;
    arrivals::log_snapshot(&controller);

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.gather(), &mut buffer)?;
    debug!("final metrics:\n{}", String::from_utf8_lossy(&buffer));

    info!(transitions = controller.transitions(), "junction-agentd stopped");
    Ok(())
}
