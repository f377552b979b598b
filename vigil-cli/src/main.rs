// Copyright 2025 Vigil Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

mod config;
mod worker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time::interval;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil_core::ensemble::resolve_algorithms;
use vigil_manager::tick;
use vigil_store::{FileRunMetricsSink, InMemoryStore, SharedStore};

use crate::config::CliConfig;

/// The `vigil` binary: the worker pool that evaluates the detector
/// ensemble over the live metric universe, and the metrics manager
/// that reconciles routing sets on its own cadence. Both run out of
/// one process; a production deployment is expected to split them
/// across many worker processes sharing one Redis-backed store, per
/// the scheduling model -- nothing here assumes a single process.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML).
    #[arg(short, long, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Required trigger count for ensemble consensus (overrides config file).
    #[arg(long, env = "CONSENSUS")]
    consensus: Option<usize>,

    /// Worker pool size (overrides config file).
    #[arg(long, env = "VIGIL_WORKER_COUNT")]
    worker_count: Option<usize>,

    /// Run a single worker sweep and a single manager tick, then exit,
    /// instead of looping on the configured cadences.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut cfg = CliConfig::load(args.config)?;
    if let Some(consensus) = args.consensus {
        cfg.engine.consensus = consensus;
    }
    if let Some(worker_count) = args.worker_count {
        cfg.scheduling.worker_count = worker_count;
    }
    cfg.validate()?;

    tracing::info!(
        algorithms = ?cfg.engine.algorithms,
        consensus = cfg.engine.consensus,
        workers = cfg.scheduling.worker_count,
        "vigil: starting"
    );

    let resolved = Arc::new(resolve_algorithms(&cfg.engine)?);
    let store: Arc<dyn SharedStore> = Arc::new(InMemoryStore::new());
    let sink = Arc::new(FileRunMetricsSink::new(
        cfg.scheduling.tmp_dir.clone(),
        cfg.scheduling.app_name.clone(),
    )?);

    if args.once {
        run_sweep(&cfg, &store, &resolved, &sink).await;
        run_manager_tick(&cfg, &store);
        drain_observability(&cfg);
        return Ok(());
    }

    let mut worker_tick = interval(Duration::from_secs(cfg.scheduling.worker_sweep_secs));
    let mut manager_interval = interval(Duration::from_secs(cfg.scheduling.manager_interval_secs));

    loop {
        tokio::select! {
            _ = worker_tick.tick() => {
                run_sweep(&cfg, &store, &resolved, &sink).await;
                drain_observability(&cfg);
            }
            _ = manager_interval.tick() => {
                run_manager_tick(&cfg, &store);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("vigil: received shutdown signal, exiting");
                break;
            }
        }
    }

    Ok(())
}

async fn run_sweep(
    cfg: &CliConfig,
    store: &Arc<dyn SharedStore>,
    resolved: &Arc<Vec<(String, vigil_core::detectors::DetectorFn)>>,
    sink: &Arc<FileRunMetricsSink>,
) {
    let dyn_sink: Arc<dyn vigil_core::ensemble::RunMetricsSink + Send + Sync> =
        Arc::clone(sink);
    let outcome = tokio::time::timeout(
        Duration::from_millis(cfg.scheduling.worker_timeout_ms.max(1) * 50),
        worker::sweep(
            Arc::clone(store),
            Arc::new(cfg.engine.clone()),
            Arc::clone(resolved),
            dyn_sink,
            cfg.manager.full_namespace.clone(),
            cfg.scheduling.worker_count,
            Duration::from_millis(cfg.scheduling.worker_timeout_ms),
            cfg.engine.enable_second_order,
            now(),
        ),
    )
    .await;

    match outcome {
        Ok(Ok(report)) => tracing::info!(?report, "vigil: sweep finished"),
        Ok(Err(e)) => tracing::warn!("vigil: sweep aborted: {e}"),
        Err(_) => tracing::warn!("vigil: sweep exceeded its wall-clock bound and was abandoned"),
    }
}

/// Runs synchronously on the calling task: the reconciliation loop is
/// single-threaded per the scheduling model, and every stage inside
/// it is in-memory set/hash arithmetic plus `SharedStore` calls, none
/// of which need the async runtime.
fn run_manager_tick(cfg: &CliConfig, store: &Arc<dyn SharedStore>) {
    match tick(
        store.as_ref(),
        &cfg.manager,
        &cfg.engine,
        &cfg.manager.external_alerts,
    ) {
        Ok(report) => tracing::info!(?report, "vigil: manager tick complete"),
        Err(e) => tracing::error!("vigil: manager tick failed: {e}"),
    }
}

/// The supervisor's once-per-run drain of the per-detector
/// count/timing/error files, logged as one aggregate line rather than
/// one line per detector per invocation.
fn drain_observability(cfg: &CliConfig) {
    match vigil_store::drain(&cfg.scheduling.tmp_dir, &cfg.scheduling.app_name) {
        Ok(report) => {
            if !report.errors.is_empty() {
                tracing::error!(
                    error_count = report.errors.len(),
                    "vigil: detector faults this run: {:?}",
                    report
                        .errors
                        .iter()
                        .map(|(d, _)| d.as_str())
                        .collect::<Vec<_>>()
                );
            }
            tracing::info!(
                detectors = report.counts.len(),
                errors = report.errors.len(),
                "vigil: drained observability sink"
            );
        }
        Err(e) => tracing::warn!("vigil: failed to drain observability sink: {e}"),
    }
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
