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

//! The worker pool: pulls metric names from the live universe and
//! evaluates the ensemble for each, independently and without
//! cross-worker locking -- each worker owns disjoint metrics within a
//! sweep. Bounded concurrency via a semaphore stands in for "one
//! worker per CPU core".

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use vigil_core::detectors::DetectorFn;
use vigil_core::ensemble::{evaluate, RunMetricsSink};
use vigil_core::error::PreFilterReject;
use vigil_core::second_order::{HistoryGated, PassThrough, SecondOrderFilter};
use vigil_core::timeseries::TimeSeries;
use vigil_core::EngineConfig;
use vigil_manager::keys::unique_metrics_key;
use vigil_store::{SharedStore, StoreTriggerHistory};

/// Outcome of evaluating a single metric, for the sweep summary.
#[derive(Debug)]
enum MetricOutcome {
    Anomalous,
    Normal,
    Rejected(PreFilterReject),
    TimedOut,
    StoreFault,
    DecodeFault,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    pub processed: usize,
    pub anomalous: usize,
    pub normal: usize,
    pub rejected: usize,
    pub timed_out: usize,
    pub faulted: usize,
}

/// One sweep over the live universe: fetch the metric list, evaluate
/// each one under `worker_count`-bounded concurrency, and apply the
/// `alert_on_stale_metrics` soft flag and second-order gate per metric.
#[allow(clippy::too_many_arguments)]
pub async fn sweep(
    store: Arc<dyn SharedStore>,
    engine_cfg: Arc<EngineConfig>,
    resolved: Arc<Vec<(String, DetectorFn)>>,
    sink: Arc<dyn RunMetricsSink + Send + Sync>,
    full_namespace: String,
    worker_count: usize,
    per_metric_timeout: Duration,
    enable_second_order: bool,
    now: i64,
) -> Result<SweepReport> {
    let universe_key = unique_metrics_key(&full_namespace);
    let metrics = store.smembers(&universe_key)?;
    if metrics.is_empty() {
        return Ok(SweepReport::default());
    }

    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
    let mut handles = Vec::with_capacity(metrics.len());

    for metric in metrics {
        let store = Arc::clone(&store);
        let engine_cfg = Arc::clone(&engine_cfg);
        let resolved = Arc::clone(&resolved);
        let sink = Arc::clone(&sink);
        let semaphore = Arc::clone(&semaphore);

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            let outcome = timeout(
                per_metric_timeout,
                tokio::task::spawn_blocking(move || {
                    evaluate_one(
                        &*store,
                        &metric,
                        &engine_cfg,
                        &resolved,
                        &*sink,
                        enable_second_order,
                        now,
                    )
                }),
            )
            .await;

            match outcome {
                Ok(Ok(o)) => o,
                Ok(Err(_)) => MetricOutcome::StoreFault,
                Err(_) => MetricOutcome::TimedOut,
            }
        }));
    }

    let mut report = SweepReport::default();
    for handle in handles {
        let outcome = handle.await.unwrap_or(MetricOutcome::StoreFault);
        report.processed += 1;
        match outcome {
            MetricOutcome::Anomalous => report.anomalous += 1,
            MetricOutcome::Normal => report.normal += 1,
            MetricOutcome::Rejected(_) => report.rejected += 1,
            MetricOutcome::TimedOut => {
                report.timed_out += 1;
                warn!("worker: a metric evaluation exceeded its wall-clock bound and was abandoned");
            }
            MetricOutcome::StoreFault | MetricOutcome::DecodeFault => report.faulted += 1,
        }
    }

    info!(
        processed = report.processed,
        anomalous = report.anomalous,
        rejected = report.rejected,
        timed_out = report.timed_out,
        faulted = report.faulted,
        "worker: sweep complete"
    );

    Ok(report)
}

fn evaluate_one(
    store: &dyn SharedStore,
    metric: &str,
    engine_cfg: &EngineConfig,
    resolved: &[(String, DetectorFn)],
    sink: &dyn RunMetricsSink,
    enable_second_order: bool,
    now: i64,
) -> MetricOutcome {
    let bytes = match store.get(metric) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return MetricOutcome::StoreFault,
        Err(_) => return MetricOutcome::StoreFault,
    };

    let ts = match TimeSeries::from_bytes(&bytes) {
        Ok(ts) => ts,
        Err(_) => return MetricOutcome::DecodeFault,
    };

    if vigil_core::detectors::alert_on_stale(&ts, engine_cfg, now) {
        let _ = store.sadd("analyzer.alert_on_stale_metrics", metric);
    }

    let result = match evaluate(&ts, engine_cfg, resolved, now, sink) {
        Ok(result) => result,
        Err(reject) => return MetricOutcome::Rejected(reject),
    };

    if !result.anomalous {
        return MetricOutcome::Normal;
    }

    let history = StoreTriggerHistory::new(store);
    let surfaced = if engine_cfg.enable_second_order && enable_second_order {
        HistoryGated::new(&history).is_anomalously_anomalous(metric, now, result.tail_value)
    } else {
        PassThrough.is_anomalously_anomalous(metric, now, result.tail_value)
    };

    if surfaced {
        MetricOutcome::Anomalous
    } else {
        MetricOutcome::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::ensemble::{resolve_algorithms, NullRunMetricsSink};
    use vigil_core::Sample;
    use vigil_store::InMemoryStore;

    fn cfg() -> EngineConfig {
        EngineConfig {
            algorithms: vec!["grubbs".to_string(), "stddev_from_average".to_string()],
            consensus: 2,
            min_tolerable_length: 1,
            stale_period: 10_000_000,
            max_tolerable_boredom: 5,
            boredom_set_size: 5,
            ..EngineConfig::default()
        }
    }

    fn seed(store: &InMemoryStore, metric: &str, samples: &[Sample]) {
        store.sadd("unique_metrics", metric).unwrap();
        let owned = TimeSeries::from_samples_owned(samples);
        let ts = owned.view();
        let bytes = vigil_core::codec::encode(&ts.iter().collect::<Vec<_>>());
        store.set(metric, bytes).unwrap();
    }

    #[tokio::test]
    async fn sweep_over_an_empty_universe_is_a_no_op() {
        let store: Arc<dyn SharedStore> = Arc::new(InMemoryStore::new());
        let engine_cfg = Arc::new(cfg());
        let resolved = Arc::new(resolve_algorithms(&engine_cfg).unwrap());
        let report = sweep(
            store,
            engine_cfg,
            resolved,
            Arc::new(NullRunMetricsSink),
            String::new(),
            2,
            Duration::from_millis(500),
            false,
            1_000,
        )
        .await
        .unwrap();
        assert_eq!(report.processed, 0);
    }

    #[tokio::test]
    async fn sweep_processes_every_metric_in_the_universe() {
        let store = InMemoryStore::new();
        let samples: Vec<Sample> = (0..200).map(|i| (i, ((i as f64) * 0.01).sin())).collect();
        seed(&store, "stats.a", &samples);
        seed(&store, "stats.b", &samples);

        let store: Arc<dyn SharedStore> = Arc::new(store);
        let engine_cfg = Arc::new(cfg());
        let resolved = Arc::new(resolve_algorithms(&engine_cfg).unwrap());

        let report = sweep(
            store,
            engine_cfg,
            resolved,
            Arc::new(NullRunMetricsSink),
            String::new(),
            2,
            Duration::from_millis(500),
            false,
            200,
        )
        .await
        .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.faulted, 0);
    }
}
