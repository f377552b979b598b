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

//! The consensus evaluator. Runs the
//! configured detector battery in declared order, short-circuiting
//! once k-of-N consensus is no longer reachable, and reports back a
//! per-detector vote vector plus the final boolean decision.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::detectors::{self, apply_pre_filters, DetectorVote};
use crate::error::{CoreError, CoreResult, PreFilterReject};
use crate::timeseries::TimeSeries;

/// One named detector's vote, kept alongside its name so callers
/// (and the second-order filter, and observability) don't need to
/// re-zip against `EngineConfig::algorithms`.
#[derive(Debug, Clone)]
pub struct NamedVote {
    pub name: String,
    pub vote: DetectorVote,
}

/// Outcome of one ensemble evaluation.
#[derive(Debug, Clone)]
pub struct EnsembleResult {
    pub anomalous: bool,
    pub votes: Vec<NamedVote>,
    pub tail_value: f64,
}

/// Observability hook: per-detector timing and error
/// sampling, implemented outside `vigil-core` (see
/// `vigil_store::observability::FileRunMetricsSink`) so the pure
/// detector battery never touches the filesystem itself.
pub trait RunMetricsSink {
    fn record_timing(&self, detector: &str, elapsed: Duration);
    /// Called once per invocation when metrics are enabled, whether
    /// or not the detector panicked.
    fn record_count(&self, detector: &str);
    /// Called only when a detector panics; `message` is the captured
    /// panic payload rendered to a string.
    fn record_error(&self, detector: &str, message: &str);
}

/// A sink that does nothing, used when
/// `EngineConfig::enable_algorithm_run_metrics` is false.
pub struct NullRunMetricsSink;

impl RunMetricsSink for NullRunMetricsSink {
    fn record_timing(&self, _detector: &str, _elapsed: Duration) {}
    fn record_count(&self, _detector: &str) {}
    fn record_error(&self, _detector: &str, _message: &str) {}
}

/// Resolve `cfg.algorithms` against the detector registry, failing
/// fast on an unknown name. Call once at engine construction, not per-sample.
pub fn resolve_algorithms(
    cfg: &EngineConfig,
) -> CoreResult<Vec<(String, detectors::DetectorFn)>> {
    cfg.algorithms
        .iter()
        .map(|name| {
            detectors::lookup(name)
                .map(|f| (name.clone(), f))
                .ok_or_else(|| CoreError::UnknownDetector(name.clone()))
        })
        .collect()
}

/// Run the ensemble against `ts`. `resolved` is the output of
/// [`resolve_algorithms`], passed in so callers don't redo the
/// registry lookup on every evaluation. `now` is the caller's
/// injected clock reading.
pub fn evaluate(
    ts: &TimeSeries,
    cfg: &EngineConfig,
    resolved: &[(String, detectors::DetectorFn)],
    now: i64,
    sink: &dyn RunMetricsSink,
) -> Result<EnsembleResult, PreFilterReject> {
    apply_pre_filters(ts, cfg, now)?;

    let n = resolved.len();
    let max_false = n as isize - cfg.consensus as isize + 1;

    let mut votes = Vec::with_capacity(n);
    let mut false_count = 0usize;
    let mut consensus_possible = true;

    for (name, detector_fn) in resolved {
        let vote = if consensus_possible {
            run_one(name, *detector_fn, ts, cfg, sink)
        } else {
            // Short-circuited: recorded as `false` without running
            // the detector, and only when RUN_OPTIMIZED_WORKFLOW
            // is set -- consensus_possible only ever goes false under
            // that flag, see below.
            DetectorVote::Normal
        };

        if vote.counts_as_false() {
            false_count += 1;
        }
        votes.push(NamedVote {
            name: name.clone(),
            vote,
        });

        if cfg.run_optimized_workflow && false_count as isize >= max_false {
            consensus_possible = false;
        }
    }

    let total_false = votes.iter().filter(|v| v.vote.counts_as_false()).count() as isize;
    let threshold = n as isize - cfg.consensus as isize;
    let anomalous = total_false <= threshold;
    let tail_value = ts.tail().1;

    Ok(EnsembleResult {
        anomalous,
        votes,
        tail_value,
    })
}

fn run_one(
    name: &str,
    detector_fn: detectors::DetectorFn,
    ts: &TimeSeries,
    cfg: &EngineConfig,
    sink: &dyn RunMetricsSink,
) -> DetectorVote {
    let timed = cfg.enable_algorithm_run_metrics;
    let start = timed.then(Instant::now);

    let result = catch_unwind(AssertUnwindSafe(|| detector_fn(ts)));

    if timed {
        sink.record_count(name);
        if let Some(start) = start {
            sink.record_timing(name, start.elapsed());
        }
    }

    match result {
        Ok(vote) => vote,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "detector panicked with a non-string payload".to_string());
            sink.record_error(name, &message);
            DetectorVote::Undetermined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::TimeSeries;

    fn cfg_with(algorithms: Vec<&str>, consensus: usize) -> EngineConfig {
        EngineConfig {
            algorithms: algorithms.into_iter().map(String::from).collect(),
            consensus,
            min_tolerable_length: 1,
            stale_period: 10_000_000,
            max_tolerable_boredom: 5,
            boredom_set_size: 5,
            ..EngineConfig::default()
        }
    }

    fn noisy_series(n: usize) -> Vec<(i64, f64)> {
        (0..n as i64)
            .map(|i| (i, ((i as f64) * 0.013).sin() * 2.0))
            .collect()
    }

    #[test]
    fn pre_filter_reject_short_circuits_before_any_vote() {
        let cfg = cfg_with(vec!["grubbs"], 1);
        let samples = vec![(0i64, 1.0)];
        let owned = TimeSeries::from_samples_owned(&samples);
        let resolved = resolve_algorithms(&cfg).unwrap();
        let cfg_too_short = EngineConfig {
            min_tolerable_length: 5,
            ..cfg
        };
        let err = evaluate(
            &owned.view(),
            &cfg_too_short,
            &resolved,
            100,
            &NullRunMetricsSink,
        )
        .unwrap_err();
        assert_eq!(err, PreFilterReject::TooShort);
    }

    #[test]
    fn unanimous_normal_series_is_not_anomalous() {
        let cfg = cfg_with(
            vec![
                "grubbs",
                "stddev_from_average",
                "median_absolute_deviation",
            ],
            3,
        );
        let samples = noisy_series(500);
        let owned = TimeSeries::from_samples_owned(&samples);
        let resolved = resolve_algorithms(&cfg).unwrap();
        let result = evaluate(&owned.view(), &cfg, &resolved, 10_000, &NullRunMetricsSink).unwrap();
        assert!(!result.anomalous);
        assert_eq!(result.votes.len(), 3);
    }

    #[test]
    fn short_circuit_does_not_change_final_decision() {
        let mut samples = noisy_series(500);
        samples.push((500, 1000.0));
        let owned = TimeSeries::from_samples_owned(&samples);

        let algorithms = vec![
            "grubbs",
            "median_absolute_deviation",
            "stddev_from_average",
            "stddev_from_moving_average",
            "mean_subtraction_cumulation",
        ];
        let cfg_optimized = cfg_with(algorithms.clone(), 5);
        let cfg_unoptimized = EngineConfig {
            run_optimized_workflow: false,
            ..cfg_with(algorithms, 5)
        };

        let resolved_opt = resolve_algorithms(&cfg_optimized).unwrap();
        let resolved_unopt = resolve_algorithms(&cfg_unoptimized).unwrap();

        let with_optimization = evaluate(
            &owned.view(),
            &cfg_optimized,
            &resolved_opt,
            501,
            &NullRunMetricsSink,
        )
        .unwrap();
        let without_optimization = evaluate(
            &owned.view(),
            &cfg_unoptimized,
            &resolved_unopt,
            501,
            &NullRunMetricsSink,
        )
        .unwrap();

        assert_eq!(with_optimization.anomalous, without_optimization.anomalous);
    }

    #[test]
    fn increasing_consensus_can_only_shrink_the_anomalous_set() {
        let mut samples = noisy_series(500);
        samples.push((500, 1000.0));
        let owned = TimeSeries::from_samples_owned(&samples);
        let algorithms = vec![
            "grubbs",
            "median_absolute_deviation",
            "stddev_from_average",
            "stddev_from_moving_average",
            "mean_subtraction_cumulation",
        ];

        let mut prev_anomalous = true;
        for consensus in 1..=algorithms.len() {
            let cfg = cfg_with(algorithms.clone(), consensus);
            let resolved = resolve_algorithms(&cfg).unwrap();
            let result =
                evaluate(&owned.view(), &cfg, &resolved, 501, &NullRunMetricsSink).unwrap();
            // Monotonicity: once false, a higher consensus requirement
            // must not flip it back to true.
            if !prev_anomalous {
                assert!(!result.anomalous);
            }
            prev_anomalous = result.anomalous;
        }
    }

    #[test]
    fn unknown_detector_name_fails_fast() {
        let cfg = cfg_with(vec!["not_a_real_detector"], 1);
        assert!(matches!(
            resolve_algorithms(&cfg).unwrap_err(),
            CoreError::UnknownDetector(name) if name == "not_a_real_detector"
        ));
    }
}
