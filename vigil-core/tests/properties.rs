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

//! Universal properties of the consensus evaluator: determinism,
//! consensus monotonicity, and short-circuit equivalence, checked
//! against randomly generated series rather than hand-picked examples.

use proptest::prelude::*;
use vigil_core::ensemble::{evaluate, resolve_algorithms, NullRunMetricsSink};
use vigil_core::{EngineConfig, TimeSeries};

const ALGORITHMS: [&str; 5] = [
    "grubbs",
    "median_absolute_deviation",
    "stddev_from_average",
    "stddev_from_moving_average",
    "mean_subtraction_cumulation",
];

fn cfg(consensus: usize, run_optimized_workflow: bool) -> EngineConfig {
    EngineConfig {
        algorithms: ALGORITHMS.iter().map(|s| s.to_string()).collect(),
        consensus,
        run_optimized_workflow,
        min_tolerable_length: 5,
        stale_period: 10_000_000_000,
        max_tolerable_boredom: 3,
        boredom_set_size: 3,
        ..EngineConfig::default()
    }
}

fn series_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1000.0f64..1000.0, 30..200)
}

fn build_series(values: &[f64]) -> Vec<(i64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as i64, *v))
        .collect()
}

proptest! {
    /// Determinism: evaluating the same series twice with the same
    /// configuration always yields the same decision and vote vector.
    #[test]
    fn determinism(values in series_strategy()) {
        let samples = build_series(&values);
        let owned = TimeSeries::from_samples_owned(&samples);
        let c = cfg(3, true);
        let resolved = resolve_algorithms(&c).unwrap();
        let now = samples.last().unwrap().0 + 1;

        let first = evaluate(&owned.view(), &c, &resolved, now, &NullRunMetricsSink);
        let second = evaluate(&owned.view(), &c, &resolved, now, &NullRunMetricsSink);

        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.anomalous, b.anomalous);
                prop_assert_eq!(a.votes.len(), b.votes.len());
                for (va, vb) in a.votes.iter().zip(b.votes.iter()) {
                    prop_assert_eq!(va.vote, vb.vote);
                }
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "non-deterministic reject/ok split"),
        }
    }

    /// Consensus monotonicity: raising CONSENSUS can only turn an
    /// anomalous verdict into a normal one, never the reverse.
    #[test]
    fn consensus_monotonicity(values in series_strategy()) {
        let samples = build_series(&values);
        let owned = TimeSeries::from_samples_owned(&samples);
        let now = samples.last().unwrap().0 + 1;

        let mut previously_anomalous: Option<bool> = None;
        for consensus in 1..=ALGORITHMS.len() {
            let c = cfg(consensus, true);
            let resolved = resolve_algorithms(&c).unwrap();
            let result = evaluate(&owned.view(), &c, &resolved, now, &NullRunMetricsSink);
            if let Ok(r) = result {
                if let Some(prev) = previously_anomalous {
                    // Once a lower CONSENSUS has flipped to normal,
                    // a stricter one must never flip back to anomalous.
                    prop_assert!(!(r.anomalous && !prev));
                }
                previously_anomalous = Some(r.anomalous);
            }
        }
    }

    /// Short-circuit equivalence: the final boolean decision must be
    /// identical whether or not RUN_OPTIMIZED_WORKFLOW short-circuits
    /// the vote loop; only the vote vector may differ.
    #[test]
    fn short_circuit_equivalence(values in series_strategy()) {
        let samples = build_series(&values);
        let owned = TimeSeries::from_samples_owned(&samples);
        let now = samples.last().unwrap().0 + 1;

        let c_opt = cfg(3, true);
        let c_unopt = cfg(3, false);
        let resolved_opt = resolve_algorithms(&c_opt).unwrap();
        let resolved_unopt = resolve_algorithms(&c_unopt).unwrap();

        let opt = evaluate(&owned.view(), &c_opt, &resolved_opt, now, &NullRunMetricsSink);
        let unopt = evaluate(&owned.view(), &c_unopt, &resolved_unopt, now, &NullRunMetricsSink);

        match (opt, unopt) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a.anomalous, b.anomalous),
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "optimized/unoptimized reject vs ok split"),
        }
    }
}
