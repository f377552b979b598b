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

//! The second-order anomaly filter. A per-metric gate that converts a
//! binary "did the ensemble trigger" signal into a judgement about
//! whether the *rate* of triggering is itself unusual, suppressing
//! repetitive alerts.
//!
//! Modeled as a strategy: the evaluator calls
//! [`SecondOrderFilter::is_anomalously_anomalous`] without caring
//! whether it's wired to [`PassThrough`] or [`HistoryGated`].

use crate::stats;

/// One trigger: the time it fired and the value that triggered it.
pub type TriggerEntry = (i64, f64);

/// Suppresses alert-on-same-data retriggers within this many seconds.
pub const SAME_VALUE_SUPPRESSION_WINDOW_SECS: i64 = 300;

/// Persistence seam for trigger history. Implemented by
/// `vigil_store::SharedStore` so this module stays free of any I/O.
pub trait TriggerHistoryStore {
    fn load(&self, metric: &str) -> Option<Vec<TriggerEntry>>;
    fn save(&self, metric: &str, history: &[TriggerEntry]);
}

/// `is_anomalously_anomalous` as a strategy.
pub trait SecondOrderFilter {
    fn is_anomalously_anomalous(&self, metric: &str, now: i64, value: f64) -> bool;
}

/// The default, second-order-disabled strategy: every ensemble
/// trigger surfaces unchanged.
pub struct PassThrough;

impl SecondOrderFilter for PassThrough {
    fn is_anomalously_anomalous(&self, _metric: &str, _now: i64, _value: f64) -> bool {
        true
    }
}

/// The history-gated strategy. Wraps any
/// [`TriggerHistoryStore`] implementation.
pub struct HistoryGated<'a> {
    store: &'a dyn TriggerHistoryStore,
}

impl<'a> HistoryGated<'a> {
    pub fn new(store: &'a dyn TriggerHistoryStore) -> Self {
        Self { store }
    }
}

impl<'a> SecondOrderFilter for HistoryGated<'a> {
    fn is_anomalously_anomalous(&self, metric: &str, now: i64, value: f64) -> bool {
        let mut history = match self.store.load(metric) {
            None => {
                self.store.save(metric, &[(now, value)]);
                return true;
            }
            Some(h) => h,
        };

        if let Some(&(last_t, last_v)) = history.last() {
            if last_v == value && now - last_t <= SAME_VALUE_SUPPRESSION_WINDOW_SECS {
                return false;
            }
        }

        history.push((now, value));
        self.store.save(metric, &history);

        let times: Vec<i64> = history.iter().map(|(t, _)| *t).collect();
        let intervals: Vec<f64> = times
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64)
            .collect();

        let mean = stats::mean(&intervals);
        let std_dev = stats::stddev(&intervals);
        let last_interval = *intervals.last().unwrap();
        (last_interval - mean).abs() > 3.0 * std_dev
    }
}
