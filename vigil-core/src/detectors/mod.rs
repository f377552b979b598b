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

//! The detector battery. Each detector is a pure
//! `fn(&TimeSeries) -> DetectorVote` registered under a fixed name;
//! `ALGORITHMS` config is a list of those names resolved at startup
//! via [`lookup`], which fails fast on an unrecognized name rather
//! than dispatching dynamically by string.

mod first_hour_average;
mod grubbs;
mod histogram_bins;
mod least_squares;
mod mean_subtraction_cumulation;
mod median_absolute_deviation;
mod stddev_from_average;
mod stddev_from_moving_average;

use crate::config::EngineConfig;
use crate::error::PreFilterReject;
use crate::timeseries::TimeSeries;

/// One detector's verdict. `Undetermined` is distinct from `Normal`:
/// it marks an internal computation failure (division by zero,
/// insufficient data) that must not count as either a trigger or a
/// non-trigger vote, only as `false` for consensus bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorVote {
    Anomalous,
    Normal,
    Undetermined,
}

impl DetectorVote {
    /// `undetermined` is normalized to `false` for consensus counting.
    pub fn counts_as_false(self) -> bool {
        !matches!(self, DetectorVote::Anomalous)
    }

    pub fn is_anomalous(self) -> bool {
        matches!(self, DetectorVote::Anomalous)
    }
}

pub type DetectorFn = fn(&TimeSeries) -> DetectorVote;

/// The static name -> function registry. Order here is irrelevant;
/// evaluation order comes from `EngineConfig::algorithms`.
const REGISTRY: &[(&str, DetectorFn)] = &[
    (
        "median_absolute_deviation",
        median_absolute_deviation::median_absolute_deviation,
    ),
    ("grubbs", grubbs::grubbs),
    (
        "first_hour_average",
        first_hour_average::first_hour_average,
    ),
    (
        "stddev_from_average",
        stddev_from_average::stddev_from_average,
    ),
    (
        "stddev_from_moving_average",
        stddev_from_moving_average::stddev_from_moving_average,
    ),
    (
        "mean_subtraction_cumulation",
        mean_subtraction_cumulation::mean_subtraction_cumulation,
    ),
    ("least_squares", least_squares::least_squares),
    ("histogram_bins", histogram_bins::histogram_bins),
    ("ks_test", ks_test::ks_test),
];

/// Look up a detector by its configured name.
pub fn lookup(name: &str) -> Option<DetectorFn> {
    REGISTRY.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

pub fn known_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(n, _)| *n).collect()
}

/// Apply the three pre-filters in the fixed order
/// `TooShort -> Stale -> Boring`. `now` is injected rather than read
/// from the clock so evaluation stays deterministic in tests.
pub fn apply_pre_filters(
    ts: &TimeSeries,
    cfg: &EngineConfig,
    now: i64,
) -> Result<(), PreFilterReject> {
    if ts.len() < cfg.min_tolerable_length {
        return Err(PreFilterReject::TooShort);
    }
    let (tail_t, _) = ts.tail();
    if now - tail_t > cfg.stale_period {
        return Err(PreFilterReject::Stale);
    }
    let window = ts.tail_n(cfg.max_tolerable_boredom);
    let distinct: std::collections::HashSet<u64> =
        window.iter().map(|(_, v)| v.to_bits()).collect();
    if distinct.len() == cfg.boredom_set_size {
        return Err(PreFilterReject::Boring);
    }
    Ok(())
}

/// Soft stale flag: true when the tail is older than
/// `alert_on_stale_period` but has not yet crossed `stale_period`
/// (i.e. would not itself be rejected by [`apply_pre_filters`]).
pub fn alert_on_stale(ts: &TimeSeries, cfg: &EngineConfig, now: i64) -> bool {
    if !cfg.alert_on_stale_metrics {
        return false;
    }
    let (tail_t, _) = ts.tail();
    let age = now - tail_t;
    age >= cfg.alert_on_stale_period && age < cfg.stale_period
}
