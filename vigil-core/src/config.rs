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

//! All engine tunables exposed to operators. Grouped
//! into one `serde`-deserializable struct so `vigil-cli` can load it
//! from TOML and layer environment/CLI overrides on top, the way
//! `agentreplay-server::config::ServerConfig` does.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Retention window of a time series, in seconds. Typically one day.
    #[serde(default = "default_full_duration")]
    pub full_duration: i64,

    /// A tail older than this many seconds triggers a `Stale` reject.
    #[serde(default = "default_stale_period")]
    pub stale_period: i64,

    /// Minimum sample count before a series is even looked at.
    #[serde(default = "default_min_tolerable_length")]
    pub min_tolerable_length: usize,

    /// Trailing window (sample count) inspected for boredom.
    #[serde(default = "default_max_tolerable_boredom")]
    pub max_tolerable_boredom: usize,

    /// Distinct-value count at/under which a trailing window counts
    /// as boring (1 == flatline).
    #[serde(default = "default_boredom_set_size")]
    pub boredom_set_size: usize,

    /// k-of-N consensus: number of detectors that must vote anomalous.
    #[serde(default = "default_consensus")]
    pub consensus: usize,

    /// Ordered list of detector names, looked up in the battery's
    /// static registry at startup. Unknown names fail fast.
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<String>,

    /// Whether the second-order filter gates triggers at all.
    #[serde(default = "default_enable_second_order")]
    pub enable_second_order: bool,

    /// Whether the ensemble evaluator may short-circuit once
    /// consensus is unreachable.
    #[serde(default = "default_run_optimized_workflow")]
    pub run_optimized_workflow: bool,

    /// Whether metrics with a moderately stale tail get flagged into
    /// `analyzer.alert_on_stale_metrics`.
    #[serde(default)]
    pub alert_on_stale_metrics: bool,

    /// Threshold (seconds) for the soft stale flag above.
    #[serde(default = "default_alert_on_stale_period")]
    pub alert_on_stale_period: i64,

    /// Patterns whose matching base-names get zero-filled on ingest.
    #[serde(default)]
    pub flux_zero_fill_namespaces: Vec<String>,

    /// Whether per-detector count/timing files are written.
    #[serde(default)]
    pub enable_algorithm_run_metrics: bool,
}

pub fn default_full_duration() -> i64 {
    86_400
}
fn default_stale_period() -> i64 {
    500
}
fn default_min_tolerable_length() -> usize {
    1
}
fn default_max_tolerable_boredom() -> usize {
    100
}
fn default_boredom_set_size() -> usize {
    1
}
fn default_consensus() -> usize {
    6
}
fn default_alert_on_stale_period() -> i64 {
    300
}
fn default_run_optimized_workflow() -> bool {
    true
}
fn default_enable_second_order() -> bool {
    false
}

fn default_algorithms() -> Vec<String> {
    vec![
        "histogram_bins".to_string(),
        "first_hour_average".to_string(),
        "stddev_from_average".to_string(),
        "stddev_from_moving_average".to_string(),
        "mean_subtraction_cumulation".to_string(),
        "least_squares".to_string(),
        "grubbs".to_string(),
        "median_absolute_deviation".to_string(),
        "ks_test".to_string(),
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            full_duration: default_full_duration(),
            stale_period: default_stale_period(),
            min_tolerable_length: default_min_tolerable_length(),
            max_tolerable_boredom: default_max_tolerable_boredom(),
            boredom_set_size: default_boredom_set_size(),
            consensus: default_consensus(),
            algorithms: default_algorithms(),
            enable_second_order: default_enable_second_order(),
            run_optimized_workflow: default_run_optimized_workflow(),
            alert_on_stale_metrics: false,
            alert_on_stale_period: default_alert_on_stale_period(),
            flux_zero_fill_namespaces: Vec::new(),
            enable_algorithm_run_metrics: false,
        }
    }
}
