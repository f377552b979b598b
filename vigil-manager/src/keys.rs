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

//! The shared-store key names the manager owns. Kept as named
//! constants rather than scattered string literals so a rename only
//! ever happens in one place.

pub const ANALYZER_SMTP_ALERTER_METRICS: &str = "analyzer.smtp_alerter_metrics";
pub const ANALYZER_NON_SMTP_ALERTER_METRICS: &str = "analyzer.non_smtp_alerter_metrics";
pub const AET_SMTP_ALERTER_METRICS: &str = "aet.analyzer.smtp_alerter_metrics";
pub const AET_NON_SMTP_ALERTER_METRICS: &str = "aet.analyzer.non_smtp_alerter_metrics";
pub const MIRAGE_UNIQUE_METRICS: &str = "mirage.unique_metrics";
pub const MIRAGE_EXPIRATION_TIMES_HASH: &str = "mirage.hash_key.metrics_expiration_times";
pub const MIRAGE_RESOLUTIONS_HASH: &str = "mirage.hash_key.metrics_resolutions";
pub const FLUX_ZERO_FILL_METRICS: &str = "analyzer.flux_zero_fill_metrics";
pub const FLUX_ZERO_FILL_MIRROR: &str = "flux.zero_fill_metrics";
pub const LAST_ALL_ALERTS: &str = "analyzer.last_all_alerts";
pub const LIVENESS_GUARD: &str = "analyzer.metrics_manager.last_run_timestamp";
pub const ZERO_FILL_CADENCE_GUARD: &str = "analyzer.manage_flux_zero_fill_namespaces";
pub const LOW_PRIORITY_LAST_ANALYZED: &str = "analyzer.low_priority_metrics.last_analyzed_timestamp";

/// The live metric universe is published under the configured
/// namespace rather than a fixed key, so it's built rather than
/// declared as a constant.
pub fn unique_metrics_key(full_namespace: &str) -> String {
    format!("{full_namespace}unique_metrics")
}
