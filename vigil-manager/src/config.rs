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

use serde::{Deserialize, Serialize};
use vigil_core::AlertRule;

/// Tunables specific to the reconciliation loop, layered on top of
/// `vigil_core::EngineConfig` (which the manager also reads, for
/// `flux_zero_fill_namespaces`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManagerConfig {
    /// Prefix stripped from fully-qualified metric names to recover
    /// their base name, and prepended back on when a mirage metric
    /// needs its fully-qualified form.
    #[serde(default)]
    pub full_namespace: String,

    /// The operator-maintained alert list, used whenever the
    /// externally-sourced list (fetched by the caller, per tick) is
    /// empty.
    #[serde(default)]
    pub static_alerts: Vec<AlertRule>,

    /// The externally-sourced alert list (`EXTERNAL_ALERTS`): merged
    /// on top of `static_alerts` every tick by [`crate::alerts::resolve_alerts`].
    /// This core treats it as configuration rather than fetching it
    /// itself -- whatever process populates it (a sidecar, a
    /// deployment step) is an external collaborator.
    #[serde(default)]
    pub external_alerts: Vec<AlertRule>,

    /// TTL of the overlap guard preventing two ticks from running
    /// concurrently.
    #[serde(default = "default_liveness_ttl_secs")]
    pub liveness_ttl_secs: u64,

    /// TTL of the zero-fill set's own cadence guard.
    #[serde(default = "default_zero_fill_cadence_secs")]
    pub zero_fill_cadence_secs: u64,

    /// Whether low-priority hash cleanup (step 10) runs at all.
    #[serde(default = "default_manage_low_priority_metrics")]
    pub manage_low_priority_metrics: bool,
}

fn default_liveness_ttl_secs() -> u64 {
    120
}

fn default_zero_fill_cadence_secs() -> u64 {
    300
}

fn default_manage_low_priority_metrics() -> bool {
    true
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            full_namespace: String::new(),
            static_alerts: Vec::new(),
            external_alerts: Vec::new(),
            liveness_ttl_secs: default_liveness_ttl_secs(),
            zero_fill_cadence_secs: default_zero_fill_cadence_secs(),
            manage_low_priority_metrics: default_manage_low_priority_metrics(),
        }
    }
}
