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

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use vigil_core::EngineConfig;
use vigil_manager::ManagerConfig;

/// Top-level configuration for the `vigil` binary: the engine's
/// detector tunables, the reconciliation loop's tunables, and the
/// scheduling knobs that are specific to running both as one process.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulingConfig {
    /// Process-identifying prefix for the observability filesystem
    /// surface and for `FileRunMetricsSink`.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Directory the count/timings/error files are written to and
    /// drained from.
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,

    /// Worker pool size. One per CPU core is sufficient per the
    /// scheduling model; left configurable for smaller deployments.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// How often the worker pool sweeps the live universe.
    #[serde(default = "default_worker_sweep_secs")]
    pub worker_sweep_secs: u64,

    /// Per-metric wall-clock bound. A worker that exceeds this is
    /// abandoned; its partial state is discarded.
    #[serde(default = "default_worker_timeout_ms")]
    pub worker_timeout_ms: u64,

    /// Manager tick cadence -- "once per minute" per the scheduling model.
    #[serde(default = "default_manager_interval_secs")]
    pub manager_interval_secs: u64,

    /// Manager per-tick wall-clock bound.
    #[serde(default = "default_manager_timeout_secs")]
    pub manager_timeout_secs: u64,
}

fn default_app_name() -> String {
    "vigil".to_string()
}

fn default_tmp_dir() -> PathBuf {
    PathBuf::from("/tmp/vigil")
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_worker_sweep_secs() -> u64 {
    60
}

fn default_worker_timeout_ms() -> u64 {
    5_000
}

fn default_manager_interval_secs() -> u64 {
    60
}

fn default_manager_timeout_secs() -> u64 {
    300
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            tmp_dir: default_tmp_dir(),
            worker_count: default_worker_count(),
            worker_sweep_secs: default_worker_sweep_secs(),
            worker_timeout_ms: default_worker_timeout_ms(),
            manager_interval_secs: default_manager_interval_secs(),
            manager_timeout_secs: default_manager_timeout_secs(),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            manager: ManagerConfig::default(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Environment overrides, applied after the file (or defaults) so
    /// `VIGIL_*` variables always win -- matching §6's "Configuration
    /// surface" precedence of file then env then CLI flags.
    fn apply_env(mut self) -> Self {
        if let Ok(v) = std::env::var("VIGIL_APP_NAME") {
            self.scheduling.app_name = v;
        }
        if let Ok(v) = std::env::var("VIGIL_TMP_DIR") {
            self.scheduling.tmp_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("VIGIL_WORKER_COUNT") {
            if let Ok(n) = v.parse() {
                self.scheduling.worker_count = n;
            }
        }
        if let Ok(v) = std::env::var("FULL_DURATION") {
            if let Ok(n) = v.parse() {
                self.engine.full_duration = n;
            }
        }
        if let Ok(v) = std::env::var("STALE_PERIOD") {
            if let Ok(n) = v.parse() {
                self.engine.stale_period = n;
            }
        }
        if let Ok(v) = std::env::var("CONSENSUS") {
            if let Ok(n) = v.parse() {
                self.engine.consensus = n;
            }
        }
        if let Ok(v) = std::env::var("ENABLE_SECOND_ORDER") {
            self.engine.enable_second_order = v.parse().unwrap_or(self.engine.enable_second_order);
        }
        if let Ok(v) = std::env::var("RUN_OPTIMIZED_WORKFLOW") {
            self.engine.run_optimized_workflow =
                v.parse().unwrap_or(self.engine.run_optimized_workflow);
        }
        if let Ok(v) = std::env::var("ALERT_ON_STALE_METRICS") {
            self.engine.alert_on_stale_metrics =
                v.parse().unwrap_or(self.engine.alert_on_stale_metrics);
        }
        self
    }

    /// Load with priority file > env > defaults, matching
    /// `ServerConfig::load`'s layering.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let config = match config_file {
            Some(path) if path.exists() => {
                tracing::info!("loading configuration from {path:?}");
                Self::from_file(&path)?
            }
            Some(path) => {
                tracing::warn!("config file {path:?} not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        Ok(config.apply_env())
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.consensus == 0 {
            anyhow::bail!("consensus must be at least 1");
        }
        if self.engine.consensus > self.engine.algorithms.len() && !self.engine.algorithms.is_empty()
        {
            anyhow::bail!(
                "consensus ({}) exceeds the number of configured algorithms ({})",
                self.engine.consensus,
                self.engine.algorithms.len()
            );
        }
        if self.scheduling.worker_count == 0 {
            anyhow::bail!("worker_count must be at least 1");
        }
        std::fs::create_dir_all(&self.scheduling.tmp_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_produce_a_valid_config() {
        let mut cfg = CliConfig::default();
        cfg.engine.algorithms = vec!["grubbs".to_string()];
        cfg.engine.consensus = 1;
        cfg.scheduling.tmp_dir = std::env::temp_dir().join("vigil-config-test");
        cfg.validate().unwrap();
    }

    #[test]
    fn consensus_above_algorithm_count_is_rejected() {
        let mut cfg = CliConfig::default();
        cfg.engine.algorithms = vec!["grubbs".to_string()];
        cfg.engine.consensus = 5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_override_wins_over_file_defaults() {
        std::env::set_var("VIGIL_APP_NAME", "vigil-test-app");
        let cfg = CliConfig::load(None).unwrap();
        assert_eq!(cfg.scheduling.app_name, "vigil-test-app");
        std::env::remove_var("VIGIL_APP_NAME");
    }
}
