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

//! Vigil Core
//!
//! The pure, deterministic heart of the anomaly-detection engine: the
//! time-series view, the detector battery, the consensus evaluator,
//! the second-order trigger-history filter, the sample codec, and the
//! alert-rule model. No network I/O and no filesystem I/O lives here
//! -- those seams are traits (`RunMetricsSink`, `TriggerHistoryStore`)
//! implemented by `vigil-store`.

pub mod alert_rule;
pub mod codec;
pub mod config;
pub mod detectors;
pub mod ensemble;
pub mod error;
pub mod second_order;
pub mod stats;
pub mod timeseries;

pub use alert_rule::{compile_all, compile_pattern, AlertRule, CompiledAlertRule};
pub use config::EngineConfig;
pub use detectors::DetectorVote;
pub use ensemble::{EnsembleResult, NamedVote, NullRunMetricsSink, RunMetricsSink};
pub use error::{CoreError, CoreResult, PreFilterReject};
pub use second_order::{HistoryGated, PassThrough, SecondOrderFilter, TriggerHistoryStore};
pub use timeseries::{OwnedTimeSeries, Sample, TimeSeries};
