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

//! Vigil Manager
//!
//! The periodic reconciliation loop: rebuilds routing sets
//! (`smtp_alerter_metrics`, `non_smtp_alerter_metrics`,
//! `mirage.unique_metrics`), the expiration/resolution hashes, and the
//! zero-fill set from the live metric universe and the alert
//! configuration, using set differencing to minimize churn. Runs on
//! its own cadence, independent of the detector workers driven from
//! `vigil-cli`.

pub mod alerts;
pub mod classify;
pub mod config;
pub mod error;
pub mod keys;
pub mod low_priority;
pub mod publish;
pub mod reconcile;
pub mod tick;
pub mod universe;
pub mod zero_fill;

pub use config::ManagerConfig;
pub use error::{ManagerError, ManagerResult};
pub use tick::{tick, TickOutcome, TickReport};
