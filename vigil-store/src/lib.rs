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

//! Vigil Store
//!
//! The shared mutable resource behind the engine: routing sets,
//! expiration/resolution hashes, trigger histories, and the liveness
//! guard, plus the filesystem-based observability sink the hot
//! detector path writes into instead of logging directly.

pub mod error;
pub mod observability;
pub mod shared_store;
pub mod trigger_history;

pub use error::{StoreError, StoreResult, StoreValueKind};
pub use observability::{drain, DrainReport, FileRunMetricsSink};
pub use shared_store::{InMemoryStore, SharedStore};
pub use trigger_history::StoreTriggerHistory;
