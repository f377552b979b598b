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

//! Wires [`vigil_core::second_order::TriggerHistoryStore`] to a
//! [`SharedStore`], persisting each metric's trigger history under
//! `trigger_history.<metric>`.

use vigil_core::second_order::{TriggerEntry, TriggerHistoryStore};

use crate::shared_store::SharedStore;

pub struct StoreTriggerHistory<'a> {
    store: &'a dyn SharedStore,
}

impl<'a> StoreTriggerHistory<'a> {
    pub fn new(store: &'a dyn SharedStore) -> Self {
        Self { store }
    }

    fn key(metric: &str) -> String {
        format!("trigger_history.{metric}")
    }
}

impl<'a> TriggerHistoryStore for StoreTriggerHistory<'a> {
    fn load(&self, metric: &str) -> Option<Vec<TriggerEntry>> {
        let bytes = self.store.get(&Self::key(metric)).ok().flatten()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn save(&self, metric: &str, history: &[TriggerEntry]) {
        if let Ok(bytes) = serde_json::to_vec(history) {
            let _ = self.store.set(&Self::key(metric), bytes);
        }
    }
}
