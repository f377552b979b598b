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

//! Reconciles the expiration-times and resolutions hashes against the
//! current classification by diffing against what's already stored,
//! touching only the fields that actually changed.

use std::collections::HashMap;

use vigil_store::{SharedStore, StoreResult};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.updated == 0
    }
}

/// Bring `hash_key` in line with `current`: fields present in `current`
/// but not in the stored hash are added, fields present in the stored
/// hash but not in `current` are removed, and fields present in both
/// with a different value are updated. Fields whose value is unchanged
/// are left untouched.
pub fn reconcile_hash(
    store: &dyn SharedStore,
    hash_key: &str,
    current: &HashMap<String, i64>,
) -> StoreResult<ReconcileReport> {
    let stored = store.hgetall(hash_key)?;
    let mut report = ReconcileReport::default();

    for (field, value) in current {
        let value_str = value.to_string();
        match stored.get(field) {
            None => {
                store.hset(hash_key, field, &value_str)?;
                report.added += 1;
            }
            Some(existing) if existing != &value_str => {
                store.hset(hash_key, field, &value_str)?;
                report.updated += 1;
            }
            Some(_) => {}
        }
    }

    for field in stored.keys() {
        if !current.contains_key(field) {
            store.hdel(hash_key, field)?;
            report.removed += 1;
        }
    }

    Ok(report)
}
