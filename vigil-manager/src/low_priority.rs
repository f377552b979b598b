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

//! Drops stale bookkeeping for metrics that left the live universe --
//! without this, the low-priority last-analyzed hash grows without
//! bound as metrics come and go over a long-running deployment.

use std::collections::HashSet;

use vigil_store::{SharedStore, StoreResult};

use crate::keys;

/// Remove every field of the low-priority last-analyzed hash whose
/// metric name is no longer in `live_universe`. Returns the number of
/// fields removed.
pub fn cleanup(store: &dyn SharedStore, live_universe: &HashSet<String>) -> StoreResult<usize> {
    let stored = store.hgetall(keys::LOW_PRIORITY_LAST_ANALYZED)?;
    let mut removed = 0;

    for field in stored.keys() {
        if !live_universe.contains(field) {
            store.hdel(keys::LOW_PRIORITY_LAST_ANALYZED, field)?;
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_store::InMemoryStore;

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn removes_only_fields_absent_from_the_live_universe() {
        let store = InMemoryStore::new();
        store
            .hset(keys::LOW_PRIORITY_LAST_ANALYZED, "stats.disk.used", "100")
            .unwrap();
        store
            .hset(keys::LOW_PRIORITY_LAST_ANALYZED, "stats.gone.metric", "50")
            .unwrap();

        let removed = cleanup(&store, &names(&["stats.disk.used"])).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(
            store
                .hget(keys::LOW_PRIORITY_LAST_ANALYZED, "stats.disk.used")
                .unwrap(),
            Some("100".to_string())
        );
        assert_eq!(
            store
                .hget(keys::LOW_PRIORITY_LAST_ANALYZED, "stats.gone.metric")
                .unwrap(),
            None
        );
    }

    #[test]
    fn empty_hash_is_a_no_op() {
        let store = InMemoryStore::new();
        assert_eq!(cleanup(&store, &names(&["a"])).unwrap(), 0);
    }
}
