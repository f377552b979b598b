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

//! Maintains the set of metrics that should be zero-filled between
//! samples, on its own cadence independent of the main reconciliation
//! cadence -- matching namespaces is cheap but the set is large enough
//! that publishing it every tick would be wasted work.

use std::collections::HashSet;
use std::time::Duration;

use regex::Regex;
use vigil_store::{SharedStore, StoreResult};

use crate::keys;
use crate::publish::publish_set;

/// If the cadence guard is held by another run, do nothing and return
/// `false`. Otherwise recompute the zero-fill set from `base_names`
/// against `patterns`, publish it to both the canonical key and its
/// mirror, and return `true`.
pub fn maintain(
    store: &dyn SharedStore,
    base_names: &HashSet<String>,
    patterns: &[Regex],
    cadence: Duration,
) -> StoreResult<bool> {
    if !store.acquire_guard(keys::ZERO_FILL_CADENCE_GUARD, cadence)? {
        return Ok(false);
    }

    let matched: HashSet<String> = base_names
        .iter()
        .filter(|name| patterns.iter().any(|p| p.is_match(name)))
        .cloned()
        .collect();

    publish_set(store, keys::FLUX_ZERO_FILL_METRICS, &matched)?;
    publish_set(store, keys::FLUX_ZERO_FILL_MIRROR, &matched)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use vigil_core::compile_pattern;
    use vigil_store::InMemoryStore;

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_configured_namespace_patterns() {
        let store = InMemoryStore::new();
        let patterns = vec![compile_pattern(r"^stats\.disk\..*$").unwrap()];
        let bases = names(&["stats.disk.used", "stats.cpu.used"]);

        let ran = maintain(&store, &bases, &patterns, Duration::from_secs(300)).unwrap();
        assert!(ran);

        let members = store.smembers(keys::FLUX_ZERO_FILL_METRICS).unwrap();
        assert!(members.contains("stats.disk.used"));
        assert!(!members.contains("stats.cpu.used"));
        assert_eq!(
            store.smembers(keys::FLUX_ZERO_FILL_MIRROR).unwrap(),
            members
        );
    }

    #[test]
    fn second_call_within_cadence_is_skipped() {
        let store = InMemoryStore::new();
        let patterns = vec![compile_pattern("stats.disk.used").unwrap()];
        let bases = names(&["stats.disk.used"]);

        assert!(maintain(&store, &bases, &patterns, Duration::from_secs(300)).unwrap());
        assert!(!maintain(&store, &bases, &patterns, Duration::from_secs(300)).unwrap());
    }

    #[test]
    fn no_patterns_means_an_empty_zero_fill_set() {
        let store = InMemoryStore::new();
        let bases = names(&["stats.disk.used"]);
        assert!(maintain(&store, &bases, &[], Duration::from_secs(300)).unwrap());
        assert!(store
            .smembers(keys::FLUX_ZERO_FILL_METRICS)
            .unwrap()
            .is_empty());
    }
}
