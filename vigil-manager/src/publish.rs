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

//! Staged publish of a rebuilt routing set. A detector worker reading
//! `canonical` mid-rebuild must always see either the old complete
//! set or the new complete set, never a partial one -- so the rebuild
//! happens under a `new_*` staging key and is swapped in via two
//! renames rather than member-by-member mutation of `canonical`.

use std::collections::HashSet;

use vigil_store::{SharedStore, StoreResult};

/// Rebuild `canonical` to contain exactly `members`, via:
/// stage into `new_<canonical>`, drop any stale `<canonical>.old`,
/// rotate `canonical` -> `<canonical>.old`, then
/// `new_<canonical>` -> `canonical`. If `canonical` doesn't exist yet
/// (first run), the rotation step is skipped.
pub fn publish_set(
    store: &dyn SharedStore,
    canonical: &str,
    members: &HashSet<String>,
) -> StoreResult<()> {
    let staging = format!("new_{canonical}");
    let old = format!("{canonical}.old");

    store.sclear(&staging)?;
    for member in members {
        store.sadd(&staging, member)?;
    }

    store.delete(&old)?;
    if store.exists(canonical) {
        store.rename(canonical, &old)?;
    }
    store.rename(&staging, canonical)?;

    Ok(())
}

/// Replace `dest` with the union of `sources`, returning its new size.
/// Used to mirror the manager's routing sets onto the `aet.analyzer.*`
/// keys the alerting workers actually watch.
pub fn cross_publish(store: &dyn SharedStore, dest: &str, sources: &[&str]) -> StoreResult<usize> {
    store.sunionstore(dest, sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_store::InMemoryStore;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_publish_with_no_prior_canonical_key() {
        let store = InMemoryStore::new();
        publish_set(&store, "routing", &set(&["a", "b"])).unwrap();
        let members = store.smembers("routing").unwrap();
        assert_eq!(members, set(&["a", "b"]));
        assert!(!store.exists("new_routing"));
    }

    #[test]
    fn republish_replaces_membership_and_rotates_old() {
        let store = InMemoryStore::new();
        publish_set(&store, "routing", &set(&["a"])).unwrap();
        publish_set(&store, "routing", &set(&["b", "c"])).unwrap();

        assert_eq!(store.smembers("routing").unwrap(), set(&["b", "c"]));
        assert_eq!(store.smembers("routing.old").unwrap(), set(&["a"]));
        assert!(!store.exists("new_routing"));
    }

    #[test]
    fn republish_with_empty_members_produces_empty_canonical_set() {
        let store = InMemoryStore::new();
        publish_set(&store, "routing", &set(&["a"])).unwrap();
        publish_set(&store, "routing", &HashSet::new()).unwrap();

        assert!(store.smembers("routing").unwrap().is_empty());
        assert!(store.exists("routing"));
    }

    #[test]
    fn cross_publish_unions_sources_into_dest() {
        let store = InMemoryStore::new();
        store.sadd("a", "x").unwrap();
        store.sadd("b", "y").unwrap();
        let n = cross_publish(&store, "dest", &["a", "b"]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.smembers("dest").unwrap(), set(&["x", "y"]));
    }
}
