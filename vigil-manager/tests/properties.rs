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

//! Universal properties of a manager tick: the SMTP/non-SMTP
//! partition invariant and idempotence of a second tick over an
//! unchanged universe and alert configuration, checked against
//! randomly generated base-name universes rather than hand-picked
//! examples.

use proptest::prelude::*;

use vigil_core::{AlertRule, EngineConfig};
use vigil_manager::{tick, ManagerConfig};
use vigil_store::{InMemoryStore, SharedStore};

fn base_name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{3,8}\\.[a-z]{3,8}\\.[a-z]{3,8}"
}

fn seed_universe(store: &InMemoryStore, names: &[String]) {
    for name in names {
        store.sadd("unique_metrics", name).unwrap();
    }
}

proptest! {
    /// Partition invariant (§8): after every successful tick,
    /// `smtp_alerter_metrics` and `non_smtp_alerter_metrics` are
    /// disjoint and their union is exactly the live base-name set,
    /// regardless of which (if any) base-names an `smtp` rule
    /// happens to match.
    #[test]
    fn smtp_and_non_smtp_partition_the_universe(
        names in prop::collection::hash_set(base_name_strategy(), 1..20),
        smtp_index in 0usize..20,
    ) {
        let store = InMemoryStore::new();
        let names: Vec<String> = names.into_iter().collect();
        seed_universe(&store, &names);

        let alerts = vec![AlertRule::new(
            names[smtp_index % names.len()].clone(),
            "smtp",
            3600,
            0,
        )];

        let cfg = ManagerConfig::default();
        let engine_cfg = EngineConfig::default();
        let report = tick(&store, &cfg, &engine_cfg, &alerts).unwrap();

        if report.outcome != vigil_manager::TickOutcome::EmptyUniverse {
            let smtp = store.smembers("analyzer.smtp_alerter_metrics").unwrap();
            let non_smtp = store.smembers("analyzer.non_smtp_alerter_metrics").unwrap();

            prop_assert!(smtp.is_disjoint(&non_smtp));
            let union: std::collections::HashSet<String> =
                smtp.union(&non_smtp).cloned().collect();
            let expected: std::collections::HashSet<String> = names.into_iter().collect();
            prop_assert_eq!(union, expected);
        }
    }

    /// Manager idempotence (§8): running the tick twice back-to-back
    /// with no universe or config change leaves the routing sets
    /// byte-identical (the second tick is a no-op rebuild).
    #[test]
    fn repeated_tick_over_unchanged_state_is_idempotent(
        names in prop::collection::hash_set(base_name_strategy(), 1..20),
    ) {
        let store = InMemoryStore::new();
        let names: Vec<String> = names.into_iter().collect();
        seed_universe(&store, &names);

        let alerts = vec![AlertRule::new(names[0].clone(), "smtp", 3600, 0)];
        let cfg = ManagerConfig { liveness_ttl_secs: 0, ..ManagerConfig::default() };
        let engine_cfg = EngineConfig::default();

        tick(&store, &cfg, &engine_cfg, &alerts).unwrap();
        let smtp_after_first = store.smembers("analyzer.smtp_alerter_metrics").unwrap();
        let non_smtp_after_first = store.smembers("analyzer.non_smtp_alerter_metrics").unwrap();

        let second = tick(&store, &cfg, &engine_cfg, &alerts).unwrap();
        let smtp_after_second = store.smembers("analyzer.smtp_alerter_metrics").unwrap();
        let non_smtp_after_second = store.smembers("analyzer.non_smtp_alerter_metrics").unwrap();

        prop_assert_eq!(second.outcome, vigil_manager::TickOutcome::NoChange);
        prop_assert_eq!(smtp_after_first, smtp_after_second);
        prop_assert_eq!(non_smtp_after_first, non_smtp_after_second);
    }
}
