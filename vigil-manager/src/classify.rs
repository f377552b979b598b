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

//! Classifies base-names against the resolved alert list, producing
//! the routing sets and expiration/resolution hashes in one pass.

use std::collections::{HashMap, HashSet};

use vigil_core::CompiledAlertRule;

use crate::universe::qualify;

pub struct Classification {
    pub smtp: HashSet<String>,
    pub non_smtp: HashSet<String>,
    /// Fully-qualified names requiring extended-window analysis.
    pub mirage: HashSet<String>,
    pub expiration_times: HashMap<String, i64>,
    pub resolutions: HashMap<String, i64>,
}

/// For each base-name, scan `rules` in order; the first `smtp`-channel
/// rule that matches wins. If that rule is also a mirage rule
/// (`second_order_hours > 24`), the metric additionally joins `mirage`
/// and contributes its expiration/resolution entries.
pub fn classify(
    base_names: &HashSet<String>,
    rules: &[CompiledAlertRule],
    full_namespace: &str,
) -> Classification {
    let mut smtp = HashSet::new();
    let mut mirage = HashSet::new();
    let mut expiration_times = HashMap::new();
    let mut resolutions = HashMap::new();

    for base_name in base_names {
        for compiled in rules {
            let rule = compiled.rule();
            if !rule.is_smtp() || !compiled.matches(base_name) {
                continue;
            }

            smtp.insert(base_name.clone());

            if rule.is_mirage() {
                mirage.insert(qualify(base_name, full_namespace));
                expiration_times.insert(base_name.clone(), rule.expiration_seconds);
                resolutions.insert(base_name.clone(), rule.second_order_hours);
            }
            break;
        }
    }

    let non_smtp = base_names.difference(&smtp).cloned().collect();

    Classification {
        smtp,
        non_smtp,
        mirage,
        expiration_times,
        resolutions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{compile_all, AlertRule};

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn smtp_and_non_smtp_partition_the_base_names() {
        let rules = compile_all(&[AlertRule::new("stats.disk.used", "smtp", 3600, 0)]).unwrap();
        let bases = names(&["stats.disk.used", "stats.cpu.used"]);
        let c = classify(&bases, &rules, "metrics.");

        assert!(c.smtp.contains("stats.disk.used"));
        assert!(c.non_smtp.contains("stats.cpu.used"));
        assert!(c.smtp.is_disjoint(&c.non_smtp));
        assert_eq!(
            c.smtp.union(&c.non_smtp).cloned().collect::<HashSet<_>>(),
            bases
        );
    }

    #[test]
    fn mirage_rule_populates_hashes_and_fully_qualified_set() {
        let rules = compile_all(&[AlertRule::new("stats.disk.used", "smtp", 7200, 48)]).unwrap();
        let bases = names(&["stats.disk.used"]);
        let c = classify(&bases, &rules, "metrics.");

        assert!(c.mirage.contains("metrics.stats.disk.used"));
        assert_eq!(c.expiration_times.get("stats.disk.used"), Some(&7200));
        assert_eq!(c.resolutions.get("stats.disk.used"), Some(&48));
    }

    #[test]
    fn non_smtp_rule_does_not_affect_classification() {
        let rules = compile_all(&[AlertRule::new("stats.disk.used", "pagerduty", 3600, 48)]).unwrap();
        let bases = names(&["stats.disk.used"]);
        let c = classify(&bases, &rules, "metrics.");

        assert!(c.non_smtp.contains("stats.disk.used"));
        assert!(c.mirage.is_empty());
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = compile_all(&[
            AlertRule::new("stats.disk.used", "smtp", 3600, 0),
            AlertRule::new("stats.disk.used", "smtp", 7200, 48),
        ])
        .unwrap();
        let bases = names(&["stats.disk.used"]);
        let c = classify(&bases, &rules, "metrics.");

        assert_eq!(c.expiration_times.get("stats.disk.used"), None);
        assert!(c.mirage.is_empty());
    }
}
