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

//! Merges the operator's static alert list with an externally-sourced
//! one into the single ordered list the rest of the tick works from.

use vigil_core::AlertRule;

/// Combine `static_alerts` and `external_alerts`, sorted deterministically
/// by pattern so two ticks over an unchanged configuration produce an
/// identical snapshot regardless of iteration order upstream. The
/// externally-sourced list is expected to be the live one; when it's
/// empty and there are static rules to fall back on, the second element
/// of the return value is `true` so the caller can log the config fault
/// once per tick.
pub fn resolve_alerts(
    static_alerts: &[AlertRule],
    external_alerts: &[AlertRule],
) -> (Vec<AlertRule>, bool) {
    let mut all: Vec<AlertRule> = static_alerts
        .iter()
        .cloned()
        .chain(external_alerts.iter().cloned())
        .collect();

    let used_fallback = external_alerts.is_empty() && !static_alerts.is_empty();
    if all.is_empty() {
        all = static_alerts.to_vec();
    }

    all.sort_by(|a, b| a.pattern.cmp(&b.pattern));
    (all, used_fallback)
}

/// A stable serialized form of an alert list, used to detect whether
/// the configuration changed since the last tick.
pub fn snapshot(alerts: &[AlertRule]) -> String {
    serde_json::to_string(alerts).expect("AlertRule serializes without error")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str) -> AlertRule {
        AlertRule::new(pattern, "smtp", 3600, 0)
    }

    #[test]
    fn merges_and_sorts_by_pattern() {
        let (merged, fallback) = resolve_alerts(&[rule("b"), rule("a")], &[rule("c")]);
        let patterns: Vec<&str> = merged.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a", "b", "c"]);
        assert!(!fallback);
    }

    #[test]
    fn empty_external_list_falls_back_to_the_static_list() {
        let (merged, fallback) = resolve_alerts(&[rule("a")], &[]);
        assert_eq!(merged.len(), 1);
        assert!(fallback);
    }

    #[test]
    fn both_lists_empty_is_not_a_fallback() {
        let (merged, fallback) = resolve_alerts(&[], &[]);
        assert!(merged.is_empty());
        assert!(!fallback);
    }

    #[test]
    fn external_only_configuration_never_falls_back() {
        let (merged, fallback) = resolve_alerts(&[], &[rule("x")]);
        assert_eq!(merged.len(), 1);
        assert!(!fallback);
    }

    #[test]
    fn snapshot_is_order_independent_after_resolve() {
        let (a, _) = resolve_alerts(&[rule("b"), rule("a")], &[]);
        let (b, _) = resolve_alerts(&[rule("a"), rule("b")], &[]);
        assert_eq!(snapshot(&a), snapshot(&b));
    }
}
