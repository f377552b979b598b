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

//! Projects the live universe of fully-qualified metric names onto
//! their base names by stripping the configured namespace prefix.

use std::collections::HashSet;

pub fn base_names(full_names: &HashSet<String>, full_namespace: &str) -> HashSet<String> {
    full_names
        .iter()
        .map(|name| strip_namespace(name, full_namespace))
        .collect()
}

pub fn strip_namespace(full_name: &str, full_namespace: &str) -> String {
    if full_namespace.is_empty() {
        return full_name.to_string();
    }
    full_name
        .strip_prefix(full_namespace)
        .map(str::to_string)
        .unwrap_or_else(|| full_name.to_string())
}

pub fn qualify(base_name: &str, full_namespace: &str) -> String {
    format!("{full_namespace}{base_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_configured_prefix() {
        assert_eq!(
            strip_namespace("metrics.stats.disk.used", "metrics."),
            "stats.disk.used"
        );
    }

    #[test]
    fn leaves_names_without_the_prefix_unchanged() {
        assert_eq!(strip_namespace("stats.disk.used", "metrics."), "stats.disk.used");
    }

    #[test]
    fn qualify_is_the_inverse_of_strip() {
        let full_namespace = "metrics.";
        let base = strip_namespace("metrics.stats.disk.used", full_namespace);
        assert_eq!(qualify(&base, full_namespace), "metrics.stats.disk.used");
    }

    #[test]
    fn base_names_projects_a_whole_set() {
        let full: HashSet<String> = ["metrics.a", "metrics.b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let bases = base_names(&full, "metrics.");
        assert!(bases.contains("a"));
        assert!(bases.contains("b"));
    }
}
