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

//! `AlertRule`: a routing rule the metrics manager
//! matches base-names against. Lives in `vigil-core` (rather than
//! `vigil-manager`) because it's pure data plus a pure match
//! function, with no dependency on the shared store.

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A metric base-name matches an `AlertRule` either literally or via
/// a regular expression: a pattern containing regex metacharacters is
/// compiled and matched as a regex; anything else is compared
/// literally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub pattern: String,
    pub channel: String,
    pub expiration_seconds: i64,
    pub second_order_hours: i64,
}

impl AlertRule {
    pub fn new(
        pattern: impl Into<String>,
        channel: impl Into<String>,
        expiration_seconds: i64,
        second_order_hours: i64,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            channel: channel.into(),
            expiration_seconds,
            second_order_hours,
        }
    }

    /// A metric routed through this rule requires the extended-window
    /// ("mirage") analyzer.
    pub fn is_mirage(&self) -> bool {
        self.second_order_hours > 24
    }

    pub fn is_smtp(&self) -> bool {
        self.channel == "smtp"
    }

    /// Compile this rule's pattern into a matcher. Literal patterns
    /// (no regex metacharacters) still round-trip through `Regex` so
    /// callers have one matching code path; `CoreError::InvalidPattern`
    /// surfaces a malformed regex pattern at config-load time rather
    /// than at match time.
    pub fn compile(&self) -> CoreResult<CompiledAlertRule> {
        let re = compile_pattern(&self.pattern)?;
        Ok(CompiledAlertRule {
            rule: self.clone(),
            regex: re,
        })
    }
}

/// The literal-or-regex heuristic shared by `AlertRule::compile` and
/// the manager's `FLUX_ZERO_FILL_NAMESPACES` matching: a pattern
/// containing regex metacharacters *other than* `.` is compiled as an
/// unanchored regex (dots are excluded from the check since metric
/// base-names are dot-namespaced, e.g. `stats.disk.used`, and would
/// otherwise almost never be recognized as literal); anything else is
/// matched literally, anchored so a shorter base-name can't match as a
/// prefix/substring of a longer one.
pub fn compile_pattern(pattern: &str) -> CoreResult<Regex> {
    let looks_like_regex = pattern.chars().any(|c| "\\^$|?*+()[]{}".contains(c));
    let anchored = if looks_like_regex {
        pattern.to_string()
    } else {
        format!("^{}$", regex::escape(pattern))
    };
    Regex::new(&anchored).map_err(|e| CoreError::InvalidPattern(format!("{pattern}: {e}")))
}

/// An `AlertRule` with its pattern pre-compiled, returned by
/// [`AlertRule::compile`]. Kept a separate type so the manager can
/// compile the alert list once per tick rather than once per
/// base-name.
pub struct CompiledAlertRule {
    rule: AlertRule,
    regex: Regex,
}

impl CompiledAlertRule {
    pub fn matches(&self, base_name: &str) -> bool {
        self.regex.is_match(base_name)
    }

    pub fn rule(&self) -> &AlertRule {
        &self.rule
    }
}

/// Compile an ordered list of rules, short-circuiting on the first
/// invalid pattern.
pub fn compile_all(rules: &[AlertRule]) -> CoreResult<Vec<CompiledAlertRule>> {
    rules.iter().map(AlertRule::compile).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_exact_base_name_only() {
        let rule = AlertRule::new("stats.disk.used", "smtp", 3600, 0);
        let compiled = rule.compile().unwrap();
        assert!(compiled.matches("stats.disk.used"));
        assert!(!compiled.matches("stats.disk.used.extra"));
    }

    #[test]
    fn regex_pattern_matches_family() {
        let rule = AlertRule::new(r"^stats\.disk\..*$", "smtp", 3600, 0);
        let compiled = rule.compile().unwrap();
        assert!(compiled.matches("stats.disk.used"));
        assert!(compiled.matches("stats.disk.free"));
        assert!(!compiled.matches("stats.cpu.used"));
    }

    #[test]
    fn mirage_threshold_is_strictly_greater_than_24() {
        assert!(!AlertRule::new("x", "smtp", 0, 24).is_mirage());
        assert!(AlertRule::new("x", "smtp", 0, 25).is_mirage());
    }
}
