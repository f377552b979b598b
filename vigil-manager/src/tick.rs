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

//! The per-tick state machine: liveness guard, universe load, alert
//! resolution, change detection, classification, staged publish, hash
//! reconciliation, zero-fill maintenance, and low-priority cleanup, in
//! that order. Each stage logs and moves on rather than aborting the
//! whole tick, except where a later stage has nothing to work from
//! without an earlier one (an empty universe, a held liveness guard).

use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use vigil_core::{compile_all, AlertRule, EngineConfig};
use vigil_store::SharedStore;

use crate::alerts::{resolve_alerts, snapshot};
use crate::classify::classify;
use crate::config::ManagerConfig;
use crate::error::{ManagerError, ManagerResult};
use crate::keys;
use crate::low_priority;
use crate::publish::{cross_publish, publish_set};
use crate::reconcile::reconcile_hash;
use crate::universe::base_names;
use crate::zero_fill;

/// What a tick actually did, for the caller's logging/metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick already holds the liveness guard.
    Skipped,
    /// The universe set was empty; nothing to reconcile against.
    EmptyUniverse,
    /// The universe and alert configuration are unchanged since the
    /// last tick; routing sets were left alone.
    NoChange,
    /// Routing sets were rebuilt and republished.
    Rebuilt,
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub smtp_count: usize,
    pub non_smtp_count: usize,
    pub mirage_count: usize,
    pub expiration_added: usize,
    pub expiration_removed: usize,
    pub expiration_updated: usize,
    pub resolutions_added: usize,
    pub resolutions_removed: usize,
    pub resolutions_updated: usize,
    pub zero_fill_ran: bool,
    pub low_priority_cleaned: usize,
}

impl TickReport {
    fn skipped(outcome: TickOutcome) -> Self {
        Self {
            outcome,
            smtp_count: 0,
            non_smtp_count: 0,
            mirage_count: 0,
            expiration_added: 0,
            expiration_removed: 0,
            expiration_updated: 0,
            resolutions_added: 0,
            resolutions_removed: 0,
            resolutions_updated: 0,
            zero_fill_ran: false,
            low_priority_cleaned: 0,
        }
    }
}

/// Run one reconciliation tick against `store`. `external_alerts` is
/// whatever alert source the caller fetched this tick (an HTTP
/// endpoint, a config file, or empty if none is configured); it's
/// merged with `cfg.static_alerts` by [`resolve_alerts`].
pub fn tick(
    store: &dyn SharedStore,
    cfg: &ManagerConfig,
    engine_cfg: &EngineConfig,
    external_alerts: &[AlertRule],
) -> ManagerResult<TickReport> {
    let liveness_ttl = Duration::from_secs(cfg.liveness_ttl_secs);
    if !store.acquire_guard(keys::LIVENESS_GUARD, liveness_ttl)? {
        info!("metrics manager: liveness guard held by another run, skipping tick");
        return Ok(TickReport::skipped(TickOutcome::Skipped));
    }

    let universe_key = keys::unique_metrics_key(&cfg.full_namespace);
    let full_names = store.smembers(&universe_key)?;
    if full_names.is_empty() {
        warn!("metrics manager: {universe_key} is empty, skipping tick");
        return Ok(TickReport::skipped(TickOutcome::EmptyUniverse));
    }
    let bases = base_names(&full_names, &cfg.full_namespace);

    let (alerts, fallback_used) = resolve_alerts(&cfg.static_alerts, external_alerts);
    if fallback_used {
        warn!("metrics manager: externally-sourced alert list empty, falling back to static list");
    }

    if !rebuild_is_needed(store, &bases, &alerts)? {
        info!("metrics manager: universe and alert configuration unchanged, skipping rebuild");
        maintain_zero_fill_and_low_priority(store, cfg, engine_cfg, &bases, TickOutcome::NoChange)
    } else {
        let rules = compile_all(&alerts).map_err(ManagerError::Config)?;
        let classification = classify(&bases, &rules, &cfg.full_namespace);

        publish_set(store, keys::ANALYZER_SMTP_ALERTER_METRICS, &classification.smtp)?;
        publish_set(
            store,
            keys::ANALYZER_NON_SMTP_ALERTER_METRICS,
            &classification.non_smtp,
        )?;
        publish_set(store, keys::MIRAGE_UNIQUE_METRICS, &classification.mirage)?;

        cross_publish(
            store,
            keys::AET_SMTP_ALERTER_METRICS,
            &[keys::ANALYZER_SMTP_ALERTER_METRICS],
        )?;
        cross_publish(
            store,
            keys::AET_NON_SMTP_ALERTER_METRICS,
            &[keys::ANALYZER_NON_SMTP_ALERTER_METRICS],
        )?;

        store.set(keys::LAST_ALL_ALERTS, snapshot(&alerts).into_bytes())?;

        let expiration_report = reconcile_hash(
            store,
            keys::MIRAGE_EXPIRATION_TIMES_HASH,
            &classification.expiration_times,
        )?;
        let resolutions_report =
            reconcile_hash(store, keys::MIRAGE_RESOLUTIONS_HASH, &classification.resolutions)?;

        info!(
            smtp = classification.smtp.len(),
            non_smtp = classification.non_smtp.len(),
            mirage = classification.mirage.len(),
            "metrics manager: routing sets rebuilt"
        );

        let mut report = maintain_zero_fill_and_low_priority(
            store,
            cfg,
            engine_cfg,
            &bases,
            TickOutcome::Rebuilt,
        )?;
        report.smtp_count = classification.smtp.len();
        report.non_smtp_count = classification.non_smtp.len();
        report.mirage_count = classification.mirage.len();
        report.expiration_added = expiration_report.added;
        report.expiration_removed = expiration_report.removed;
        report.expiration_updated = expiration_report.updated;
        report.resolutions_added = resolutions_report.added;
        report.resolutions_removed = resolutions_report.removed;
        report.resolutions_updated = resolutions_report.updated;
        Ok(report)
    }
}

fn maintain_zero_fill_and_low_priority(
    store: &dyn SharedStore,
    cfg: &ManagerConfig,
    engine_cfg: &EngineConfig,
    bases: &HashSet<String>,
    outcome: TickOutcome,
) -> ManagerResult<TickReport> {
    let patterns: Vec<regex::Regex> = engine_cfg
        .flux_zero_fill_namespaces
        .iter()
        .filter_map(|p| match vigil_core::compile_pattern(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("metrics manager: dropping invalid zero-fill pattern {p:?}: {e}");
                None
            }
        })
        .collect();

    let zero_fill_ran = zero_fill::maintain(
        store,
        bases,
        &patterns,
        Duration::from_secs(cfg.zero_fill_cadence_secs),
    )?;

    let low_priority_cleaned = if cfg.manage_low_priority_metrics {
        low_priority::cleanup(store, bases)?
    } else {
        0
    };

    let mut report = TickReport::skipped(outcome);
    report.zero_fill_ran = zero_fill_ran;
    report.low_priority_cleaned = low_priority_cleaned;
    Ok(report)
}

/// A rebuild is needed whenever the live base-name set has drifted
/// from the last published union of routing sets, or the alert
/// configuration itself changed since the last tick.
fn rebuild_is_needed(
    store: &dyn SharedStore,
    bases: &HashSet<String>,
    alerts: &[AlertRule],
) -> ManagerResult<bool> {
    let last_smtp = store.smembers(keys::ANALYZER_SMTP_ALERTER_METRICS)?;
    let last_non_smtp = store.smembers(keys::ANALYZER_NON_SMTP_ALERTER_METRICS)?;
    let known: HashSet<String> = last_smtp.union(&last_non_smtp).cloned().collect();

    if &known != bases {
        return Ok(true);
    }

    let last_snapshot = store
        .get(keys::LAST_ALL_ALERTS)?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    let current_snapshot = snapshot(alerts);
    Ok(last_snapshot.as_deref() != Some(current_snapshot.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_store::InMemoryStore;

    fn seed_universe(store: &InMemoryStore, names: &[&str]) {
        for name in names {
            store.sadd("unique_metrics", name).unwrap();
        }
    }

    #[test]
    fn empty_universe_is_reported_and_nothing_is_published() {
        let store = InMemoryStore::new();
        let cfg = ManagerConfig::default();
        let engine_cfg = EngineConfig::default();
        let report = tick(&store, &cfg, &engine_cfg, &[]).unwrap();
        assert_eq!(report.outcome, TickOutcome::EmptyUniverse);
    }

    #[test]
    fn first_tick_rebuilds_routing_sets_from_scratch() {
        let store = InMemoryStore::new();
        seed_universe(&store, &["stats.disk.used", "stats.cpu.used"]);
        let cfg = ManagerConfig::default();
        let engine_cfg = EngineConfig::default();
        let alerts = [AlertRule::new("stats.disk.used", "smtp", 3600, 0)];

        let report = tick(&store, &cfg, &engine_cfg, &alerts).unwrap();

        assert_eq!(report.outcome, TickOutcome::Rebuilt);
        assert_eq!(report.smtp_count, 1);
        assert_eq!(report.non_smtp_count, 1);
        assert!(store
            .smembers(keys::ANALYZER_SMTP_ALERTER_METRICS)
            .unwrap()
            .contains("stats.disk.used"));
        assert!(store
            .smembers(keys::AET_SMTP_ALERTER_METRICS)
            .unwrap()
            .contains("stats.disk.used"));
    }

    #[test]
    fn second_tick_with_unchanged_universe_and_alerts_is_a_no_op_rebuild() {
        let store = InMemoryStore::new();
        seed_universe(&store, &["stats.disk.used"]);
        let cfg = ManagerConfig {
            liveness_ttl_secs: 0,
            ..ManagerConfig::default()
        };
        let engine_cfg = EngineConfig::default();
        let alerts = [AlertRule::new("stats.disk.used", "smtp", 3600, 0)];

        let first = tick(&store, &cfg, &engine_cfg, &alerts).unwrap();
        assert_eq!(first.outcome, TickOutcome::Rebuilt);

        let second = tick(&store, &cfg, &engine_cfg, &alerts).unwrap();
        assert_eq!(second.outcome, TickOutcome::NoChange);
    }

    #[test]
    fn concurrent_tick_is_skipped_while_guard_is_held() {
        let store = InMemoryStore::new();
        seed_universe(&store, &["stats.disk.used"]);
        let cfg = ManagerConfig::default();
        let engine_cfg = EngineConfig::default();

        assert!(store
            .acquire_guard(keys::LIVENESS_GUARD, Duration::from_secs(120))
            .unwrap());
        let report = tick(&store, &cfg, &engine_cfg, &[]).unwrap();
        assert_eq!(report.outcome, TickOutcome::Skipped);
    }
}
