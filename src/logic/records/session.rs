//! Session Aggregation
//!
//! Groups logs per session and derives the `ChargingSession` aggregate
//! when only logs are available.

use std::collections::BTreeMap;

use super::types::{ChargingRecord, ChargingSession};

/// Group logs by `session_id`, each group ordered by `created_at` (stable)
pub fn group_logs_by_session(logs: &[ChargingRecord]) -> BTreeMap<String, Vec<ChargingRecord>> {
    let mut groups: BTreeMap<String, Vec<ChargingRecord>> = BTreeMap::new();
    for log in logs {
        groups.entry(log.session_id.clone()).or_default().push(log.clone());
    }
    for group in groups.values_mut() {
        group.sort_by_key(|log| log.created_at);
    }
    groups
}

/// Logs of one session, ordered by `created_at`
pub fn logs_for_session(logs: &[ChargingRecord], session_id: &str) -> Vec<ChargingRecord> {
    let mut selected: Vec<ChargingRecord> = logs
        .iter()
        .filter(|log| log.session_id == session_id)
        .cloned()
        .collect();
    selected.sort_by_key(|log| log.created_at);
    selected
}

impl ChargingSession {
    /// Derive the aggregate from a session's logs. `None` for an empty slice.
    ///
    /// Consumption is cumulative, so the total is the largest reading.
    pub fn from_logs(id: impl Into<String>, logs: &[ChargingRecord]) -> Option<Self> {
        let last = logs.iter().max_by_key(|log| log.created_at)?;

        let started_at = logs.iter().map(|log| log.started_at).min();
        let stopped_at = logs.iter().filter_map(|log| log.stopped_at).max();

        let mut ordered: Vec<&ChargingRecord> = logs.iter().collect();
        ordered.sort_by_key(|log| log.created_at);

        let battery_level = ordered.iter().rev().find_map(|log| log.battery_level);
        let consumption = logs
            .iter()
            .filter_map(|log| log.consumption)
            .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.max(c))));

        let duration_ms = match (started_at, stopped_at) {
            (Some(start), Some(stop)) => (stop - start).num_milliseconds().max(0),
            _ => 0,
        };

        Some(Self {
            id: id.into(),
            status: last.status.clone(),
            started_at,
            stopped_at,
            battery_level,
            consumption,
            duration_ms,
        })
    }
}
