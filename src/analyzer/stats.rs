//! Analyzer counters.

use crate::state::CacheStats;
use serde::Serialize;
use std::time::Duration;

/// Snapshot of analyzer activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerStats {
    /// Pipeline runs started.
    pub analyses: u64,
    /// Runs that produced a layout.
    pub successes: u64,
    /// Runs aborted by a failed stage.
    pub failures: u64,
    /// Calls rejected because an analysis was already running.
    pub skipped_in_flight: u64,
    /// Debounced resizes dropped for changing less than the minimum delta.
    pub skipped_below_threshold: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// Wall time of the most recent pipeline run.
    pub last_duration: Option<Duration>,
    /// Dimension cache counters.
    pub cache: CacheStats,
    /// Snapshots in the history.
    pub history_len: usize,
    /// Live scroll containers.
    pub active_containers: usize,
    /// Updates waiting behind a transition.
    pub queued_updates: usize,
}
