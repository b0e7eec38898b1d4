use std::collections::BTreeMap;
use serde::Serialize;

use super::model::{EventNotification, LogLine};

/// Summary of one parse session, exported alongside the task tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Lines that decomposed into a [`LogLine`]
    pub total_lines: usize,
    /// Non-blank lines dropped by the decomposer
    pub skipped_lines: usize,
    pub total_events: usize,
    /// Keyed by the level text as written in the log
    pub level_counts: BTreeMap<String, usize>,
    /// Keyed by event name (`Tasker.Task.Starting`, ...)
    pub event_counts: BTreeMap<String, usize>,
    pub task_count: usize,
    pub node_count: usize,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
    /// Distinct strings held by the intern pool at the end of the parse
    pub interned_strings: usize,
}

/// Accumulates [`ParseStats`] while the pipeline runs.
#[derive(Debug, Default)]
pub struct StatsCollector {
    stats: ParseStats,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_line(&mut self, line: &LogLine) {
        self.stats.total_lines += 1;
        *self.stats.level_counts.entry(line.level.to_string()).or_insert(0) += 1;

        if self.stats.first_timestamp.is_none() {
            self.stats.first_timestamp = Some(line.timestamp.to_string());
        }
        self.stats.last_timestamp = Some(line.timestamp.to_string());
    }

    pub fn record_skip(&mut self) {
        self.stats.skipped_lines += 1;
    }

    pub fn record_event(&mut self, event: &EventNotification) {
        self.stats.total_events += 1;
        *self.stats.event_counts.entry(event.message.clone()).or_insert(0) += 1;
    }

    pub fn finish(mut self, task_count: usize, node_count: usize, interned_strings: usize) -> ParseStats {
        self.stats.task_count = task_count;
        self.stats.node_count = node_count;
        self.stats.interned_strings = interned_strings;
        self.stats
    }
}
