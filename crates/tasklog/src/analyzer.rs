//! Full parse pipeline: raw text → lines → events → task tree + statistics.

use std::path::Path;
use std::sync::Arc;
use serde::Serialize;
use tokio::fs::File;
use tokio_stream::StreamExt;

use crate::conf::AnalyzerConfig;
use crate::parser::{
    extract_event, EventNotification, InternPool, LineParser, LogLine, ParseError, ParseStats,
    StatsCollector,
};
use crate::search::reader::line_stream;
use crate::search::source::not_found_or_io;
use crate::search::{SearchError, DEFAULT_CHUNK_SIZE};
use crate::tree::{build_tasks, TaskInfo};

/// Everything one parse produces.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    #[serde(skip)]
    pub lines: Vec<LogLine>,
    #[serde(skip)]
    pub events: Vec<EventNotification>,
    pub tasks: Vec<TaskInfo>,
    pub stats: ParseStats,
}

#[derive(Debug, Clone)]
pub struct LogAnalyzer {
    intern_strings: bool,
    chunk_size: usize,
}

impl Default for LogAnalyzer {
    fn default() -> Self {
        Self {
            intern_strings: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Per-parse state. Owns its intern pool, so each parse has a single writer.
struct Session {
    parser: LineParser,
    collector: StatsCollector,
    lines: Vec<LogLine>,
    events: Vec<EventNotification>,
    line_index: usize,
}

impl Session {
    fn new(intern_strings: bool) -> Self {
        let parser = if intern_strings {
            LineParser::with_pool(Arc::new(InternPool::new()))
        } else {
            LineParser::without_interning()
        };
        Self {
            parser,
            collector: StatsCollector::new(),
            lines: Vec::new(),
            events: Vec::new(),
            line_index: 0,
        }
    }

    fn feed(&mut self, raw: &str) {
        self.line_index += 1;
        match self.parser.parse(raw, self.line_index) {
            Ok(line) => {
                self.collector.record_line(&line);
                if let Some(event) = extract_event(&line) {
                    self.collector.record_event(&event);
                    self.events.push(event);
                }
                self.lines.push(line);
            }
            Err(ParseError::Empty) => {}
            Err(e) => {
                tracing::trace!(line = self.line_index, error = %e, "line skipped");
                self.collector.record_skip();
            }
        }
    }

    fn finish(self) -> Analysis {
        let tasks = build_tasks(&self.events);
        let node_count = tasks.iter().map(|t| t.nodes.len()).sum();
        let interned = self.parser.pool().map(|p| p.len()).unwrap_or(0);
        let stats = self.collector.finish(tasks.len(), node_count, interned);

        tracing::debug!(
            lines = stats.total_lines,
            skipped = stats.skipped_lines,
            events = stats.total_events,
            tasks = stats.task_count,
            nodes = stats.node_count,
            "analysis finished"
        );

        Analysis {
            lines: self.lines,
            events: self.events,
            tasks,
            stats,
        }
    }
}

impl LogAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            intern_strings: config.intern_strings,
            chunk_size: config.chunk_size.max(1),
        }
    }

    /// Parse a fully resident log text.
    pub fn analyze(&self, text: &str) -> Analysis {
        let mut session = Session::new(self.intern_strings);
        for raw in text.lines() {
            session.feed(raw);
        }
        session.finish()
    }

    /// Parse a file through the chunked line reader, without holding the
    /// raw text in memory.
    pub async fn analyze_file(&self, path: impl AsRef<Path>) -> Result<Analysis, SearchError> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| not_found_or_io(path, e))?;

        let mut session = Session::new(self.intern_strings);
        let lines = line_stream(file, self.chunk_size);
        tokio::pin!(lines);
        while let Some(raw) = lines.next().await {
            session.feed(&raw?);
        }
        Ok(session.finish())
    }
}
