/// Log line decomposition and event extraction
///
/// Converts raw application log text into structured records.
///
/// # Architecture
///
/// - `intern.rs`: shared pool for repeated short strings
/// - `line.rs`: bracket-field decomposer for one raw line
/// - `params.rs`: `[key=value]` / `[flag]` tokenizer and `| enter/leave` suffix
/// - `event.rs`: event-notification lift for marker lines
/// - `stats.rs`: per-parse statistics summary
///
/// Line- and parameter-level anomalies never fail a parse: malformed lines are
/// skipped and malformed embedded JSON degrades to a raw string.

pub mod intern;
pub mod line;
pub mod params;
pub mod event;
pub mod model;
pub mod stats;

// Re-export commonly used types
pub use intern::InternPool;
pub use line::LineParser;
pub use event::extract_event;
pub use model::{EventNotification, LogLevel, LogLine, ParseError, Params, ScopeStatus};
pub use stats::{ParseStats, StatsCollector};

// Constants
pub const MAX_LINE_SIZE: usize = 1_048_576; // 1MB
pub const EVENT_MARKER: &str = "!!!OnEventNotify!!!";
