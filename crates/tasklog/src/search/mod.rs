//! Search module: literal/regex search over log inputs, buffered or streamed.

pub mod engine;
pub mod error;
pub mod reader;
pub mod scan;
pub mod source;

pub use engine::{SearchMatcher, SearchOptions};
pub use error::SearchError;
pub use reader::{line_stream, split_lines, LineSplitter};
pub use scan::{ContextLine, ContextWindow, SearchOutcome, SearchResult, MAX_RESULTS};
pub use source::{LogSource, SearchMode};

/// Inputs at or above this size (5 MiB) are searched without loading them.
pub const LARGE_FILE_THRESHOLD: u64 = 5 * 1024 * 1024;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
