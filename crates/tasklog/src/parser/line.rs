use std::sync::Arc;
use once_cell::sync::Lazy;
use regex::Regex;

use super::intern::InternPool;
use super::model::{LogLine, ParseError};
use super::params;
use super::MAX_LINE_SIZE;

/// `[timestamp][level][pid][tid]([opt1])?([opt2])?([opt3])?message`
static LINE_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\[([^\]]+)\]\[([^\]]+)\]\[([^\]]+)\]\[([^\]]+)\](?:\[([^\]]+)\])?(?:\[([^\]]+)\])?(?:\[([^\]]+)\])?(.*)$",
    )
    .expect("Invalid line grammar regex")
});

/// A lone optional field containing one of these is a source file, not a function.
const SOURCE_FILE_MARKERS: &[&str] = &[".cpp", ".h"];

/// Decomposes one raw line into a [`LogLine`].
///
/// Repeated short fields are shared through an [`InternPool`] unless the
/// parser was built with [`LineParser::without_interning`].
#[derive(Debug, Clone)]
pub struct LineParser {
    pool: Option<Arc<InternPool>>,
}

impl LineParser {
    pub fn new() -> Self {
        Self::with_pool(Arc::new(InternPool::new()))
    }

    pub fn with_pool(pool: Arc<InternPool>) -> Self {
        Self { pool: Some(pool) }
    }

    pub fn without_interning() -> Self {
        Self { pool: None }
    }

    pub fn pool(&self) -> Option<&Arc<InternPool>> {
        self.pool.as_ref()
    }

    fn share(&self, s: &str) -> Arc<str> {
        match &self.pool {
            Some(pool) => pool.intern(s),
            None => Arc::from(s),
        }
    }

    /// Parse a raw line. `line_index` is the 1-based position in the source.
    pub fn parse(&self, raw: &str, line_index: usize) -> Result<LogLine, ParseError> {
        if raw.len() > MAX_LINE_SIZE {
            return Err(ParseError::LineTooLarge(raw.len(), MAX_LINE_SIZE));
        }

        let line = raw.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let caps = LINE_GRAMMAR.captures(line).ok_or(ParseError::NoMatch)?;
        let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");

        let optional: Vec<&str> = (5..=7)
            .filter_map(|i| caps.get(i).map(|m| m.as_str()))
            .collect();

        let (source_file, line_number, function_name) = match optional.as_slice() {
            [file, line, func] => (Some(*file), parse_line_number(line), Some(*func)),
            [file, line] => (Some(*file), parse_line_number(line), None),
            [single] if is_source_file(single) => (Some(*single), None, None),
            [single] => (None, None, Some(*single)),
            _ => (None, None, None),
        };

        let extracted = params::extract(field(8));

        Ok(LogLine {
            timestamp: self.share(field(1)),
            level: self.share(field(2)),
            process_id: self.share(field(3)),
            thread_id: self.share(field(4)),
            source_file: source_file.map(|s| self.share(s)),
            line_number,
            function_name: function_name.map(|s| self.share(s)),
            message: extracted.message,
            params: extracted.params,
            status: extracted.status,
            duration: extracted.duration,
            line_index,
        })
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_source_file(field: &str) -> bool {
    SOURCE_FILE_MARKERS.iter().any(|m| field.contains(m))
}

/// Accepts `123` and `L123`.
fn parse_line_number(field: &str) -> Option<u32> {
    let digits = field.trim();
    let digits = digits.strip_prefix('L').unwrap_or(digits);
    digits.parse().ok()
}
