use std::sync::atomic::{AtomicU64, Ordering};
use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use serde::Deserialize;

use super::error::SearchError;

/// What to look for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchOptions {
    pub query: String,
    /// Treat `query` as a regular expression instead of a literal
    pub use_regex: bool,
    pub case_sensitive: bool,
}

impl SearchOptions {
    pub fn literal(query: &str) -> Self {
        Self {
            query: query.to_string(),
            use_regex: false,
            case_sensitive: false,
        }
    }

    pub fn regex(query: &str) -> Self {
        Self {
            query: query.to_string(),
            use_regex: true,
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }
}

#[derive(Debug, Default)]
pub struct SearchStats {
    pub lines_scanned: AtomicU64,
    pub lines_matched: AtomicU64,
    pub bytes_processed: AtomicU64,
}

/// Compiled line matcher. Literal queries are escaped and run through the
/// same engine as regex queries, so both modes share case folding rules.
pub struct SearchMatcher {
    matcher: RegexMatcher,
    stats: SearchStats,
}

impl SearchMatcher {
    pub fn new(options: &SearchOptions) -> Result<Self, SearchError> {
        if options.query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let pattern = if options.use_regex {
            options.query.clone()
        } else {
            regex::escape(&options.query)
        };

        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(!options.case_sensitive)
            .multi_line(false)
            .build(&pattern)
            .map_err(|e| SearchError::InvalidRegex(e.to_string()))?;

        Ok(Self {
            matcher,
            stats: SearchStats::default(),
        })
    }

    /// First match in `line` as character offsets `(start, end)`.
    #[inline]
    pub fn find(&self, line: &str) -> Option<(usize, usize)> {
        self.stats.lines_scanned.fetch_add(1, Ordering::Relaxed);
        self.stats.bytes_processed.fetch_add(line.len() as u64, Ordering::Relaxed);

        let found = self.matcher.find(line.as_bytes()).ok().flatten()?;
        self.stats.lines_matched.fetch_add(1, Ordering::Relaxed);

        // Byte-mode patterns can match inside a multi-byte character
        let bytes = line.as_bytes();
        Some((char_floor(bytes, found.start()), char_ceil(bytes, found.end())))
    }

    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.stats.lines_scanned.load(Ordering::Relaxed),
            self.stats.lines_matched.load(Ordering::Relaxed),
            self.stats.bytes_processed.load(Ordering::Relaxed),
        )
    }
}

fn is_char_start(b: u8) -> bool {
    b & 0xC0 != 0x80
}

/// Index of the character containing byte `at`.
fn char_floor(bytes: &[u8], at: usize) -> usize {
    let starts = bytes[..at].iter().filter(|&&b| is_char_start(b)).count();
    match bytes.get(at) {
        Some(&b) if !is_char_start(b) => starts.saturating_sub(1),
        _ => starts,
    }
}

/// Number of characters that begin before byte `at`.
fn char_ceil(bytes: &[u8], at: usize) -> usize {
    bytes[..at].iter().filter(|&&b| is_char_start(b)).count()
}
