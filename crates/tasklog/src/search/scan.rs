use futures_util::pin_mut;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::engine::SearchMatcher;
use super::error::SearchError;
use super::reader::line_stream;

/// Maximum number of results a single search returns.
pub const MAX_RESULTS: usize = 500;

/// Lines scanned in buffered mode before yielding back to the runtime.
const POLL_BUDGET: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// 1-based
    pub line_number: usize,
    pub line: String,
    pub match_start: usize,
    pub match_end: usize,
    pub context: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub total_matches: usize,
    pub lines_scanned: usize,
    /// The scan stopped at [`MAX_RESULTS`]
    pub capped: bool,
    /// The scan stopped because the token was cancelled
    pub cancelled: bool,
}

impl SearchOutcome {
    /// Test one line; returns false once the cap is reached.
    fn offer(&mut self, matcher: &SearchMatcher, line_number: usize, line: &str) -> bool {
        self.lines_scanned += 1;
        if let Some((match_start, match_end)) = matcher.find(line) {
            self.results.push(SearchResult {
                line_number,
                line: line.to_string(),
                match_start,
                match_end,
                context: line.to_string(),
            });
            self.total_matches += 1;
        }
        if self.results.len() >= MAX_RESULTS {
            self.capped = true;
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextLine {
    pub line_number: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextWindow {
    pub target: usize,
    pub lines: Vec<ContextLine>,
    pub cancelled: bool,
}

/// Inclusive 1-based window bounds around `target`.
fn window_bounds(target: usize, before: usize, after: usize) -> (usize, usize) {
    let start = target.saturating_sub(before).max(1);
    (start, target.saturating_add(after))
}

/// Scan resident lines. Yields once before starting and then every
/// [`POLL_BUDGET`] lines; the token is checked before every line.
pub async fn search_lines(
    lines: &[String],
    matcher: &SearchMatcher,
    cancel: &CancellationToken,
) -> SearchOutcome {
    let mut outcome = SearchOutcome::default();
    tokio::task::yield_now().await;

    for (idx, line) in lines.iter().enumerate() {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        if !outcome.offer(matcher, idx + 1, line) {
            break;
        }
        if (idx + 1) % POLL_BUDGET == 0 {
            tokio::task::yield_now().await;
        }
    }

    tracing::debug!(
        scanned = outcome.lines_scanned,
        matches = outcome.total_matches,
        bytes = matcher.stats().2,
        capped = outcome.capped,
        cancelled = outcome.cancelled,
        "buffered search finished"
    );
    outcome
}

/// Scan a reader chunk by chunk. The reader is consumed and dropped as soon
/// as the scan ends, whether it ran to completion, hit the cap, or was
/// cancelled. A read failure discards the partial outcome.
pub async fn search_reader<R>(
    reader: R,
    chunk_size: usize,
    matcher: &SearchMatcher,
    cancel: &CancellationToken,
) -> Result<SearchOutcome, SearchError>
where
    R: AsyncRead + Unpin,
{
    let mut outcome = SearchOutcome::default();
    let lines = line_stream(reader, chunk_size);
    pin_mut!(lines);

    let mut line_number = 0usize;
    loop {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        let Some(line) = lines.next().await else {
            break;
        };
        let line = line?;
        line_number += 1;
        if !outcome.offer(matcher, line_number, &line) {
            break;
        }
    }

    tracing::debug!(
        scanned = outcome.lines_scanned,
        matches = outcome.total_matches,
        bytes = matcher.stats().2,
        capped = outcome.capped,
        cancelled = outcome.cancelled,
        "streaming search finished"
    );
    Ok(outcome)
}

pub fn context_from_lines(lines: &[String], target: usize, before: usize, after: usize) -> ContextWindow {
    let (start, end) = window_bounds(target, before, after);
    let lines = lines
        .iter()
        .enumerate()
        .skip(start - 1)
        .take_while(|(idx, _)| idx + 1 <= end)
        .map(|(idx, text)| ContextLine {
            line_number: idx + 1,
            text: text.clone(),
        })
        .collect();

    ContextWindow {
        target,
        lines,
        cancelled: false,
    }
}

/// Re-read from the start and collect the window around `target`, stopping
/// as soon as the window's last line has been passed.
pub async fn context_from_reader<R>(
    reader: R,
    chunk_size: usize,
    target: usize,
    before: usize,
    after: usize,
    cancel: &CancellationToken,
) -> Result<ContextWindow, SearchError>
where
    R: AsyncRead + Unpin,
{
    let (start, end) = window_bounds(target, before, after);
    let mut window = ContextWindow {
        target,
        ..Default::default()
    };

    let lines = line_stream(reader, chunk_size);
    pin_mut!(lines);

    let mut line_number = 0usize;
    loop {
        if cancel.is_cancelled() {
            window.cancelled = true;
            break;
        }
        let Some(line) = lines.next().await else {
            break;
        };
        let line = line?;
        line_number += 1;
        if line_number > end {
            break;
        }
        if line_number >= start {
            window.lines.push(ContextLine {
                line_number,
                text: line,
            });
        }
    }

    Ok(window)
}
