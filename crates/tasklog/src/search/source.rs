use std::path::{Path, PathBuf};
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio_util::sync::CancellationToken;

use super::engine::{SearchMatcher, SearchOptions};
use super::error::SearchError;
use super::reader::{count_lines, split_lines};
use super::scan::{
    context_from_lines, context_from_reader, search_lines, search_reader, ContextWindow,
    SearchOutcome,
};
use super::{DEFAULT_CHUNK_SIZE, LARGE_FILE_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Pick by file size
    #[default]
    Auto,
    Buffered,
    Streaming,
}

impl SearchMode {
    fn resolve(self, size: u64) -> Self {
        match self {
            SearchMode::Auto if size >= LARGE_FILE_THRESHOLD => SearchMode::Streaming,
            SearchMode::Auto => SearchMode::Buffered,
            forced => forced,
        }
    }
}

#[derive(Debug, Clone)]
enum Body {
    Resident(Arc<Vec<String>>),
    OnDisk(PathBuf),
}

/// A searchable log input.
///
/// Small inputs are read once and kept as pre-split lines. Large inputs stay
/// on disk; every operation opens its own reader and drops it before
/// returning, so no handle outlives a call.
#[derive(Debug, Clone)]
pub struct LogSource {
    body: Body,
    size: u64,
    chunk_size: usize,
}

impl LogSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        Self::open_with_mode(path, SearchMode::Auto).await
    }

    pub async fn open_with_mode(path: impl AsRef<Path>, mode: SearchMode) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| not_found_or_io(path, e))?;
        let size = metadata.len();

        let body = match mode.resolve(size) {
            SearchMode::Streaming => Body::OnDisk(path.to_path_buf()),
            _ => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| not_found_or_io(path, e))?;
                Body::Resident(Arc::new(split_lines(&bytes)))
            }
        };

        tracing::debug!(
            path = %path.display(),
            size,
            streaming = matches!(body, Body::OnDisk(_)),
            "log source opened"
        );

        Ok(Self {
            body,
            size,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            body: Body::Resident(Arc::new(split_lines(text.as_bytes()))),
            size: text.len() as u64,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn mode(&self) -> SearchMode {
        match self.body {
            Body::Resident(_) => SearchMode::Buffered,
            Body::OnDisk(_) => SearchMode::Streaming,
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// The pattern is compiled before any input is touched, so a bad regex
    /// never starts a scan.
    pub async fn search(
        &self,
        options: &SearchOptions,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        let matcher = SearchMatcher::new(options)?;

        match &self.body {
            Body::Resident(lines) => Ok(search_lines(lines, &matcher, cancel).await),
            Body::OnDisk(path) => {
                let file = open_file(path).await?;
                search_reader(file, self.chunk_size, &matcher, cancel).await
            }
        }
    }

    pub async fn context(
        &self,
        target: usize,
        before: usize,
        after: usize,
        cancel: &CancellationToken,
    ) -> Result<ContextWindow, SearchError> {
        match &self.body {
            Body::Resident(lines) => Ok(context_from_lines(lines, target, before, after)),
            Body::OnDisk(path) => {
                let file = open_file(path).await?;
                context_from_reader(file, self.chunk_size, target, before, after, cancel).await
            }
        }
    }

    pub async fn count_lines(&self) -> Result<usize, SearchError> {
        match &self.body {
            Body::Resident(lines) => Ok(lines.len()),
            Body::OnDisk(path) => {
                let file = open_file(path).await?;
                Ok(count_lines(file, self.chunk_size).await?)
            }
        }
    }
}

async fn open_file(path: &Path) -> Result<File, SearchError> {
    File::open(path).await.map_err(|e| not_found_or_io(path, e))
}

pub(crate) fn not_found_or_io(path: &Path, err: std::io::Error) -> SearchError {
    if err.kind() == std::io::ErrorKind::NotFound {
        SearchError::FileNotFound(path.to_path_buf())
    } else {
        SearchError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LOG: &str = "[2024-05-01 10:00:00.000][INF][Px1][Tx1] start\n\
                       [2024-05-01 10:00:00.100][ERR][Px1][Tx1] failed to load\n\
                       [2024-05-01 10:00:00.200][INF][Px1][Tx1] retry\n\
                       [2024-05-01 10:00:00.300][ERR][Px1][Tx1] Failed again\n";

    fn write_log(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(SearchMode::Auto.resolve(0), SearchMode::Buffered);
        assert_eq!(SearchMode::Auto.resolve(LARGE_FILE_THRESHOLD - 1), SearchMode::Buffered);
        assert_eq!(SearchMode::Auto.resolve(LARGE_FILE_THRESHOLD), SearchMode::Streaming);
        assert_eq!(SearchMode::Buffered.resolve(LARGE_FILE_THRESHOLD * 2), SearchMode::Buffered);
        assert_eq!(SearchMode::Streaming.resolve(1), SearchMode::Streaming);
    }

    #[tokio::test]
    async fn test_small_file_opens_buffered() {
        let file = write_log(LOG);
        let source = LogSource::open(file.path()).await.unwrap();
        assert_eq!(source.mode(), SearchMode::Buffered);
        assert_eq!(source.size(), LOG.len() as u64);
        assert_eq!(source.count_lines().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_forced_modes_return_identical_results() {
        let file = write_log(LOG);
        let cancel = CancellationToken::new();
        let buffered = LogSource::open_with_mode(file.path(), SearchMode::Buffered).await.unwrap();
        let streaming = LogSource::open_with_mode(file.path(), SearchMode::Streaming)
            .await
            .unwrap()
            .with_chunk_size(13);
        assert_eq!(streaming.mode(), SearchMode::Streaming);

        for options in [SearchOptions::literal("failed"), SearchOptions::regex(r"\[ERR\].*again")] {
            let a = buffered.search(&options, &cancel).await.unwrap();
            let b = streaming.search(&options, &cancel).await.unwrap();
            assert_eq!(a.results, b.results);
            assert_eq!(a.total_matches, b.total_matches);
        }

        let a = buffered.search(&SearchOptions::literal("failed"), &cancel).await.unwrap();
        assert_eq!(a.total_matches, 2);
        let b = buffered
            .search(&SearchOptions::literal("Failed").case_sensitive(true), &cancel)
            .await
            .unwrap();
        assert_eq!(b.results.len(), 1);
        assert_eq!(b.results[0].line_number, 4);

        assert_eq!(
            streaming.count_lines().await.unwrap(),
            buffered.count_lines().await.unwrap()
        );
        let wa = buffered.context(2, 5, 20, &cancel).await.unwrap();
        let wb = streaming.context(2, 5, 20, &cancel).await.unwrap();
        assert_eq!(wa.lines, wb.lines);
        assert_eq!(wa.lines.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.log");
        let result = LogSource::open(&missing).await;
        assert!(matches!(result, Err(SearchError::FileNotFound(p)) if p == missing));
    }

    #[tokio::test]
    async fn test_invalid_regex_rejected_before_scan() {
        let source = LogSource::from_text(LOG);
        let cancel = CancellationToken::new();
        let result = source.search(&SearchOptions::regex("(unclosed"), &cancel).await;
        assert!(matches!(result, Err(SearchError::InvalidRegex(_))));
    }

    #[tokio::test]
    async fn test_streaming_file_removed_after_open() {
        let file = write_log(LOG);
        let path = file.path().to_path_buf();
        let source = LogSource::open_with_mode(&path, SearchMode::Streaming).await.unwrap();
        drop(file);

        let cancel = CancellationToken::new();
        let result = source.search(&SearchOptions::literal("x"), &cancel).await;
        assert!(matches!(result, Err(SearchError::FileNotFound(_))));
    }
}
