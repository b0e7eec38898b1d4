//! Model: AnalyzerConfig.

use serde::{Deserialize, Serialize};

use crate::search::{SearchMode, DEFAULT_CHUNK_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Read size for streamed inputs, in bytes
    pub chunk_size: usize,
    /// Lines shown before a context target
    pub context_before: usize,
    /// Lines shown after a context target
    pub context_after: usize,
    /// Share repeated short strings while parsing
    pub intern_strings: bool,
    pub search_mode: SearchMode,
    /// `tracing` filter directive, e.g. `tasklog=debug`
    pub log_filter: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            context_before: 5,
            context_after: 20,
            intern_strings: true,
            search_mode: SearchMode::Auto,
            log_filter: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }
        if self.context_after == 0 {
            return Err("context_after must be > 0".to_string());
        }
        Ok(())
    }
}
