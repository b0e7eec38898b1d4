//! Load: config loading from file and environment variables.

use std::path::Path;

use super::model::AnalyzerConfig;
use crate::search::SearchMode;

impl AnalyzerConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("TASKLOG_CONFIG_FILE")
            .unwrap_or_else(|_| "tasklog.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", config_path);
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalyzerConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Overlay every `TASKLOG_*` variable `lookup` knows about. Unparseable
    /// values are ignored.
    pub(crate) fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TASKLOG_CHUNK_SIZE").and_then(|s| s.parse().ok()) {
            self.chunk_size = v;
        }
        if let Some(v) = lookup("TASKLOG_CONTEXT_BEFORE").and_then(|s| s.parse().ok()) {
            self.context_before = v;
        }
        if let Some(v) = lookup("TASKLOG_CONTEXT_AFTER").and_then(|s| s.parse().ok()) {
            self.context_after = v;
        }
        if let Some(v) = lookup("TASKLOG_INTERN").and_then(|s| s.parse().ok()) {
            self.intern_strings = v;
        }
        if let Some(mode) = lookup("TASKLOG_SEARCH_MODE").and_then(|s| parse_mode(&s)) {
            self.search_mode = mode;
        }
        if let Some(filter) = lookup("TASKLOG_LOG") {
            self.log_filter = Some(filter);
        }
    }
}

fn parse_mode(s: &str) -> Option<SearchMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "auto" => Some(SearchMode::Auto),
        "buffered" => Some(SearchMode::Buffered),
        "streaming" => Some(SearchMode::Streaming),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AnalyzerConfig::default();
        cfg.apply_env(env(&[
            ("TASKLOG_CHUNK_SIZE", "4096"),
            ("TASKLOG_CONTEXT_BEFORE", "2"),
            ("TASKLOG_CONTEXT_AFTER", "8"),
            ("TASKLOG_INTERN", "false"),
            ("TASKLOG_SEARCH_MODE", "Streaming"),
            ("TASKLOG_LOG", "tasklog=trace"),
        ]));

        assert_eq!(cfg.chunk_size, 4096);
        assert_eq!(cfg.context_before, 2);
        assert_eq!(cfg.context_after, 8);
        assert!(!cfg.intern_strings);
        assert_eq!(cfg.search_mode, SearchMode::Streaming);
        assert_eq!(cfg.log_filter.as_deref(), Some("tasklog=trace"));
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut cfg = AnalyzerConfig::default();
        cfg.apply_env(env(&[
            ("TASKLOG_CHUNK_SIZE", "lots"),
            ("TASKLOG_INTERN", "maybe"),
            ("TASKLOG_SEARCH_MODE", "sideways"),
        ]));
        assert_eq!(cfg, AnalyzerConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size = 1024").unwrap();
        writeln!(file, "intern_strings = false").unwrap();
        file.flush().unwrap();

        let cfg = AnalyzerConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.chunk_size, 1024);
        assert!(!cfg.intern_strings);
        assert_eq!(cfg.context_after, 20);
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size = \"big\"").unwrap();
        file.flush().unwrap();
        assert!(AnalyzerConfig::from_file(file.path()).is_err());
    }
}
