//! Boot: config load, validation, and logging init.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::conf::AnalyzerConfig;

const DEFAULT_LOG_FILTER: &str = "tasklog=info";

/// Initialise the tracing / logging subsystem.
///
/// An explicit `directive` wins over `RUST_LOG`. Output goes to stderr so
/// stdout stays clean for JSON results.
pub fn init_logging(directive: Option<&str>) {
    let filter = directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Load and validate config, then bring up logging with its filter.
pub fn boot() -> Result<AnalyzerConfig, Box<dyn std::error::Error>> {
    let config = AnalyzerConfig::load()?;
    config.validate()?;

    init_logging(config.log_filter.as_deref());
    info!(
        "Loaded configuration: chunk_size={}, context={}/{}, intern={}, mode={:?}",
        config.chunk_size,
        config.context_before,
        config.context_after,
        config.intern_strings,
        config.search_mode
    );

    Ok(config)
}
