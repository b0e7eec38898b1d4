// Module structure for the task log analyzer.

// Core pipeline
pub mod parser;
pub mod tree;
pub mod analyzer;

// Search
pub mod search;

// Process setup
pub mod conf;
pub mod runtime;

pub use analyzer::{Analysis, LogAnalyzer};
pub use conf::AnalyzerConfig;
