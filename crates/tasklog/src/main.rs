use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use tasklog::runtime::boot;
use tasklog::search::{LogSource, SearchOptions};
use tasklog::LogAnalyzer;

#[derive(Parser)]
#[command(name = "tasklog", version, about = "Task-flow log analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the task tree and print it with parse statistics
    Parse { file: PathBuf },
    /// Search a log file
    Search {
        file: PathBuf,
        pattern: String,
        /// Treat the pattern as a regular expression
        #[arg(long)]
        regex: bool,
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Print the lines around a 1-based line number
    Context {
        file: PathBuf,
        line: usize,
        #[arg(long)]
        before: Option<usize>,
        #[arg(long)]
        after: Option<usize>,
    },
    /// Count lines
    Count { file: PathBuf },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = boot::boot()?;

    // Ctrl-C stops a running scan; partial results are still printed
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let open = |file: PathBuf| {
        let mode = config.search_mode;
        let chunk_size = config.chunk_size;
        async move {
            LogSource::open_with_mode(file, mode)
                .await
                .map(|source| source.with_chunk_size(chunk_size))
        }
    };

    match cli.command {
        Command::Parse { file } => {
            let analysis = LogAnalyzer::new(&config).analyze_file(&file).await?;
            print_json(&analysis)?;
        }
        Command::Search { file, pattern, regex, case_sensitive } => {
            let options = SearchOptions {
                query: pattern,
                use_regex: regex,
                case_sensitive,
            };
            let source = open(file).await?;
            let outcome = source.search(&options, &cancel).await?;
            print_json(&outcome)?;
        }
        Command::Context { file, line, before, after } => {
            let source = open(file).await?;
            let window = source
                .context(
                    line,
                    before.unwrap_or(config.context_before),
                    after.unwrap_or(config.context_after),
                    &cancel,
                )
                .await?;
            print_json(&window)?;
        }
        Command::Count { file } => {
            let source = open(file).await?;
            let lines = source.count_lines().await?;
            print_json(&serde_json::json!({ "lines": lines, "bytes": source.size() }))?;
        }
    }

    Ok(())
}
