//! CLI entry point for the coinbrief tool.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use coinbrief::{
    AnalyzerConfig, BatchProcessor, Database, HttpClient, ItemProcessor, ItemResult,
    OpenAiAnalyzer, TaskQueue, Worker, server,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, Command};

/// How often `submit --wait` polls the broker for batch completion.
const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match args.command {
        Some(Command::Serve { bind, workers }) => {
            let batch = BatchProcessor::with_workers(build_processor()?, usize::from(workers));
            server::serve(bind, batch).await
        }
        Some(Command::Worker { db }) => run_worker(&db).await,
        Some(Command::Submit {
            db,
            urls,
            file,
            wait,
        }) => run_submit(&db, urls, file, wait).await,
        None => run_batch(args).await,
    }
}

/// Local batch mode: process URLs in-process and print results.
async fn run_batch(args: Args) -> Result<()> {
    let urls = gather_urls(args.urls, args.file)?;

    let batch = BatchProcessor::with_workers(build_processor()?, usize::from(args.workers));
    let results = batch.run(&urls).await?;
    print_results(&results);

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!(
        total = results.len(),
        succeeded,
        failed = results.len() - succeeded,
        "done"
    );
    Ok(())
}

/// Broker worker mode: claim and process tasks until stopped.
async fn run_worker(db_path: &std::path::Path) -> Result<()> {
    let db = Database::new(db_path).await?;
    let queue = TaskQueue::new(db);
    let worker = Worker::new(queue, build_processor()?);
    worker.run().await?;
    Ok(())
}

/// Submit mode: enqueue a batch, optionally wait for its results.
async fn run_submit(
    db_path: &std::path::Path,
    urls: Vec<String>,
    file: Option<PathBuf>,
    wait: bool,
) -> Result<()> {
    let urls = gather_urls(urls, file)?;

    let db = Database::new(db_path).await?;
    let queue = TaskQueue::new(db.clone());
    let batch_id = queue.submit_batch(&urls).await?;
    println!("batch {batch_id}");

    if wait {
        let results = queue.wait_for_batch(&batch_id, WAIT_POLL_INTERVAL).await?;
        print_results(&results);
    }

    // Flush WAL and release the file before exiting
    db.close().await;
    Ok(())
}

/// Builds the shared per-URL pipeline from environment configuration.
fn build_processor() -> Result<ItemProcessor> {
    let config = AnalyzerConfig::from_env()?;
    let analyzer = OpenAiAnalyzer::new(config);
    Ok(ItemProcessor::new(HttpClient::new(), Arc::new(analyzer)))
}

/// Collects URLs from positional args, an input file, or piped stdin.
fn gather_urls(urls: Vec<String>, file: Option<PathBuf>) -> Result<Vec<String>> {
    let mut collected = urls;

    if let Some(path) = file {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        collected.extend(parse_url_lines(&text));
    }

    if collected.is_empty() && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        collected.extend(parse_url_lines(&buffer));
    }

    if collected.is_empty() {
        bail!("no URLs provided; pass them as arguments, via --file, or on stdin");
    }
    Ok(collected)
}

/// Splits input text into URLs, skipping blanks and comment lines.
fn parse_url_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Prints one block per result.
fn print_results(results: &[ItemResult]) {
    for result in results {
        println!("=== {} ===", result.url());
        match result {
            ItemResult::Success {
                title,
                summary,
                label,
                ..
            } => {
                println!("Title:   {title}");
                println!("Label:   {label}");
                println!("Summary: {summary}");
            }
            ItemResult::Failure { reason, .. } => {
                println!("[error] {reason}");
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::parse_url_lines;

    #[test]
    fn test_parse_url_lines_skips_blanks_and_comments() {
        let text = "https://example.com/a\n\n# comment\n  https://example.com/b  \n";
        let urls = parse_url_lines(text);
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn test_parse_url_lines_empty_input() {
        assert!(parse_url_lines("").is_empty());
        assert!(parse_url_lines("\n# only a comment\n").is_empty());
    }
}
