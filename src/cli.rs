//! CLI argument definitions using clap derive macros.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use coinbrief::DEFAULT_WORKERS;

/// Fetch, extract and analyze web articles in batches.
///
/// Without a subcommand, coinbrief processes the given URLs locally and
/// prints one result per URL. Subcommands expose the HTTP front end and the
/// broker-backed distributed mode.
#[derive(Parser, Debug)]
#[command(name = "coinbrief")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// URLs to process (batch mode)
    pub urls: Vec<String>,

    /// Read URLs from a file, one per line
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Concurrent pipelines in batch mode (1-100)
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Alternative run modes.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Concurrent pipelines per request batch (1-100)
        #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
        workers: u8,
    },

    /// Run a broker worker processing queued tasks
    Worker {
        /// Path to the broker database
        #[arg(long, default_value = "coinbrief.db")]
        db: PathBuf,
    },

    /// Submit a batch of URLs to the broker
    Submit {
        /// Path to the broker database
        #[arg(long, default_value = "coinbrief.db")]
        db: PathBuf,

        /// URLs to enqueue
        urls: Vec<String>,

        /// Read URLs from a file, one per line
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,

        /// Wait for the batch to settle and print its results
        #[arg(long)]
        wait: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["coinbrief"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.urls.is_empty());
        assert_eq!(args.workers, 5); // DEFAULT_WORKERS
        assert!(args.command.is_none());
    }

    #[test]
    fn test_cli_positional_urls_collected() {
        let args = Args::try_parse_from([
            "coinbrief",
            "https://example.com/a",
            "https://example.com/b",
        ])
        .unwrap();
        assert_eq!(args.urls.len(), 2);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["coinbrief", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["coinbrief", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["coinbrief", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["coinbrief", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["coinbrief", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["coinbrief", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    // ==================== Workers Tests ====================

    #[test]
    fn test_cli_workers_short_flag() {
        let args = Args::try_parse_from(["coinbrief", "-w", "3"]).unwrap();
        assert_eq!(args.workers, 3);
    }

    #[test]
    fn test_cli_workers_long_flag() {
        let args = Args::try_parse_from(["coinbrief", "--workers", "20"]).unwrap();
        assert_eq!(args.workers, 20);
    }

    #[test]
    fn test_cli_workers_min_value() {
        let args = Args::try_parse_from(["coinbrief", "-w", "1"]).unwrap();
        assert_eq!(args.workers, 1);
    }

    #[test]
    fn test_cli_workers_max_value() {
        let args = Args::try_parse_from(["coinbrief", "-w", "100"]).unwrap();
        assert_eq!(args.workers, 100);
    }

    #[test]
    fn test_cli_workers_zero_rejected() {
        let result = Args::try_parse_from(["coinbrief", "-w", "0"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_workers_over_max_rejected() {
        let result = Args::try_parse_from(["coinbrief", "-w", "101"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_file_flag_parses() {
        let args = Args::try_parse_from(["coinbrief", "-f", "urls.txt"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("urls.txt")));
    }

    // ==================== Subcommand Tests ====================

    #[test]
    fn test_cli_serve_defaults() {
        let args = Args::try_parse_from(["coinbrief", "serve"]).unwrap();
        match args.command {
            Some(Command::Serve { bind, workers }) => {
                assert_eq!(bind.to_string(), "127.0.0.1:8080");
                assert_eq!(workers, 5);
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_serve_custom_bind() {
        let args = Args::try_parse_from(["coinbrief", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match args.command {
            Some(Command::Serve { bind, .. }) => assert_eq!(bind.to_string(), "0.0.0.0:9000"),
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_serve_rejects_bad_bind() {
        let result = Args::try_parse_from(["coinbrief", "serve", "--bind", "not-an-addr"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_worker_default_db() {
        let args = Args::try_parse_from(["coinbrief", "worker"]).unwrap();
        match args.command {
            Some(Command::Worker { db }) => assert_eq!(db, PathBuf::from("coinbrief.db")),
            other => panic!("expected worker command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_submit_with_urls_and_wait() {
        let args = Args::try_parse_from([
            "coinbrief",
            "submit",
            "--wait",
            "https://example.com/a",
        ])
        .unwrap();
        match args.command {
            Some(Command::Submit { urls, wait, .. }) => {
                assert_eq!(urls, vec!["https://example.com/a".to_string()]);
                assert!(wait);
            }
            other => panic!("expected submit command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_global_verbose_after_subcommand() {
        let args = Args::try_parse_from(["coinbrief", "worker", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);
    }
}
