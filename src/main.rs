mod config;
mod error;
mod models;
mod pipeline;
mod scraper;
mod storage;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::pipeline::{Pipeline, RunOptions};

const MAX_THREADS: i64 = 10;

const FIRST_RUN_HELP: &str = "1 - create every output file fresh, with a header
0 - append the latest day to existing files";

#[derive(Parser, Debug)]
#[command(
    name = "cmc-history",
    about = "Export coinmarketcap listings and daily price history to CSV",
    version
)]
struct Cli {
    #[arg(value_name = "first_run", help = FIRST_RUN_HELP, value_parser = clap::value_parser!(u8).range(0..=1))]
    first_run: u8,

    /// Number of concurrent history workers
    #[arg(long = "n_threads", default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=MAX_THREADS))]
    n_threads: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cmc_history=info,warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(filter)
        .init();

    let config = AppConfig::load()?;
    let opts = RunOptions {
        first_run: cli.first_run == 1,
        workers: usize::from(cli.n_threads),
        today: Local::now().date_naive(),
    };

    let started = Instant::now();
    let summary = Pipeline::new(config)?.run(opts).await?;

    if !summary.is_clean() {
        for (coin, reason) in &summary.failed {
            warn!("Not written: {}: {}", coin, reason);
        }
    }
    info!(
        "Finished with {} workers in {:.2?}",
        summary.workers,
        started.elapsed()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_threads_defaults_to_four() {
        let cli = Cli::try_parse_from(["cmc-history", "1"]).unwrap();
        assert_eq!(cli.first_run, 1);
        assert_eq!(cli.n_threads, 4);
    }

    #[test]
    fn accepts_underscored_thread_flag() {
        let cli = Cli::try_parse_from(["cmc-history", "0", "--n_threads", "10"]).unwrap();
        assert_eq!(cli.first_run, 0);
        assert_eq!(cli.n_threads, 10);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Cli::try_parse_from(["cmc-history", "2"]).is_err());
        assert!(Cli::try_parse_from(["cmc-history", "1", "--n_threads", "0"]).is_err());
        assert!(Cli::try_parse_from(["cmc-history", "1", "--n_threads", "11"]).is_err());
        assert!(Cli::try_parse_from(["cmc-history"]).is_err());
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["cmc-history", "1", "--verbose"]).is_err());
    }
}
