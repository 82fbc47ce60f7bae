//! Pipeline orchestrator: ties scraper → storage together.
//!
//! `run()` does one complete job:
//!   1. Fetch the all-coins listing and overwrite the coin list file.
//!   2. Read the coin list back, cap it, split it into one contiguous partition per worker,
//!      and let each worker fetch + write history for its coins in order.
//!
//! Partitions are disjoint, so every history file has exactly one writer.
//! Failures for one coin are recorded and the worker moves on to the next coin.

mod partition;

pub use partition::partition;

use crate::config::AppConfig;
use crate::models::{CoinOutcome, CoinReport, DateWindow, HistoryPage, RunSummary};
use crate::scraper::{CoinMarketCapScraper, MarketDataSource};
use crate::storage::{CsvStore, WriteMode};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Per-invocation parameters from the command line.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub first_run: bool,
    pub workers: usize,
    /// Date of the invocation; the fetch window ends the day before.
    pub today: NaiveDate,
}

pub struct Pipeline {
    config: AppConfig,
    source: Arc<dyn MarketDataSource>,
    store: Arc<CsvStore>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Result<Self> {
        let source = CoinMarketCapScraper::new(&config.scraper).context("Failed to build scraper")?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    pub fn with_source(config: AppConfig, source: Arc<dyn MarketDataSource>) -> Self {
        let store = Arc::new(CsvStore::new(&config.storage));
        Self { config, source, store }
    }

    pub async fn run(&self, opts: RunOptions) -> Result<RunSummary> {
        // ── 1. Refresh the coin list ──────────────────────────────────────────
        info!("=== Step 1: Refreshing coin list ===");
        let coins = self
            .source
            .fetch_coin_list()
            .await
            .context("Coin list fetch failed")?;
        self.store.write_coin_list(&coins)?;

        // ── 2. Fetch history per coin ─────────────────────────────────────────
        let window = DateWindow::for_run(opts.first_run, opts.today, self.config.pipeline.history_epoch);
        info!(
            "=== Step 2: Fetching history {} → {} ({} run) ===",
            window.start,
            window.end,
            if opts.first_run { "first" } else { "incremental" }
        );

        self.dispatch(opts, window).await
    }

    /// Splits the stored coin list across workers and waits for all of them.
    pub async fn dispatch(&self, opts: RunOptions, window: DateWindow) -> Result<RunSummary> {
        let mut coins = self.store.read_coin_list()?;
        let coins_listed = coins.len();

        if let Some(cap) = self.config.pipeline.coin_cap() {
            if coins.len() > cap {
                info!("Limiting history fetch to the first {} of {} coins", cap, coins.len());
                coins.truncate(cap);
            }
        }

        let names: Vec<String> = coins.into_iter().map(|c| c.name).collect();
        let mode = WriteMode::for_run(opts.first_run);

        let mut handles = Vec::new();
        for (worker, part) in partition(&names, opts.workers).into_iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            info!("Worker {}: {} coins ({} … {})", worker, part.len(), part[0], part[part.len() - 1]);

            let source = Arc::clone(&self.source);
            let store = Arc::clone(&self.store);
            let coins = part.clone();

            let handle = tokio::spawn(async move {
                run_worker(worker, coins, source, store, window, mode).await
            });
            handles.push((worker, part, handle));
        }

        let mut summary = RunSummary {
            coins_listed,
            coins_dispatched: names.len(),
            workers: handles.len(),
            ..Default::default()
        };

        for (worker, part, handle) in handles {
            match handle.await {
                Ok(reports) => reports.into_iter().for_each(|r| summary.record(r)),
                Err(e) => {
                    error!("Worker {} panicked: {}", worker, e);
                    for coin in part {
                        summary.record(CoinReport {
                            coin,
                            outcome: CoinOutcome::Failed {
                                reason: format!("worker {} panicked: {}", worker, e),
                            },
                        });
                    }
                }
            }
        }

        info!(
            "=== Done: {} listed | {} dispatched | {} written ({} rows) | {} no data | {} failed ===",
            summary.coins_listed,
            summary.coins_dispatched,
            summary.appended,
            summary.rows_written,
            summary.no_data,
            summary.failed.len(),
        );

        Ok(summary)
    }
}

async fn run_worker(
    worker: usize,
    coins: Vec<String>,
    source: Arc<dyn MarketDataSource>,
    store: Arc<CsvStore>,
    window: DateWindow,
    mode: WriteMode,
) -> Vec<CoinReport> {
    let mut reports = Vec::with_capacity(coins.len());

    for coin in coins {
        let outcome = match fetch_coin(source.as_ref(), &store, &coin, window, mode).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("[worker {}] {}: {:#}", worker, coin, e);
                CoinOutcome::Failed { reason: format!("{:#}", e) }
            }
        };
        reports.push(CoinReport { coin, outcome });
    }

    reports
}

async fn fetch_coin(
    source: &dyn MarketDataSource,
    store: &CsvStore,
    coin: &str,
    window: DateWindow,
    mode: WriteMode,
) -> Result<CoinOutcome> {
    let page = source
        .fetch_history(coin, window)
        .await
        .with_context(|| format!("fetch_history({})", coin))?;

    match page {
        HistoryPage::NoData => {
            info!("{}: no data for {} → {}", coin, window.start, window.end);
            Ok(CoinOutcome::NoData)
        }
        HistoryPage::Table(table) => {
            let rows = store
                .write_history(coin, &table, mode)
                .with_context(|| format!("write_history({})", coin))?;
            info!(
                "{}: {} rows (latest: {:?})",
                coin,
                rows,
                table.rows.iter().map(|r| r.date).max()
            );
            Ok(CoinOutcome::Appended { rows })
        }
    }
}
