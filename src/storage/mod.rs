//! Semicolon-delimited CSV output: the coin list and one history file per coin.

use crate::config::StorageConfig;
use crate::models::{Coin, HistoryTable, Supply, UNKNOWN_SUPPLY};
use crate::scraper::cleaner::format_date;
use anyhow::{Context, Result, bail};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DELIMITER: u8 = b';';
pub const LISTING_HEADER: [&str; 3] = ["Name", "Symbol", "Supply"];

/// Whether a history write starts a fresh file with a header or extends an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Fresh,
    Append,
}

impl WriteMode {
    pub fn for_run(first_run: bool) -> Self {
        if first_run { WriteMode::Fresh } else { WriteMode::Append }
    }
}

pub struct CsvStore {
    listing_path: PathBuf,
    history_dir: PathBuf,
}

impl CsvStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            listing_path: config.data_dir.join(&config.listing_file),
            history_dir: config.data_dir.join(&config.history_dir),
        }
    }

    pub fn history_path(&self, coin: &str) -> PathBuf {
        self.history_dir.join(format!("{}.csv", coin))
    }

    // ── Coin list ─────────────────────────────────────────────────────────────

    /// Replaces the coin list file wholesale.
    pub fn write_coin_list(&self, coins: &[Coin]) -> Result<usize> {
        ensure_parent(&self.listing_path)?;

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_path(&self.listing_path)
            .with_context(|| format!("Failed to create {:?}", self.listing_path))?;

        wtr.write_record(LISTING_HEADER)?;
        for coin in coins {
            let supply = coin.supply.to_string();
            wtr.write_record([coin.name.as_str(), coin.symbol.as_str(), supply.as_str()])
                .with_context(|| format!("write coin {}", coin.name))?;
        }
        wtr.flush()?;

        info!("Wrote {} coins to {:?}", coins.len(), self.listing_path);
        Ok(coins.len())
    }

    pub fn read_coin_list(&self) -> Result<Vec<Coin>> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .from_path(&self.listing_path)
            .with_context(|| format!("Failed to open {:?}", self.listing_path))?;

        let headers = rdr.headers()?.clone();
        if headers.iter().ne(LISTING_HEADER) {
            bail!("{:?} has header {:?}, expected {:?}", self.listing_path, headers, LISTING_HEADER);
        }

        let mut coins = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result.with_context(|| format!("row {} of {:?}", i + 1, self.listing_path))?;
            let (Some(name), Some(symbol), Some(supply)) = (record.get(0), record.get(1), record.get(2))
            else {
                bail!("row {} of {:?} is incomplete", i + 1, self.listing_path);
            };

            let supply = match supply {
                UNKNOWN_SUPPLY => Supply::Unknown,
                n => Supply::Known(
                    n.parse()
                        .with_context(|| format!("bad supply {:?} for {}", n, name))?,
                ),
            };

            coins.push(Coin {
                name: name.to_string(),
                symbol: symbol.to_string(),
                supply,
            });
        }

        Ok(coins)
    }

    // ── Per-coin history ──────────────────────────────────────────────────────

    /// Writes `table` to the coin's history file and returns the number of rows written.
    /// `Fresh` truncates and writes the header, so a first run discards any history already
    /// on disk instead of appending below it; `Append` adds rows only.
    pub fn write_history(&self, coin: &str, table: &HistoryTable, mode: WriteMode) -> Result<usize> {
        let path = self.history_path(coin);
        ensure_parent(&path)?;

        let file = match mode {
            WriteMode::Fresh => OpenOptions::new().create(true).write(true).truncate(true).open(&path),
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(&path),
        }
        .with_context(|| format!("Failed to open {:?}", path))?;

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .from_writer(file);

        if mode == WriteMode::Fresh {
            wtr.write_record(&table.columns)?;
        }

        for row in &table.rows {
            let date = format_date(row.date);
            wtr.write_record(std::iter::once(date.as_str()).chain(row.values.iter().map(String::as_str)))
                .with_context(|| format!("write {} row {}", coin, date))?;
        }
        wtr.flush()?;

        debug!("{}: {} rows -> {:?} ({:?})", coin, table.rows.len(), path, mode);
        Ok(table.rows.len())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create dir {:?}", parent))?;
    }
    Ok(())
}
