use chrono::{Days, NaiveDate};
use std::fmt;

/// Marker written in place of an unknown circulating supply.
pub const UNKNOWN_SUPPLY: &str = "NULL";

// ── Coin listing ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supply {
    Known(u64),
    Unknown,
}

impl fmt::Display for Supply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Supply::Known(n) => write!(f, "{}", n),
            Supply::Unknown => f.write_str(UNKNOWN_SUPPLY),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    /// URL slug, e.g. "bitcoin". Unique within a listing.
    pub name: String,
    pub symbol: String,
    pub supply: Supply,
}

/// One listing table row as it appears on the page, before cleaning.
#[derive(Debug, Clone)]
pub struct RawListingRow {
    pub symbol: String,
    pub href: String,
    pub supply: String,
}

// ── Price history ─────────────────────────────────────────────────────────────

/// Inclusive date range sent as `start`/`end` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The window always ends yesterday so the current, still-open day is never fetched.
    /// A first run starts at `epoch`; incremental runs only ask for yesterday.
    pub fn for_run(first_run: bool, today: NaiveDate, epoch: NaiveDate) -> Self {
        let end = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let start = if first_run { epoch.min(end) } else { end };
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub date: NaiveDate,
    /// Remaining cells in column order, already cleaned.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTable {
    /// Column names including the leading "Date".
    pub columns: Vec<String>,
    pub rows: Vec<HistoryRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPage {
    /// The site reported no observations for the requested window.
    NoData,
    Table(HistoryTable),
}

/// Raw history page content: header cells plus body cells, untouched.
#[derive(Debug, Clone)]
pub struct RawHistoryTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ── Run reporting ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinOutcome {
    Appended { rows: usize },
    NoData,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinReport {
    pub coin: String,
    pub outcome: CoinOutcome,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub coins_listed: usize,
    pub coins_dispatched: usize,
    pub workers: usize,
    pub appended: usize,
    pub rows_written: usize,
    pub no_data: usize,
    /// (coin, reason)
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn record(&mut self, report: CoinReport) {
        match report.outcome {
            CoinOutcome::Appended { rows } => {
                self.appended += 1;
                self.rows_written += rows;
            }
            CoinOutcome::NoData => self.no_data += 1,
            CoinOutcome::Failed { reason } => self.failed.push((report.coin, reason)),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
