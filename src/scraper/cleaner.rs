use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{Coin, HistoryPage, HistoryRow, HistoryTable, RawHistoryTable, RawListingRow, Supply};
use crate::scraper::parsers::HISTORY_SCHEMA;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::warn;
use url::Url;

/// Text the site puts in the single body row when a window has no observations.
pub const NO_DATA_SENTINEL: &str = "No data was found for the selected time period.";

pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

// ── Field parsers ─────────────────────────────────────────────────────────────

/// "120,000,000" → Known(120000000) | "?" → Unknown
pub fn parse_supply(token: &str) -> Supply {
    let cleaned = token.trim().replace(',', "");
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Supply::Unknown;
    }
    cleaned.parse().map(Supply::Known).unwrap_or(Supply::Unknown)
}

/// "/currencies/bitcoin/" → "bitcoin". Absolute links are reduced to their path first.
pub fn slug_from_href(href: &str) -> Option<String> {
    let path = match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.to_string(),
    };
    path.split('/')
        .nth(2)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse dates: "Apr 28, 2013" (history tables) or ISO
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%b %d, %Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, CANONICAL_DATE_FORMAT) {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d %b %Y") {
        return Some(d);
    }

    None
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(CANONICAL_DATE_FORMAT).to_string()
}

/// Numeric cells lose thousands separators and currency signs; "-" means missing.
pub fn clean_cell(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() || s == "-" || s == "—" || s == "N/A" {
        return String::new();
    }
    let numeric = s.trim_start_matches('$').replace(',', "");
    if numeric.parse::<f64>().is_ok() {
        numeric
    } else {
        s.to_string()
    }
}

// ── Listing rows → Coin ───────────────────────────────────────────────────────

pub fn clean_listing_rows(rows: Vec<RawListingRow>) -> ScrapeResult<Vec<Coin>> {
    let mut seen = HashSet::new();
    let mut coins = Vec::with_capacity(rows.len());

    for (i, row) in rows.into_iter().enumerate() {
        let name = slug_from_href(&row.href).ok_or_else(|| {
            ScrapeError::structure(format!(
                "listing row {}: no coin name in link {:?}",
                i + 1,
                row.href
            ))
        })?;

        let symbol = row.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(ScrapeError::structure(format!(
                "listing row {} ({}): empty symbol",
                i + 1,
                name
            )));
        }

        if !seen.insert(name.clone()) {
            warn!("Duplicate coin {} in listing, keeping the first entry", name);
            continue;
        }

        coins.push(Coin {
            name,
            symbol,
            supply: parse_supply(&row.supply),
        });
    }

    Ok(coins)
}

// ── History table → HistoryPage ───────────────────────────────────────────────

fn is_no_data(rows: &[Vec<String>]) -> bool {
    match rows {
        [] => true,
        [only] => only.first().map(|c| c.trim()) == Some(NO_DATA_SENTINEL),
        _ => false,
    }
}

pub fn clean_history_table(raw: RawHistoryTable) -> ScrapeResult<HistoryPage> {
    let columns = HISTORY_SCHEMA.validate(&raw.headers)?;

    if is_no_data(&raw.rows) {
        return Ok(HistoryPage::NoData);
    }

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (i, cells) in raw.rows.iter().enumerate() {
        if cells.len() != columns.len() {
            return Err(ScrapeError::structure(format!(
                "history row {} has {} cells, header has {}",
                i + 1,
                cells.len(),
                columns.len()
            )));
        }

        let date = parse_date(&cells[0]).ok_or_else(|| {
            ScrapeError::structure(format!("history row {}: bad date {:?}", i + 1, cells[0]))
        })?;

        rows.push(HistoryRow {
            date,
            values: cells[1..].iter().map(|c| clean_cell(c)).collect(),
        });
    }

    Ok(HistoryPage::Table(HistoryTable { columns, rows }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
