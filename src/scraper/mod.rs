pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::error::ScrapeResult;
use crate::models::{Coin, DateWindow, HistoryPage};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use self::cleaner::{clean_history_table, clean_listing_rows};
use self::http_client::{HttpClient, PageFetcher};
use self::parsers::{parse_history_page, parse_listing_page};

const LISTING_PATH: &str = "coins/views/all/";
const QUERY_DATE_FORMAT: &str = "%Y%m%d";

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable data source abstraction.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_coin_list(&self) -> ScrapeResult<Vec<Coin>>;
    async fn fetch_history(&self, coin: &str, window: DateWindow) -> ScrapeResult<HistoryPage>;
}

// ── coinmarketcap scraper ─────────────────────────────────────────────────────

pub struct CoinMarketCapScraper {
    fetcher: Arc<dyn PageFetcher>,
    base_url: Url,
}

impl CoinMarketCapScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = HttpClient::new(config)?;
        Ok(Self::with_fetcher(Arc::new(client), config.base_url.clone()))
    }

    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, base_url: Url) -> Self {
        Self { fetcher, base_url }
    }

    fn listing_url(&self) -> ScrapeResult<Url> {
        Ok(self.base_url.join(LISTING_PATH)?)
    }

    /// e.g. bitcoin → /currencies/bitcoin/historical-data/?start=20130428&end=20240101
    pub fn history_url(&self, coin: &str, window: DateWindow) -> ScrapeResult<Url> {
        let mut url = self
            .base_url
            .join(&format!("currencies/{}/historical-data/", coin))?;
        url.query_pairs_mut()
            .append_pair("start", &window.start.format(QUERY_DATE_FORMAT).to_string())
            .append_pair("end", &window.end.format(QUERY_DATE_FORMAT).to_string());
        Ok(url)
    }
}

#[async_trait]
impl MarketDataSource for CoinMarketCapScraper {
    async fn fetch_coin_list(&self) -> ScrapeResult<Vec<Coin>> {
        let url = self.listing_url()?;
        info!("Fetching listing ({})", url);

        let html = self.fetcher.get_text(&url).await?;
        let coins = clean_listing_rows(parse_listing_page(&html)?)?;

        info!("Total coins discovered: {}", coins.len());
        Ok(coins)
    }

    async fn fetch_history(&self, coin: &str, window: DateWindow) -> ScrapeResult<HistoryPage> {
        let url = self.history_url(coin, window)?;
        debug!("Fetching history page: {}", url);

        let html = self.fetcher.get_text(&url).await?;
        clean_history_table(parse_history_page(&html)?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::ScrapeError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages keyed by URL path; unknown paths fail like a 404.
    #[derive(Default)]
    pub struct CannedPages {
        pages: HashMap<String, String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl CannedPages {
        pub fn with(mut self, path: &str, html: impl Into<String>) -> Self {
            self.pages.insert(path.to_string(), html.into());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for CannedPages {
        async fn get_text(&self, url: &Url) -> ScrapeResult<String> {
            if let Ok(mut log) = self.requested.lock() {
                log.push(url.to_string());
            }
            self.pages
                .get(url.path())
                .cloned()
                .ok_or_else(|| ScrapeError::structure(format!("no canned page for {}", url.path())))
        }
    }

    pub fn listing_html(rows: &[(&str, &str, &str)]) -> String {
        let body: String = rows
            .iter()
            .map(|(slug, symbol, supply)| {
                format!(
                    r#"<tr><td><a class="currency-name-container" href="/currencies/{slug}/">{slug}</a></td>
                       <td><span class="currency-symbol">{symbol}</span></td>
                       <td class="circulating-supply"> <span>{supply}</span> </td></tr>"#
                )
            })
            .collect();
        format!(
            r#"<html><body><table id="currencies-all">
               <thead><tr><th>Name</th><th>Symbol</th><th>Circulating Supply</th></tr></thead>
               <tbody>{body}</tbody></table></body></html>"#
        )
    }

    pub fn history_html(rows: &[[&str; 7]]) -> String {
        let body: String = rows
            .iter()
            .map(|cells| {
                let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
                format!("<tr>{tds}</tr>")
            })
            .collect();
        format!(
            r#"<html><body><table class="table">
               <thead><tr><th>Date</th><th>Open*</th><th>High</th><th>Low</th><th>Close**</th>
               <th>Volume</th><th>Market Cap</th></tr></thead>
               <tbody>{body}</tbody></table></body></html>"#
        )
    }

    pub fn no_data_html() -> String {
        format!(
            r#"<html><body><table class="table">
               <thead><tr><th>Date</th><th>Open*</th><th>High</th><th>Low</th><th>Close**</th>
               <th>Volume</th><th>Market Cap</th></tr></thead>
               <tbody><tr><td colspan="7">{}</td></tr></tbody></table></body></html>"#,
            cleaner::NO_DATA_SENTINEL
        )
    }
}
