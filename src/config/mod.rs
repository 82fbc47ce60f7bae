use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: Url,

    /// Legacy charset the site bodies are decoded with.
    pub encoding: String,

    pub user_agent: String,

    /// Unset means requests never time out.
    pub timeout_secs: Option<u64>,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub listing_file: String,
    pub history_dir: String,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Only the first `max_coins` listed coins get their history fetched. 0 = all.
    pub max_coins: usize,

    /// Start of the fetch window on a first run.
    pub history_epoch: NaiveDate,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_BASE_URL: &str = "https://coinmarketcap.com/";
pub const DEFAULT_MAX_COINS: usize = 11;

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            encoding: "windows-1250".to_string(),
            user_agent: "cmc-history/0.1 (daily coin history export)".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("cryptocurrency_data"),
            listing_file: "cryptocurrencies.csv".to_string(),
            history_dir: "historical_data".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_coins: DEFAULT_MAX_COINS,
            history_epoch: NaiveDate::from_ymd_opt(2013, 4, 28).expect("epoch is a valid date"),
        }
    }
}

impl PipelineConfig {
    pub fn coin_cap(&self) -> Option<usize> {
        (self.max_coins > 0).then_some(self.max_coins)
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("CMC").separator("__"))
            .build()
            .context("Failed to read configuration sources")?;

        cfg.try_deserialize()
            .context("Invalid configuration")
    }
}
