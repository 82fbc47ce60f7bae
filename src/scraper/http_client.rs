use crate::config::ScraperConfig;
use crate::error::{ScrapeError, ScrapeResult};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use encoding_rs::Encoding;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Anything that can turn a URL into page text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get_text(&self, url: &Url) -> ScrapeResult<String>;
}

/// Single-shot HTTPS fetcher. Certificates are always verified; no retries.
pub struct HttpClient {
    inner: reqwest::Client,
    encoding: &'static Encoding,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let encoding = Encoding::for_label(config.encoding.as_bytes())
            .ok_or_else(|| anyhow!("Unknown page encoding {:?}", config.encoding))?;

        let mut builder = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .https_only(true)
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let inner = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            encoding,
        })
    }

    /// Decodes the body with the configured encoding, whatever charset the response declares.
    async fn read_body(&self, resp: reqwest::Response) -> reqwest::Result<String> {
        let bytes = resp.bytes().await?;
        let (text, _) = self.encoding.decode_without_bom_handling(&bytes);
        Ok(text.into_owned())
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn get_text(&self, url: &Url) -> ScrapeResult<String> {
        debug!("GET {}", url);

        let transport = |source: reqwest::Error| ScrapeError::Transport {
            url: url.to_string(),
            source,
        };

        let resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?;

        self.read_body(resp).await.map_err(transport)
    }
}
