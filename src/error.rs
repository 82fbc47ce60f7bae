use thiserror::Error;

/// Failures while turning a remote page into typed rows.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected page structure: {0}")]
    ParseStructure(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ScrapeError {
    pub fn structure(msg: impl Into<String>) -> Self {
        ScrapeError::ParseStructure(msg.into())
    }
}

pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;
