use std::time::Duration;

use thiserror::Error;

const USER_AGENT: &str = concat!("heading-audit/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("HTTP {status}")]
    Status { status: u16 },
    #[error("unreadable body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Source of page bodies. One GET per call, no retries.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP with a bounded per-request timeout.
/// Any non-2xx status is a failure.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(FetchError::Body)
    }
}

// ── Tests ──
