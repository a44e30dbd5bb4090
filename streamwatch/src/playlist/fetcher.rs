//! Playlist download over HTTP(S).

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("streamwatch/", env!("CARGO_PKG_VERSION"));

/// Why a playlist could not be retrieved.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(StatusCode),
}

/// Downloads playlist text with a fixed deadline.
#[derive(Debug, Clone)]
pub struct PlaylistFetcher {
    client: Client,
}

impl PlaylistFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|error| {
                warn!(error = %error, "Failed to build playlist HTTP client, using defaults");
                Client::new()
            });
        Self { client }
    }

    /// Fetch the playlist body.
    ///
    /// Returns `None` for non-HTTP URLs and for any transport or status
    /// failure. Those failures are logged and never propagated. Surrounding
    /// whitespace in `url` is ignored.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if !is_http_url(url) {
            debug!(url = %url, "Playlist URL is not http(s), skipping fetch");
            return None;
        }

        match self.try_fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch playlist");
                None
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
