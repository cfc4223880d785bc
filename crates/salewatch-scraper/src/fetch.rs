//! HTTP fetcher for brand storefront pages.

use std::time::Duration;

use reqwest::{redirect, Client};

use crate::error::FetchError;

/// Redirect chains longer than this are treated as a network error.
const MAX_REDIRECTS: usize = 10;

/// Fetches raw storefront HTML with a browser-like request profile.
///
/// Accepts any status in [200, 500) as a non-error response — storefronts
/// routinely serve sale banners on soft-404 and region-gate pages — and
/// classifies 5xx statuses and transport failures into [`FetchError`]
/// variants. Never retries; skipping predictably failing brands is the
/// orchestrator's job.
pub struct PageFetcher {
    client: Client,
    timeout_secs: u64,
}

impl PageFetcher {
    /// Creates a `PageFetcher` with the configured total timeout and
    /// User-Agent, following up to 10 redirects.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Fetches one page and returns the raw body text.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] — the request exceeded the configured timeout.
    /// - [`FetchError::Status`] and the named 4xx variants — status outside [200, 500).
    /// - [`FetchError::Dns`] / [`FetchError::ConnectionRefused`] /
    ///   [`FetchError::Network`] — transport-level failure.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url, self.timeout_secs))?;

        let status = response.status();
        if !(200..500).contains(&status.as_u16()) {
            return Err(FetchError::from_status(status, url));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url, self.timeout_secs))
    }
}
