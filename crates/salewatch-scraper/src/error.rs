use std::error::Error as _;

use reqwest::StatusCode;
use thiserror::Error;

/// Classified fetch failure for one brand page. Every variant renders a
/// distinct human-readable message; the orchestrator surfaces that message
/// in the per-brand result rather than propagating the error.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {timeout_secs}s: {url}")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("access forbidden (403): {url}")]
    Forbidden { url: String },

    #[error("page permanently gone (410): {url}")]
    Gone { url: String },

    #[error("page not found (404): {url}")]
    NotFound { url: String },

    #[error("rate limited (429): {url}")]
    RateLimited { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("DNS lookup failed for {url}")]
    Dns { url: String },

    #[error("connection refused by {url}")]
    ConnectionRefused { url: String },

    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to construct HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Classify a rejected HTTP status. Statuses in [200, 500) are accepted
    /// by the fetcher and never reach this function; the 4xx arms below
    /// cover servers that surface those codes through redirect targets.
    pub(crate) fn from_status(status: StatusCode, url: &str) -> Self {
        let url = url.to_string();
        match status {
            StatusCode::FORBIDDEN => FetchError::Forbidden { url },
            StatusCode::GONE => FetchError::Gone { url },
            StatusCode::NOT_FOUND => FetchError::NotFound { url },
            StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited { url },
            other => FetchError::Status {
                status: other.as_u16(),
                url,
            },
        }
    }

    /// Classify a network-level `reqwest` failure into the taxonomy:
    /// timeout, DNS failure, connection refused, or generic network error.
    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout {
                url: url.to_string(),
                timeout_secs,
            };
        }

        if err.is_connect() {
            // reqwest flattens transport failures; the io error kind and
            // resolver message in the source chain tell them apart.
            let mut source: Option<&(dyn std::error::Error + 'static)> = err.source();
            while let Some(inner) = source {
                if let Some(io_err) = inner.downcast_ref::<std::io::Error>() {
                    if io_err.kind() == std::io::ErrorKind::ConnectionRefused {
                        return FetchError::ConnectionRefused {
                            url: url.to_string(),
                        };
                    }
                }
                if inner.to_string().to_lowercase().contains("dns") {
                    return FetchError::Dns {
                        url: url.to_string(),
                    };
                }
                source = inner.source();
            }
        }

        FetchError::Network {
            url: url.to_string(),
            source: err,
        }
    }
}
