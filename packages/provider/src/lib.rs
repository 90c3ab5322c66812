#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the external listings provider.
//!
//! One module per upstream endpoint family:
//!
//! - [`sector`] — region lookup returning a polygon-bounded [`Sector`]
//! - [`region`] — region list and paced batch sector resolution
//! - [`complex`] — sector-scoped, direction-partitioned complex listings
//! - [`article`] — clustered article listings keyed by a raw bounding box
//! - [`amenity`] — per-category points of interest around a sector
//!
//! Every fetch takes a shared [`reqwest::Client`] and a base URL, so
//! tests and alternate deployments can point the same code anywhere.
//! Rate-limit handling for the sector endpoint lives in [`retry`].
//!
//! [`Sector`]: estate_map_geometry::Sector

pub mod amenity;
pub mod article;
pub mod complex;
pub mod parsing;
pub mod region;
pub mod retry;
pub mod sector;

use std::time::Duration;

use thiserror::Error;

/// Default base URL for the sector / complex / amenity endpoints.
pub const DEFAULT_LISTINGS_BASE_URL: &str = "https://new.land.naver.com/api";

/// Default base URL for the clustered article-list endpoint.
pub const DEFAULT_ARTICLE_BASE_URL: &str = "https://m.land.naver.com/cluster/ajax";

/// Default `User-Agent` header for upstream requests.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Conservative default timeout for listing fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tighter timeout for the small amenity lookups, so one slow category
/// cannot dominate total request latency.
pub const SHORT_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors from listings-provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (network error, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-2xx status other than 429.
    #[error("Upstream returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Upstream returned HTTP 429. `retries` is how many backoff
    /// retries were already spent (0 for a raw response).
    #[error("Rate limited by upstream after {retries} retries")]
    RateLimited {
        /// Retries performed before giving up.
        retries: u32,
    },

    /// A required field was absent or malformed in an upstream response.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

impl ProviderError {
    /// True for rate-limit responses, which are the only errors the
    /// sector backoff loop retries.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Configuration for the provider client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL for sector / complex / amenity endpoints.
    pub listings_base_url: String,
    /// Base URL for the clustered article-list endpoint.
    pub article_base_url: String,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            listings_base_url: DEFAULT_LISTINGS_BASE_URL.to_string(),
            article_base_url: DEFAULT_ARTICLE_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Reads configuration from `ESTATE_MAP_LISTINGS_BASE_URL`,
    /// `ESTATE_MAP_ARTICLE_BASE_URL`, and `ESTATE_MAP_USER_AGENT`,
    /// falling back to the defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listings_base_url: std::env::var("ESTATE_MAP_LISTINGS_BASE_URL")
                .unwrap_or(defaults.listings_base_url),
            article_base_url: std::env::var("ESTATE_MAP_ARTICLE_BASE_URL")
                .unwrap_or(defaults.article_base_url),
            user_agent: std::env::var("ESTATE_MAP_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

/// Builds the shared HTTP client with the configured user agent and the
/// conservative default timeout.
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if the client cannot be constructed.
pub fn build_client(config: &ProviderConfig) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(ProviderError::Http)
}

/// Classifies a response status: 2xx passes through, 429 becomes
/// [`ProviderError::RateLimited`], anything else
/// [`ProviderError::Status`].
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Err(ProviderError::RateLimited { retries: 0 })
    } else {
        Err(ProviderError::Status {
            status: status.as_u16(),
        })
    }
}
