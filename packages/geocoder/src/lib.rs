#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map-provider geocoding client.
//!
//! Two lookups against the map provider's local API, both cached:
//!
//! - **forward**: street address → coordinate
//! - **reverse**: coordinate → display address
//!
//! Reverse lookups quantize the coordinate to ~1 m before keying the
//! cache, so the per-listing reverse-geocode fan-out on the article
//! path re-resolves a building only once. Both calls use a tight
//! timeout; geocoding must not dominate request latency.

use std::time::Duration;

use estate_map_cache::TtlCache;
use estate_map_geometry::Location;
use serde_json::Value;
use thiserror::Error;

/// Default base URL for the map provider's local API.
pub const DEFAULT_GEO_BASE_URL: &str = "https://dapi.kakao.com";

/// Per-request timeout for geocoding calls.
pub const GEOCODE_TIMEOUT: Duration = Duration::from_secs(3);

/// How long cached geocode results live.
pub const GEOCODE_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Decimal places for reverse-cache coordinate keys (~1 m).
const REVERSE_KEY_DECIMALS: u32 = 5;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-2xx status.
    #[error("Geocoder returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider had no match for the query.
    #[error("No geocoding match")]
    NotFound,
}

/// Configuration for the geocoding client.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Base URL of the map provider's local API.
    pub base_url: String,
    /// Bearer-style API key sent on every request.
    pub api_key: String,
}

impl GeocoderConfig {
    /// Reads configuration from `ESTATE_MAP_GEO_BASE_URL` and
    /// `ESTATE_MAP_GEO_API_KEY`. A missing key is left empty — requests
    /// will fail upstream, which beats failing construction for code
    /// paths that never geocode.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ESTATE_MAP_GEO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEO_BASE_URL.to_string()),
            api_key: std::env::var("ESTATE_MAP_GEO_API_KEY").unwrap_or_default(),
        }
    }
}

/// Geocoding client with read-through caches in both directions.
pub struct Geocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
    forward_cache: TtlCache<String, (f64, f64)>,
    reverse_cache: TtlCache<(i64, i64), String>,
}

impl Geocoder {
    /// Creates a geocoder sharing `client`, with the default cache TTL.
    #[must_use]
    pub fn new(client: reqwest::Client, config: GeocoderConfig) -> Self {
        Self::with_cache_ttl(client, config, GEOCODE_CACHE_TTL)
    }

    /// Creates a geocoder with an explicit cache TTL (tests shorten it).
    #[must_use]
    pub fn with_cache_ttl(
        client: reqwest::Client,
        config: GeocoderConfig,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            client,
            config,
            forward_cache: TtlCache::new(cache_ttl),
            reverse_cache: TtlCache::new(cache_ttl),
        }
    }

    /// Resolves a street address to a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::NotFound`] when the provider has no
    /// match, or the transport/parse variants otherwise.
    pub async fn forward(&self, address: &str) -> Result<Location, GeocodeError> {
        if let Some((lat, lon)) = self.forward_cache.get(&address.to_string()) {
            return Ok(Location::new(lat, lon));
        }
        log::debug!("forward geocoding `{address}`");

        let url = format!("{}/v2/local/search/address.json", self.config.base_url);
        let body = self.get_json(&url, &[("query", address)]).await?;
        let (lat, lon) = parse_forward(&body)?;

        self.forward_cache.insert(address.to_string(), (lat, lon));
        Ok(Location::new(lat, lon))
    }

    /// Resolves a coordinate to a display address.
    ///
    /// Coordinates within ~1 m of a cached lookup return the cached
    /// address without a new call.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::NotFound`] when the provider has no
    /// match, or the transport/parse variants otherwise.
    pub async fn reverse(&self, location: &Location) -> Result<String, GeocodeError> {
        let key = location.rounded_key(REVERSE_KEY_DECIMALS);
        if let Some(address) = self.reverse_cache.get(&key) {
            return Ok(address);
        }
        log::debug!("reverse geocoding {location}");

        let x = location.lon.to_string();
        let y = location.lat.to_string();
        let url = format!("{}/v2/local/geo/coord2address.json", self.config.base_url);
        let body = self
            .get_json(&url, &[("x", x.as_str()), ("y", y.as_str())])
            .await?;
        let address = parse_reverse(&body)?;

        self.reverse_cache.insert(key, address.clone());
        Ok(address)
    }

    /// Drops both caches.
    pub fn clear_caches(&self) {
        self.forward_cache.clear();
        self.reverse_cache.clear();
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, GeocodeError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("KakaoAK {}", self.config.api_key))
            .query(query)
            .timeout(GEOCODE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

/// Parses a forward-geocode response into `(lat, lon)`.
///
/// # Errors
///
/// Returns [`GeocodeError::NotFound`] for an empty document list and
/// [`GeocodeError::Parse`] for malformed coordinates.
pub fn parse_forward(body: &Value) -> Result<(f64, f64), GeocodeError> {
    let documents = body["documents"]
        .as_array()
        .ok_or_else(|| GeocodeError::Parse {
            message: "missing `documents` array".to_string(),
        })?;
    let Some(first) = documents.first() else {
        return Err(GeocodeError::NotFound);
    };

    let lon = coordinate_field(&first["x"]).ok_or_else(|| GeocodeError::Parse {
        message: "missing `x` coordinate".to_string(),
    })?;
    let lat = coordinate_field(&first["y"]).ok_or_else(|| GeocodeError::Parse {
        message: "missing `y` coordinate".to_string(),
    })?;

    Ok((lat, lon))
}

/// Parses a reverse-geocode response into a display address.
///
/// # Errors
///
/// Returns [`GeocodeError::NotFound`] for an empty document list and
/// [`GeocodeError::Parse`] when the address name is absent.
pub fn parse_reverse(body: &Value) -> Result<String, GeocodeError> {
    let documents = body["documents"]
        .as_array()
        .ok_or_else(|| GeocodeError::Parse {
            message: "missing `documents` array".to_string(),
        })?;
    let Some(first) = documents.first() else {
        return Err(GeocodeError::NotFound);
    };

    first["address"]["address_name"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| GeocodeError::Parse {
            message: "missing `address_name`".to_string(),
        })
}

/// The provider returns coordinates as strings; accept numbers too.
fn coordinate_field(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_forward_response() {
        let body = json!({
            "documents": [
                { "x": "127.0311", "y": "37.5005" },
                { "x": "127.9999", "y": "37.9999" }
            ]
        });
        let (lat, lon) = parse_forward(&body).unwrap();
        assert!((lat - 37.5005).abs() < 1e-9);
        assert!((lon - 127.0311).abs() < 1e-9);
    }

    #[test]
    fn empty_documents_is_not_found() {
        let body = json!({ "documents": [] });
        assert!(matches!(parse_forward(&body), Err(GeocodeError::NotFound)));
        assert!(matches!(parse_reverse(&body), Err(GeocodeError::NotFound)));
    }

    #[test]
    fn parses_reverse_response() {
        let body = json!({
            "documents": [
                { "address": { "address_name": "Seoul Gangnam-gu Yeoksam-dong 123-1" } }
            ]
        });
        assert_eq!(
            parse_reverse(&body).unwrap(),
            "Seoul Gangnam-gu Yeoksam-dong 123-1"
        );
    }

    #[test]
    fn malformed_coordinates_are_parse_errors() {
        let body = json!({ "documents": [ { "x": "not-a-number", "y": "37.5" } ] });
        assert!(matches!(parse_forward(&body), Err(GeocodeError::Parse { .. })));
    }

    #[test]
    fn missing_documents_is_a_parse_error() {
        assert!(matches!(
            parse_forward(&json!({})),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
