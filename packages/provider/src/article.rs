//! Clustered article listings, the fallback path for property types the
//! complex endpoint underserves (studios, low-rise housing).
//!
//! Keyed by a raw bounding box around the query point rather than a
//! sector id, and wider than the sector-scoped box. Only the first page
//! is fetched; the cluster endpoint front-loads the closest results and
//! deeper pages add little for a comparison set.

use estate_map_geometry::Location;
use estate_map_listing_models::{PropertyType, TradeType, colon_joined};
use serde_json::Value;

use crate::parsing::{num_f64, num_u64, string_like};
use crate::{ProviderError, check_status};

/// An article entry as parsed from the cluster endpoint, before
/// reverse geocoding and normalization into a comparable.
#[derive(Debug, Clone)]
pub struct RawArticle {
    /// Listing display name.
    pub name: String,
    /// Property-type display name from the provider.
    pub type_name: String,
    /// Deposit in ten-thousand-won units (0 when absent).
    pub deposit: u64,
    /// Monthly rent in ten-thousand-won units (0 when absent).
    pub monthly: u64,
    /// Exclusive area in square meters (0.0 when absent).
    pub area_m2: f64,
    /// Listing location.
    pub location: Location,
}

/// Fetches one page of article listings around `location`.
///
/// # Errors
///
/// Returns [`ProviderError`] if the request fails, the status is
/// non-2xx, or the response body carries no article array. Individual
/// malformed articles are skipped.
pub async fn fetch(
    client: &reqwest::Client,
    base_url: &str,
    location: &Location,
    trades: &[TradeType],
    types: &[PropertyType],
    page: u32,
) -> Result<Vec<RawArticle>, ProviderError> {
    let bbox = location.cluster_box();
    let url = format!("{base_url}/articleList");
    let response = client
        .get(&url)
        .query(&[
            ("rletTpCd", colon_joined(types)),
            ("tradTpCd", colon_joined(trades)),
            ("z", location.zoom.to_string()),
            ("lat", location.lat.to_string()),
            ("lon", location.lon.to_string()),
            ("btm", bbox.bottom_lat.to_string()),
            ("lft", bbox.left_lon.to_string()),
            ("top", bbox.top_lat.to_string()),
            ("rgt", bbox.right_lon.to_string()),
            ("page", page.to_string()),
        ])
        .send()
        .await?;

    let body: Value = check_status(response)?.json().await?;
    parse_articles(&body)
}

/// Parses the article array out of a cluster response body.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] when the `body` array is absent.
pub fn parse_articles(body: &Value) -> Result<Vec<RawArticle>, ProviderError> {
    let items = body["body"].as_array().ok_or_else(|| ProviderError::Parse {
        message: "article response has no `body` array".to_string(),
    })?;

    let mut articles = Vec::with_capacity(items.len());
    for item in items {
        let Some(lat) = num_f64(&item["lat"]) else {
            log::warn!("skipping article without a latitude");
            continue;
        };
        let Some(lon) = num_f64(&item["lng"]) else {
            log::warn!("skipping article without a longitude");
            continue;
        };

        articles.push(RawArticle {
            name: string_like(&item["atclNm"]).unwrap_or_default(),
            type_name: string_like(&item["rletTpNm"]).unwrap_or_default(),
            deposit: num_u64(&item["prc"]).unwrap_or(0),
            monthly: num_u64(&item["rentPrc"]).unwrap_or(0),
            area_m2: num_f64(&item["spc2"]).unwrap_or(0.0),
            location: Location::new(lat, lon),
        });
    }
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_articles_with_string_and_numeric_fields() {
        let body = json!({
            "body": [
                { "atclNm": "Sunny Studio", "rletTpNm": "One-room",
                  "prc": 2000, "rentPrc": 65, "spc2": "27.1",
                  "lat": "37.5005", "lng": "127.0311" },
                { "atclNm": "Hill Villa", "rletTpNm": "Villa",
                  "prc": "1500", "rentPrc": "70", "spc2": 28.4,
                  "lat": 37.5012, "lng": 127.0308 }
            ]
        });
        let articles = parse_articles(&body).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].name, "Sunny Studio");
        assert_eq!(articles[0].deposit, 2000);
        assert_eq!(articles[0].monthly, 65);
        assert!((articles[0].area_m2 - 27.1).abs() < f64::EPSILON);
        assert!((articles[1].location.lat - 37.5012).abs() < f64::EPSILON);
    }

    #[test]
    fn absent_price_and_area_default_to_zero() {
        let body = json!({
            "body": [
                { "atclNm": "Bare", "lat": 37.5, "lng": 127.0 }
            ]
        });
        let articles = parse_articles(&body).unwrap();
        assert_eq!(articles[0].deposit, 0);
        assert_eq!(articles[0].monthly, 0);
        assert!((articles[0].area_m2 - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn skips_articles_without_coordinates() {
        let body = json!({
            "body": [
                { "atclNm": "No Coords", "prc": 1000 },
                { "atclNm": "Good", "lat": 37.5, "lng": 127.0 }
            ]
        });
        let articles = parse_articles(&body).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].name, "Good");
    }

    #[test]
    fn missing_body_array_is_a_parse_error() {
        assert!(parse_articles(&json!({})).is_err());
    }
}
