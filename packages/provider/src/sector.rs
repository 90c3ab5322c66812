//! Sector resolution: center coordinate → administrative region with a
//! polygon boundary.
//!
//! This layer does no retrying of its own; [`resolve_with_backoff`]
//! layers the rate-limit policy from [`crate::retry`] on top for
//! callers on the complex-listing path. A sector that cannot be parsed
//! is fatal for the request — without a boundary there is nothing to
//! test containment against.

use estate_map_geometry::{Location, Sector, SectorMap};
use serde_json::Value;

use crate::parsing::{required_f64, required_string};
use crate::retry::{MAX_RATE_LIMIT_RETRIES, RATE_LIMIT_BASE_DELAY, with_rate_limit_backoff};
use crate::{ProviderError, check_status};

/// Resolves the sector containing `location`.
///
/// # Errors
///
/// Returns [`ProviderError::RateLimited`] on HTTP 429,
/// [`ProviderError::Status`] / [`ProviderError::Http`] on other
/// transport failures, and [`ProviderError::Parse`] when a required
/// field is absent from the response.
pub async fn resolve(
    client: &reqwest::Client,
    base_url: &str,
    location: &Location,
) -> Result<Sector, ProviderError> {
    let url = format!("{base_url}/cortars");
    let response = client
        .get(&url)
        .query(&[
            ("centerLat", location.lat.to_string()),
            ("centerLon", location.lon.to_string()),
            ("zoom", location.zoom.to_string()),
        ])
        .send()
        .await?;

    let body: Value = check_status(response)?.json().await?;
    parse_sector(&body)
}

/// [`resolve`] with the standard linear 429 backoff applied.
///
/// # Errors
///
/// As [`resolve`]; persistent rate limiting surfaces as
/// [`ProviderError::RateLimited`] with the retry budget spent.
pub async fn resolve_with_backoff(
    client: &reqwest::Client,
    base_url: &str,
    location: &Location,
) -> Result<Sector, ProviderError> {
    with_rate_limit_backoff(
        || resolve(client, base_url, location),
        MAX_RATE_LIMIT_RETRIES,
        RATE_LIMIT_BASE_DELAY,
    )
    .await
}

/// Parses a sector descriptor into a [`Sector`].
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] when any required field is missing;
/// sector parsing is all-or-nothing.
pub fn parse_sector(body: &Value) -> Result<Sector, ProviderError> {
    let name = required_string(body, "sectorName")?;
    let id = required_string(body, "sectorNo")?;
    let city = required_string(body, "cityName")?;
    let division = required_string(body, "divisionName")?;
    let lat = required_f64(body, "centerLat")?;
    let lon = required_f64(body, "centerLon")?;

    let rings = parse_vertex_rings(&body["cortarVertexLists"])?;

    Ok(Sector {
        name,
        location: Location::new(lat, lon),
        id,
        city,
        division,
        map: SectorMap::from_vertex_rings(&rings),
    })
}

/// Parses the boundary vertex rings: a list of rings, each an ordered
/// list of `[lat, lon]` pairs.
fn parse_vertex_rings(value: &Value) -> Result<Vec<Vec<[f64; 2]>>, ProviderError> {
    let rings = value.as_array().ok_or_else(|| ProviderError::Parse {
        message: "missing field `cortarVertexLists`".to_string(),
    })?;

    rings
        .iter()
        .map(|ring| {
            let vertices = ring.as_array().ok_or_else(|| ProviderError::Parse {
                message: "boundary ring is not an array".to_string(),
            })?;
            vertices
                .iter()
                .map(|vertex| {
                    let pair = vertex.as_array().filter(|p| p.len() >= 2).ok_or_else(|| {
                        ProviderError::Parse {
                            message: "boundary vertex is not a [lat, lon] pair".to_string(),
                        }
                    })?;
                    let lat = crate::parsing::num_f64(&pair[0]);
                    let lon = crate::parsing::num_f64(&pair[1]);
                    match (lat, lon) {
                        (Some(lat), Some(lon)) => Ok([lat, lon]),
                        _ => Err(ProviderError::Parse {
                            message: "boundary vertex is not numeric".to_string(),
                        }),
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sector_body() -> Value {
        json!({
            "sectorName": "Yeoksam-dong",
            "sectorNo": "1168010100",
            "cityName": "Seoul",
            "divisionName": "Gangnam-gu",
            "centerLat": 37.5006,
            "centerLon": 127.0365,
            "cortarVertexLists": [
                [[37.49, 127.02], [37.49, 127.05], [37.51, 127.05], [37.51, 127.02]]
            ]
        })
    }

    #[test]
    fn parses_full_descriptor() {
        let sector = parse_sector(&sector_body()).unwrap();
        assert_eq!(sector.name, "Yeoksam-dong");
        assert_eq!(sector.id, "1168010100");
        assert_eq!(sector.city, "Seoul");
        assert_eq!(sector.division, "Gangnam-gu");
        assert!(sector.map.contains(&estate_map_geometry::Location::new(37.5, 127.03)));
        assert!(!sector.map.contains(&estate_map_geometry::Location::new(37.6, 127.03)));
    }

    #[test]
    fn numeric_sector_id_is_stringified() {
        let mut body = sector_body();
        body["sectorNo"] = json!(1_168_010_100_u64);
        let sector = parse_sector(&body).unwrap();
        assert_eq!(sector.id, "1168010100");
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let mut body = sector_body();
        body.as_object_mut().unwrap().remove("sectorName");
        let err = parse_sector(&body).unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
        assert!(err.to_string().contains("sectorName"));
    }

    #[test]
    fn missing_vertex_lists_is_fatal() {
        let mut body = sector_body();
        body.as_object_mut().unwrap().remove("cortarVertexLists");
        assert!(parse_sector(&body).is_err());
    }

    #[test]
    fn empty_rings_produce_an_empty_map() {
        let mut body = sector_body();
        body["cortarVertexLists"] = json!([[]]);
        let sector = parse_sector(&body).unwrap();
        assert!(sector.map.is_empty());
    }
}
