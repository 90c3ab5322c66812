//! Amenity (point-of-interest) lookups around a sector.
//!
//! One request per query category, all run concurrently. Schools come
//! from a dedicated endpoint and are split into public/private by the
//! organization-type field; every other category goes through the
//! neighborhoods endpoint with a `type` parameter. Daycare and
//! preschool results get a name-granularity dedup because the provider
//! returns the same facility at several naming granularities for those
//! two categories.

use estate_map_geometry::{Location, Sector};
use estate_map_listing_models::{AmenityCategory, AmenityPoint, AmenityQuery};
use futures::stream::{self, StreamExt as _};
use serde_json::Value;

use crate::parsing::{num_f64, string_like};
use crate::{ProviderError, SHORT_TIMEOUT, check_status};

/// Organization-type value marking a public school.
const PUBLIC_SCHOOL_ORG_TYPE: &str = "공립";

/// Fetches one amenity category for a sector.
///
/// # Errors
///
/// Returns [`ProviderError`] if the request fails or the response has
/// no point array. Individual malformed points are skipped.
pub async fn fetch_category(
    client: &reqwest::Client,
    base_url: &str,
    sector: &Sector,
    query: AmenityQuery,
) -> Result<Vec<AmenityPoint>, ProviderError> {
    let around = sector.location.around_box();
    let mut params = vec![
        ("leftLon", around.left_lon.to_string()),
        ("rightLon", around.right_lon.to_string()),
        ("topLat", around.top_lat.to_string()),
        ("bottomLat", around.bottom_lat.to_string()),
        ("zoom", sector.location.zoom.to_string()),
    ];

    let url = if query == AmenityQuery::School {
        format!("{base_url}/schools")
    } else {
        params.push(("type", query.to_string()));
        format!("{base_url}/regions/neighborhoods")
    };

    let response = client
        .get(&url)
        .query(&params)
        .timeout(SHORT_TIMEOUT)
        .send()
        .await?;
    let body: Value = check_status(response)?.json().await?;

    let points = if query == AmenityQuery::School {
        parse_schools(&body)?
    } else {
        parse_neighborhood_points(&body, category_for(query))?
    };

    Ok(match query {
        AmenityQuery::Daycare | AmenityQuery::Preschool => dedup_name_granularity(points),
        _ => points,
    })
}

/// Fetches every amenity category concurrently and flattens the
/// results. A failed category is logged and contributes nothing; the
/// sweep never fails as a whole.
pub async fn fetch_all(
    client: &reqwest::Client,
    base_url: &str,
    sector: &Sector,
) -> Vec<AmenityPoint> {
    async fn run_category(
        client: &reqwest::Client,
        base_url: &str,
        sector: &Sector,
        query: AmenityQuery,
    ) -> (AmenityQuery, Result<Vec<AmenityPoint>, ProviderError>) {
        (query, fetch_category(client, base_url, sector, query).await)
    }

    let results: Vec<(AmenityQuery, Result<Vec<AmenityPoint>, ProviderError>)> =
        stream::iter(
            AmenityQuery::EACH
                .into_iter()
                .map(|query| run_category(client, base_url, sector, query)),
        )
        .buffer_unordered(AmenityQuery::EACH.len())
        .collect()
        .await;

    let mut points = Vec::new();
    for (query, result) in results {
        match result {
            Ok(mut batch) => {
                log::debug!("amenity category {query}: {} points", batch.len());
                points.append(&mut batch);
            }
            Err(e) => log::warn!("amenity category {query} failed, skipping: {e}"),
        }
    }
    points
}

/// Maps a wire query category to its annotation category. Schools
/// never pass through here; they split public/private at parse time.
fn category_for(query: AmenityQuery) -> AmenityCategory {
    match query {
        AmenityQuery::Bus => AmenityCategory::Bus,
        AmenityQuery::Metro => AmenityCategory::Metro,
        AmenityQuery::Daycare => AmenityCategory::Daycare,
        AmenityQuery::Preschool => AmenityCategory::Preschool,
        AmenityQuery::Hospital => AmenityCategory::Hospital,
        AmenityQuery::Parking => AmenityCategory::Parking,
        AmenityQuery::Mart => AmenityCategory::Mart,
        AmenityQuery::Convenience => AmenityCategory::Convenience,
        AmenityQuery::Laundry => AmenityCategory::Laundry,
        AmenityQuery::Bank => AmenityCategory::Bank,
        AmenityQuery::Office => AmenityCategory::Office,
        AmenityQuery::School => unreachable!("schools are parsed via parse_schools"),
    }
}

/// Parses a neighborhoods response into points of one category.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] when the `neighborhoods` array is
/// absent.
pub fn parse_neighborhood_points(
    body: &Value,
    category: AmenityCategory,
) -> Result<Vec<AmenityPoint>, ProviderError> {
    let entries = body["neighborhoods"]
        .as_array()
        .ok_or_else(|| ProviderError::Parse {
            message: "amenity response has no `neighborhoods` array".to_string(),
        })?;

    let mut points = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = string_like(&entry["name"]);
        let lat = num_f64(&entry["latitude"]);
        let lon = num_f64(&entry["longitude"]);
        match (name, lat, lon) {
            (Some(name), Some(lat), Some(lon)) => points.push(AmenityPoint {
                category,
                name,
                location: Location::new(lat, lon),
            }),
            _ => log::warn!("skipping malformed amenity point"),
        }
    }
    Ok(points)
}

/// Parses the school endpoint's bare array, splitting entries into
/// public and private schools.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] when the body is not an array.
pub fn parse_schools(body: &Value) -> Result<Vec<AmenityPoint>, ProviderError> {
    let entries = body.as_array().ok_or_else(|| ProviderError::Parse {
        message: "school response is not an array".to_string(),
    })?;

    let mut points = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = string_like(&entry["schoolName"]);
        let lat = num_f64(&entry["latitude"]);
        let lon = num_f64(&entry["longitude"]);
        match (name, lat, lon) {
            (Some(name), Some(lat), Some(lon)) => {
                let category = if entry["organizationType"].as_str() == Some(PUBLIC_SCHOOL_ORG_TYPE)
                {
                    AmenityCategory::PublicSchool
                } else {
                    AmenityCategory::PrivateSchool
                };
                points.push(AmenityPoint {
                    category,
                    name,
                    location: Location::new(lat, lon),
                });
            }
            _ => log::warn!("skipping malformed school entry"),
        }
    }
    Ok(points)
}

/// Collapses duplicate facilities listed at several name granularities:
/// keeps the shortest name and drops entries whose names strictly
/// contain it (e.g. a branch suffix on the same facility name).
#[must_use]
pub fn dedup_name_granularity(points: Vec<AmenityPoint>) -> Vec<AmenityPoint> {
    let mut remaining = points;
    remaining.sort_by(|a, b| b.name.len().cmp(&a.name.len()));

    let mut kept = Vec::with_capacity(remaining.len());
    while let Some(point) = remaining.pop() {
        remaining.retain(|other| !(other.name.contains(&point.name) && other.name != point.name));
        kept.push(point);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(category: AmenityCategory, name: &str) -> AmenityPoint {
        AmenityPoint {
            category,
            name: name.to_string(),
            location: Location::new(37.5, 127.0),
        }
    }

    #[test]
    fn parses_neighborhood_points() {
        let body = json!({
            "neighborhoods": [
                { "name": "Central Stop", "latitude": 37.5, "longitude": 127.0 },
                { "name": "Broken" }
            ]
        });
        let points = parse_neighborhood_points(&body, AmenityCategory::Bus).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].category, AmenityCategory::Bus);
        assert_eq!(points[0].name, "Central Stop");
    }

    #[test]
    fn splits_schools_by_organization_type() {
        let body = json!([
            { "schoolName": "First Elementary", "organizationType": "공립",
              "latitude": 37.5, "longitude": 127.0 },
            { "schoolName": "Hope Academy", "organizationType": "사립",
              "latitude": 37.51, "longitude": 127.01 },
            { "schoolName": "No Org Type", "latitude": 37.52, "longitude": 127.02 }
        ]);
        let points = parse_schools(&body).unwrap();
        assert_eq!(points[0].category, AmenityCategory::PublicSchool);
        assert_eq!(points[1].category, AmenityCategory::PrivateSchool);
        assert_eq!(points[2].category, AmenityCategory::PrivateSchool);
    }

    #[test]
    fn dedup_keeps_shortest_name_and_drops_superstrings() {
        let points = vec![
            point(AmenityCategory::Daycare, "Rainbow Daycare Annex"),
            point(AmenityCategory::Daycare, "Rainbow Daycare"),
            point(AmenityCategory::Daycare, "Sunshine Daycare"),
        ];
        let deduped = dedup_name_granularity(points);
        let names: Vec<&str> = deduped.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"Rainbow Daycare"));
        assert!(names.contains(&"Sunshine Daycare"));
        assert!(!names.contains(&"Rainbow Daycare Annex"));
    }

    #[test]
    fn dedup_keeps_identical_names() {
        let points = vec![
            point(AmenityCategory::Preschool, "Little Stars"),
            point(AmenityCategory::Preschool, "Little Stars"),
        ];
        assert_eq!(dedup_name_granularity(points).len(), 2);
    }
}
