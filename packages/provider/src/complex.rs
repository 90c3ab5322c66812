//! Direction-partitioned complex listings scoped to a sector.
//!
//! The upstream requires splitting a sector query across the eight
//! compass directions to keep individual responses small; each call
//! here covers one direction. Raw entries are filtered before they
//! become [`Listing`]s: entries with no price data at all or with zero
//! deal and lease counts are dropped, and whatever survives parsing is
//! kept only if its coordinate falls inside the sector boundary.

use estate_map_geometry::{Location, Sector};
use estate_map_listing_models::{
    AmenityCounts, AreaRange, Direction, Listing, PriceRange, PropertyType, TradeType,
    colon_joined,
};
use serde_json::Value;

use crate::parsing::{num_f64, num_u64, string_like};
use crate::{ProviderError, check_status};

/// Sentinel upper bound meaning "no filter" for the price and area
/// range parameters.
pub const NO_FILTER_MAX: u64 = 900_000_000;

/// Fetches the complex listings for one compass direction and filters
/// them to the sector boundary.
///
/// # Errors
///
/// Returns [`ProviderError`] if the request fails, the status is
/// non-2xx, or the response is not a listing array. Individual
/// malformed entries are skipped, not errors.
pub async fn fetch_direction(
    client: &reqwest::Client,
    base_url: &str,
    sector: &Sector,
    direction: Direction,
    trades: &[TradeType],
    types: &[PropertyType],
) -> Result<Vec<Listing>, ProviderError> {
    let url = format!("{base_url}/complexes/single-markers/2.0");
    let response = client
        .get(&url)
        .query(&query_params(sector, direction, trades, types))
        .send()
        .await?;

    let body: Value = check_status(response)?.json().await?;
    parse_listings(&body, sector, direction)
}

fn query_params(
    sector: &Sector,
    direction: Direction,
    trades: &[TradeType],
    types: &[PropertyType],
) -> Vec<(&'static str, String)> {
    let around = sector.location.around_box();
    vec![
        ("cortarNo", sector.id.clone()),
        ("zoom", sector.location.zoom.to_string()),
        ("priceType", "RETAIL".to_string()),
        ("markerId", String::new()),
        ("markerType", String::new()),
        ("selectedComplexNo", String::new()),
        ("selectedComplexBuildingNo", String::new()),
        ("fakeComplexMarker", String::new()),
        ("tag", "::::::::".to_string()),
        ("rentPriceMin", "0".to_string()),
        ("rentPriceMax", NO_FILTER_MAX.to_string()),
        ("priceMin", "0".to_string()),
        ("priceMax", NO_FILTER_MAX.to_string()),
        ("areaMin", "0".to_string()),
        ("areaMax", NO_FILTER_MAX.to_string()),
        ("oldBuildYears", String::new()),
        ("recentlyBuildYears", String::new()),
        ("minHouseHoldCount", String::new()),
        ("maxHouseHoldCount", String::new()),
        ("showArticle", "true".to_string()),
        ("sameAddressGroup", "false".to_string()),
        ("minMaintenanceCost", String::new()),
        ("maxMaintenanceCost", String::new()),
        ("leftLon", around.left_lon.to_string()),
        ("rightLon", around.right_lon.to_string()),
        ("topLat", around.top_lat.to_string()),
        ("bottomLat", around.bottom_lat.to_string()),
        ("directions", direction.to_string()),
        ("tradeType", colon_joined(trades)),
        ("realEstateType", colon_joined(types)),
    ]
}

/// Parses a complex-listing response array, applying the pre-filters
/// and the sector containment test. Surviving listings are tagged with
/// the direction they were discovered under.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] when the response body is not an
/// array.
pub fn parse_listings(
    body: &Value,
    sector: &Sector,
    direction: Direction,
) -> Result<Vec<Listing>, ProviderError> {
    let items = body.as_array().ok_or_else(|| ProviderError::Parse {
        message: "complex response is not an array".to_string(),
    })?;

    let mut listings = Vec::new();
    for item in items {
        if item.get("minDealPrice").is_none() && item.get("minLeasePrice").is_none() {
            continue;
        }
        if item["dealCount"].as_u64().unwrap_or(0) == 0
            && item["leaseCount"].as_u64().unwrap_or(0) == 0
        {
            continue;
        }

        let Some(listing) = parse_listing(item, direction) else {
            log::warn!(
                "skipping malformed complex entry {}",
                item["complexName"].as_str().unwrap_or("<unnamed>")
            );
            continue;
        };

        if sector.map.contains(&listing.location) {
            listings.push(listing);
        }
    }
    Ok(listings)
}

fn parse_listing(item: &Value, direction: Direction) -> Option<Listing> {
    let name = string_like(&item["complexName"])?;
    let lat = num_f64(&item["latitude"])?;
    let lon = num_f64(&item["longitude"])?;

    Some(Listing {
        complex_id: string_like(&item["markerId"]),
        name,
        property_type: string_like(&item["realEstateTypeCode"]).unwrap_or_default(),
        build_time: string_like(&item["completionYearMonth"]).unwrap_or_default(),
        location: Location::new(lat, lon),
        area: AreaRange {
            min: num_f64(&item["minArea"]),
            max: num_f64(&item["maxArea"]),
            representative: num_f64(&item["representativeArea"]),
            floor_area_ratio: num_f64(&item["floorAreaRatio"]),
        },
        deal: PriceRange::from_raw(
            num_u64(&item["minDealPrice"]),
            num_u64(&item["maxDealPrice"]),
            num_u64(&item["medianDealPrice"]),
        ),
        lease: PriceRange::from_raw(
            num_u64(&item["minLeasePrice"]),
            num_u64(&item["maxLeasePrice"]),
            num_u64(&item["medianLeasePrice"]),
        ),
        deal_unit: PriceRange::from_raw(
            num_u64(&item["minDealUnitPrice"]),
            num_u64(&item["maxDealUnitPrice"]),
            num_u64(&item["medianDealUnitPrice"]),
        ),
        lease_unit: PriceRange::from_raw(
            num_u64(&item["minLeaseUnitPrice"]),
            num_u64(&item["maxLeaseUnitPrice"]),
            num_u64(&item["medianLeaseUnitPrice"]),
        ),
        direction: Some(direction),
        amenities: AmenityCounts::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_map_geometry::SectorMap;
    use serde_json::json;

    fn square_sector() -> Sector {
        Sector {
            name: "Test-dong".into(),
            location: Location::new(37.5, 127.0),
            id: "1100000000".into(),
            city: "Seoul".into(),
            division: "Test-gu".into(),
            map: SectorMap::from_vertex_rings(&[vec![
                [37.49, 126.99],
                [37.49, 127.01],
                [37.51, 127.01],
                [37.51, 126.99],
            ]]),
        }
    }

    fn entry(name: &str, lat: f64, lon: f64) -> Value {
        json!({
            "markerId": "101",
            "complexName": name,
            "realEstateTypeCode": "APT",
            "completionYearMonth": "201204",
            "latitude": lat,
            "longitude": lon,
            "dealCount": 2,
            "leaseCount": 1,
            "minArea": 59.0,
            "maxArea": 114.0,
            "representativeArea": 84.0,
            "floorAreaRatio": 249.0,
            "minDealPrice": 90_000,
            "maxDealPrice": 120_000,
            "minLeasePrice": 45_000,
            "maxLeasePrice": 60_000,
            "minDealUnitPrice": 1_070,
            "maxDealUnitPrice": 1_420,
            "minLeaseUnitPrice": 530,
            "maxLeaseUnitPrice": 710
        })
    }

    #[test]
    fn keeps_contained_listings_tagged_with_direction() {
        let body = json!([entry("Inside Palace", 37.5, 127.0)]);
        let listings = parse_listings(&body, &square_sector(), Direction::South).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Inside Palace");
        assert_eq!(listings[0].direction, Some(Direction::South));
        assert_eq!(listings[0].complex_id.as_deref(), Some("101"));
    }

    #[test]
    fn drops_listings_outside_the_sector() {
        let body = json!([entry("Far Away Towers", 37.6, 127.2)]);
        let listings = parse_listings(&body, &square_sector(), Direction::East).unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn skips_entries_without_any_price_fields() {
        let mut no_prices = entry("No Prices", 37.5, 127.0);
        let object = no_prices.as_object_mut().unwrap();
        object.remove("minDealPrice");
        object.remove("minLeasePrice");
        let listings =
            parse_listings(&json!([no_prices]), &square_sector(), Direction::East).unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn skips_entries_with_zero_deal_and_lease_counts() {
        let mut empty = entry("Ghost Complex", 37.5, 127.0);
        empty["dealCount"] = json!(0);
        empty["leaseCount"] = json!(0);
        let listings = parse_listings(&json!([empty]), &square_sector(), Direction::East).unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn skips_malformed_entries_without_failing_the_batch() {
        let mut broken = entry("Broken", 37.5, 127.0);
        broken.as_object_mut().unwrap().remove("latitude");
        let body = json!([broken, entry("Fine", 37.5, 127.0)]);
        let listings = parse_listings(&body, &square_sector(), Direction::East).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Fine");
    }

    #[test]
    fn zero_prices_normalize_to_absent() {
        let mut zero_lease = entry("Zero Lease", 37.5, 127.0);
        zero_lease["minLeasePrice"] = json!(0);
        zero_lease["maxLeasePrice"] = json!(0);
        let listings =
            parse_listings(&json!([zero_lease]), &square_sector(), Direction::East).unwrap();
        assert_eq!(listings[0].lease.min, None);
        assert_eq!(listings[0].lease.max, None);
        assert_eq!(listings[0].deal.min, Some(90_000));
    }

    #[test]
    fn non_array_body_is_a_parse_error() {
        let err = parse_listings(&json!({}), &square_sector(), Direction::East).unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
    }
}
