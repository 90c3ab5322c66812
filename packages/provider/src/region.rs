//! Region listing and paced batch sector resolution.
//!
//! Regions are the lightweight parent records used to enumerate
//! sectors in bulk (dataset building), not the per-request hot path.
//! Batch resolution is deliberately slow: the provider rate-limits
//! aggressively, so the walk pauses between every `interval` lookups
//! and backs off hard after a failure.

use std::time::Duration;

use estate_map_geometry::{Location, Region, Sector};
use serde_json::Value;

use crate::parsing::{num_f64, string_like};
use crate::{ProviderError, check_status, sector};

/// Root region code covering the whole country.
pub const ROOT_REGION_CODE: &str = "0000000000";

/// Pause taken after a failed sector lookup before continuing the walk.
const ERROR_BACKOFF: Duration = Duration::from_secs(20);

/// Lists the child regions of `parent_code`.
///
/// # Errors
///
/// Returns [`ProviderError`] if the request fails or the response has
/// no region list.
pub async fn list(
    client: &reqwest::Client,
    base_url: &str,
    parent_code: &str,
) -> Result<Vec<Region>, ProviderError> {
    let url = format!("{base_url}/regions/list");
    let response = client
        .get(&url)
        .query(&[("cortarNo", parent_code)])
        .send()
        .await?;

    let body: Value = check_status(response)?.json().await?;
    parse_regions(&body)
}

/// Parses a region list response. Malformed entries are skipped with a
/// warning rather than failing the batch.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] when the region list itself is
/// absent.
pub fn parse_regions(body: &Value) -> Result<Vec<Region>, ProviderError> {
    let entries = body["regionList"]
        .as_array()
        .ok_or_else(|| ProviderError::Parse {
            message: "missing field `regionList`".to_string(),
        })?;

    let mut regions = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = string_like(&entry["cortarName"]);
        let id = string_like(&entry["cortarNo"]);
        let lat = num_f64(&entry["centerLat"]);
        let lon = num_f64(&entry["centerLon"]);
        match (name, id, lat, lon) {
            (Some(name), Some(id), Some(lat), Some(lon)) => regions.push(Region {
                name,
                location: Location::new(lat, lon),
                id,
            }),
            _ => log::warn!("skipping malformed region entry: {entry}"),
        }
    }
    Ok(regions)
}

/// Resolves a sector for every region, pacing requests to stay under
/// the provider's rate limit.
///
/// Sleeps `pace` after every `interval` successful lookups. A failed
/// lookup is logged, the region is collected into the returned failure
/// list, and the walk continues after a longer pause.
pub async fn resolve_many(
    client: &reqwest::Client,
    base_url: &str,
    regions: &[Region],
    pace: Duration,
    interval: usize,
) -> (Vec<Sector>, Vec<Region>) {
    let mut sectors = Vec::with_capacity(regions.len());
    let mut failed = Vec::new();
    let mut since_pause = 0_usize;

    for region in regions {
        match sector::resolve(client, base_url, &region.location).await {
            Ok(sector) => {
                sectors.push(sector);
                since_pause += 1;
                if since_pause >= interval.max(1) {
                    tokio::time::sleep(pace).await;
                    since_pause = 0;
                }
            }
            Err(e) => {
                log::warn!("sector lookup failed for {region}: {e}");
                failed.push(region.clone());
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }

    (sectors, failed)
}
