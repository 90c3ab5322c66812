#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation over fetched listings.
//!
//! Two order-independent computations: per-listing amenity counts
//! ([`amenity`]) and average price/area over a comparable set
//! ([`compare`]). Neither filters its input — inclusion rules run
//! upstream in the acquisition layer, so the averages here are exactly
//! sum over count of what was passed in.

pub mod amenity;

use estate_map_listing_models::{ComparableListing, ComparisonResult};
use thiserror::Error;

/// Errors from comparison aggregation.
#[derive(Debug, Error)]
pub enum CompareError {
    /// The comparable set was empty. Terminal for the request; there is
    /// nothing to average.
    #[error("No comparable listings found")]
    NoComparables,
}

/// Computes average price and area over `comparables` and whether
/// `target_price` beats the average.
///
/// Average price rounds to the nearest integer; average area to one
/// decimal. "Cheaper" means strictly below the average.
///
/// # Errors
///
/// Returns [`CompareError::NoComparables`] when `comparables` is empty.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn compare(
    target_price: u64,
    comparables: Vec<ComparableListing>,
) -> Result<ComparisonResult, CompareError> {
    if comparables.is_empty() {
        return Err(CompareError::NoComparables);
    }

    let count = comparables.len() as f64;
    let total_price: u64 = comparables.iter().map(|c| c.price).sum();
    let total_area: f64 = comparables.iter().map(|c| c.area_m2).sum();

    let average_price = (total_price as f64 / count).round() as u64;
    let average_area = (total_area / count * 10.0).round() / 10.0;

    Ok(ComparisonResult {
        cheaper_than_average: target_price < average_price,
        average_price,
        average_area,
        comparables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_map_geometry::Location;
    use estate_map_listing_models::{ListingSource, effective_price};

    fn comparable(deposit: u64, monthly: u64, area_m2: f64) -> ComparableListing {
        ComparableListing {
            name: "comp".into(),
            address: "somewhere".into(),
            area_m2,
            deposit,
            monthly,
            price: effective_price(deposit, monthly),
            location: Location::new(37.5, 127.0),
            distance_km: 0.4,
            source: ListingSource::Article,
        }
    }

    #[test]
    fn averages_known_comparable_set() {
        // Effective prices 2650, 2200, 1800, 2250; areas 27.1..29.0.
        let comparables = vec![
            comparable(2000, 65, 27.1),
            comparable(1500, 70, 28.4),
            comparable(1000, 80, 26.4),
            comparable(1500, 75, 29.0),
        ];

        let result = compare(2000, comparables).unwrap();
        assert_eq!(result.average_price, 2225);
        assert!((result.average_area - 27.7).abs() < 1e-9);
        assert!(result.cheaper_than_average);
    }

    #[test]
    fn target_at_average_is_not_cheaper() {
        let comparables = vec![comparable(2000, 0, 20.0), comparable(3000, 0, 30.0)];
        let result = compare(2500, comparables).unwrap();
        assert_eq!(result.average_price, 2500);
        assert!(!result.cheaper_than_average);
    }

    #[test]
    fn empty_set_is_no_comparables() {
        assert!(matches!(
            compare(1000, Vec::new()),
            Err(CompareError::NoComparables)
        ));
    }

    #[test]
    fn no_hidden_filtering_inside_the_aggregator() {
        // A zero-area record still participates — filtering is the
        // acquisition layer's job.
        let comparables = vec![comparable(100, 0, 0.0), comparable(300, 0, 10.0)];
        let result = compare(500, comparables).unwrap();
        assert_eq!(result.comparables.len(), 2);
        assert_eq!(result.average_price, 200);
        assert!((result.average_area - 5.0).abs() < 1e-9);
    }
}
