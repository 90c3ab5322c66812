//! Per-listing amenity counts.
//!
//! A nested listing × amenity comparison: an amenity point counts for a
//! listing when their rounded great-circle distance is within the
//! category's threshold (inclusive). Quadratic, which is fine at
//! single-sector scale — tens to low hundreds on each side.

use estate_map_geometry::{Location, distance_between};
use estate_map_listing_models::{AmenityCounts, AmenityPoint, Listing};

/// Counts amenities within their category thresholds of `location`.
#[must_use]
pub fn counts_for(location: &Location, amenities: &[AmenityPoint]) -> AmenityCounts {
    let mut counts = AmenityCounts::new();
    for amenity in amenities {
        let distance = distance_between(location, &amenity.location);
        if distance <= amenity.category.distance_threshold_m() {
            counts.increment(amenity.category);
        }
    }
    counts
}

/// Recomputes the amenity annotation on every listing.
pub fn annotate(listings: &mut [Listing], amenities: &[AmenityPoint]) {
    for listing in listings.iter_mut() {
        listing.amenities = counts_for(&listing.location, amenities);
    }
    log::debug!(
        "annotated {} listings against {} amenity points",
        listings.len(),
        amenities.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_map_listing_models::{AmenityCategory, AreaRange, PriceRange};

    /// Mean earth radius used by the haversine distance.
    const EARTH_RADIUS_M: f64 = 6_371_008.8;

    fn offset_by_meters(base: &Location, meters: f64) -> Location {
        let delta = meters / (EARTH_RADIUS_M * std::f64::consts::PI / 180.0);
        Location::new(base.lat + delta, base.lon)
    }

    fn amenity(category: AmenityCategory, location: Location) -> AmenityPoint {
        AmenityPoint {
            category,
            name: "poi".into(),
            location,
        }
    }

    fn listing_at(location: Location) -> Listing {
        Listing {
            complex_id: None,
            name: "listing".into(),
            property_type: "APT".into(),
            build_time: String::new(),
            location,
            area: AreaRange::default(),
            deal: PriceRange::default(),
            lease: PriceRange::default(),
            deal_unit: PriceRange::default(),
            lease_unit: PriceRange::default(),
            direction: None,
            amenities: AmenityCounts::new(),
        }
    }

    #[test]
    fn threshold_is_inclusive_at_the_boundary() {
        let here = Location::new(37.5, 127.0);
        let near = amenity(AmenityCategory::Convenience, offset_by_meters(&here, 299.0));
        let at_limit = amenity(AmenityCategory::Convenience, offset_by_meters(&here, 300.0));
        let beyond = amenity(AmenityCategory::Convenience, offset_by_meters(&here, 301.0));

        let counts = counts_for(&here, &[near, at_limit, beyond]);
        assert_eq!(counts.get(AmenityCategory::Convenience), 2);
    }

    #[test]
    fn thresholds_apply_per_category() {
        let here = Location::new(37.5, 127.0);
        let at_800 = offset_by_meters(&here, 800.0);

        // 800 m: inside a hospital's 2000 m radius, outside a bus
        // stop's 500 m radius.
        let counts = counts_for(
            &here,
            &[
                amenity(AmenityCategory::Hospital, at_800),
                amenity(AmenityCategory::Bus, at_800),
            ],
        );
        assert_eq!(counts.get(AmenityCategory::Hospital), 1);
        assert_eq!(counts.get(AmenityCategory::Bus), 0);
    }

    #[test]
    fn annotate_replaces_previous_counts() {
        let here = Location::new(37.5, 127.0);
        let mut listings = vec![listing_at(here)];
        listings[0].amenities.increment(AmenityCategory::Bank);

        let nearby = amenity(AmenityCategory::Metro, offset_by_meters(&here, 100.0));
        annotate(&mut listings, &[nearby]);

        assert_eq!(listings[0].amenities.get(AmenityCategory::Metro), 1);
        assert_eq!(
            listings[0].amenities.get(AmenityCategory::Bank),
            0,
            "stale counts are discarded"
        );
    }
}
