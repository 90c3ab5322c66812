#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate and geometry model for sector-bounded listing queries.
//!
//! A [`Location`] is a WGS84 point plus the zoom level sent alongside it
//! in upstream queries. A [`Sector`] is a provider-defined administrative
//! region whose boundary is one or more polygon rings; [`SectorMap`]
//! answers point-in-region queries against that ring set. Distances are
//! great-circle meters via the `geo` crate's haversine implementation.
//!
//! The bounding-box deltas here are fixed degree offsets, intentionally
//! independent of the zoom level carried next to them — that is the
//! observed behavior of the upstream query contract, not an oversight.

pub mod raster;

use geo::{Contains, Coord, Distance, Haversine, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Longitude half-width of the "around" box sent to sector-scoped
/// endpoints (complex listings, amenity categories).
pub const AROUND_LON_DELTA: f64 = 0.013_732_9;

/// Latitude half-height of the "around" box.
pub const AROUND_LAT_DELTA: f64 = 0.006_978_6;

/// Latitude half-height of the wider box used by the clustered
/// article-list endpoint.
pub const CLUSTER_LAT_DELTA: f64 = 0.005;

/// Longitude half-width of the clustered article-list box.
pub const CLUSTER_LON_DELTA: f64 = 0.01;

/// Default zoom level for upstream queries.
pub const DEFAULT_ZOOM: u8 = 16;

/// A WGS84 coordinate with the zoom level used for upstream queries.
///
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Zoom level passed through to upstream queries.
    pub zoom: u8,
}

impl Location {
    /// Creates a location at the default zoom level.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            zoom: DEFAULT_ZOOM,
        }
    }

    /// Returns a copy with a different zoom level.
    #[must_use]
    pub const fn with_zoom(self, zoom: u8) -> Self {
        Self { zoom, ..self }
    }

    /// The fixed-delta bounding box used by sector-scoped queries.
    #[must_use]
    pub fn around_box(&self) -> BoundingBox {
        BoundingBox {
            left_lon: self.lon - AROUND_LON_DELTA,
            right_lon: self.lon + AROUND_LON_DELTA,
            top_lat: self.lat + AROUND_LAT_DELTA,
            bottom_lat: self.lat - AROUND_LAT_DELTA,
        }
    }

    /// The wider fixed-delta box used by the clustered article-list
    /// endpoint.
    #[must_use]
    pub fn cluster_box(&self) -> BoundingBox {
        BoundingBox {
            left_lon: self.lon - CLUSTER_LON_DELTA,
            right_lon: self.lon + CLUSTER_LON_DELTA,
            top_lat: self.lat + CLUSTER_LAT_DELTA,
            bottom_lat: self.lat - CLUSTER_LAT_DELTA,
        }
    }

    /// Quantizes the coordinate to `decimals` decimal places, for use as
    /// a cache key. 5 decimals is roughly 1 m of latitude, 4 roughly
    /// 11 m.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rounded_key(&self, decimals: u32) -> (i64, i64) {
        let factor = f64::from(10_u32.pow(decimals));
        (
            (self.lat * factor).round() as i64,
            (self.lon * factor).round() as i64,
        )
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "loc({} | {})", self.lat, self.lon)
    }
}

/// An axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western edge longitude.
    pub left_lon: f64,
    /// Eastern edge longitude.
    pub right_lon: f64,
    /// Northern edge latitude.
    pub top_lat: f64,
    /// Southern edge latitude.
    pub bottom_lat: f64,
}

/// Great-circle distance between two locations in meters.
#[must_use]
pub fn distance_m(a: &Location, b: &Location) -> f64 {
    Haversine.distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

/// Great-circle distance rounded to whole meters.
///
/// Amenity thresholds compare against this rounded value, so a pair of
/// points 299.6 m apart counts as 300 m.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn distance_between(a: &Location, b: &Location) -> u32 {
    distance_m(a, b).round().max(0.0) as u32
}

/// The polygon boundary of a sector.
///
/// A sector can have several disjoint rings (exclaves); containment is
/// true if the point falls inside **any** ring. Containment is
/// boundary-exclusive: a point exactly on a ring edge is outside.
#[derive(Debug, Clone)]
pub struct SectorMap {
    rings: Vec<Vec<[f64; 2]>>,
    polygons: MultiPolygon<f64>,
}

impl SectorMap {
    /// Builds a map from raw vertex rings as the sector endpoint returns
    /// them: each ring an ordered list of `[lat, lon]` pairs. Empty
    /// rings are skipped.
    #[must_use]
    pub fn from_vertex_rings(rings: &[Vec<[f64; 2]>]) -> Self {
        let rings: Vec<Vec<[f64; 2]>> = rings.iter().filter(|r| !r.is_empty()).cloned().collect();

        let polygons = rings
            .iter()
            .map(|ring| {
                let exterior = LineString::from(
                    ring.iter()
                        .map(|&[lat, lon]| Coord { x: lon, y: lat })
                        .collect::<Vec<_>>(),
                );
                Polygon::new(exterior, vec![])
            })
            .collect::<Vec<_>>();

        Self {
            rings,
            polygons: MultiPolygon(polygons),
        }
    }

    /// True if the location falls inside any of the sector's rings.
    #[must_use]
    pub fn contains(&self, loc: &Location) -> bool {
        let point = Point::new(loc.lon, loc.lat);
        self.polygons.iter().any(|poly| poly.contains(&point))
    }

    /// The raw vertex rings, in `[lat, lon]` order.
    #[must_use]
    pub fn rings(&self) -> &[Vec<[f64; 2]>] {
        &self.rings
    }

    /// True if the sector has no usable boundary rings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Builds the raster transform for this boundary, if it has any
    /// vertices.
    #[must_use]
    pub fn dimension(&self) -> Option<raster::Dimension> {
        raster::Dimension::from_rings(&self.rings)
    }
}

/// A provider-defined administrative region with a polygon boundary,
/// the unit of complex-listing queries.
#[derive(Debug, Clone)]
pub struct Sector {
    /// Region name (e.g. a neighborhood or dong).
    pub name: String,
    /// Centroid reported by the provider.
    pub location: Location,
    /// Provider-assigned region identifier.
    pub id: String,
    /// City label.
    pub city: String,
    /// Division (district) label.
    pub division: String,
    /// Polygon boundary set.
    pub map: SectorMap,
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.city, self.division, self.name, self.id, self.location
        )
    }
}

/// Lightweight region record used for batch sector resolution.
#[derive(Debug, Clone)]
pub struct Region {
    /// Region name.
    pub name: String,
    /// Region centroid.
    pub location: Location,
    /// Provider-assigned region identifier.
    pub id: String,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.name, self.id, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mean earth radius used by `geo`'s haversine implementation.
    const EARTH_RADIUS_M: f64 = 6_371_008.8;

    fn meters_to_lat_degrees(m: f64) -> f64 {
        m / (EARTH_RADIUS_M * std::f64::consts::PI / 180.0)
    }

    fn unit_square() -> Vec<Vec<[f64; 2]>> {
        vec![vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]]
    }

    #[test]
    fn contains_centroid_of_convex_ring() {
        let map = SectorMap::from_vertex_rings(&unit_square());
        assert!(map.contains(&Location::new(0.5, 0.5)));
    }

    #[test]
    fn excludes_point_outside_every_ring() {
        let map = SectorMap::from_vertex_rings(&unit_square());
        assert!(!map.contains(&Location::new(1.5, 0.5)));
        assert!(!map.contains(&Location::new(-0.1, -0.1)));
    }

    #[test]
    fn containment_is_boundary_exclusive() {
        let map = SectorMap::from_vertex_rings(&unit_square());
        assert!(!map.contains(&Location::new(0.0, 0.5)));
        assert!(!map.contains(&Location::new(1.0, 1.0)));
    }

    #[test]
    fn contains_matches_any_ring() {
        let rings = vec![
            vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]],
            vec![[10.0, 10.0], [10.0, 11.0], [11.0, 11.0], [11.0, 10.0]],
        ];
        let map = SectorMap::from_vertex_rings(&rings);
        assert!(map.contains(&Location::new(10.5, 10.5)));
        assert!(map.contains(&Location::new(0.5, 0.5)));
        assert!(!map.contains(&Location::new(5.0, 5.0)));
    }

    #[test]
    fn empty_rings_are_skipped() {
        let rings = vec![vec![], unit_square().remove(0)];
        let map = SectorMap::from_vertex_rings(&rings);
        assert_eq!(map.rings().len(), 1);
        assert!(map.contains(&Location::new(0.5, 0.5)));
    }

    #[test]
    fn around_box_uses_fixed_deltas() {
        let bbox = Location::new(37.5, 127.0).around_box();
        assert!((bbox.left_lon - (127.0 - AROUND_LON_DELTA)).abs() < f64::EPSILON);
        assert!((bbox.right_lon - (127.0 + AROUND_LON_DELTA)).abs() < f64::EPSILON);
        assert!((bbox.top_lat - (37.5 + AROUND_LAT_DELTA)).abs() < f64::EPSILON);
        assert!((bbox.bottom_lat - (37.5 - AROUND_LAT_DELTA)).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_along_meridian() {
        let a = Location::new(37.5, 127.0);
        let b = Location::new(37.5 + meters_to_lat_degrees(500.0), 127.0);
        assert_eq!(distance_between(&a, &b), 500);
    }

    #[test]
    fn rounded_key_quantizes() {
        let a = Location::new(37.500_004, 127.000_004);
        let b = Location::new(37.500_001, 127.000_001);
        assert_eq!(a.rounded_key(5), b.rounded_key(5));
        assert_ne!(
            a.rounded_key(6),
            b.rounded_key(6),
            "6 decimals should distinguish them"
        );
    }
}
