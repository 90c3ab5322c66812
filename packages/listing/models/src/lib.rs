#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing domain records and provider code enums.
//!
//! This crate defines the canonical types shared across the estate-map
//! system: the code enums the listings provider speaks (trade type,
//! property type, compass direction, amenity category), the price/area
//! ranges parsed from its responses, and the normalized records the
//! acquisition and comparison layers exchange.
//!
//! Enum `Display`/`FromStr` implementations serialize to the provider's
//! wire codes (`A1`, `APT`, `EE`, `PRI_SCHOOL`, …), so a code round-trips
//! between query parameters and parsed responses without a lookup table.

use estate_map_geometry::Location;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Multiplier converting monthly rent into deposit-equivalent units for
/// the effective-price metric used throughout the system.
pub const RENT_TO_DEPOSIT_MULTIPLIER: u64 = 10;

/// Normalized comparison metric: deposit plus ten months of rent.
#[must_use]
pub const fn effective_price(deposit: u64, monthly: u64) -> u64 {
    deposit + monthly * RENT_TO_DEPOSIT_MULTIPLIER
}

/// Joins wire codes with `:` the way the provider's multi-value query
/// parameters expect.
#[must_use]
pub fn colon_joined<T: AsRef<str>>(codes: &[T]) -> String {
    codes
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(":")
}

/// Trade type codes accepted by the listings provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum TradeType {
    /// Outright sale.
    #[serde(rename = "A1")]
    #[strum(serialize = "A1")]
    Deal,
    /// Deposit-only lease (jeonse).
    #[serde(rename = "B1")]
    #[strum(serialize = "B1")]
    Lease,
    /// Monthly rent with deposit.
    #[serde(rename = "B2")]
    #[strum(serialize = "B2")]
    MonthlyRent,
    /// Short-term rental.
    #[serde(rename = "B3")]
    #[strum(serialize = "B3")]
    ShortTermRent,
}

/// Which upstream endpoint serves a property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionRoute {
    /// The sector-scoped complex single-markers endpoint.
    ComplexMarkers,
    /// The clustered article-list endpoint plus reverse geocoding.
    ArticleList,
}

/// Property type codes, with the routing table that picks the
/// acquisition path for each.
///
/// Complex-style inventory (apartments, officetels and their presale or
/// redevelopment variants) is served by the complex endpoint; studio and
/// low-rise inventory is underserved there and goes through the
/// article-list fallback instead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum PropertyType {
    /// Apartment complex.
    #[serde(rename = "APT")]
    #[strum(serialize = "APT")]
    Apartment,
    /// Apartment presale right.
    #[serde(rename = "ABYG")]
    #[strum(serialize = "ABYG")]
    ApartmentPresale,
    /// Reconstruction project.
    #[serde(rename = "JGC")]
    #[strum(serialize = "JGC")]
    Reconstruction,
    /// Officetel.
    #[serde(rename = "OPST")]
    #[strum(serialize = "OPST")]
    Officetel,
    /// Officetel presale right.
    #[serde(rename = "OBYG")]
    #[strum(serialize = "OBYG")]
    OfficetelPresale,
    /// Redevelopment project.
    #[serde(rename = "JGB")]
    #[strum(serialize = "JGB")]
    Redevelopment,
    /// Villa / row house.
    #[serde(rename = "VL")]
    #[strum(serialize = "VL")]
    Villa,
    /// Detached / multi-household house.
    #[serde(rename = "HO")]
    #[strum(serialize = "HO")]
    House,
    /// Terrace house.
    #[serde(rename = "TH")]
    #[strum(serialize = "TH")]
    TerraceHouse,
    /// Studio / one-room.
    #[serde(rename = "OR")]
    #[strum(serialize = "OR")]
    OneRoom,
    /// Detached or multi-family house, as the article endpoint codes it.
    #[serde(rename = "DDDGG")]
    #[strum(serialize = "DDDGG")]
    MultiFamilyHouse,
    /// Traditional (hanok) house.
    #[serde(rename = "HOJT")]
    #[strum(serialize = "HOJT")]
    TraditionalHouse,
    /// Country house.
    #[serde(rename = "JWJT")]
    #[strum(serialize = "JWJT")]
    CountryHouse,
}

impl PropertyType {
    /// Property types the article-list fallback queries as a group.
    pub const ARTICLE_QUERY_TYPES: &[Self] = &[
        Self::Villa,
        Self::MultiFamilyHouse,
        Self::TraditionalHouse,
        Self::CountryHouse,
        Self::OneRoom,
    ];

    /// The acquisition path serving this property type.
    #[must_use]
    pub const fn route(self) -> AcquisitionRoute {
        match self {
            Self::Apartment
            | Self::ApartmentPresale
            | Self::Reconstruction
            | Self::Officetel
            | Self::OfficetelPresale
            | Self::Redevelopment => AcquisitionRoute::ComplexMarkers,
            Self::Villa
            | Self::House
            | Self::TerraceHouse
            | Self::OneRoom
            | Self::MultiFamilyHouse
            | Self::TraditionalHouse
            | Self::CountryHouse => AcquisitionRoute::ArticleList,
        }
    }
}

/// Compass direction codes the complex endpoint partitions queries by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Direction {
    /// East.
    #[serde(rename = "EE")]
    #[strum(serialize = "EE")]
    East,
    /// Southeast.
    #[serde(rename = "ES")]
    #[strum(serialize = "ES")]
    Southeast,
    /// West.
    #[serde(rename = "WW")]
    #[strum(serialize = "WW")]
    West,
    /// Southwest.
    #[serde(rename = "WS")]
    #[strum(serialize = "WS")]
    Southwest,
    /// South.
    #[serde(rename = "SS")]
    #[strum(serialize = "SS")]
    South,
    /// Northeast.
    #[serde(rename = "EN")]
    #[strum(serialize = "EN")]
    Northeast,
    /// North.
    #[serde(rename = "NN")]
    #[strum(serialize = "NN")]
    North,
    /// Northwest.
    #[serde(rename = "WN")]
    #[strum(serialize = "WN")]
    Northwest,
}

impl Direction {
    /// All eight directions, in the order the fan-out issues them.
    pub const ALL: [Self; 8] = [
        Self::East,
        Self::Southeast,
        Self::West,
        Self::Southwest,
        Self::South,
        Self::Northeast,
        Self::North,
        Self::Northwest,
    ];
}

/// Amenity categories a listing is annotated with.
///
/// Schools are split into public and private at parse time from the
/// school endpoint's organization-type field, so both appear here even
/// though the upstream query uses a single school category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
pub enum AmenityCategory {
    /// Bus stop.
    #[serde(rename = "BUS")]
    #[strum(serialize = "BUS")]
    Bus,
    /// Subway station.
    #[serde(rename = "METRO")]
    #[strum(serialize = "METRO")]
    Metro,
    /// Daycare center.
    #[serde(rename = "INFANT")]
    #[strum(serialize = "INFANT")]
    Daycare,
    /// Preschool / kindergarten.
    #[serde(rename = "PRESCHOOL")]
    #[strum(serialize = "PRESCHOOL")]
    Preschool,
    /// Hospital.
    #[serde(rename = "HOSPITAL")]
    #[strum(serialize = "HOSPITAL")]
    Hospital,
    /// Parking lot.
    #[serde(rename = "PARKING")]
    #[strum(serialize = "PARKING")]
    Parking,
    /// Mart / grocery.
    #[serde(rename = "MART")]
    #[strum(serialize = "MART")]
    Mart,
    /// Convenience store.
    #[serde(rename = "CONVENIENCE")]
    #[strum(serialize = "CONVENIENCE")]
    Convenience,
    /// Laundry.
    #[serde(rename = "WASHING")]
    #[strum(serialize = "WASHING")]
    Laundry,
    /// Bank branch.
    #[serde(rename = "BANK")]
    #[strum(serialize = "BANK")]
    Bank,
    /// Government office.
    #[serde(rename = "OFFICE")]
    #[strum(serialize = "OFFICE")]
    Office,
    /// Private school.
    #[serde(rename = "PRI_SCHOOL")]
    #[strum(serialize = "PRI_SCHOOL")]
    PrivateSchool,
    /// Public school.
    #[serde(rename = "PUB_SCHOOL")]
    #[strum(serialize = "PUB_SCHOOL")]
    PublicSchool,
}

impl AmenityCategory {
    /// All annotation categories, in the fixed export-column order.
    pub const ALL: [Self; 13] = [
        Self::Bus,
        Self::Metro,
        Self::Daycare,
        Self::Preschool,
        Self::Hospital,
        Self::Parking,
        Self::Mart,
        Self::Convenience,
        Self::Laundry,
        Self::Bank,
        Self::Office,
        Self::PrivateSchool,
        Self::PublicSchool,
    ];

    /// Distance threshold in meters within which an amenity of this
    /// category counts toward a listing.
    #[must_use]
    pub const fn distance_threshold_m(self) -> u32 {
        match self {
            Self::Bus | Self::Metro | Self::Parking | Self::Mart | Self::Laundry => 500,
            Self::Convenience => 300,
            Self::Daycare | Self::Preschool | Self::Bank => 750,
            Self::PrivateSchool | Self::PublicSchool => 1000,
            Self::Hospital => 2000,
            Self::Office => 1250,
        }
    }
}

/// Categories the amenity endpoint is queried with, one request each.
///
/// Everything except schools goes to the neighborhoods endpoint with a
/// `type` parameter; schools have a dedicated endpoint whose results
/// are split into [`AmenityCategory::PublicSchool`] /
/// [`AmenityCategory::PrivateSchool`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum AmenityQuery {
    /// Bus stops.
    #[serde(rename = "BUS")]
    #[strum(serialize = "BUS")]
    Bus,
    /// Subway stations.
    #[serde(rename = "METRO")]
    #[strum(serialize = "METRO")]
    Metro,
    /// Daycare centers.
    #[serde(rename = "INFANT")]
    #[strum(serialize = "INFANT")]
    Daycare,
    /// Preschools.
    #[serde(rename = "PRESCHOOL")]
    #[strum(serialize = "PRESCHOOL")]
    Preschool,
    /// Schools (public and private).
    #[serde(rename = "SCHOOLPOI")]
    #[strum(serialize = "SCHOOLPOI")]
    School,
    /// Hospitals.
    #[serde(rename = "HOSPITAL")]
    #[strum(serialize = "HOSPITAL")]
    Hospital,
    /// Parking lots.
    #[serde(rename = "PARKING")]
    #[strum(serialize = "PARKING")]
    Parking,
    /// Marts.
    #[serde(rename = "MART")]
    #[strum(serialize = "MART")]
    Mart,
    /// Convenience stores.
    #[serde(rename = "CONVENIENCE")]
    #[strum(serialize = "CONVENIENCE")]
    Convenience,
    /// Laundries.
    #[serde(rename = "WASHING")]
    #[strum(serialize = "WASHING")]
    Laundry,
    /// Bank branches.
    #[serde(rename = "BANK")]
    #[strum(serialize = "BANK")]
    Bank,
    /// Government offices.
    #[serde(rename = "OFFICE")]
    #[strum(serialize = "OFFICE")]
    Office,
}

impl AmenityQuery {
    /// Every category fetched during a full amenity sweep.
    pub const EACH: [Self; 12] = [
        Self::Bus,
        Self::Metro,
        Self::Daycare,
        Self::Preschool,
        Self::School,
        Self::Hospital,
        Self::Parking,
        Self::Mart,
        Self::Convenience,
        Self::Laundry,
        Self::Bank,
        Self::Office,
    ];
}

/// A category-tagged point of interest near a sector.
#[derive(Debug, Clone)]
pub struct AmenityPoint {
    /// Annotation category.
    pub category: AmenityCategory,
    /// Display name from the provider.
    pub name: String,
    /// Point location.
    pub location: Location,
}

/// Per-category amenity counts attached to a listing after the
/// intersection step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityCounts {
    counts: std::collections::BTreeMap<AmenityCategory, u32>,
}

impl AmenityCounts {
    /// Zeroed counts for every category.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: AmenityCategory::ALL.iter().map(|&c| (c, 0)).collect(),
        }
    }

    /// Increments the counter for `category`.
    pub fn increment(&mut self, category: AmenityCategory) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    /// The count for `category`.
    #[must_use]
    pub fn get(&self, category: AmenityCategory) -> u32 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Counts in the fixed export-column order.
    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        AmenityCategory::ALL
            .iter()
            .map(|&c| self.get(c).to_string())
            .collect()
    }
}

/// A price range in ten-thousand-won units.
///
/// The upstream reports `0` where it has no data; a zero is normalized
/// to absent at construction and never treated as a real price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    /// Minimum price, if reported.
    pub min: Option<u64>,
    /// Maximum price, if reported.
    pub max: Option<u64>,
    /// Median price, if reported.
    pub median: Option<u64>,
}

impl PriceRange {
    /// Builds a range from raw upstream fields, normalizing zeros to
    /// absent.
    #[must_use]
    pub fn from_raw(min: Option<u64>, max: Option<u64>, median: Option<u64>) -> Self {
        let nonzero = |v: Option<u64>| v.filter(|&n| n != 0);
        Self {
            min: nonzero(min),
            max: nonzero(max),
            median: nonzero(median),
        }
    }
}

/// An area range in square meters, plus the floor-area ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRange {
    /// Minimum exclusive area.
    pub min: Option<f64>,
    /// Maximum exclusive area.
    pub max: Option<f64>,
    /// Representative area used for comparisons.
    pub representative: Option<f64>,
    /// Floor-area ratio.
    pub floor_area_ratio: Option<f64>,
}

/// Which acquisition path produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSource {
    /// Sector-scoped complex endpoint.
    Complex,
    /// Clustered article-list endpoint.
    Article,
}

/// A property complex entry parsed from the complex endpoint.
///
/// Discarded per request; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Provider-assigned complex identifier, when the response carries
    /// one. Used for cross-direction deduplication.
    pub complex_id: Option<String>,
    /// Complex display name.
    pub name: String,
    /// Raw property-type code (kept as received; unknown codes pass
    /// through unmodified).
    pub property_type: String,
    /// Completion year-month as reported (`YYYYMM`).
    pub build_time: String,
    /// Complex location.
    pub location: Location,
    /// Area range.
    pub area: AreaRange,
    /// Sale price range.
    pub deal: PriceRange,
    /// Lease price range.
    pub lease: PriceRange,
    /// Sale price per unit area.
    pub deal_unit: PriceRange,
    /// Lease price per unit area.
    pub lease_unit: PriceRange,
    /// Compass direction the listing was discovered under.
    pub direction: Option<Direction>,
    /// Amenity counts, zero until the intersection step runs.
    pub amenities: AmenityCounts,
}

impl Listing {
    /// Fixed export header: listing columns followed by one column per
    /// amenity category.
    #[must_use]
    pub fn csv_header() -> Vec<&'static str> {
        let mut header = vec![
            "Name",
            "Type",
            "Build",
            "Dir",
            "minArea",
            "maxArea",
            "representativeArea",
            "floorAreaRatio",
            "minDeal",
            "maxDeal",
            "medianDeal",
            "minLease",
            "maxLease",
            "medianLease",
            "minDealUnit",
            "maxDealUnit",
            "medianDealUnit",
            "minLeaseUnit",
            "maxLeaseUnit",
            "medianLeaseUnit",
            "Lat",
            "Lon",
        ];
        header.extend(AmenityCategory::ALL.iter().map(|&c| <&'static str>::from(c)));
        header
    }

    /// Flattens the listing into one export row matching
    /// [`Self::csv_header`]. Absent values become empty cells.
    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        fn opt_u64(v: Option<u64>) -> String {
            v.map(|n| n.to_string()).unwrap_or_default()
        }
        fn opt_f64(v: Option<f64>) -> String {
            v.map(|n| n.to_string()).unwrap_or_default()
        }

        let mut row = vec![
            self.name.clone(),
            self.property_type.clone(),
            self.build_time.clone(),
            self.direction.map(|d| d.to_string()).unwrap_or_default(),
            opt_f64(self.area.min),
            opt_f64(self.area.max),
            opt_f64(self.area.representative),
            opt_f64(self.area.floor_area_ratio),
            opt_u64(self.deal.min),
            opt_u64(self.deal.max),
            opt_u64(self.deal.median),
            opt_u64(self.lease.min),
            opt_u64(self.lease.max),
            opt_u64(self.lease.median),
            opt_u64(self.deal_unit.min),
            opt_u64(self.deal_unit.max),
            opt_u64(self.deal_unit.median),
            opt_u64(self.lease_unit.min),
            opt_u64(self.lease_unit.max),
            opt_u64(self.lease_unit.median),
            self.location.lat.to_string(),
            self.location.lon.to_string(),
        ];
        row.extend(self.amenities.to_row());
        row
    }

    /// Key used to deduplicate the same complex discovered under two
    /// adjacent directions: the provider id when present, else name plus
    /// coordinate quantized to 1e-6°.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        self.complex_id.clone().unwrap_or_else(|| {
            let (lat, lon) = self.location.rounded_key(6);
            format!("{}@{lat}:{lon}", self.name)
        })
    }
}

/// A normalized comparable record, uniform across both acquisition
/// paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparableListing {
    /// Listing display name.
    pub name: String,
    /// Human-readable address (reverse geocoded on the article path,
    /// the complex name otherwise).
    pub address: String,
    /// Exclusive area in square meters.
    pub area_m2: f64,
    /// Deposit in ten-thousand-won units.
    pub deposit: u64,
    /// Monthly rent in ten-thousand-won units.
    pub monthly: u64,
    /// Effective price: deposit plus ten months of rent.
    pub price: u64,
    /// Listing location.
    pub location: Location,
    /// Distance from the query point in kilometers.
    pub distance_km: f64,
    /// Which acquisition path produced this record.
    pub source: ListingSource,
}

/// Aggregate statistics over a comparable set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// True when the target's effective price is strictly below the
    /// comparable average.
    pub cheaper_than_average: bool,
    /// Average effective price, rounded to the nearest integer.
    pub average_price: u64,
    /// Average area, rounded to one decimal.
    pub average_area: f64,
    /// The comparables the averages were computed over.
    pub comparables: Vec<ComparableListing>,
}
