#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Acquisition orchestration.
//!
//! Routes a (location, property type, trade set) query to the right
//! acquisition path and drives it as an explicit state machine:
//!
//! ```text
//! ResolvingSector ──ok──► FetchingComplex ──comparables──► Done
//!       │                       │
//!       │ rate limit budget     │ no usable comparables
//!       │ exhausted             ▼
//!       └──────────────► FetchingArticleFallback ──► Done / NoComparables
//! ```
//!
//! Complex-routed property types start at `ResolvingSector`;
//! article-routed types enter at `FetchingArticleFallback` directly.
//! Sector parse failures and non-429 transport failures during sector
//! resolution fail the request — without a boundary polygon the
//! complex path cannot filter anything. Per-direction failures inside
//! the complex fan-out only shrink the union.

pub mod gateway;

pub use gateway::{HttpGateway, ListingsGateway, SECTOR_CACHE_TTL};

use std::collections::HashSet;
use std::time::Duration;

use estate_map_cache::TtlCache;
use estate_map_geometry::{Location, Sector, distance_between};
use estate_map_listing_models::{
    AcquisitionRoute, AmenityPoint, ComparableListing, ComparisonResult, Direction, Listing,
    ListingSource, PropertyType, TradeType, effective_price,
};
use estate_map_provider::ProviderError;
use estate_map_provider::article::RawArticle;
use futures::stream::{self, StreamExt as _};
use thiserror::Error;

/// Time-to-live of the last-query (survey) cache.
pub const LAST_QUERY_TTL: Duration = Duration::from_secs(60);

/// Decimal places for survey-cache coordinate keys.
const SURVEY_KEY_DECIMALS: u32 = 4;

/// Trade types the article fallback always queries.
pub const ARTICLE_TRADES: &[TradeType] = &[
    TradeType::Deal,
    TradeType::Lease,
    TradeType::MonthlyRent,
];

/// Trade types a full sector survey queries.
pub const SURVEY_TRADES: &[TradeType] = &[TradeType::Deal, TradeType::Lease];

/// Property types a full sector survey covers.
pub const SURVEY_PROPERTY_TYPES: &[PropertyType] = &[
    PropertyType::Apartment,
    PropertyType::Officetel,
    PropertyType::Villa,
    PropertyType::House,
    PropertyType::TerraceHouse,
    PropertyType::OneRoom,
];

/// Address used when reverse geocoding has no match for a listing.
const UNKNOWN_ADDRESS: &str = "(address unknown)";

/// Errors from acquisition orchestration.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// An upstream call failed in a way no fallback covers.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Both acquisition paths produced nothing. A domain-level outcome,
    /// not a system failure.
    #[error("No comparable listings found")]
    NoComparables,
}

/// Result of a full sector survey: the sector, its listings annotated
/// with amenity counts, and the amenity points themselves.
#[derive(Debug, Clone)]
pub struct Survey {
    /// The resolved sector.
    pub sector: Sector,
    /// Directional listings, deduplicated and amenity-annotated.
    pub listings: Vec<Listing>,
    /// Every amenity point fetched for the sector.
    pub amenities: Vec<AmenityPoint>,
}

/// Acquisition driver over a [`ListingsGateway`].
pub struct Acquirer<G> {
    gateway: G,
    survey_cache: TtlCache<(i64, i64), Survey>,
}

/// Explicit acquisition state. Variants carry what the next step needs
/// so there is no "resolved sector" ambient state to get wrong.
enum Phase {
    ResolvingSector,
    FetchingComplex(Sector),
    FetchingArticleFallback,
    Done(Vec<ComparableListing>),
}

impl<G: ListingsGateway> Acquirer<G> {
    /// Creates an acquirer with the default last-query cache TTL.
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            survey_cache: TtlCache::new(LAST_QUERY_TTL),
        }
    }

    /// The underlying gateway.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Resolves comparable listings for a query point.
    ///
    /// Complex-routed property types resolve the sector, fan out across
    /// all eight directions, and fall back to the article path when the
    /// sector endpoint stays rate limited past its retry budget or the
    /// complex results yield no usable comparables. Article-routed
    /// types skip straight to the article path.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::NoComparables`] when both paths come up
    /// empty, or [`AcquireError::Provider`] for unrecoverable upstream
    /// failures (sector parse failure, article endpoint failure).
    pub async fn resolve_comparables(
        &self,
        location: &Location,
        property_type: PropertyType,
        trades: &[TradeType],
    ) -> Result<Vec<ComparableListing>, AcquireError> {
        let mut phase = match property_type.route() {
            AcquisitionRoute::ComplexMarkers => Phase::ResolvingSector,
            AcquisitionRoute::ArticleList => {
                log::debug!("{property_type} is article-routed, skipping sector resolution");
                Phase::FetchingArticleFallback
            }
        };

        loop {
            phase = match phase {
                Phase::ResolvingSector => match self.gateway.resolve_sector(location).await {
                    Ok(sector) => {
                        log::debug!("resolved sector {sector}");
                        Phase::FetchingComplex(sector)
                    }
                    Err(e) if e.is_rate_limited() => {
                        log::warn!(
                            "sector resolution rate limited past its retry budget, \
                             falling back to the article path: {e}"
                        );
                        Phase::FetchingArticleFallback
                    }
                    Err(e) => return Err(e.into()),
                },
                Phase::FetchingComplex(sector) => {
                    let listings = self
                        .fetch_all_directions(&sector, trades, &[property_type])
                        .await;
                    let comparables = complex_comparables(location, listings);
                    if comparables.is_empty() {
                        log::warn!(
                            "complex path yielded no usable comparables in {sector}, \
                             falling back to the article path"
                        );
                        Phase::FetchingArticleFallback
                    } else {
                        Phase::Done(comparables)
                    }
                }
                Phase::FetchingArticleFallback => {
                    let articles = self
                        .gateway
                        .articles(location, ARTICLE_TRADES, PropertyType::ARTICLE_QUERY_TYPES)
                        .await?;
                    let comparables = self.article_comparables(location, articles).await;
                    if comparables.is_empty() {
                        return Err(AcquireError::NoComparables);
                    }
                    Phase::Done(comparables)
                }
                Phase::Done(comparables) => return Ok(comparables),
            };
        }
    }

    /// Resolves comparables and compares them against a target's
    /// effective price.
    ///
    /// # Errors
    ///
    /// As [`Self::resolve_comparables`].
    pub async fn compare_listing(
        &self,
        location: &Location,
        property_type: PropertyType,
        trades: &[TradeType],
        deposit: u64,
        monthly: u64,
    ) -> Result<ComparisonResult, AcquireError> {
        let comparables = self
            .resolve_comparables(location, property_type, trades)
            .await?;
        estate_map_analytics::compare(effective_price(deposit, monthly), comparables)
            .map_err(|_| AcquireError::NoComparables)
    }

    /// Runs a full sector survey: every direction, every amenity
    /// category, listings annotated with amenity counts.
    ///
    /// Results are cached per quantized location for [`LAST_QUERY_TTL`];
    /// a repeated query inside that window does not touch the upstream.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Provider`] when sector resolution fails;
    /// a survey has no article fallback to offer.
    pub async fn survey(&self, location: &Location) -> Result<Survey, AcquireError> {
        let key = location.rounded_key(SURVEY_KEY_DECIMALS);
        if let Some(cached) = self.survey_cache.get(&key) {
            log::debug!("survey cache hit for {location}");
            return Ok(cached);
        }

        let sector = self.gateway.resolve_sector(location).await?;
        let (listings, amenities) = futures::future::join(
            self.fetch_all_directions(&sector, SURVEY_TRADES, SURVEY_PROPERTY_TYPES),
            self.gateway.amenities(&sector),
        )
        .await;

        let mut listings = listings;
        estate_map_analytics::amenity::annotate(&mut listings, &amenities);

        let survey = Survey {
            sector,
            listings,
            amenities,
        };
        self.survey_cache.insert(key, survey.clone());
        Ok(survey)
    }

    /// Fans one complex query out across all eight directions
    /// concurrently and unions the results.
    ///
    /// A failed direction is logged and contributes nothing — the union
    /// of the eight direction queries is itself an approximation, so
    /// partial coverage beats failing the request. Duplicates discovered
    /// under adjacent directions are collapsed, first direction seen
    /// wins.
    async fn fetch_all_directions(
        &self,
        sector: &Sector,
        trades: &[TradeType],
        types: &[PropertyType],
    ) -> Vec<Listing> {
        let results: Vec<(Direction, Result<Vec<Listing>, ProviderError>)> =
            stream::iter(Direction::ALL.iter().map(|&direction| async move {
                (
                    direction,
                    self.gateway
                        .complex_by_direction(sector, direction, trades, types)
                        .await,
                )
            }))
            .buffer_unordered(Direction::ALL.len())
            .collect()
            .await;

        let mut listings = Vec::new();
        for (direction, result) in results {
            match result {
                Ok(batch) => {
                    log::debug!("direction {direction}: {} listings", batch.len());
                    listings.extend(batch);
                }
                Err(e) => log::warn!(
                    "direction {direction} fetch failed, continuing with partial results: {e}"
                ),
            }
        }
        dedup_listings(listings)
    }

    /// Normalizes raw articles into comparables, reverse geocoding every
    /// coordinate concurrently through the gateway's cached lookup.
    async fn article_comparables(
        &self,
        origin: &Location,
        articles: Vec<RawArticle>,
    ) -> Vec<ComparableListing> {
        let concurrency = articles.len().max(1);
        stream::iter(articles.into_iter().map(|article| async move {
            let address = self
                .gateway
                .reverse_address(&article.location)
                .await
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string());

            ComparableListing {
                name: article.name,
                address,
                area_m2: round1(article.area_m2),
                deposit: article.deposit,
                monthly: article.monthly,
                price: effective_price(article.deposit, article.monthly),
                location: article.location,
                distance_km: distance_km(origin, &article.location),
                source: ListingSource::Article,
            }
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await
    }
}

/// Collapses the same complex discovered under multiple directions.
fn dedup_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen: HashSet<String> = HashSet::with_capacity(listings.len());
    let mut unique = Vec::with_capacity(listings.len());
    for listing in listings {
        if seen.insert(listing.dedup_key()) {
            unique.push(listing);
        }
    }
    unique
}

/// Converts directional listings into comparables.
///
/// A listing participates only when both its minimum lease price and
/// its representative area are present; complex comparables are
/// deposit-only (the lease minimum), with no monthly component.
fn complex_comparables(origin: &Location, listings: Vec<Listing>) -> Vec<ComparableListing> {
    listings
        .into_iter()
        .filter_map(|listing| {
            let deposit = listing.lease.min?;
            let area_m2 = listing.area.representative?;
            Some(ComparableListing {
                address: listing.name.clone(),
                name: listing.name,
                area_m2,
                deposit,
                monthly: 0,
                price: effective_price(deposit, 0),
                location: listing.location,
                distance_km: distance_km(origin, &listing.location),
                source: ListingSource::Complex,
            })
        })
        .collect()
}

/// Distance in kilometers, rounded to two decimals, from whole-meter
/// great-circle distance.
fn distance_km(a: &Location, b: &Location) -> f64 {
    (f64::from(distance_between(a, b)) / 10.0).round() / 100.0
}

/// Rounds to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
