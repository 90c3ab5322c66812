//! Seam between the orchestration layer and the upstream clients.
//!
//! [`ListingsGateway`] is the set of upstream operations the
//! acquisition state machine drives. The production implementation
//! ([`HttpGateway`]) delegates to the provider and geocoder crates and
//! owns the sector cache; tests substitute stubs to exercise retry and
//! fallback behavior without a network.

use std::time::Duration;

use async_trait::async_trait;
use estate_map_cache::TtlCache;
use estate_map_geocoder::{Geocoder, GeocoderConfig};
use estate_map_geometry::{Location, Sector};
use estate_map_listing_models::{AmenityPoint, Direction, Listing, PropertyType, TradeType};
use estate_map_provider::article::RawArticle;
use estate_map_provider::{ProviderConfig, ProviderError, amenity, article, build_client, complex, sector};

/// How long resolved sectors stay cached.
pub const SECTOR_CACHE_TTL: Duration = Duration::from_secs(600);

/// Decimal places for sector-cache coordinate keys (~11 m).
const SECTOR_KEY_DECIMALS: u32 = 4;

/// Upstream operations the acquisition layer depends on.
#[async_trait]
pub trait ListingsGateway: Send + Sync {
    /// Resolves the sector containing `location`, with the rate-limit
    /// backoff policy already applied.
    async fn resolve_sector(&self, location: &Location) -> Result<Sector, ProviderError>;

    /// Fetches the complex listings for one direction, filtered to the
    /// sector boundary.
    async fn complex_by_direction(
        &self,
        sector: &Sector,
        direction: Direction,
        trades: &[TradeType],
        types: &[PropertyType],
    ) -> Result<Vec<Listing>, ProviderError>;

    /// Fetches the first page of article listings around `location`.
    async fn articles(
        &self,
        location: &Location,
        trades: &[TradeType],
        types: &[PropertyType],
    ) -> Result<Vec<RawArticle>, ProviderError>;

    /// Fetches every amenity category for a sector. Per-category
    /// failures are already absorbed; this never fails as a whole.
    async fn amenities(&self, sector: &Sector) -> Vec<AmenityPoint>;

    /// Reverse geocodes a coordinate to a display address. `None` when
    /// the lookup fails — the caller keeps the listing either way.
    async fn reverse_address(&self, location: &Location) -> Option<String>;
}

/// Production gateway backed by the listings provider and the map
/// provider's geocoder.
pub struct HttpGateway {
    client: reqwest::Client,
    config: ProviderConfig,
    geocoder: Geocoder,
    sector_cache: TtlCache<(i64, i64), Sector>,
}

impl HttpGateway {
    /// Creates a gateway over an existing client and configuration.
    #[must_use]
    pub fn new(client: reqwest::Client, config: ProviderConfig, geocoder: Geocoder) -> Self {
        Self {
            client,
            config,
            geocoder,
            sector_cache: TtlCache::new(SECTOR_CACHE_TTL),
        }
    }

    /// Builds a gateway entirely from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ProviderError> {
        let config = ProviderConfig::from_env();
        let client = build_client(&config)?;
        let geocoder = Geocoder::new(client.clone(), GeocoderConfig::from_env());
        Ok(Self::new(client, config, geocoder))
    }

    /// Drops the sector cache (tests and long-lived processes).
    pub fn clear_sector_cache(&self) {
        self.sector_cache.clear();
    }
}

#[async_trait]
impl ListingsGateway for HttpGateway {
    async fn resolve_sector(&self, location: &Location) -> Result<Sector, ProviderError> {
        let key = location.rounded_key(SECTOR_KEY_DECIMALS);
        if let Some(cached) = self.sector_cache.get(&key) {
            log::debug!("sector cache hit for {location}");
            return Ok(cached);
        }

        let resolved =
            sector::resolve_with_backoff(&self.client, &self.config.listings_base_url, location)
                .await?;
        self.sector_cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    async fn complex_by_direction(
        &self,
        sector: &Sector,
        direction: Direction,
        trades: &[TradeType],
        types: &[PropertyType],
    ) -> Result<Vec<Listing>, ProviderError> {
        complex::fetch_direction(
            &self.client,
            &self.config.listings_base_url,
            sector,
            direction,
            trades,
            types,
        )
        .await
    }

    async fn articles(
        &self,
        location: &Location,
        trades: &[TradeType],
        types: &[PropertyType],
    ) -> Result<Vec<RawArticle>, ProviderError> {
        article::fetch(
            &self.client,
            &self.config.article_base_url,
            location,
            trades,
            types,
            1,
        )
        .await
    }

    async fn amenities(&self, sector: &Sector) -> Vec<AmenityPoint> {
        amenity::fetch_all(&self.client, &self.config.listings_base_url, sector).await
    }

    async fn reverse_address(&self, location: &Location) -> Option<String> {
        match self.geocoder.reverse(location).await {
            Ok(address) => Some(address),
            Err(e) => {
                log::warn!("reverse geocode failed for {location}: {e}");
                None
            }
        }
    }
}
