#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the estate-map core.
//!
//! Three tools: `survey` runs a full sector sweep (directional listings
//! plus amenity annotation) with optional CSV export, `compare`
//! resolves comparables for a target listing and reports whether it
//! beats the average, and `regions` walks the provider's region tree.
//!
//! Upstream endpoints and the geocoder key come from the
//! `ESTATE_MAP_*` environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr as _;

use clap::{Parser, Subcommand};
use estate_map_acquire::{Acquirer, HttpGateway};
use estate_map_geocoder::{Geocoder, GeocoderConfig};
use estate_map_geometry::Location;
use estate_map_listing_models::{Listing, PropertyType, TradeType};
use estate_map_provider::{ProviderConfig, build_client, region};

#[derive(Parser)]
#[command(name = "estate_map", about = "Sector-bounded real-estate listing surveys")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Survey a sector: directional listings with amenity counts
    Survey {
        /// Query latitude
        #[arg(long)]
        lat: f64,
        /// Query longitude
        #[arg(long)]
        lon: f64,
        /// Write the annotated listings to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Compare a target listing against nearby comparables
    Compare {
        /// Query latitude (alternative to --address)
        #[arg(long)]
        lat: Option<f64>,
        /// Query longitude (alternative to --address)
        #[arg(long)]
        lon: Option<f64>,
        /// Street address, geocoded when --lat/--lon are not given
        #[arg(long)]
        address: Option<String>,
        /// Property type code (APT, OPST, VL, OR, ...)
        #[arg(long, default_value = "OR")]
        property_type: String,
        /// Deposit in ten-thousand-won units
        #[arg(long)]
        deposit: u64,
        /// Monthly rent in ten-thousand-won units
        #[arg(long, default_value_t = 0)]
        monthly: u64,
    },
    /// List the child regions of a region code
    Regions {
        /// Parent region code
        #[arg(long, default_value = region::ROOT_REGION_CODE)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Survey { lat, lon, csv } => run_survey(lat, lon, csv.as_deref()).await,
        Commands::Compare {
            lat,
            lon,
            address,
            property_type,
            deposit,
            monthly,
        } => run_compare(lat, lon, address, &property_type, deposit, monthly).await,
        Commands::Regions { code } => run_regions(&code).await,
    }
}

async fn run_survey(
    lat: f64,
    lon: f64,
    csv: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let acquirer = Acquirer::new(HttpGateway::from_env()?);
    let survey = acquirer.survey(&Location::new(lat, lon)).await?;

    println!(
        "{}: {} listings, {} amenity points",
        survey.sector,
        survey.listings.len(),
        survey.amenities.len()
    );

    if let Some(path) = csv {
        write_listings_csv(path, &survey.listings)?;
        println!("wrote {} rows to {}", survey.listings.len(), path.display());
    } else {
        for listing in &survey.listings {
            println!(
                "  {} ({}) lease min {:?} / area {:?}",
                listing.name,
                listing.property_type,
                listing.lease.min,
                listing.area.representative
            );
        }
    }
    Ok(())
}

async fn run_compare(
    lat: Option<f64>,
    lon: Option<f64>,
    address: Option<String>,
    property_type: &str,
    deposit: u64,
    monthly: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let property_type = PropertyType::from_str(&property_type.to_uppercase())
        .map_err(|_| format!("unknown property type code `{property_type}`"))?;

    let location = match (lat, lon, address) {
        (Some(lat), Some(lon), _) => Location::new(lat, lon),
        (_, _, Some(address)) => {
            let config = ProviderConfig::from_env();
            let client = build_client(&config)?;
            let geocoder = Geocoder::new(client, GeocoderConfig::from_env());
            geocoder.forward(&address).await?
        }
        _ => return Err("pass either --lat/--lon or --address".into()),
    };

    let acquirer = Acquirer::new(HttpGateway::from_env()?);
    let result = acquirer
        .compare_listing(
            &location,
            property_type,
            &[TradeType::Deal, TradeType::Lease],
            deposit,
            monthly,
        )
        .await?;

    println!(
        "average price {} / average area {}㎡ over {} comparables",
        result.average_price,
        result.average_area,
        result.comparables.len()
    );
    println!(
        "target is {} the average",
        if result.cheaper_than_average {
            "cheaper than"
        } else {
            "at or above"
        }
    );
    for comparable in &result.comparables {
        println!(
            "  {} | {}㎡ | price {} | {} km | {}",
            comparable.name,
            comparable.area_m2,
            comparable.price,
            comparable.distance_km,
            comparable.address
        );
    }
    Ok(())
}

async fn run_regions(code: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ProviderConfig::from_env();
    let client = build_client(&config)?;
    let regions = region::list(&client, &config.listings_base_url, code).await?;

    for region in &regions {
        println!("{region}");
    }
    log::info!("{} regions under {code}", regions.len());
    Ok(())
}

fn write_listings_csv(path: &Path, listings: &[Listing]) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(Listing::csv_header())?;
    for listing in listings {
        writer.write_record(listing.to_row())?;
    }
    writer.flush()?;
    Ok(())
}
