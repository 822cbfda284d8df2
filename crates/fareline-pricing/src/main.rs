//! Fareline - price a batch of rides
//!
//! Usage: `fareline [rides.json]`
//!
//! Reads a JSON array of ride requests (or uses the built-in demo rides),
//! prices each one and prints the per-ride details and totals.

use anyhow::Context;
use fareline_common::{FailureResponse, RideRequest};
use fareline_pricing::{FareLedger, FareService, FarelineConfig, PREMIUM_CLASS, STANDARD_CLASS};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Fareline v{}", fareline_common::VERSION);

    let config = FarelineConfig::load().context("loading configuration")?;
    info!("Loaded configuration: {:?}", config);

    let service = FareService::from_config(&config).context("building fare service")?;

    let rides = match std::env::args().nth(1) {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading rides from {}", path))?;
            serde_json::from_str::<Vec<RideRequest>>(&content)
                .with_context(|| format!("parsing rides from {}", path))?
        }
        None => demo_rides(),
    };

    println!("-- Rides --");
    let mut priced = Decimal::ZERO;
    let mut failed = 0usize;
    for ride in &rides {
        match service.compute_fare(ride) {
            Ok(fare) => {
                priced += fare.total;
                println!(
                    "RideID: {} | From: {} -> To: {} | Distance: {:.2} mi | Class: {} | Fare: ${:.2}",
                    ride.ride_id,
                    ride.pickup_location,
                    ride.dropoff_location,
                    ride.distance_miles,
                    fare.ride_class,
                    fare.total
                );
            }
            Err(err) => {
                failed += 1;
                warn!(ride_id = %ride.ride_id, code = err.code(), "Ride could not be priced");
                let failure = FailureResponse::from(&err);
                println!(
                    "RideID: {} | Error: {}",
                    ride.ride_id,
                    serde_json::to_string(&failure)?
                );
            }
        }
    }

    if let Some(ledger) = service.ledger() {
        println!();
        println!("-- Totals by class --");
        for (ride_class, total) in ledger.totals_by_class() {
            println!("{}: ${:.2}", ride_class, total);
        }
        priced = ledger.total_fares();
    }

    println!();
    println!(
        "Total of fares for {} rides: ${:.2} ({} rejected)",
        rides.len() - failed,
        priced,
        failed
    );

    Ok(())
}

fn demo_rides() -> Vec<RideRequest> {
    vec![
        RideRequest::new("R100", "Downtown", "Airport", dec!(10.5), STANDARD_CLASS),
        RideRequest::new("R101", "Mall", "University", dec!(6.2), PREMIUM_CLASS),
        RideRequest::new("R102", "Home", "Office", dec!(3.4), STANDARD_CLASS),
        RideRequest::new("R103", "Station", "Hotel", dec!(12.0), PREMIUM_CLASS),
    ]
}
