use clap::{Parser, Subcommand};
use hawkeroute_geo::geo;
use hawkeroute_geo::geolocation::{FixCache, GeolocationService, IpApiProvider, Position};

/// HawkeRoute geolocation toolkit.
///
/// Acquires the device position (IP-based when no platform provider exists),
/// streams position updates, and computes great-circle distances.
///
/// Examples:
///   hawkgeo locate
///   hawkgeo locate --offline
///   hawkgeo watch --count 3
///   hawkgeo distance 1.3521 103.8198 3.1390 101.6869
#[derive(Parser)]
#[command(name = "hawkgeo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Acquire the current position and print it as JSON.
    Locate {
        /// Skip the network and answer from the last cached fix.
        #[arg(long)]
        offline: bool,
    },
    /// Stream position updates until the count is reached.
    Watch {
        /// Number of updates to print before stopping.
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
    /// Great-circle distance in kilometers between two points.
    Distance {
        #[arg(allow_hyphen_values = true)]
        lat1: f64,
        #[arg(allow_hyphen_values = true)]
        lon1: f64,
        #[arg(allow_hyphen_values = true)]
        lat2: f64,
        #[arg(allow_hyphen_values = true)]
        lon2: f64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Locate { offline } => locate(offline).await,
        Command::Watch { count } => watch(count).await,
        Command::Distance { lat1, lon1, lat2, lon2 } => distance(lat1, lon1, lat2, lon2),
    }
}

fn service() -> GeolocationService<IpApiProvider> {
    GeolocationService::with_cache(IpApiProvider::new(), FixCache::load())
}

async fn locate(offline: bool) {
    let service = service();

    if offline {
        match service.last_known() {
            Some(position) => print_position(&position, "cached"),
            None => {
                eprintln!("Error: No cached position available. Run without --offline first.");
                std::process::exit(1);
            }
        }
        return;
    }

    match service.current_position().await {
        Ok(position) => print_position(&position, "live"),
        Err(e) => {
            // Same shape as the storefront: degrade to the last known fix
            // before giving up.
            match service.last_known() {
                Some(position) => {
                    eprintln!("  \u{26A0}\u{FE0F}  {} \u{2014} using last known position", e);
                    print_position(&position, "cached");
                }
                None => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

async fn watch(count: u32) {
    let service = service();
    let mut watch = service.watch_position();
    let mut delivered = 0u32;

    while delivered < count {
        match watch.next().await {
            Some(Ok(position)) => {
                delivered += 1;
                eprintln!(
                    "  \u{1F4CD} {}  \u{00B1}{:.0} m",
                    geo::format_coords(position.latitude, position.longitude),
                    position.accuracy,
                );
                println!("{}", serde_json::to_string(&position).unwrap());
            }
            Some(Err(e)) => eprintln!("  \u{26A0}\u{FE0F}  {}", e),
            None => break,
        }
    }

    watch.cancel();
}

fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) {
    for (lat, lon) in [(lat1, lon1), (lat2, lon2)] {
        if let Err(e) = geo::validate_coords(lat, lon) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    eprintln!(
        "  \u{1F4D0} {}  \u{2192}  {}",
        geo::format_coords(lat1, lon1),
        geo::format_coords(lat2, lon2),
    );
    println!("{:.3}", geo::distance_km(lat1, lon1, lat2, lon2));
}

fn print_position(position: &Position, provenance: &str) {
    eprintln!(
        "  \u{1F4CD} {} ({})  \u{00B1}{:.0} m",
        geo::format_coords(position.latitude, position.longitude),
        provenance,
        position.accuracy,
    );
    println!("{}", serde_json::to_string_pretty(position).unwrap());
}
