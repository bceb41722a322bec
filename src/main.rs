//! Visited CLI - record and query approximate visited locations

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use visited::{ApproximateLocation, VisitedStore, config};

#[derive(Parser)]
#[command(name = "visited")]
#[command(version)]
#[command(about = "Persistent store of approximate visited locations")]
#[command(long_about = r#"
Visited keeps a durable log of approximate latitude/longitude samples and
answers rectangular range queries over them.

Example usage:
  visited insert --latitude 51.5074 --longitude -0.1278
  visited import --file samples.json
  visited within --lat-max 52 --lon-min -1 --lat-min 51 --lon-max 0
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides visited.toml)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a single location
    Insert {
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Provider tag for the sample
        #[arg(short, long, default_value = "manual")]
        provider: String,
    },

    /// Batch-insert locations from a JSON array
    Import {
        /// Path to a JSON file: [{"latitude": .., "longitude": ..}, ..]
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List every stored location, longitude descending
    List {
        /// Emit JSON instead of human-readable lines
        #[arg(long)]
        json: bool,
    },

    /// List locations inside a bounding box, latitude descending
    Within {
        /// Latitude of the upper-left corner
        #[arg(long, allow_hyphen_values = true)]
        lat_max: f64,

        /// Longitude of the upper-left corner
        #[arg(long, allow_hyphen_values = true)]
        lon_min: f64,

        /// Latitude of the lower-right corner
        #[arg(long, allow_hyphen_values = true)]
        lat_min: f64,

        /// Longitude of the lower-right corner
        #[arg(long, allow_hyphen_values = true)]
        lon_max: f64,

        /// Emit JSON instead of human-readable lines
        #[arg(long)]
        json: bool,
    },

    /// Delete every stored location
    Clear {
        /// Confirm the irreversible deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show row count and database location
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let loaded = config::load_config(None)?;
    let database = config::resolve_database(cli.database, loaded.as_ref());
    config::ensure_db_dir(&database)?;
    let store = VisitedStore::open(&database)?;

    match cli.command {
        Commands::Insert {
            latitude,
            longitude,
            provider,
        } => {
            let id = store.insert(&ApproximateLocation::new(provider, latitude, longitude))?;
            println!("Inserted row {id}");
        }

        Commands::Import { file } => {
            let contents = std::fs::read_to_string(&file)?;
            let locations: Vec<ApproximateLocation> = serde_json::from_str(&contents)?;
            let inserted = store.insert_batch(&locations)?;
            println!("Imported {inserted} locations from {}", file.display());
        }

        Commands::List { json } => {
            let locations = store.select_all()?;
            print_locations(&locations, json)?;
        }

        Commands::Within {
            lat_max,
            lon_min,
            lat_min,
            lon_max,
            json,
        } => {
            let upper_left = ApproximateLocation::new("query", lat_max, lon_min);
            let lower_right = ApproximateLocation::new("query", lat_min, lon_max);
            let locations = store.select_visited(&upper_left, &lower_right)?;
            print_locations(&locations, json)?;
        }

        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("clear deletes every stored location; pass --yes to confirm");
            }
            store.delete_all()?;
            println!("Deleted all locations");
        }

        Commands::Stats => {
            println!("Database: {}", database.display());
            println!("Locations: {}", store.count()?);
        }
    }

    Ok(())
}

fn print_locations(locations: &[ApproximateLocation], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(locations)?);
    } else if locations.is_empty() {
        println!("(no locations)");
    } else {
        for location in locations {
            println!("{location}");
        }
    }
    Ok(())
}
