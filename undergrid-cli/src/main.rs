//! Undergrid command line tool
//!
//! Usage:
//!   undergrid --db network.db load
//!   undergrid --db network.db import drawings.json
//!   undergrid project --lon 120.1 --lat 30.1 --zoom 10
//!   undergrid tiles --min-lon 120 --min-lat 30 --max-lon 121 --max-lat 31 --min-zoom 3 --max-zoom 10
//!
//! Results are printed to stdout as JSON, logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use undergrid_cli::AppConfig;
use undergrid_types::{CancelFlag, GeoBounds, GeoPoint, TileContext};

#[derive(Parser, Debug)]
#[command(name = "undergrid")]
#[command(about = "Draw, store and inspect utility network pipelines and facilities")]
struct Args {
    /// Path to the SQLite store
    #[arg(long, default_value = "undergrid.db")]
    db: PathBuf,

    /// JSON file with `sync` and `render` settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reload every user-drawn entity and print counts
    Load {
        /// Zoom of the dry-run render
        #[arg(long, default_value_t = TileContext::MIN_ZOOM)]
        zoom: u8,
    },
    /// Draw and save the entities of a JSON array file
    Import { input: PathBuf },
    /// Delete every user-drawn pipeline and facility
    Clear,
    /// Project a coordinate onto the scene canvas
    Project {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long)]
        zoom: u8,
        #[arg(long, default_value_t = TileContext::DEFAULT_TILE_SIZE)]
        tile_size: u32,
    },
    /// Count the tiles covering a region
    Tiles {
        #[arg(long, allow_hyphen_values = true)]
        min_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        min_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        max_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        max_lat: f64,
        #[arg(long, default_value_t = TileContext::MIN_ZOOM)]
        min_zoom: u8,
        #[arg(long, default_value_t = TileContext::MAX_ZOOM)]
        max_zoom: u8,
        /// Print every tile, not just the count
        #[arg(long)]
        list: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = AppConfig::load(args.config.as_deref())?;
    let cancel = CancelFlag::new();

    match args.command {
        Command::Load { zoom } => {
            info!("Loading drawings from {:?}", args.db);
            let ctx = TileContext::clamped(zoom);
            print_json(&undergrid_cli::load(&args.db, &config, ctx, &cancel)?)
        }
        Command::Import { input } => {
            info!("Importing {:?} into {:?}", input, args.db);
            print_json(&undergrid_cli::import(&args.db, &config, &input, &cancel)?)
        }
        Command::Clear => {
            let cleared = undergrid_cli::clear(&args.db, &config)?;
            print_json(&serde_json::json!({ "cleared": cleared, "db": display(&args.db) }))
        }
        Command::Project {
            lon,
            lat,
            zoom,
            tile_size,
        } => print_json(&undergrid_cli::project(GeoPoint::new(lon, lat), zoom, tile_size)?),
        Command::Tiles {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
            min_zoom,
            max_zoom,
            list,
        } => {
            let bounds = GeoBounds::new(GeoPoint::new(min_lon, min_lat), GeoPoint::new(max_lon, max_lat));
            print_json(&undergrid_cli::tiles(&bounds, min_zoom..=max_zoom, list, &cancel)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{text}");
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
