//! mapinfo: inspect map feature lists and terrain type tables
//!
//! Usage:
//!   mapinfo features maps/2c-Startup/feat.bjo   # Print a feature list
//!   mapinfo terrain maps/2c-Startup             # Print a terrain type table
//!   mapinfo scan maps                           # Load every map below a directory
//!
//! Paths are relative to `--root` (default: current directory).
//! Set `RUST_LOG=debug` to see why a file was rejected.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

use mapdata::map::{try_load_features, try_load_terrain_types};
use mapdata::scan::{check_map_dir, find_map_dirs, ScanSummary};
use mapdata::{LocalStorage, Storage, Tileset};

#[derive(Parser)]
#[command(name = "mapinfo", version = mapdata::VERSION)]
#[command(about = "Inspect map feature lists and terrain type tables")]
struct Cli {
    /// Directory that resource paths are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Output format for printed tables
    #[arg(long, value_enum, default_value_t = Format::Ron)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Ron,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the feature list stored in a resource
    Features {
        /// Resource path, e.g. maps/2c-Startup/feat.bjo
        resource: String,
    },
    /// Print the terrain type table of a map directory
    Terrain {
        /// Map directory containing ttypes.ttp
        map_dir: String,
    },
    /// Load the tables of every map directory below a directory
    Scan {
        /// Directory to search
        #[arg(default_value = "")]
        dir: String,
    },
}

fn main() -> Result<()> {
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let local = LocalStorage::with_base_dir(&cli.root);

    match cli.command {
        Commands::Features { resource } => show_features(&Storage::from(local), &resource, cli.format),
        Commands::Terrain { map_dir } => show_terrain(&Storage::from(local), &map_dir, cli.format),
        Commands::Scan { dir } => scan(local, &dir),
    }
}

/// Print a value in the selected format
fn print<T: Serialize>(value: &T, format: Format) -> Result<()> {
    let text = match format {
        Format::Ron => {
            let config = ron::ser::PrettyConfig::new()
                .depth_limit(4)
                .indentor("  ".to_string());
            ron::ser::to_string_pretty(value, config).context("Failed to serialize as RON")?
        }
        Format::Json => serde_json::to_string_pretty(value).context("Failed to serialize as JSON")?,
    };
    println!("{}", text);
    Ok(())
}

fn show_features(storage: &Storage, resource: &str, format: Format) -> Result<()> {
    let table = try_load_features(storage, resource)
        .with_context(|| format!("Failed to load features from {}", resource))?;
    eprintln!(
        "{}: version {} ({:?} layout), {} features",
        resource,
        table.version,
        table.format(),
        table.len()
    );
    print(&table, format)
}

#[derive(Serialize)]
struct TerrainView<'a> {
    version: u32,
    count: u32,
    tileset: &'static str,
    types: &'a [mapdata::TerrainType],
}

fn show_terrain(storage: &Storage, map_dir: &str, format: Format) -> Result<()> {
    let table = try_load_terrain_types(storage, map_dir)
        .with_context(|| format!("Failed to load terrain types for {}", map_dir))?;

    let tileset = table.tileset().unwrap_or_else(|| {
        log::warn!(
            "Unknown terrain signature in {}: {:?}, assuming arizona",
            map_dir,
            &table.types[..3]
        );
        Tileset::Arizona
    });

    print(
        &TerrainView {
            version: table.version,
            count: table.count,
            tileset: tileset.label(),
            types: table.active(),
        },
        format,
    )
}

fn scan(local: LocalStorage, dir: &str) -> Result<()> {
    let dirs = find_map_dirs(&local, dir)
        .with_context(|| format!("Failed to search {}", local.base_dir().join(dir).display()))?;
    let storage = Storage::from(local);

    let pb = ProgressBar::new(dirs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Loading maps [{bar:30}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("█▓░"),
    );

    let mut summary = ScanSummary::default();
    let mut failures = Vec::new();
    for map_dir in &dirs {
        pb.set_message(map_dir.clone());
        let report = check_map_dir(&storage, map_dir);
        summary.add(&report);
        if report.has_failure() {
            failures.push(report);
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("Checked {} map directories", summary.dirs));

    for report in &failures {
        println!("{}:", report.dir);
        println!("  features:      {:?}", report.features);
        println!("  terrain types: {:?}", report.terrain_types);
    }
    println!(
        "{} tables loaded, {} absent, {} failed",
        summary.loaded, summary.absent, summary.failed
    );

    if summary.failed > 0 {
        bail!("{} tables failed to load", summary.failed);
    }
    Ok(())
}
