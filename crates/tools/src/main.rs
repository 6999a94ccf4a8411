use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use formats::{ElevationGrid, VectorDocument, detect_texture_layout, texture_dir_for};
use foundation::math::{DistanceUnit, GeoPoint, great_circle_distance};
use terrain::{ElevationMode, TextureMode};
use tools::{GenerateOptions, ToolSettings, generate};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tiled terrain generation from elevation grids and vector maps")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate tiles, place vegetation and export them
    Generate {
        /// Elevation samples; the header is read from the sibling .hdr file
        #[arg(long)]
        elevation: PathBuf,

        /// OSM XML map used for vegetation
        #[arg(long)]
        map: Option<PathBuf>,

        /// JSON settings with optional "generation" and "vegetation" sections
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "out/terrain")]
        out: PathBuf,

        /// Time budget per tick in milliseconds
        #[arg(long, default_value_t = 16)]
        tick_ms: u64,

        /// Tile grid as XxY when no texture tiles are present
        #[arg(long)]
        tiles: Option<String>,

        /// Height samples per tile edge
        #[arg(long)]
        resolution: Option<usize>,

        /// Use real-world heights instead of exaggerated ones
        #[arg(long)]
        real_world: bool,

        /// Skip texture binding
        #[arg(long)]
        no_texture: bool,

        /// Vegetation random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print elevation header, bounds and texture layout
    Inspect {
        #[arg(long)]
        elevation: PathBuf,

        #[arg(long)]
        map: Option<PathBuf>,
    },

    /// Great-circle distance between two points
    Distance {
        #[arg(long, allow_hyphen_values = true)]
        lat1: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon1: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat2: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon2: f64,
        #[arg(long, value_enum, default_value_t = Unit::Km)]
        unit: Unit,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum Unit {
    Km,
    Mi,
    Nm,
}

impl From<Unit> for DistanceUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Km => DistanceUnit::Kilometers,
            Unit::Mi => DistanceUnit::Miles,
            Unit::Nm => DistanceUnit::NauticalMiles,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Generate {
            elevation,
            map,
            config,
            out,
            tick_ms,
            tiles,
            resolution,
            real_world,
            no_texture,
            seed,
        } => {
            let mut settings = match config {
                Some(path) => ToolSettings::load(path)?,
                None => ToolSettings::default(),
            };
            if let Some(tiles) = tiles {
                settings.generation.tiles = parse_tiles(&tiles)?;
            }
            if let Some(resolution) = resolution {
                settings.generation.heightmap_resolution = resolution;
            }
            if real_world {
                settings.generation.elevation_mode = ElevationMode::RealWorldElevation;
            }
            if no_texture {
                settings.generation.texture_mode = TextureMode::WithoutTexture;
            }
            if let Some(seed) = seed {
                settings.vegetation.seed = seed;
            }
            settings.generation.validate()?;

            let summary = generate(&GenerateOptions {
                elevation,
                map,
                out,
                tick: Duration::from_millis(tick_ms),
                settings,
            })?;
            info!(ticks = summary.ticks, tiles = summary.tiles, "done");
            println!("{}", summary.manifest.display());
        }
        Command::Inspect { elevation, map } => inspect(elevation, map)?,
        Command::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
            unit,
        } => {
            let d = great_circle_distance(
                GeoPoint::new(lat1, lon1),
                GeoPoint::new(lat2, lon2),
                unit.into(),
            );
            println!("{d:.6}");
        }
    }

    Ok(())
}

fn parse_tiles(raw: &str) -> Result<[usize; 2], Box<dyn std::error::Error>> {
    let (x, y) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("tiles must look like 4x3, got {raw}"))?;
    Ok([x.trim().parse()?, y.trim().parse()?])
}

fn inspect(elevation: PathBuf, map: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let grid = ElevationGrid::load(&elevation)?;
    let h = grid.header();
    println!("source\t{}", elevation.display());
    println!("grid\t{} cols x {} rows", h.ncols, h.nrows);
    println!("cell\t{} x {} deg", h.xdim, h.ydim);
    for (name, p) in [
        ("origin", grid.origin()),
        ("top_left", grid.top_left()),
        ("top_right", grid.top_right()),
        ("bottom_right", grid.bottom_right()),
    ] {
        println!("{name}\t{:.6}, {:.6}", p.lat_deg, p.lon_deg);
    }
    if grid.has_data() {
        println!(
            "elevation\t{} .. {} m",
            grid.min_elevation(),
            grid.max_elevation()
        );
    } else {
        println!("elevation\tno data");
    }
    let size = grid.world_size();
    println!("world\t{:.3} x {:.3} units", size.x, size.z);
    match detect_texture_layout(&texture_dir_for(&elevation)) {
        Some(layout) => println!("textures\t{} x {}", layout.columns, layout.rows),
        None => println!("textures\tnone"),
    }

    if let Some(map) = map {
        let doc = VectorDocument::load(&map)?;
        println!(
            "map\t{} nodes, {} ways, {} relations",
            doc.nodes().count(),
            doc.ways().count(),
            doc.relations().len()
        );
    }
    Ok(())
}
