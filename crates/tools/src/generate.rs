use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use formats::{
    DetailLayerRecord, InstanceRecord, TerrainExporter, TerrainManifest, TileExport, VectorDocument,
};
use foundation::math::GeoPoint;
use layers::{PlacementReport, VegetationPlacer};
use runtime::EventKind;
use terrain::{TerrainContainer, TileOrchestrator};
use tracing::{debug, info, warn};

use crate::settings::ToolSettings;

/// Inputs of one `terragen generate` run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub elevation: PathBuf,
    pub map: Option<PathBuf>,
    pub out: PathBuf,
    /// Wall-clock allowance per simulated host tick.
    pub tick: Duration,
    pub settings: ToolSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateSummary {
    pub ticks: u64,
    pub tiles: usize,
    pub manifest: PathBuf,
    pub placement: Option<PlacementReport>,
}

/// Elevation context reported with the completion event.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Origin {
    point: GeoPoint,
    min_elevation: f32,
    max_elevation: f32,
}

/// Drives the orchestrator to completion, places vegetation, exports tiles.
pub fn generate(opts: &GenerateOptions) -> Result<GenerateSummary, Box<dyn Error>> {
    let mut orchestrator = TileOrchestrator::new(opts.settings.generation.clone());
    if !orchestrator.start(&opts.elevation) {
        return Err("terrain generation is already running".into());
    }

    let mut ticks = 0u64;
    let mut origin = None;
    while orchestrator.is_running() {
        orchestrator.advance(opts.tick);
        ticks += 1;
        for event in orchestrator.events_mut().drain() {
            match event.kind {
                EventKind::Progress { phase, progress } => {
                    debug!(tick = event.tick_index, phase, progress, "progress")
                }
                EventKind::Origin {
                    origin: point,
                    min_elevation,
                    max_elevation,
                } => {
                    info!(
                        lat = point.lat_deg,
                        lon = point.lon_deg,
                        min_elevation,
                        max_elevation,
                        "terrain origin"
                    );
                    origin = Some(Origin {
                        point,
                        min_elevation,
                        max_elevation,
                    });
                }
                EventKind::ReadError { message } => warn!(%message, "elevation source unreadable"),
            }
        }
    }

    if let Some(err) = orchestrator.take_error() {
        return Err(Box::new(err));
    }
    let mut container = orchestrator
        .sink_mut()
        .take_latest()
        .ok_or("generation finished without a terrain")?;
    let origin = origin.ok_or("generation finished without an origin")?;

    let placement = match &opts.map {
        Some(path) => {
            let doc = VectorDocument::load(path)?;
            let mut placer = VegetationPlacer::new(opts.settings.vegetation.clone())?;
            Some(placer.place(&doc, &mut container))
        }
        None => None,
    };

    let manifest = export_terrain(&container, &opts.elevation, origin, &opts.out)?;
    info!(ticks, tiles = container.tile_count(), manifest = %manifest.display(), "export complete");
    Ok(GenerateSummary {
        ticks,
        tiles: container.tile_count(),
        manifest,
        placement,
    })
}

fn export_terrain(
    container: &TerrainContainer,
    source: &Path,
    origin: Origin,
    out: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let resolution = container
        .tile(0, 0)
        .map(|t| t.resolution())
        .ok_or("terrain has no tiles")?;
    let size = container.tile_size();
    let manifest = TerrainManifest {
        version: String::new(),
        source: source.display().to_string(),
        origin: [origin.point.lat_deg, origin.point.lon_deg],
        min_elevation: origin.min_elevation,
        max_elevation: origin.max_elevation,
        tiles_x: container.tiles_x(),
        tiles_y: container.tiles_y(),
        tile_size: [size.x, size.y, size.z],
        heightmap_resolution: resolution,
        tiles: Vec::new(),
    };

    let mut exporter = TerrainExporter::create(out, manifest)?;
    for ((x, y), tile) in container.tiles().iter() {
        let instances = tile
            .instances
            .iter()
            .map(|i| InstanceRecord {
                species: i.species.clone(),
                position: i.position.as_f32(),
                scale: i.scale,
            })
            .collect();
        let detail_layers = tile
            .detail_layers
            .iter()
            .map(|l| DetailLayerRecord {
                species: l.species.clone(),
                resolution: l.resolution,
                counts: l.counts.clone(),
            })
            .collect();
        exporter.write_tile(TileExport {
            x,
            y,
            heights: tile.heights(),
            texture: tile.texture.as_ref().map(|t| t.path.as_path()),
            instances,
            detail_layers,
        })?;
    }
    Ok(exporter.finish()?)
}
