use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const TERRAIN_MANIFEST_VERSION: &str = "1.0";
pub const TERRAIN_MANIFEST_FILE_NAME: &str = "terrain.manifest.json";

#[derive(Debug)]
pub enum ExportError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    UnsupportedVersion {
        found: String,
    },
    HeightCount {
        x: usize,
        y: usize,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io { path, source } => write!(f, "I/O error at {}: {source}", path.display()),
            ExportError::Json(err) => write!(f, "manifest JSON error: {err}"),
            ExportError::UnsupportedVersion { found } => {
                write!(f, "unsupported terrain manifest version: {found}")
            }
            ExportError::HeightCount {
                x,
                y,
                expected,
                found,
            } => write!(
                f,
                "tile ({x}, {y}) has {found} height samples, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io { source, .. } => Some(source),
            ExportError::Json(err) => Some(err),
            ExportError::UnsupportedVersion { .. } | ExportError::HeightCount { .. } => None,
        }
    }
}

/// Index of an exported terrain, written next to the tile payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainManifest {
    pub version: String,
    pub source: String,
    /// `[lat, lon]` of the south-west corner.
    pub origin: [f64; 2],
    pub min_elevation: f32,
    pub max_elevation: f32,
    pub tiles_x: usize,
    pub tiles_y: usize,
    /// `[x, height, z]` in world units.
    pub tile_size: [f64; 3],
    pub heightmap_resolution: usize,
    pub tiles: Vec<TileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TileEntry {
    pub x: usize,
    pub y: usize,
    /// Little-endian `f32` heights, row-major, south row first.
    pub heights: String,
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<String>,
    #[serde(default)]
    pub instance_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detail_layers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceRecord {
    pub species: String,
    /// Tile-local position.
    pub position: [f32; 3],
    pub scale: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailLayerRecord {
    pub species: String,
    pub resolution: usize,
    pub counts: Vec<u16>,
}

/// One tile's payload handed to [`TerrainExporter::write_tile`].
#[derive(Debug, Clone, PartialEq)]
pub struct TileExport<'a> {
    pub x: usize,
    pub y: usize,
    pub heights: &'a [f32],
    pub texture: Option<&'a Path>,
    pub instances: Vec<InstanceRecord>,
    pub detail_layers: Vec<DetailLayerRecord>,
}

impl TerrainManifest {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = root.as_ref().join(TERRAIN_MANIFEST_FILE_NAME);
        let payload = fs::read_to_string(&path).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        let manifest: TerrainManifest = serde_json::from_str(&payload).map_err(ExportError::Json)?;
        if manifest.version != TERRAIN_MANIFEST_VERSION {
            return Err(ExportError::UnsupportedVersion {
                found: manifest.version,
            });
        }
        Ok(manifest)
    }
}

/// Writes tile payloads and the manifest into an output directory.
#[derive(Debug)]
pub struct TerrainExporter {
    root: PathBuf,
    manifest: TerrainManifest,
}

impl TerrainExporter {
    /// `manifest.tiles` is filled by [`TerrainExporter::write_tile`].
    pub fn create(root: impl AsRef<Path>, mut manifest: TerrainManifest) -> Result<Self, ExportError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| ExportError::Io {
            path: root.clone(),
            source,
        })?;
        manifest.version = TERRAIN_MANIFEST_VERSION.to_string();
        manifest.tiles.clear();
        Ok(Self { root, manifest })
    }

    pub fn write_tile(&mut self, tile: TileExport<'_>) -> Result<(), ExportError> {
        let res = self.manifest.heightmap_resolution;
        if tile.heights.len() != res * res {
            return Err(ExportError::HeightCount {
                x: tile.x,
                y: tile.y,
                expected: res * res,
                found: tile.heights.len(),
            });
        }

        let bytes: Vec<u8> = tile.heights.iter().flat_map(|h| h.to_le_bytes()).collect();
        let heights_name = format!("tile_{}_{}.bin", tile.x, tile.y);
        self.write_file(&heights_name, &bytes)?;

        let instances = if tile.instances.is_empty() {
            None
        } else {
            let name = format!("tile_{}_{}.instances.json", tile.x, tile.y);
            let payload = serde_json::to_vec_pretty(&tile.instances).map_err(ExportError::Json)?;
            self.write_file(&name, &payload)?;
            Some(name)
        };

        let mut detail_layers = Vec::with_capacity(tile.detail_layers.len());
        for (i, layer) in tile.detail_layers.iter().enumerate() {
            let name = format!("tile_{}_{}.detail{i}.json", tile.x, tile.y);
            let payload = serde_json::to_vec(layer).map_err(ExportError::Json)?;
            self.write_file(&name, &payload)?;
            detail_layers.push(name);
        }

        self.manifest.tiles.push(TileEntry {
            x: tile.x,
            y: tile.y,
            heights: heights_name,
            content_hash: blake3::hash(&bytes).to_hex().to_string(),
            texture: tile.texture.map(|p| p.display().to_string()),
            instances,
            instance_count: tile.instances.len(),
            detail_layers,
        });
        Ok(())
    }

    /// Writes the manifest and returns its path.
    pub fn finish(self) -> Result<PathBuf, ExportError> {
        let payload = serde_json::to_string_pretty(&self.manifest).map_err(ExportError::Json)?;
        let path = self.root.join(TERRAIN_MANIFEST_FILE_NAME);
        fs::write(&path, payload).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        let path = self.root.join(name);
        fs::write(&path, bytes).map_err(|source| ExportError::Io { path, source })
    }
}
