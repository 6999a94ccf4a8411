use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use foundation::Grid2;
use foundation::bounds::Aabb2;
use foundation::math::{GeoPoint, Mercator, Vec2, Vec3};

use crate::config::ElevationMode;

/// Elevation range that maps to one unit of exaggerated height.
pub const ELEVATION_SCALE: f64 = 1112.0;
pub const EXAGGERATION_FACTOR: f64 = 100.0;
/// Ground meters covered by one world unit (ten units per kilometer).
pub const METERS_PER_WORLD_UNIT: f64 = 1000.0 / formats::WORLD_UNITS_PER_KM;

/// Vertical extent of every tile for the chosen elevation mode.
pub fn terrain_height(mode: ElevationMode, exaggeration: f32, min: f32, max: f32) -> f64 {
    let range = (max - min) as f64;
    match mode {
        ElevationMode::ExaggerationTerrain => {
            range / ELEVATION_SCALE * exaggeration as f64 * EXAGGERATION_FACTOR
        }
        ElevationMode::RealWorldElevation => range / METERS_PER_WORLD_UNIT,
    }
}

/// Image bound as a tile's single texture layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TileTexture {
    pub path: PathBuf,
    pub image: image::RgbaImage,
    /// UV repeat size in world units, `[x, z]`.
    pub uv_scale: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedInstance {
    pub species: String,
    /// Tile-local position; `y` is the terrain height at that point.
    pub position: Vec3,
    pub scale: f32,
}

/// Per-tile density grid for one vegetation species.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLayer {
    pub species: String,
    pub resolution: usize,
    pub counts: Vec<u16>,
}

impl DetailLayer {
    pub fn new(species: impl Into<String>, resolution: usize) -> Self {
        Self {
            species: species.into(),
            resolution,
            counts: vec![0; resolution * resolution],
        }
    }

    pub fn count(&self, cx: usize, cz: usize) -> u16 {
        self.counts[cz * self.resolution + cx]
    }

    pub fn add(&mut self, cx: usize, cz: usize, amount: u16) {
        let cell = &mut self.counts[cz * self.resolution + cx];
        *cell = cell.saturating_add(amount);
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

/// One height-field chunk of the terrain.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainTile {
    index: (usize, usize),
    position: Vec3,
    size: Vec3,
    resolution: usize,
    heights: Vec<f32>,
    source: PathBuf,
    pub texture: Option<TileTexture>,
    pub instances: Vec<PlacedInstance>,
    pub detail_layers: Vec<DetailLayer>,
    /// Ids of vector features already rasterized into this tile.
    pub already_created: BTreeSet<String>,
}

impl TerrainTile {
    pub fn new(index: (usize, usize), size: Vec3, resolution: usize, source: PathBuf) -> Self {
        Self {
            index,
            position: Vec3::new(size.x * index.0 as f64, 0.0, size.z * index.1 as f64),
            size,
            resolution,
            heights: vec![0.0; resolution * resolution],
            source,
            texture: None,
            instances: Vec::new(),
            detail_layers: Vec::new(),
            already_created: BTreeSet::new(),
        }
    }

    pub fn index(&self) -> (usize, usize) {
        self.index
    }

    /// World position of the tile's south-west corner.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Normalized heights, row-major, row 0 on the southern edge.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn heights_mut(&mut self) -> &mut [f32] {
        &mut self.heights
    }

    pub fn height(&self, col: usize, row: usize) -> f32 {
        self.heights[row * self.resolution + col]
    }

    pub fn set_height(&mut self, col: usize, row: usize, value: f32) {
        self.heights[row * self.resolution + col] = value;
    }

    /// World-space footprint.
    pub fn bounds(&self) -> Aabb2 {
        let min = self.position.plane();
        Aabb2::new(min, Vec2::new(min.x + self.size.x, min.z + self.size.z))
    }

    pub fn to_local(&self, world: Vec2) -> Vec2 {
        world - self.position.plane()
    }

    /// Bilinear terrain height (world units) at a tile-local point.
    pub fn sample_height(&self, local: Vec2) -> f64 {
        let last = (self.resolution - 1) as f64;
        let u = (local.x / self.size.x * last).clamp(0.0, last);
        let v = (local.z / self.size.z * last).clamp(0.0, last);
        let (c0, r0) = (u.floor() as usize, v.floor() as usize);
        let (c1, r1) = (
            (c0 + 1).min(self.resolution - 1),
            (r0 + 1).min(self.resolution - 1),
        );
        let (fu, fv) = (u - c0 as f64, v - r0 as f64);

        let h = |c, r| self.height(c, r) as f64;
        let south = h(c0, r0) * (1.0 - fu) + h(c1, r0) * fu;
        let north = h(c0, r1) * (1.0 - fu) + h(c1, r1) * fu;
        (south * (1.0 - fv) + north * fv) * self.size.y
    }

    /// Layer for `species`, created on first use.
    pub fn detail_layer_mut(&mut self, species: &str, resolution: usize) -> &mut DetailLayer {
        let idx = match self.detail_layers.iter().position(|l| l.species == species) {
            Some(idx) => idx,
            None => {
                self.detail_layers.push(DetailLayer::new(species, resolution));
                self.detail_layers.len() - 1
            }
        };
        &mut self.detail_layers[idx]
    }
}

pub type TileArena = Grid2<TerrainTile>;

/// The full tiled terrain plus its geographic placement.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainContainer {
    tile_size: Vec3,
    total_size: Vec2,
    top_left: GeoPoint,
    bottom_right: GeoPoint,
    top_left_mercator: Mercator,
    bottom_right_mercator: Mercator,
    tiles: TileArena,
}

impl TerrainContainer {
    pub fn new(
        tiles: [usize; 2],
        tile_size: Vec3,
        top_left: GeoPoint,
        bottom_right: GeoPoint,
        resolution: usize,
        source: &Path,
    ) -> Self {
        let arena = Grid2::from_fn(tiles[0], tiles[1], |x, y| {
            TerrainTile::new((x, y), tile_size, resolution, source.to_path_buf())
        });
        Self {
            tile_size,
            total_size: Vec2::new(tile_size.x * tiles[0] as f64, tile_size.z * tiles[1] as f64),
            top_left,
            bottom_right,
            top_left_mercator: Mercator::from_geo(top_left),
            bottom_right_mercator: Mercator::from_geo(bottom_right),
            tiles: arena,
        }
    }

    pub fn tiles_x(&self) -> usize {
        self.tiles.width()
    }

    pub fn tiles_y(&self) -> usize {
        self.tiles.height()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile_size(&self) -> Vec3 {
        self.tile_size
    }

    pub fn total_size(&self) -> Vec2 {
        self.total_size
    }

    pub fn top_left(&self) -> GeoPoint {
        self.top_left
    }

    pub fn bottom_right(&self) -> GeoPoint {
        self.bottom_right
    }

    pub fn top_left_mercator(&self) -> Mercator {
        self.top_left_mercator
    }

    pub fn bottom_right_mercator(&self) -> Mercator {
        self.bottom_right_mercator
    }

    pub fn tiles(&self) -> &TileArena {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut TileArena {
        &mut self.tiles
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&TerrainTile> {
        self.tiles.get(x, y)
    }

    pub fn tile_mut(&mut self, x: usize, y: usize) -> Option<&mut TerrainTile> {
        self.tiles.get_mut(x, y)
    }

    pub fn bounds(&self) -> Aabb2 {
        Aabb2::new(Vec2::new(0.0, 0.0), self.total_size)
    }

    /// Linear remap of Mercator into `[0, total_size]`; north is `+z`.
    pub fn mercator_to_world(&self, m: Mercator) -> Vec2 {
        let (tl, br) = (self.top_left_mercator, self.bottom_right_mercator);
        let x = (m.x - tl.x) / (br.x - tl.x) * self.total_size.x;
        let z = (br.y - m.y) / (br.y - tl.y) * self.total_size.z;
        Vec2::new(x, z)
    }

    pub fn world_to_mercator(&self, p: Vec2) -> Mercator {
        let (tl, br) = (self.top_left_mercator, self.bottom_right_mercator);
        let x = tl.x + p.x / self.total_size.x * (br.x - tl.x);
        let y = br.y - p.z / self.total_size.z * (br.y - tl.y);
        Mercator::new(x, y)
    }

    pub fn geo_to_world(&self, geo: GeoPoint) -> Vec2 {
        self.mercator_to_world(Mercator::from_geo(geo))
    }

    pub fn world_to_geo(&self, p: Vec2) -> GeoPoint {
        self.world_to_mercator(p).to_geo()
    }

    /// Tile covering world point `p`; points on the far edges belong to the
    /// last row/column.
    pub fn tile_index_at(&self, p: Vec2) -> Option<(usize, usize)> {
        if !self.bounds().contains(p) {
            return None;
        }
        let x = ((p.x / self.tile_size.x) as usize).min(self.tiles_x() - 1);
        let y = ((p.z / self.tile_size.z) as usize).min(self.tiles_y() - 1);
        Some((x, y))
    }
}
