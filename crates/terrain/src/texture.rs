use std::fmt;
use std::path::{Path, PathBuf};

use formats::{TEXTURE_EXTENSIONS, texture_dir_for, texture_file_name};
use image::imageops::FilterType;

use crate::container::{TerrainTile, TileTexture};

#[derive(Debug)]
pub enum TextureError {
    Missing { tile: (usize, usize), dir: PathBuf },
    Decode { path: PathBuf, source: image::ImageError },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Missing { tile, dir } => {
                write!(f, "no texture for tile {tile:?} in {}", dir.display())
            }
            TextureError::Decode { path, source } => {
                write!(f, "failed to load texture {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Decode { source, .. } => Some(source),
            TextureError::Missing { .. } => None,
        }
    }
}

/// Binds `<stem>_Textures/Tile__x__y.{png,jpg}` to tiles.
#[derive(Debug, Clone)]
pub struct TextureAssigner {
    dir: PathBuf,
    max_dimension: u32,
}

impl TextureAssigner {
    pub fn new(elevation_path: &Path, max_dimension: u32) -> Self {
        Self {
            dir: texture_dir_for(elevation_path),
            max_dimension,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First existing texture file for tile `(x, y)`.
    pub fn resolve(&self, x: usize, y: usize) -> Option<PathBuf> {
        TEXTURE_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(texture_file_name(x, y, ext)))
            .find(|p| p.is_file())
    }

    pub fn load(&self, path: &Path) -> Result<image::RgbaImage, TextureError> {
        let img = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let img = if img.width() > self.max_dimension || img.height() > self.max_dimension {
            img.resize_exact(
                (img.width() / 2).max(1),
                (img.height() / 2).max(1),
                FilterType::Triangle,
            )
        } else {
            img
        };
        Ok(img.to_rgba8())
    }

    /// Loads and binds the tile's texture; the tile is untouched on error.
    pub fn assign(&self, tile: &mut TerrainTile) -> Result<(), TextureError> {
        let (x, y) = tile.index();
        let path = self.resolve(x, y).ok_or_else(|| TextureError::Missing {
            tile: (x, y),
            dir: self.dir.clone(),
        })?;
        let image = self.load(&path)?;
        let size = tile.size();
        tile.texture = Some(TileTexture {
            path,
            image,
            uv_scale: [size.x as f32, size.z as f32],
        });
        Ok(())
    }
}
