use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ElevationMode {
    RealWorldElevation,
    #[default]
    ExaggerationTerrain,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TextureMode {
    #[default]
    WithTexture,
    WithoutTexture,
}

/// Parameters of one stitching pass.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StitchPass {
    /// Samples on each side of a seam that receive part of the correction.
    pub blend_width: usize,
    /// Exponent shaping how fast the correction fades away from the seam.
    pub falloff: f32,
}

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub elevation_mode: ElevationMode,
    /// Vertical multiplier in `ExaggerationTerrain` mode.
    pub exaggeration: f32,
    /// Tile grid used when no texture tiling is found next to the source.
    pub tiles: [usize; 2],
    pub texture_mode: TextureMode,
    /// Textures larger than this in either dimension are halved.
    pub texture_max_dimension: u32,
    /// Height samples per tile edge.
    pub heightmap_resolution: usize,
    pub coarse_stitch: StitchPass,
    pub fine_stitch: StitchPass,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            elevation_mode: ElevationMode::ExaggerationTerrain,
            exaggeration: 1.0,
            tiles: [2, 2],
            texture_mode: TextureMode::WithTexture,
            texture_max_dimension: 128,
            heightmap_resolution: 129,
            coarse_stitch: StitchPass {
                blend_width: 16,
                falloff: 2.0,
            },
            fine_stitch: StitchPass {
                blend_width: 3,
                falloff: 1.0,
            },
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "failed to parse config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl GenerationConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(payload).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heightmap_resolution < 2 {
            return Err(ConfigError::Invalid("heightmap_resolution must be at least 2"));
        }
        if self.exaggeration <= 0.0 || !self.exaggeration.is_finite() {
            return Err(ConfigError::Invalid("exaggeration must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ElevationMode, GenerationConfig, TextureMode};

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = GenerationConfig::from_json_str(
            r#"{ "elevation_mode": "RealWorldElevation", "texture_mode": "WithoutTexture" }"#,
        )
        .expect("parse");
        assert_eq!(cfg.elevation_mode, ElevationMode::RealWorldElevation);
        assert_eq!(cfg.texture_mode, TextureMode::WithoutTexture);
        assert_eq!(cfg.heightmap_resolution, 129);
        assert_eq!(cfg.texture_max_dimension, 128);
    }

    #[test]
    fn rejects_degenerate_resolution() {
        let err = GenerationConfig::from_json_str(r#"{ "heightmap_resolution": 1 }"#)
            .expect_err("too small");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
