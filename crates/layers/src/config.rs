use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Vegetation placement settings. Distances are in world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationConfig {
    pub seed: u64,
    /// Spacing of the sampling grid laid over area features.
    pub density: f64,
    /// Jitter bound is `jitter_numerator / density`, capped at half a cell.
    pub jitter_numerator: f64,
    /// Detail count added per accepted grass sample, split across species.
    pub detail_density: u16,
    /// Detail layer cells per tile edge.
    pub detail_resolution: usize,
    pub tree_species: Vec<String>,
    pub grass_species: Vec<String>,
    pub base_scale: f32,
    /// Relative scale variation, `scale = base * (1 + U(-j, j))`.
    pub scale_jitter: f32,
    /// Distance between instances along tree rows and hedges.
    pub line_spacing: f64,
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            density: 0.5,
            jitter_numerator: 400.0,
            detail_density: 16,
            detail_resolution: 64,
            tree_species: vec!["broadleaf".to_string(), "conifer".to_string()],
            grass_species: vec!["grass".to_string(), "wildflowers".to_string()],
            base_scale: 1.0,
            scale_jitter: 0.2,
            line_spacing: 0.1,
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
                write!(f, "failed to read vegetation config {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "failed to parse vegetation config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid vegetation config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl VegetationConfig {
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
        if !(self.density > 0.0) {
            return Err(ConfigError::Invalid("density must be positive"));
        }
        if !(self.line_spacing > 0.0) {
            return Err(ConfigError::Invalid("line_spacing must be positive"));
        }
        if self.jitter_numerator < 0.0 {
            return Err(ConfigError::Invalid("jitter_numerator must not be negative"));
        }
        if !(0.0..1.0).contains(&self.scale_jitter) {
            return Err(ConfigError::Invalid("scale_jitter must be in [0, 1)"));
        }
        if self.detail_resolution == 0 {
            return Err(ConfigError::Invalid("detail_resolution must be at least 1"));
        }
        Ok(())
    }

    /// Jitter bound for a sampling cell of the given edge length.
    pub fn jitter_bound(&self, cell: f64) -> f64 {
        (self.jitter_numerator / self.density).min(cell * 0.5)
    }
}
