use std::fs;
use std::path::Path;

use layers::VegetationConfig;
use serde::{Deserialize, Serialize};
use terrain::GenerationConfig;

/// Contents of the optional `--config` JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub generation: GenerationConfig,
    pub vegetation: VegetationConfig,
}

impl ToolSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path)
            .map_err(|e| format!("read config {}: {e}", path.display()))?;
        let settings: Self = serde_json::from_str(&payload)?;
        settings.generation.validate()?;
        settings.vegetation.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::ToolSettings;
    use std::fs;

    #[test]
    fn sections_are_optional() {
        let mut path = std::env::temp_dir();
        path.push(format!("terragen_settings_{}.json", std::process::id()));
        fs::write(&path, r#"{ "vegetation": { "seed": 99 } }"#).expect("write config");

        let settings = ToolSettings::load(&path).expect("load");
        assert_eq!(settings.vegetation.seed, 99);
        assert_eq!(settings.generation, terrain::GenerationConfig::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut path = std::env::temp_dir();
        path.push(format!("terragen_settings_bad_{}.json", std::process::id()));
        fs::write(&path, r#"{ "generation": { "heightmap_resolution": 1 } }"#).expect("write");
        assert!(ToolSettings::load(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
