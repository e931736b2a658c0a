//! Configuration system
//!
//! Detector configuration is plain serde data loadable from TOML or RON.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::collision::DetectorType;
use crate::foundation::math::Vec3;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            ConfigFormat::Ron => {
                ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Supported on-disk formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Octree broad-phase settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeSettings {
    /// Minimum corner of the indexed world volume
    pub world_min: Vec3,

    /// Maximum corner of the indexed world volume
    pub world_max: Vec3,

    /// Maximum proxies per node before subdivision
    pub max_entities_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node half-size (prevents excessive subdivision)
    pub min_node_size: f64,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        Self {
            world_min: Vec3::new(-100.0, -100.0, -100.0),
            world_max: Vec3::new(100.0, 100.0, 100.0),
            max_entities_per_node: 8,
            max_depth: 8,
            min_node_size: 0.5,
        }
    }
}

/// Resolution used when shapes without a native primitive are tessellated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationSettings {
    /// Radial subdivisions of a cylinder
    pub cylinder_slices: u32,

    /// Axial subdivisions of a cylinder
    pub cylinder_stacks: u32,

    /// Latitude bands of a non-spherical ellipsoid
    pub ellipsoid_rings: u32,

    /// Longitude segments of a non-spherical ellipsoid
    pub ellipsoid_segments: u32,
}

impl Default for TessellationSettings {
    fn default() -> Self {
        Self {
            cylinder_slices: 16,
            cylinder_stacks: 16,
            ellipsoid_rings: 8,
            ellipsoid_segments: 16,
        }
    }
}

/// Defaults applied by [`crate::collision::CollisionDetector::default_option`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionDefaults {
    /// Contact count at which detection stops early
    pub max_num_contacts: usize,

    /// Whether contact points are computed at all
    pub enable_contact: bool,
}

impl Default for DetectionDefaults {
    fn default() -> Self {
        Self {
            max_num_contacts: 1000,
            enable_contact: true,
        }
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Broad-phase backend, which is also the detector's type tag
    pub detector_type: DetectorType,

    /// Octree settings (ignored by other backends)
    pub octree: OctreeSettings,

    /// Tessellation resolution for the geometry builder
    pub tessellation: TessellationSettings,

    /// Default detection option values
    pub detection: DetectionDefaults,
}

impl Config for DetectorConfig {}

impl DetectorConfig {
    /// Check values that deserialize fine but would break the engine
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (&self.octree.world_min, &self.octree.world_max);
        if min.x >= max.x || min.y >= max.y || min.z >= max.z {
            return Err(ConfigError::Invalid(format!(
                "octree world bounds are empty: min {min:?}, max {max:?}"
            )));
        }
        if self.octree.max_entities_per_node == 0 {
            return Err(ConfigError::Invalid("octree max_entities_per_node must be > 0".into()));
        }
        if self.tessellation.cylinder_slices < 3 || self.tessellation.cylinder_stacks < 1 {
            return Err(ConfigError::Invalid(format!(
                "cylinder tessellation needs >= 3 slices and >= 1 stack, got {}x{}",
                self.tessellation.cylinder_slices, self.tessellation.cylinder_stacks
            )));
        }
        if self.tessellation.ellipsoid_rings < 2 || self.tessellation.ellipsoid_segments < 3 {
            return Err(ConfigError::Invalid(format!(
                "ellipsoid tessellation needs >= 2 rings and >= 3 segments, got {}x{}",
                self.tessellation.ellipsoid_rings, self.tessellation.ellipsoid_segments
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("collision_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let path = temp_path("detector.toml");
        let mut config = DetectorConfig::default();
        config.detector_type = DetectorType::BruteForce;
        config.tessellation.cylinder_slices = 24;
        config.save_to_file(&path).unwrap();

        let loaded = DetectorConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_ron_round_trip() {
        let path = temp_path("detector.ron");
        let mut config = DetectorConfig::default();
        config.detection.max_num_contacts = 4;
        config.save_to_file(&path).unwrap();

        let loaded = DetectorConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DetectorConfig = toml::from_str(
            r#"
            detector_type = "brute_force"

            [detection]
            max_num_contacts = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.detector_type, DetectorType::BruteForce);
        assert_eq!(config.detection.max_num_contacts, 10);
        assert!(config.detection.enable_contact);
        assert_eq!(config.tessellation, TessellationSettings::default());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = DetectorConfig::default().save_to_file(temp_path("detector.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_empty_world_bounds_are_invalid() {
        let mut config = DetectorConfig::default();
        config.octree.world_max = config.octree.world_min;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
