//! Landscape settings, loadable from TOML.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```toml
//! window_size = [9, 9]
//! view_distance = 150.0
//!
//! [terrain]
//! seed = 7
//! ```

use std::path::Path;
use std::{fmt, io};

use bevy::log::info;
use serde::{Deserialize, Serialize};

/// Noise parameters for terrain generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
  /// Perlin permutation seed shared by both noise fields.
  pub seed: u32,
  /// Lattice units per noise unit.
  pub noise_scale: f32,
  /// Lattice offset of the cavern field relative to the surface field, so
  /// cavern roofs are not correlated with surface height.
  pub cavern_offset: [i32; 2],
}

impl Default for TerrainConfig {
  fn default() -> Self {
    Self {
      seed: 0,
      noise_scale: 133.37,
      cavern_offset: [444, 124],
    }
  }
}

/// Configuration for the streamed landscape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandscapeConfig {
  /// Window of chunk slots kept around the observer, in chunks (x, z).
  pub window_size: [u32; 2],
  /// Chunks farther than this (world units, XZ) from the observer are not
  /// handed to the renderer.
  pub view_distance: f32,
  /// Generation worker threads. 0 picks one per logical CPU.
  pub worker_threads: usize,
  /// Terrain noise parameters.
  pub terrain: TerrainConfig,
}

impl Default for LandscapeConfig {
  fn default() -> Self {
    Self {
      window_size: [17, 17],
      view_distance: 200.0,
      worker_threads: 0,
      terrain: TerrainConfig::default(),
    }
  }
}

impl LandscapeConfig {
  /// Parses and validates a TOML document.
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads, parses and validates a TOML file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let config = Self::from_toml_str(&contents)?;
    info!("Loaded landscape config from {}", path.display());
    Ok(config)
  }

  /// Serializes the config as pretty TOML.
  pub fn to_toml_string(&self) -> Result<String, ConfigError> {
    toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
  }

  /// Checks value ranges that serde cannot express.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let [w, h] = self.window_size;
    if w == 0 || h == 0 {
      return Err(ConfigError::Invalid(format!(
        "window_size must be at least 1x1, got {w}x{h}"
      )));
    }
    if !(self.view_distance.is_finite() && self.view_distance > 0.0) {
      return Err(ConfigError::Invalid(format!(
        "view_distance must be positive, got {}",
        self.view_distance
      )));
    }
    if !(self.terrain.noise_scale.is_finite() && self.terrain.noise_scale > 0.0) {
      return Err(ConfigError::Invalid(format!(
        "terrain.noise_scale must be positive, got {}",
        self.terrain.noise_scale
      )));
    }
    Ok(())
  }
}

/// Error loading a landscape config.
#[derive(Debug)]
pub enum ConfigError {
  /// The file could not be read.
  Io(io::Error),
  /// The document is not valid TOML or has mistyped keys.
  Parse(toml::de::Error),
  /// A value is out of range.
  Invalid(String),
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(e) => write!(f, "I/O error: {e}"),
      Self::Parse(e) => write!(f, "parse error: {e}"),
      Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io(e) => Some(e),
      Self::Parse(e) => Some(e),
      Self::Invalid(_) => None,
    }
  }
}

impl From<io::Error> for ConfigError {
  fn from(err: io::Error) -> Self {
    Self::Io(err)
  }
}

impl From<toml::de::Error> for ConfigError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn empty_document_yields_defaults() {
    let config = LandscapeConfig::from_toml_str("").unwrap();
    assert_eq!(config, LandscapeConfig::default());
  }

  #[test]
  fn partial_document_overrides_only_given_keys() {
    let config = LandscapeConfig::from_toml_str(
      r#"
      window_size = [5, 3]

      [terrain]
      seed = 9
      "#,
    )
    .unwrap();
    assert_eq!(config.window_size, [5, 3]);
    assert_eq!(config.view_distance, 200.0);
    assert_eq!(config.terrain.seed, 9);
    assert_eq!(config.terrain.cavern_offset, [444, 124]);
  }

  #[test]
  fn defaults_survive_toml_round_trip() {
    let text = LandscapeConfig::default().to_toml_string().unwrap();
    assert_eq!(
      LandscapeConfig::from_toml_str(&text).unwrap(),
      LandscapeConfig::default()
    );
  }

  #[test]
  fn invalid_values_are_rejected() {
    assert!(matches!(
      LandscapeConfig::from_toml_str("window_size = [0, 4]"),
      Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
      LandscapeConfig::from_toml_str("view_distance = -1.0"),
      Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
      LandscapeConfig::from_toml_str("[terrain]\nnoise_scale = 0.0"),
      Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
      LandscapeConfig::from_toml_str("window_size = \"big\""),
      Err(ConfigError::Parse(_))
    ));
  }

  #[test]
  fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "worker_threads = 2").unwrap();
    let config = LandscapeConfig::load(file.path()).unwrap();
    assert_eq!(config.worker_threads, 2);

    let missing = file.path().with_extension("missing");
    assert!(matches!(
      LandscapeConfig::load(missing),
      Err(ConfigError::Io(_))
    ));
  }
}
