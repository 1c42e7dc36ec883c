//! Demo settings (seeds, terrain, probes). Loaded from citygen.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use procgen::NoiseTerrainConfig;

/// Settings for the `citygen` demo. Loaded from `citygen.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Seed for building placement.
    #[serde(default = "default_world_seed")]
    pub world_seed: u64,
    /// Buildings config file. `None` uses the built-in default.
    #[serde(default)]
    pub buildings_config: Option<PathBuf>,
    #[serde(default)]
    pub terrain: TerrainSettings,
    #[serde(default)]
    pub walker: WalkerSettings,
    #[serde(default)]
    pub ray_fan: RayFanSettings,
    /// Generate this many fields back to back, swapping each into the collision world.
    #[serde(default = "default_regenerations")]
    pub regenerations: u32,
}

/// Demo heightfield parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub seed: u64,
    pub base_height: f32,
    pub height_scale: f32,
    pub frequency: f64,
    pub octaves: u32,
    pub water_level: f32,
}

/// A sphere walked across the field in fixed steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerSettings {
    pub start: [f32; 2],
    /// XY displacement per step.
    pub step: [f32; 2],
    pub steps: u32,
    pub radius: f32,
}

/// Rays cast outward from one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RayFanSettings {
    pub origin: [f32; 3],
    pub count: u32,
    pub length: f32,
    /// Downward tilt in degrees.
    pub pitch_degrees: f32,
}

fn default_world_seed() -> u64 {
    1
}
fn default_regenerations() -> u32 {
    1
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            world_seed: default_world_seed(),
            buildings_config: None,
            terrain: TerrainSettings::default(),
            walker: WalkerSettings::default(),
            ray_fan: RayFanSettings::default(),
            regenerations: default_regenerations(),
        }
    }
}

impl Default for TerrainSettings {
    fn default() -> Self {
        let noise = NoiseTerrainConfig::default();
        Self {
            seed: noise.seed,
            base_height: noise.base_height,
            height_scale: noise.height_scale,
            frequency: noise.frequency,
            octaves: noise.octaves,
            water_level: noise.water_level,
        }
    }
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self {
            start: [-550.0, -550.0],
            step: [2.0, 2.0],
            steps: 550,
            radius: 1.0,
        }
    }
}

impl Default for RayFanSettings {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0, 60.0],
            count: 64,
            length: 800.0,
            pitch_degrees: 5.0,
        }
    }
}

impl TerrainSettings {
    pub fn to_noise_config(&self) -> NoiseTerrainConfig {
        NoiseTerrainConfig {
            seed: self.seed,
            base_height: self.base_height,
            height_scale: self.height_scale,
            frequency: self.frequency,
            octaves: self.octaves,
            water_level: self.water_level,
            ..Default::default()
        }
    }
}

impl DemoConfig {
    /// Load config from `citygen.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("citygen.ron")
}
