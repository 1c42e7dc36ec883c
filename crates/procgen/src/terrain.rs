//! Terrain seen by the placement engine: height sampling, water level and optional flattening.
//!
//! **Seed-based determinism:** [`NoiseTerrain`] derives all noise from its
//! config seed, so the same seed yields the same height at every (x, y).

use engine_core::{Aabb, Vec2};
use noise::{NoiseFn, Perlin, Simplex};

/// Height source for building placement. Z is up.
///
/// Sampling must be callable from worker threads; flattening is a mutation and
/// is only ever called sequentially.
pub trait Terrain: Sync {
    fn height_at(&self, x: f32, y: f32) -> f32;

    fn water_level(&self) -> f32;

    /// Whether [`flatten_region`](Self::flatten_region) does anything.
    fn can_flatten(&self) -> bool {
        false
    }

    /// Flatten the ground under `footprint` to `footprint.min.z`.
    fn flatten_region(&mut self, _footprint: &Aabb) {}

    fn is_underwater(&self, z: f32) -> bool {
        z < self.water_level()
    }
}

/// Constant-height ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    /// Ground height everywhere.
    pub height: f32,
    /// Sea level; ground below it is underwater.
    pub water_level: f32,
}

impl FlatTerrain {
    pub fn new(height: f32, water_level: f32) -> Self {
        Self {
            height,
            water_level,
        }
    }
}

impl Default for FlatTerrain {
    fn default() -> Self {
        Self::new(0.0, -10.0)
    }
}

impl Terrain for FlatTerrain {
    fn height_at(&self, _x: f32, _y: f32) -> f32 {
        self.height
    }

    fn water_level(&self) -> f32 {
        self.water_level
    }
}

/// Derive a deterministic u32 noise seed from a world seed and an offset.
#[inline]
fn deterministic_noise_seed(seed: u64, offset: u64) -> u32 {
    ((seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
        >> 32) as u32
}

/// Configuration for [`NoiseTerrain`].
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseTerrainConfig {
    /// Height at noise value 0.
    pub base_height: f32,
    /// Height span covered by noise values 0..1.
    pub height_scale: f32,
    /// Noise frequency (lower = smoother).
    pub frequency: f64,
    /// Number of noise layers summed.
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Noise seed; the same seed always gives the same heightfield.
    pub seed: u64,
    /// Sea level reported through [`Terrain::water_level`].
    pub water_level: f32,
}

impl Default for NoiseTerrainConfig {
    fn default() -> Self {
        Self {
            base_height: -5.0,
            height_scale: 40.0,
            frequency: 0.004,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 0,
            water_level: 0.0,
        }
    }
}

/// Fractal Perlin/Simplex heightfield with flattened rectangles on top.
#[derive(Debug, Clone)]
pub struct NoiseTerrain {
    config: NoiseTerrainConfig,
    perlin: Perlin,
    simplex: Simplex,
    /// Flattened footprints; the most recent one wins where they overlap.
    flattened: Vec<(Aabb, f32)>,
}

impl NoiseTerrain {
    pub fn new(config: NoiseTerrainConfig) -> Self {
        Self {
            perlin: Perlin::new(deterministic_noise_seed(config.seed, 0)),
            simplex: Simplex::new(deterministic_noise_seed(config.seed, 1)),
            config,
            flattened: Vec::new(),
        }
    }

    /// Number of flatten overrides recorded so far.
    pub fn num_flattened(&self) -> usize {
        self.flattened.len()
    }

    /// Drop all flatten overrides.
    pub fn reset_flattening(&mut self) {
        self.flattened.clear();
    }

    /// Height from noise alone, ignoring flattened regions.
    pub fn natural_height_at(&self, x: f32, y: f32) -> f32 {
        let n = self.fractal_noise(x as f64, y as f64) as f32;
        self.config.base_height + n * self.config.height_scale
    }

    fn fractal_noise(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.frequency;
        let mut max_value = 0.0;

        for _ in 0..self.config.octaves.max(1) {
            // Mix Perlin and Simplex for variety
            let perlin_sample = self.perlin.get([x * frequency, y * frequency]);
            let simplex_sample = self
                .simplex
                .get([x * frequency + 1000.0, y * frequency + 1000.0]);

            value += (perlin_sample * 0.7 + simplex_sample * 0.3) * amplitude;
            max_value += amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        // Normalize to 0-1 range
        (value / max_value + 1.0) * 0.5
    }
}

impl Terrain for NoiseTerrain {
    fn height_at(&self, x: f32, y: f32) -> f32 {
        let p = Vec2::new(x, y);
        self.flattened
            .iter()
            .rev()
            .find(|(bc, _)| bc.contains_pt_xy(p))
            .map(|&(_, z)| z)
            .unwrap_or_else(|| self.natural_height_at(x, y))
    }

    fn water_level(&self) -> f32 {
        self.config.water_level
    }

    fn can_flatten(&self) -> bool {
        true
    }

    fn flatten_region(&mut self, footprint: &Aabb) {
        self.flattened.push((*footprint, footprint.min.z));
    }
}
