//! Building material profiles: shape probabilities, size ranges, colors and textures.

use engine_core::{Aabb, Color};
use rand::Rng;

use crate::shape::rand_uniform;

/// A color distribution sampled once per building.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRange {
    /// Extra random brightness added to RGB, scaled by a uniform `[0, 1)` draw.
    pub grayscale_rand: f32,
    pub cmin: Color,
    pub cmax: Color,
}

impl Default for ColorRange {
    fn default() -> Self {
        Self {
            grayscale_rand: 0.0,
            cmin: Color::WHITE,
            cmax: Color::WHITE,
        }
    }
}

impl ColorRange {
    /// A range that always yields exactly `color`.
    pub fn exact(color: Color) -> Self {
        Self {
            cmin: color,
            cmax: color,
            ..Default::default()
        }
    }

    pub fn gen_color<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        let mut color = if self.cmin == self.cmax {
            self.cmin
        } else {
            let (lo, hi) = (self.cmin.to_array(), self.cmax.to_array());
            let mut c = [0.0; 4];
            for i in 0..4 {
                c[i] = rand_uniform(rng, lo[i], hi[i]);
            }
            Color::from_array(c)
        };
        if self.grayscale_rand > 0.0 {
            let v = self.grayscale_rand * rng.gen::<f32>();
            color.r += v;
            color.g += v;
            color.b += v;
        }
        color
    }
}

/// Texture references for one surface (sides or roof).
///
/// Textures themselves live in the host renderer; only their names and the
/// average color (used to tint line-hit effects) are kept here.
#[derive(Debug, Clone, PartialEq)]
pub struct TexturePair {
    pub tid: Option<String>,
    pub nm_tid: Option<String>,
    pub tscale: f32,
    /// Average texel color, filled in by the host. White until resolved.
    pub avg_color: Color,
}

impl Default for TexturePair {
    fn default() -> Self {
        Self {
            tid: None,
            nm_tid: None,
            tscale: 1.0,
            avg_color: Color::WHITE,
        }
    }
}

/// Everything that varies per building material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialProfile {
    pub min_levels: u32,
    pub max_levels: u32,
    pub min_sides: u32,
    pub max_sides: u32,
    /// Altitude band relative to sea level.
    pub min_alt: f32,
    pub max_alt: f32,
    pub split_prob: f32,
    pub cube_prob: f32,
    pub round_prob: f32,
    /// Per-axis size range: `min` holds the lower bounds, `max` the upper bounds.
    /// X/Y are full widths, Z is the full height.
    pub size_range: Aabb,
    pub side_color: ColorRange,
    pub roof_color: ColorRange,
    pub side_tex: TexturePair,
    pub roof_tex: TexturePair,
    /// Relative selection weight when choosing a material for a new building.
    pub probability: u32,
}

impl Default for MaterialProfile {
    fn default() -> Self {
        Self {
            min_levels: 1,
            max_levels: 1,
            min_sides: 4,
            max_sides: 4,
            min_alt: -1000.0,
            max_alt: 1000.0,
            split_prob: 0.0,
            cube_prob: 1.0,
            round_prob: 0.0,
            size_range: Aabb::from_ranges(1.0, 1.0, 1.0, 1.0, 1.0, 1.0),
            side_color: ColorRange::default(),
            roof_color: ColorRange::default(),
            side_tex: TexturePair::default(),
            roof_tex: TexturePair::default(),
            probability: 1,
        }
    }
}

impl MaterialProfile {
    /// Is a building whose base sits `z_above_sea` over sea level allowed?
    pub fn altitude_ok(&self, z_above_sea: f32) -> bool {
        z_above_sea >= self.min_alt && z_above_sea <= self.max_alt
    }

    /// Draw one full size per axis from [`size_range`](Self::size_range).
    pub fn sample_size<R: Rng + ?Sized>(&self, rng: &mut R) -> [f32; 3] {
        let (lo, hi) = (self.size_range.min, self.size_range.max);
        [
            rand_uniform(rng, lo.x, hi.x),
            rand_uniform(rng, lo.y, hi.y),
            rand_uniform(rng, lo.z, hi.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn exact_color_range_is_constant() {
        let mut rng = StdRng::seed_from_u64(3);
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let range = ColorRange::exact(red);
        for _ in 0..10 {
            assert_eq!(range.gen_color(&mut rng), red);
        }
    }

    #[test]
    fn color_range_stays_within_bounds_plus_grayscale() {
        let mut rng = StdRng::seed_from_u64(9);
        let range = ColorRange {
            grayscale_rand: 0.1,
            cmin: Color::new(0.2, 0.2, 0.2, 1.0),
            cmax: Color::new(0.4, 0.5, 0.6, 1.0),
        };
        for _ in 0..100 {
            let c = range.gen_color(&mut rng);
            assert!(c.r >= 0.2 && c.r <= 0.5 + 1e-6, "r out of range: {}", c.r);
            assert!(c.b >= 0.2 && c.b <= 0.7 + 1e-6, "b out of range: {}", c.b);
            assert_eq!(c.a, 1.0);
        }
    }

    #[test]
    fn altitude_band() {
        let mat = MaterialProfile {
            min_alt: 5.0,
            max_alt: 50.0,
            ..Default::default()
        };
        assert!(mat.altitude_ok(10.0));
        assert!(!mat.altitude_ok(1.0));
        assert!(!mat.altitude_ok(60.0));
    }
}
