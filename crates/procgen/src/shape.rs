//! Procedural building shapes: side count, levels, L/T/U footprint splits and rotation.
//!
//! **Determinism:** `gen_geometry` draws only from an RNG seeded by the
//! building's index, so the same field regenerates identically no matter how
//! the per-building work is scheduled across threads.

use engine_core::{Aabb, Vec3, XyRotation};
use rand::prelude::*;

use crate::building::{Building, MAX_CYLIN_SIDES};
use crate::material::MaterialProfile;

/// Footprint regeneration attempts per telescoping level.
const MAX_SHRINK_ATTEMPTS: usize = 10;
/// Per-edge inset range (fraction of base size) for telescoping levels; negative draws clamp to 0.
const TELESCOPE_INSET: (f32, f32) = (-0.2, 0.45);
/// Per-edge inset range (fraction of edge length) for stacked levels.
const STACK_INSET: (f32, f32) = (0.1, 0.4);
/// Shared Z jitter of stacked level boundaries, as a fraction of one level height.
const STACK_Z_JITTER: f32 = 0.35;
/// Number of L/T/U split variants: 0-3 are L shapes, 4-5 T shapes, 6 the U shape.
pub const NUM_SPLIT_SHAPES: u32 = 7;
const U_SHAPE: u32 = 6;

/// Uniform `f32` in `[lo, hi)`; degenerate or inverted ranges are allowed.
pub(crate) fn rand_uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * rng.gen::<f32>()
}

pub(crate) fn rand_probability<R: Rng + ?Sized>(rng: &mut R, p: f32) -> bool {
    rng.gen::<f32>() < p
}

/// Seed for a building's geometry, derived only from its index in the building list.
pub fn building_seed(ix: usize) -> u64 {
    let ix = ix as u64;
    (123u64.wrapping_add(ix) << 32) ^ 345u64.wrapping_mul(ix)
}

/// One L/T/U split of a footprint, fully specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitSpec {
    /// Primary split axis: 0 = X, 1 = Y.
    pub dim: usize,
    /// Which side of the primary split keeps the full-width part.
    pub dir: bool,
    /// Variant in `0..NUM_SPLIT_SHAPES`.
    pub shape: u32,
    /// Primary split position as a fraction of the seed size along `dim`.
    pub div: f32,
    /// Secondary split positions along the other axis.
    pub s1: f32,
    pub s2: f32,
}

impl SplitSpec {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let dim = usize::from(rng.gen::<bool>());
        let dir = rng.gen::<bool>();
        let shape = rng.gen_range(0..NUM_SPLIT_SHAPES);
        Self {
            dim,
            dir,
            shape,
            div: rand_uniform(rng, 0.3, 0.7),
            s1: rand_uniform(rng, 0.2, 0.4),
            s2: rand_uniform(rng, 0.6, 0.8),
        }
    }

    pub fn num_parts(&self) -> usize {
        if self.shape == U_SHAPE {
            3
        } else {
            2
        }
    }
}

/// Cut `seed` into an L, T or U footprint.
///
/// Part 0 spans the full width and is clipped at the primary split; the
/// remaining parts sit on the other side of the split, narrowed along the
/// other axis according to the variant.
pub fn split_footprint(seed: &Aabb, spec: &SplitSpec) -> Vec<Aabb> {
    assert!(spec.shape < NUM_SPLIT_SHAPES, "invalid split shape {}", spec.shape);
    assert!(spec.dim < 2, "split axis must be X or Y, got {}", spec.dim);
    let (dim, odim) = (spec.dim, 1 - spec.dim);
    let (llc, sz) = (seed.min, seed.size());
    let dpos = llc[dim] + spec.div * sz[dim];
    let spos1 = llc[odim] + spec.s1 * sz[odim];
    let spos2 = llc[odim] + spec.s2 * sz[odim];

    let mut parts = vec![*seed; spec.num_parts()];
    parts[0].set_bound(dim, spec.dir, dpos);
    for p in &mut parts[1..] {
        p.set_bound(dim, !spec.dir, dpos);
    }
    match spec.shape {
        // L: trim one side of the narrow part
        0..=3 => {
            let v = if spec.shape & 1 != 0 { spos2 } else { spos1 };
            parts[1].set_bound(odim, spec.shape >> 1 != 0, v);
        }
        // T: narrow part centered between the secondary splits
        4 | 5 => {
            parts[1].set_bound(odim, false, spos1);
            parts[1].set_bound(odim, true, spos2);
        }
        // U: two prongs
        _ => {
            parts[1].set_bound(odim, true, spos1);
            parts[2].set_bound(odim, false, spos2);
        }
    }
    parts
}

impl Building {
    /// Apply a random rotation in `[0, max_rot_angle]` and re-fit `bcube` to the rotated footprint.
    ///
    /// The current `bcube` becomes the single unrotated base part.
    pub fn gen_rotation<R: Rng + ?Sized>(&mut self, max_rot_angle: f32, rng: &mut R) {
        if max_rot_angle == 0.0 {
            return;
        }
        let angle = rand_uniform(rng, 0.0, max_rot_angle);
        self.rotation = XyRotation::from_angle(angle);
        let base = self.bcube;
        self.parts.clear();
        self.parts.push(base);
        let center = base.center().truncate();
        let mut bc = Aabb::new(
            Vec3::new(f32::MAX, f32::MAX, base.min.z),
            Vec3::new(f32::MIN, f32::MIN, base.max.z),
        );
        for corner in base.corners_xy() {
            let c = self.rotation.rotate_about_xy(center, corner);
            bc.union_with_pt(c.extend(base.min.z));
        }
        self.bcube = bc;
    }

    /// Append an L/T/U split of `seed_cube` to `parts`.
    pub fn split_in_xy<R: Rng + ?Sized>(&mut self, seed_cube: &Aabb, rng: &mut R) {
        let spec = SplitSpec::random(rng);
        self.parts.extend(split_footprint(seed_cube, &spec));
    }

    /// Generate side count, levels and parts. `ix` is the building's index and
    /// selects the random stream. No-op for invalid buildings.
    pub fn gen_geometry(&mut self, ix: usize, mat: &MaterialProfile, min_level_height: f32) {
        if !self.is_valid() {
            return;
        }
        let base = self.parts.last().copied().unwrap_or(self.bcube);
        self.parts.clear();
        let mut rng = StdRng::seed_from_u64(building_seed(ix));

        // shape: cylinder, cube or N-gon
        self.num_sides = if rand_probability(&mut rng, mat.round_prob) {
            MAX_CYLIN_SIDES
        } else if rand_probability(&mut rng, mat.cube_prob) {
            4
        } else {
            let (lo, hi) = (mat.min_sides.min(mat.max_sides), mat.min_sides.max(mat.max_sides));
            rng.gen_range(lo..=hi)
        };
        assert!(
            self.num_sides >= 3,
            "material {} produced {} sides",
            self.material,
            self.num_sides
        );

        let num_levels = self.choose_num_levels(&base, mat, min_level_height, &mut rng);
        // buildings with 4+ levels and non-cubes are never split
        let do_split =
            num_levels < 4 && self.is_cube() && rand_probability(&mut rng, mat.split_prob);

        if num_levels == 1 {
            if do_split {
                self.split_in_xy(&base, &mut rng);
            } else {
                self.parts.push(base);
            }
            return;
        }
        let telescope = rng.gen::<bool>();
        if telescope && !do_split {
            self.gen_telescoping_levels(&base, num_levels, &mut rng);
        } else {
            self.gen_stacked_levels(&base, num_levels, do_split, &mut rng);
        }
    }

    fn choose_num_levels<R: Rng + ?Sized>(
        &self,
        base: &Aabb,
        mat: &MaterialProfile,
        min_level_height: f32,
        rng: &mut R,
    ) -> u32 {
        let mut num_levels = mat.min_levels;
        // only cubes get a random level count
        if mat.min_levels < mat.max_levels && self.is_cube() {
            num_levels += rng.gen_range(0..=(mat.max_levels - mat.min_levels));
        }
        if min_level_height > 0.0 {
            let max_fit = (base.dz() / min_level_height) as u32;
            num_levels = num_levels.min(max_fit).max(mat.min_levels);
        }
        num_levels.max(1)
    }

    /// Levels all start at the base and grow taller, each with a footprint that
    /// should not swallow any lower level.
    fn gen_telescoping_levels<R: Rng + ?Sized>(&mut self, base: &Aabb, num_levels: u32, rng: &mut R) {
        let dz = base.dz() / num_levels as f32;
        let sz = base.size();
        for i in 0..num_levels as usize {
            let mut bc = *base;
            bc.max.z = base.min.z + (i + 1) as f32 * dz;
            if i > 0 {
                bc.max.z += dz * rand_uniform(rng, -0.5, 0.5);
                bc.max.z = bc.max.z.min(base.max.z);
            }
            // the last attempt is kept even if it still contains a lower level
            for _ in 0..MAX_SHRINK_ATTEMPTS {
                for d in 0..2 {
                    let lo = rand_uniform(rng, TELESCOPE_INSET.0, TELESCOPE_INSET.1).max(0.0);
                    let hi = rand_uniform(rng, TELESCOPE_INSET.0, TELESCOPE_INSET.1).max(0.0);
                    bc.min[d] = base.min[d] + lo * sz[d];
                    bc.max[d] = base.max[d] - hi * sz[d];
                }
                debug_assert!(bc.is_strictly_normalized());
                if !self.parts.iter().any(|p| bc.contains_cube_xy(p)) {
                    break;
                }
            }
            self.parts.push(bc);
        }
    }

    /// Each level sits on top of the previous one with some edges pulled in.
    fn gen_stacked_levels<R: Rng + ?Sized>(
        &mut self,
        base: &Aabb,
        num_levels: u32,
        do_split: bool,
        rng: &mut R,
    ) {
        let dz = base.dz() / num_levels as f32;
        for i in 0..num_levels as usize {
            let mut bc = if i == 0 {
                *base
            } else {
                let prev = self.parts[i - 1];
                let mut bc = prev;
                for d in 0..2 {
                    let len = prev.max[d] - prev.min[d];
                    for hi in [false, true] {
                        // 25% chance of no shift, 75% chance of an inset
                        let delta = if rng.gen_range(0..4u32) != 0 {
                            rand_uniform(rng, STACK_INSET.0, STACK_INSET.1)
                        } else {
                            0.0
                        };
                        let shift = delta * len;
                        let v = if hi {
                            prev.bound(d, hi) - shift
                        } else {
                            prev.bound(d, hi) + shift
                        };
                        bc.set_bound(d, hi, v);
                    }
                }
                bc.min.z = prev.max.z;
                bc
            };
            bc.max.z = bc.min.z + dz;
            bc.normalize();
            self.parts.push(bc);
        }
        for i in 1..num_levels as usize {
            let ddz = rand_uniform(rng, -STACK_Z_JITTER * dz, STACK_Z_JITTER * dz);
            self.parts[i].min.z += ddz;
            self.parts[i - 1].max.z += ddz;
        }
        if do_split {
            if let Some(split_cube) = self.parts.pop() {
                self.split_in_xy(&split_cube, rng);
            }
        }
    }
}
