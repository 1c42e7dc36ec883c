//! Axis-aligned boxes in world or building-local space (Z up).

use glam::{Vec2, Vec3};

/// An axis-aligned box. All building geometry is expressed with these.
///
/// The all-zeros box doubles as the "unset" sentinel: a building whose box was
/// never placed (or was invalidated) carries [`Aabb::ZERO`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Aabb {
    pub const ZERO: Self = Self {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Build from per-axis ranges `(x1, x2, y1, y2, z1, z2)`, the order used by config files.
    pub fn from_ranges(x1: f32, x2: f32, y1: f32, y2: f32, z1: f32, z2: f32) -> Self {
        Self {
            min: Vec3::new(x1, y1, z1),
            max: Vec3::new(x2, y2, z2),
        }
    }

    /// Degenerate box containing a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Box spanning two arbitrary corners (e.g. the endpoints of a segment).
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Tight box around a sphere.
    pub fn from_sphere(center: Vec3, radius: f32) -> Self {
        Self {
            min: center - Vec3::splat(radius),
            max: center + Vec3::splat(radius),
        }
    }

    pub fn is_all_zeros(&self) -> bool {
        self.min == Vec3::ZERO && self.max == Vec3::ZERO
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn dz(&self) -> f32 {
        self.max.z - self.min.z
    }

    pub fn union_with_pt(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union_with(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Grow each face outward by the matching component of `amount`.
    pub fn expand_by(&mut self, amount: Vec3) {
        self.min -= amount;
        self.max += amount;
    }

    pub fn expanded(mut self, amount: Vec3) -> Self {
        self.expand_by(amount);
        self
    }

    /// Strict overlap on all three axes (touching faces do not count).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Strict overlap of the XY footprints.
    pub fn intersects_xy(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Inclusive overlap of the XY footprints.
    pub fn touches_xy(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Inclusive overlap on all three axes. Used where one box may be flat (a segment's bounds).
    pub fn touches(&self, other: &Aabb) -> bool {
        self.touches_xy(other)
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains_pt(&self, p: Vec3) -> bool {
        self.contains_pt_xy(p.truncate()) && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Inclusive XY containment.
    pub fn contains_pt_xy(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// True if `other` lies entirely inside this box (inclusive).
    pub fn contains_cube(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    /// Like [`contains_cube`](Self::contains_cube) but ignoring Z.
    pub fn contains_cube_xy(&self, other: &Aabb) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Clamp a point into the box.
    pub fn clamp_pt(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    /// `min < max` on every axis.
    pub fn is_strictly_normalized(&self) -> bool {
        self.min.cmplt(self.max).all()
    }

    /// Swap any inverted axis so that `min <= max`.
    pub fn normalize(&mut self) {
        let (lo, hi) = (self.min.min(self.max), self.min.max(self.max));
        self.min = lo;
        self.max = hi;
    }

    /// XY footprint corners in the order (x1,y1), (x2,y1), (x1,y2), (x2,y2).
    pub fn corners_xy(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.min.x, self.min.y),
            Vec2::new(self.max.x, self.min.y),
            Vec2::new(self.min.x, self.max.y),
            Vec2::new(self.max.x, self.max.y),
        ]
    }

    /// Footprint area.
    pub fn area_xy(&self) -> f32 {
        let s = self.size();
        s.x * s.y
    }

    /// Lower and upper bound along one axis (0 = X, 1 = Y, 2 = Z).
    pub fn axis(&self, dim: usize) -> (f32, f32) {
        (self.min[dim], self.max[dim])
    }

    /// Set one bound: `hi == false` writes `min[dim]`, `hi == true` writes `max[dim]`.
    pub fn set_bound(&mut self, dim: usize, hi: bool, value: f32) {
        if hi {
            self.max[dim] = value;
        } else {
            self.min[dim] = value;
        }
    }

    pub fn bound(&self, dim: usize, hi: bool) -> f32 {
        if hi {
            self.max[dim]
        } else {
            self.min[dim]
        }
    }
}
