//! The building model: a rotated stack of axis-aligned parts.

use engine_core::{Aabb, Color, Vec2, Vec3, XyRotation};

use crate::params::BuildingParams;

/// Side count used for smooth round buildings.
pub const MAX_CYLIN_SIDES: u32 = 36;

/// Above this side count, collision treats a building as a cylinder.
pub const CYLINDER_COLL_MIN_SIDES: u32 = 9;

/// Overlap margins (fraction of size) used during placement.
pub const ROTATED_PLACEMENT_MARGIN: f32 = 0.05;
/// Margin for unrotated buildings, where the overlap test is an exact AABB test.
pub const AXIS_ALIGNED_PLACEMENT_MARGIN: f32 = 0.1;

/// Cross-section of a building's parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Rectangular prism: each part is drawn and collided as its box.
    Cube,
    /// Smooth (elliptical) cylinder inscribed in each part's footprint.
    Cylinder { sides: u32 },
    /// Regular polygon inscribed in each part's footprint.
    Polygon { sides: u32 },
}

impl ShapeKind {
    /// Classify a side count the way drawing and collision treat it.
    pub fn from_sides(sides: u32) -> Self {
        if sides == 4 {
            ShapeKind::Cube
        } else if sides >= CYLINDER_COLL_MIN_SIDES {
            ShapeKind::Cylinder { sides }
        } else {
            ShapeKind::Polygon { sides }
        }
    }
}

/// One placed structure.
///
/// `parts` are authored in an unrotated local frame pivoting on the center of
/// `bcube`; `bcube` itself is the world-space AABB of the rotated footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    /// Index into [`BuildingParams::materials`].
    pub material: usize,
    /// Side count of every part: 4 is a box, [`CYLINDER_COLL_MIN_SIDES`] or more a cylinder,
    /// anything else an N-gon.
    pub num_sides: u32,
    /// Rotation about the center of `bcube`. Identity for axis-aligned buildings.
    pub rotation: XyRotation,
    /// Wall color, drawn from the material's side color range on placement.
    pub side_color: Color,
    /// Roof color, drawn from the material's roof color range on placement.
    pub roof_color: Color,
    /// World-space bounds of the rotated footprint. All zeros once invalidated.
    pub bcube: Aabb,
    /// Level and split boxes in the local (unrotated) frame. Part 0 sits on the base.
    pub parts: Vec<Aabb>,
}

impl Building {
    /// An empty, invalid building of material `material`.
    pub fn new(material: usize) -> Self {
        Self {
            material,
            num_sides: 4,
            rotation: XyRotation::IDENTITY,
            side_color: Color::WHITE,
            roof_color: Color::WHITE,
            bcube: Aabb::ZERO,
            parts: Vec::new(),
        }
    }

    /// An unrotated building occupying `bcube` with a single base part.
    pub fn from_bcube(material: usize, bcube: Aabb) -> Self {
        Self {
            bcube,
            parts: vec![bcube],
            ..Self::new(material)
        }
    }

    /// False once [`invalidate`](Self::invalidate) was called (or for a zero box).
    pub fn is_valid(&self) -> bool {
        !self.bcube.is_all_zeros()
    }

    pub fn is_rotated(&self) -> bool {
        !self.rotation.is_identity()
    }

    pub fn is_cube(&self) -> bool {
        self.num_sides == 4
    }

    /// Approximate: anything rounder than an octagon collides as a cylinder.
    pub fn use_cylinder_coll(&self) -> bool {
        self.num_sides >= CYLINDER_COLL_MIN_SIDES
    }

    pub fn shape_kind(&self) -> ShapeKind {
        ShapeKind::from_sides(self.num_sides)
    }

    /// Mark as unusable. The building keeps its slot so indices stay stable.
    pub fn invalidate(&mut self) {
        self.bcube = Aabb::ZERO;
    }

    /// Pivot of the local frame.
    pub fn rotation_center(&self) -> Vec3 {
        self.bcube.center()
    }

    /// World space → local (unrotated) frame.
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        if self.is_rotated() {
            self.rotation.inverse_rotate_about(self.rotation_center(), p)
        } else {
            p
        }
    }

    /// Local frame → world space.
    pub fn to_world(&self, p: Vec3) -> Vec3 {
        if self.is_rotated() {
            self.rotation.rotate_about(self.rotation_center(), p)
        } else {
            p
        }
    }

    /// Margin used when testing this building against others during placement.
    pub fn placement_margin(&self) -> f32 {
        if self.is_rotated() {
            ROTATED_PLACEMENT_MARGIN
        } else {
            AXIS_ALIGNED_PLACEMENT_MARGIN
        }
    }

    /// Parts, or the bounding box if no parts were generated yet.
    pub fn footprint_parts(&self) -> &[Aabb] {
        if self.parts.is_empty() {
            std::slice::from_ref(&self.bcube)
        } else {
            &self.parts
        }
    }

    /// Would `self`, grown by `expand` (a fraction of its size), overlap `other` in XY?
    ///
    /// A cheap AABB test first; if either building is rotated, the part
    /// corners of each are moved into the other's local frame and tested for
    /// containment against its parts.
    pub fn overlaps(&self, other: &Building, expand: f32) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        let test_bc = self.bcube.expanded(self.bcube.size() * expand);
        if !test_bc.intersects_xy(&other.bcube) {
            return false;
        }
        other.overlaps_one_dir(self, expand) || self.overlaps_one_dir(other, expand)
    }

    /// Does any (expanded) part corner or part center of `b` fall inside one of our parts?
    fn overlaps_one_dir(&self, b: &Building, expand: f32) -> bool {
        if !self.is_rotated() && !b.is_rotated() {
            // the AABB check done by the caller is exact
            return true;
        }
        let center_b = b.rotation_center().truncate();
        let center_self = self.rotation_center().truncate();
        let to_self = |p: Vec2| {
            let world = b.rotation.rotate_about_xy(center_b, p);
            self.rotation.inverse_rotate_about_xy(center_self, world)
        };
        b.footprint_parts().iter().any(|p1| {
            let c_exp = p1.expanded(p1.size() * expand);
            let mut pts = [Vec2::ZERO; 5];
            pts[0] = to_self(p1.center().truncate());
            for (dst, corner) in pts[1..].iter_mut().zip(c_exp.corners_xy()) {
                *dst = to_self(corner);
            }
            self.footprint_parts()
                .iter()
                .any(|p2| pts.iter().any(|&p| p2.contains_pt_xy(p)))
        })
    }

    pub fn avg_side_color(&self, params: &BuildingParams) -> Color {
        self.side_color
            .modulate_with(params.material(self.material).side_tex.avg_color)
    }

    pub fn avg_roof_color(&self, params: &BuildingParams) -> Color {
        self.roof_color
            .modulate_with(params.material(self.material).roof_tex.avg_color)
    }
}
