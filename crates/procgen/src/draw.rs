//! Render descriptors for the host renderer: one entry per part of every valid building.

use bytemuck::{Pod, Zeroable};
use engine_core::{regular_polygon_points, Aabb, Color, Vec2, Vec3, XyRotation};

use crate::building::{Building, ShapeKind};
use crate::placement::BuildingField;

/// What the host needs to tessellate one part.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDraw {
    /// Index of the owning building in the field.
    pub building: usize,
    /// Index into that building's `parts`.
    pub part: usize,
    pub shape: ShapeKind,
    /// Part box in the building's unrotated local frame.
    pub local: Aabb,
    pub side_color: Color,
    pub roof_color: Color,
    /// Building rotation, applied about `pivot`.
    pub rotation: XyRotation,
    /// Rotation pivot in world space.
    pub pivot: Vec3,
}

/// GPU instance record for one part (must match the host's building instance layout).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PartInstance {
    /// Local part box, lower corner.
    pub local_min: [f32; 3],
    /// 4 = box, otherwise the polygon side count.
    pub num_sides: u32,
    /// Local part box, upper corner.
    pub local_max: [f32; 3],
    /// 1 if the part is drawn as a smooth cylinder.
    pub smooth: u32,
    /// x = sin, y = cos, zw = pivot XY
    pub rotation: [f32; 4],
    /// Linear RGBA.
    pub side_color: [f32; 4],
    pub roof_color: [f32; 4],
}

impl PartDraw {
    fn new(ix: usize, b: &Building, part: usize) -> Self {
        Self {
            building: ix,
            part,
            shape: b.shape_kind(),
            local: b.parts[part],
            side_color: b.side_color,
            roof_color: b.roof_color,
            rotation: b.rotation,
            pivot: b.rotation_center(),
        }
    }

    /// Side count of the part's cross-section.
    pub fn num_sides(&self) -> u32 {
        match self.shape {
            ShapeKind::Cube => 4,
            ShapeKind::Cylinder { sides } | ShapeKind::Polygon { sides } => sides,
        }
    }

    /// Pack into the GPU instance layout.
    pub fn instance(&self) -> PartInstance {
        PartInstance {
            local_min: self.local.min.to_array(),
            num_sides: self.num_sides(),
            local_max: self.local.max.to_array(),
            smooth: u32::from(matches!(self.shape, ShapeKind::Cylinder { .. })),
            rotation: [
                self.rotation.sin,
                self.rotation.cos,
                self.pivot.x,
                self.pivot.y,
            ],
            side_color: self.side_color.to_array(),
            roof_color: self.roof_color.to_array(),
        }
    }

    /// World-space XY outline of the part. Polygon and cylinder outlines start on
    /// the local +Y axis and match the points collision tests against.
    pub fn outline(&self) -> Vec<Vec2> {
        let local = match self.shape {
            ShapeKind::Cube => {
                let [a, b, c, d] = self.local.corners_xy();
                vec![a, b, d, c]
            }
            _ => regular_polygon_points(&self.local, self.num_sides(), 0.0),
        };
        let pivot = self.pivot.truncate();
        local
            .into_iter()
            .map(|p| self.rotation.rotate_about_xy(pivot, p))
            .collect()
    }
}

impl BuildingField {
    /// Draw descriptors for every part of every valid building, in building order.
    pub fn part_draws(&self) -> impl Iterator<Item = PartDraw> + '_ {
        self.valid_buildings()
            .flat_map(|(ix, b)| (0..b.parts.len()).map(move |part| PartDraw::new(ix, b, part)))
    }

    /// [`part_draws`](Self::part_draws) packed for upload.
    pub fn part_instances(&self) -> Vec<PartInstance> {
        self.part_draws().map(|d| d.instance()).collect()
    }
}

/// Raw bytes for uploading instances.
pub fn instance_bytes(instances: &[PartInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::MAX_CYLIN_SIDES;

    fn draw_for(b: &Building) -> PartDraw {
        PartDraw::new(0, b, 0)
    }

    #[test]
    fn instance_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<PartInstance>(), 80);
        let b = Building::from_bcube(0, Aabb::from_ranges(0.0, 2.0, 0.0, 2.0, 0.0, 2.0));
        let instances = vec![draw_for(&b).instance(); 3];
        assert_eq!(instance_bytes(&instances).len(), 240);
    }

    #[test]
    fn cylinder_instance_is_smooth() {
        let mut b = Building::from_bcube(0, Aabb::from_ranges(0.0, 2.0, 0.0, 2.0, 0.0, 2.0));
        b.num_sides = MAX_CYLIN_SIDES;
        let inst = draw_for(&b).instance();
        assert_eq!(inst.num_sides, MAX_CYLIN_SIDES);
        assert_eq!(inst.smooth, 1);
        b.num_sides = 6;
        assert_eq!(draw_for(&b).instance().smooth, 0);
    }

    #[test]
    fn cube_outline_is_a_closed_ring_of_corners() {
        let b = Building::from_bcube(0, Aabb::from_ranges(0.0, 4.0, 0.0, 2.0, 0.0, 1.0));
        let outline = draw_for(&b).outline();
        assert_eq!(
            outline,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(4.0, 0.0),
                Vec2::new(4.0, 2.0),
                Vec2::new(0.0, 2.0)
            ]
        );
    }

    #[test]
    fn rotated_polygon_outline_is_rotated_about_pivot() {
        let mut b = Building::from_bcube(0, Aabb::from_ranges(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0));
        b.num_sides = 6;
        b.rotation = XyRotation::from_angle(std::f32::consts::FRAC_PI_2);
        let outline = draw_for(&b).outline();
        assert_eq!(outline.len(), 6);
        for p in &outline {
            assert!((p.length() - 1.0).abs() < 1e-5);
        }
        // first vertex starts on +Y locally; a quarter turn moves it onto the X axis
        assert!(outline[0].y.abs() < 1e-5);
        assert!((outline[0].x.abs() - 1.0).abs() < 1e-5);
    }
}
