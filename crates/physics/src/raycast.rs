//! Line queries: first building hit along a segment, hit color and line of sight.

use engine_core::{Aabb, Color, Vec3};

use crate::collision::{BuildingCollision, HitKind};
use crate::collision_world::CollisionWorld;
use crate::intersect::line_clip_aabb;

/// Result of a line query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    /// Hit position as a fraction of the segment, in `[0, 1]`.
    pub t: f32,
    pub kind: HitKind,
    /// Index of the building that was hit.
    pub building: usize,
}

impl LineHit {
    /// World position of the hit on segment `p1 -> p2`.
    pub fn point(&self, p1: Vec3, p2: Vec3) -> Vec3 {
        p1 + (p2 - p1) * self.t
    }
}

impl CollisionWorld {
    /// Closest building hit along `p1 -> p2`.
    ///
    /// Cells are visited in grid order; each hit shortens the segment used to
    /// reject later cells and buildings. Vertical segments stop at the first hit.
    pub fn check_line_coll(&self, p1: Vec3, p2: Vec3) -> Option<LineHit> {
        let field = &**self.field();
        let buildings = field.buildings();
        let vertical = p1.x == p2.x && p1.y == p2.y;
        let mut best: Option<LineHit> = None;
        let mut end = p2;

        for (_, cell) in field.grid().cells_in(&Aabb::from_corners(p1, p2)) {
            if cell.is_empty() || line_clip_aabb(p1, end, &cell.bcube).is_none() {
                continue;
            }
            for &ix in &cell.members {
                let b = &buildings[ix];
                if !b.is_valid() || !b.bcube.touches(&Aabb::from_corners(p1, end)) {
                    continue;
                }
                let Some((t, kind)) = b.line_coll(p1, p2) else {
                    continue;
                };
                if best.map_or(true, |h| t <= h.t) {
                    best = Some(LineHit {
                        t,
                        kind,
                        building: ix,
                    });
                    end = p1 + (p2 - p1) * t;
                    if vertical {
                        return best;
                    }
                }
            }
        }
        best
    }

    /// Average color of the surface hit along `p1 -> p2`: the building's side
    /// or roof color modulated by that surface's average texture color.
    pub fn line_hit_color(&self, p1: Vec3, p2: Vec3) -> Option<Color> {
        let hit = self.check_line_coll(p1, p2)?;
        let field = self.field();
        let b = &field.buildings()[hit.building];
        Some(match hit.kind {
            HitKind::Roof => b.avg_roof_color(field.params()),
            HitKind::Side => b.avg_side_color(field.params()),
        })
    }

    /// True if no building blocks `p1 -> p2`.
    pub fn line_of_sight(&self, p1: Vec3, p2: Vec3) -> bool {
        self.check_line_coll(p1, p2).is_none()
    }
}
