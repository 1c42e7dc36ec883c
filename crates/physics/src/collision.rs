//! Per-building narrow phase for sphere and line queries.
//!
//! Everything runs in the building's unrotated local frame: query points are
//! de-rotated about the rotation center, tested against the parts, and any
//! corrected position is rotated back.

use engine_core::{point_in_polygon_2d, regular_polygon_points, Aabb, Vec2, Vec3};
use procgen::{Building, ShapeKind};

use crate::intersect::{
    line_clip_aabb, line_clip_convex_prism, line_clip_elliptic_cylinder, pt_segment_dist_xy,
    sphere_cube_push_out, sphere_intersects_cube,
};

/// Relative distance below a part top within which a hit counts as a roof hit.
const ROOF_HIT_TOLERANCE: f32 = 1e-4;

/// Which surface a line hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Side,
    Roof,
}

/// Sphere and line tests against one building.
pub trait BuildingCollision {
    /// Test a sphere moving from `p_last` to `*pos`. On contact, `pos` is
    /// corrected and `true` returned. With `xy_only`, heights are ignored and
    /// only parts standing on the building base are considered.
    fn sphere_coll(&self, pos: &mut Vec3, p_last: Vec3, radius: f32, xy_only: bool) -> bool;

    /// First hit along `p1 -> p2` as `(t, kind)`.
    fn line_coll(&self, p1: Vec3, p2: Vec3) -> Option<(f32, HitKind)>;
}

impl BuildingCollision for Building {
    fn sphere_coll(&self, pos: &mut Vec3, p_last: Vec3, radius: f32, xy_only: bool) -> bool {
        if !self.is_valid() || !sphere_meets_box(*pos, radius, &self.bcube, xy_only) {
            return false;
        }
        let mut p = self.to_local(*pos);
        let p_last = self.to_local(p_last);
        let shape = self.shape_kind();
        let mut coll = false;

        for part in self.footprint_parts() {
            if xy_only && part.min.z > self.bcube.min.z {
                continue;
            }
            if !xy_only && (p.z + radius < part.min.z || p.z - radius > part.max.z) {
                continue;
            }
            match shape {
                ShapeKind::Cylinder { .. } => {
                    let size = part.size();
                    let center = part.center().truncate();
                    let r_sum = radius + 0.5 * size.x.max(size.y);
                    let d = p.truncate() - center;
                    let dist = d.length();
                    if dist < r_sum {
                        let dir = if dist > 0.0 {
                            d / dist
                        } else {
                            (p_last.truncate() - center).try_normalize().unwrap_or(Vec2::X)
                        };
                        let out = center + dir * r_sum;
                        p.x = out.x;
                        p.y = out.y;
                        coll = true;
                    }
                }
                ShapeKind::Polygon { sides } => {
                    let pts = regular_polygon_points(part, sides, radius);
                    if point_in_polygon_2d(p.truncate(), &pts) {
                        p = p_last;
                        coll = true;
                    }
                }
                ShapeKind::Cube => {
                    let test = if xy_only { unbounded_z(part) } else { *part };
                    if let Some(out) = sphere_cube_push_out(p, p_last, radius, &test) {
                        p = out;
                        coll = true;
                    }
                }
            }
        }
        if coll {
            *pos = self.to_world(p);
        }
        coll
    }

    fn line_coll(&self, p1: Vec3, p2: Vec3) -> Option<(f32, HitKind)> {
        if !self.is_valid() {
            return None;
        }
        line_clip_aabb(p1, p2, &self.bcube)?;
        let (a, b) = (self.to_local(p1), self.to_local(p2));
        let vertical = p1.x == p2.x && p1.y == p2.y;
        let (zmin, zmax) = (a.z.min(b.z), a.z.max(b.z));
        let shape = self.shape_kind();
        let mut best: Option<(f32, HitKind)> = None;

        for part in self.footprint_parts() {
            if zmin > part.max.z || zmax < part.min.z {
                continue;
            }
            let t = match shape {
                ShapeKind::Cylinder { .. } => {
                    let size = part.size();
                    let bound_r = 0.5 * size.x.max(size.y);
                    let center = part.center().truncate();
                    if !vertical && pt_segment_dist_xy(center, a.truncate(), b.truncate()) > bound_r {
                        continue;
                    }
                    line_clip_elliptic_cylinder(a, b, part)
                }
                ShapeKind::Polygon { sides } => {
                    let pts = regular_polygon_points(part, sides, 0.0);
                    line_clip_convex_prism(a, b, &pts, part.min.z, part.max.z)
                }
                ShapeKind::Cube => line_clip_aabb(a, b, part),
            };
            let Some((t, _)) = t else {
                continue;
            };
            if best.map_or(false, |(bt, _)| bt <= t) {
                continue;
            }
            let z = a.z + (b.z - a.z) * t;
            let kind = if (z - part.max.z).abs() < ROOF_HIT_TOLERANCE * part.dz() {
                HitKind::Roof
            } else {
                HitKind::Side
            };
            best = Some((t, kind));
        }
        best
    }
}

fn sphere_meets_box(center: Vec3, radius: f32, bc: &Aabb, xy_only: bool) -> bool {
    let bc = if xy_only { unbounded_z(bc) } else { *bc };
    sphere_intersects_cube(center, radius, &bc)
}

/// `bc` with its Z range opened up so only XY matters.
fn unbounded_z(bc: &Aabb) -> Aabb {
    let mut bc = *bc;
    bc.min.z = -f32::MAX;
    bc.max.z = f32::MAX;
    bc
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::XyRotation;

    fn building(sides: u32, bc: Aabb) -> Building {
        let mut b = Building::from_bcube(0, bc);
        b.num_sides = sides;
        b
    }

    fn tower() -> Aabb {
        Aabb::from_ranges(-5.0, 5.0, -5.0, 5.0, 0.0, 10.0)
    }

    #[test]
    fn resting_sphere_away_from_building_is_untouched() {
        let b = building(4, tower());
        let p = Vec3::new(20.0, 0.0, 5.0);
        let mut pos = p;
        assert!(!b.sphere_coll(&mut pos, p, 1.0, false));
        assert_eq!(pos, p);
    }

    #[test]
    fn cylinder_pushes_out_radially() {
        let b = building(36, tower());
        let mut pos = Vec3::new(5.5, 0.0, 5.0);
        assert!(b.sphere_coll(&mut pos, Vec3::new(8.0, 0.0, 5.0), 1.0, false));
        assert!((pos - Vec3::new(6.0, 0.0, 5.0)).length() < 1e-5);
        // the empty corner of the bounding box is free space
        let p = Vec3::new(4.9, 4.9, 5.0);
        let mut pos = p;
        assert!(!b.sphere_coll(&mut pos, p, 0.0, false));
    }

    #[test]
    fn polygon_snaps_back_to_previous_position() {
        let b = building(6, tower());
        let last = Vec3::new(10.0, 0.0, 5.0);
        let mut pos = Vec3::new(1.0, 0.0, 5.0);
        assert!(b.sphere_coll(&mut pos, last, 0.5, false));
        assert_eq!(pos, last);
    }

    #[test]
    fn xy_only_ignores_height() {
        let b = building(4, tower());
        let p = Vec3::new(0.0, 0.0, 50.0);
        let mut pos = p;
        assert!(!b.sphere_coll(&mut pos, p, 1.0, false));
        assert!(b.sphere_coll(&mut pos, p, 1.0, true));
        assert_eq!(pos.z, 50.0);
    }

    #[test]
    fn xy_only_skips_raised_parts() {
        let mut b = building(4, tower());
        // second level sits above the base and overhangs nothing at ground level
        b.parts = vec![
            Aabb::from_ranges(-5.0, 0.0, -5.0, 5.0, 0.0, 5.0),
            Aabb::from_ranges(0.0, 5.0, -5.0, 5.0, 5.0, 10.0),
        ];
        let p = Vec3::new(3.0, 0.0, 7.0);
        let mut pos = p;
        assert!(!b.sphere_coll(&mut pos, p, 0.1, true));
        assert!(b.sphere_coll(&mut pos, p, 0.1, false));
    }

    #[test]
    fn rotated_building_corrects_in_world_space() {
        let base = tower();
        let mut b = building(4, base);
        b.rotation = XyRotation::from_angle(std::f32::consts::FRAC_PI_4);
        let r = 5.0 * std::f32::consts::SQRT_2;
        b.bcube = Aabb::from_ranges(-r, r, -r, r, 0.0, 10.0);
        // inside the diamond
        let p = Vec3::new(0.0, 6.5, 5.0);
        let mut pos = p;
        assert!(b.sphere_coll(&mut pos, Vec3::new(0.0, 9.0, 5.0), 0.0, false));
        assert!(pos.y > 6.5);
        // in the bounding box corner, outside the diamond
        let p = Vec3::new(5.0, 5.0, 5.0);
        let mut pos = p;
        assert!(!b.sphere_coll(&mut pos, p, 0.0, false));
    }

    #[test]
    fn vertical_line_hits_roof() {
        let b = building(4, Aabb::from_ranges(0.0, 10.0, 0.0, 10.0, 0.0, 20.0));
        let (t, kind) = b
            .line_coll(Vec3::new(5.0, 5.0, 100.0), Vec3::new(5.0, 5.0, -100.0))
            .unwrap();
        assert_eq!(kind, HitKind::Roof);
        assert!((t - 0.4).abs() < 1e-6);
    }

    #[test]
    fn horizontal_line_hits_side() {
        for sides in [4, 6, 36] {
            let b = building(sides, tower());
            let (t, kind) = b
                .line_coll(Vec3::new(-20.0, 0.0, 5.0), Vec3::new(20.0, 0.0, 5.0))
                .unwrap();
            assert_eq!(kind, HitKind::Side, "{sides} sides");
            assert!(t > 0.3 && t < 0.4, "{sides} sides: t = {t}");
        }
    }

    #[test]
    fn line_misses_invalid_building() {
        let mut b = building(4, tower());
        b.invalidate();
        assert!(b
            .line_coll(Vec3::new(0.0, 0.0, 100.0), Vec3::new(0.0, 0.0, -100.0))
            .is_none());
    }
}
