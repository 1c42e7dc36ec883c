//! Intersection primitives shared by the sphere and line queries.
//!
//! Line tests take a segment `p1 -> p2` and return the parametric interval
//! `(t_enter, t_exit)` within `[0, 1]` that lies inside the solid.

use engine_core::{Aabb, Vec2, Vec3};

/// Clip `[t0, t1]` to where `start + t * delta` lies in `[lo, hi]`.
fn clip_slab(start: f32, delta: f32, lo: f32, hi: f32, t0: &mut f32, t1: &mut f32) -> bool {
    if delta == 0.0 {
        return start >= lo && start <= hi;
    }
    let inv = 1.0 / delta;
    let (mut ta, mut tb) = ((lo - start) * inv, (hi - start) * inv);
    if ta > tb {
        std::mem::swap(&mut ta, &mut tb);
    }
    *t0 = t0.max(ta);
    *t1 = t1.min(tb);
    *t0 <= *t1
}

/// Segment vs. axis-aligned box.
pub fn line_clip_aabb(p1: Vec3, p2: Vec3, cube: &Aabb) -> Option<(f32, f32)> {
    let d = p2 - p1;
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for dim in 0..3 {
        if !clip_slab(p1[dim], d[dim], cube.min[dim], cube.max[dim], &mut t0, &mut t1) {
            return None;
        }
    }
    Some((t0, t1))
}

/// Segment vs. the elliptical cylinder inscribed in `part`.
pub fn line_clip_elliptic_cylinder(p1: Vec3, p2: Vec3, part: &Aabb) -> Option<(f32, f32)> {
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    if !clip_slab(p1.z, p2.z - p1.z, part.min.z, part.max.z, &mut t0, &mut t1) {
        return None;
    }
    let size = part.size();
    let (rx, ry) = (0.5 * size.x, 0.5 * size.y);
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    let center = part.center();
    // unit circle space
    let u0 = Vec2::new((p1.x - center.x) / rx, (p1.y - center.y) / ry);
    let du = Vec2::new((p2.x - p1.x) / rx, (p2.y - p1.y) / ry);
    let a = du.length_squared();
    let b = 2.0 * u0.dot(du);
    let c = u0.length_squared() - 1.0;

    if a == 0.0 {
        // vertical: the XY position never changes
        return (c <= 0.0).then_some((t0, t1));
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let (ta, tb) = ((-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a));
    t0 = t0.max(ta);
    t1 = t1.min(tb);
    (t0 <= t1).then_some((t0, t1))
}

/// Segment vs. the vertical prism over convex polygon `pts` spanning `[z1, z2]`.
///
/// Works for either winding.
pub fn line_clip_convex_prism(p1: Vec3, p2: Vec3, pts: &[Vec2], z1: f32, z2: f32) -> Option<(f32, f32)> {
    if pts.len() < 3 {
        return None;
    }
    let d = p2 - p1;
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    if !clip_slab(p1.z, d.z, z1, z2, &mut t0, &mut t1) {
        return None;
    }
    let winding = signed_area(pts).signum();
    let (a, dxy) = (p1.truncate(), d.truncate());
    for (i, &v0) in pts.iter().enumerate() {
        let v1 = pts[(i + 1) % pts.len()];
        let e = v1 - v0;
        let n = Vec2::new(e.y, -e.x) * winding; // outward
        let num = n.dot(a - v0);
        let den = n.dot(dxy);
        if den == 0.0 {
            if num > 0.0 {
                return None;
            }
            continue;
        }
        let t = -num / den;
        if den < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Twice the signed area; positive for counter-clockwise winding.
fn signed_area(pts: &[Vec2]) -> f32 {
    let n = pts.len();
    (0..n).map(|i| pts[i].perp_dot(pts[(i + 1) % n])).sum()
}

/// Distance from `p` to segment `a -> b`, in XY.
pub fn pt_segment_dist_xy(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

pub fn sphere_intersects_cube(center: Vec3, radius: f32, cube: &Aabb) -> bool {
    if cube.contains_pt(center) {
        return true;
    }
    let closest = cube.clamp_pt(center);
    closest.distance_squared(center) < radius * radius
}

/// Push a sphere at `pos` (coming from `p_last`) out of `cube`.
///
/// Returns the corrected position on the face of `cube` grown by `radius`,
/// or `None` if there is no contact. The face is the one `p_last` was
/// furthest outside of; if `p_last` was already inside, the nearest face.
pub fn sphere_cube_push_out(pos: Vec3, p_last: Vec3, radius: f32, cube: &Aabb) -> Option<Vec3> {
    if !sphere_intersects_cube(pos, radius, cube) {
        return None;
    }
    let grown = cube.expanded(Vec3::splat(radius));
    let mut best: Option<(usize, bool, f32)> = None;
    for dim in 0..3 {
        let below = grown.min[dim] - p_last[dim];
        let above = p_last[dim] - grown.max[dim];
        let (hi, sep) = if above > below { (true, above) } else { (false, below) };
        if sep > 0.0 && best.map_or(true, |(_, _, s)| sep > s) {
            best = Some((dim, hi, sep));
        }
    }
    let (dim, hi) = match best {
        Some((dim, hi, _)) => (dim, hi),
        None => {
            // started inside: leave through the closest face
            let mut nearest = (0, false, f32::MAX);
            for dim in 0..3 {
                for hi in [false, true] {
                    let pen = (pos[dim] - grown.bound(dim, hi)).abs();
                    if pen < nearest.2 {
                        nearest = (dim, hi, pen);
                    }
                }
            }
            (nearest.0, nearest.1)
        }
    };
    let mut out = pos;
    out[dim] = grown.bound(dim, hi);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::regular_polygon_points;

    fn unit_box() -> Aabb {
        Aabb::from_ranges(0.0, 10.0, 0.0, 10.0, 0.0, 20.0)
    }

    #[test]
    fn vertical_segment_enters_box_top() {
        let (t0, t1) =
            line_clip_aabb(Vec3::new(5.0, 5.0, 100.0), Vec3::new(5.0, 5.0, -100.0), &unit_box()).unwrap();
        assert!((t0 - 0.4).abs() < 1e-6);
        assert!((t1 - 0.5).abs() < 1e-6);
    }

    #[test]
    fn segment_missing_box() {
        let r = line_clip_aabb(Vec3::new(-5.0, 15.0, 5.0), Vec3::new(15.0, 15.0, 5.0), &unit_box());
        assert!(r.is_none());
        // starts inside
        let (t0, _) =
            line_clip_aabb(Vec3::new(5.0, 5.0, 5.0), Vec3::new(50.0, 5.0, 5.0), &unit_box()).unwrap();
        assert_eq!(t0, 0.0);
    }

    #[test]
    fn cylinder_clip_enters_at_radius() {
        let part = Aabb::from_ranges(-5.0, 5.0, -5.0, 5.0, 0.0, 10.0);
        let (t0, _) = line_clip_elliptic_cylinder(
            Vec3::new(-10.0, 0.0, 5.0),
            Vec3::new(10.0, 0.0, 5.0),
            &part,
        )
        .unwrap();
        assert!((t0 - 0.25).abs() < 1e-5);
        // passes through the empty corner of the bounding box
        assert!(line_clip_elliptic_cylinder(
            Vec3::new(4.6, -10.0, 5.0),
            Vec3::new(4.6, 10.0, 5.0),
            &part
        )
        .map_or(true, |(t0, t1)| t1 - t0 < 0.2));
        assert!(line_clip_elliptic_cylinder(
            Vec3::new(4.9, 4.9, 50.0),
            Vec3::new(4.9, 4.9, -50.0),
            &part
        )
        .is_none());
        let (t0, _) = line_clip_elliptic_cylinder(
            Vec3::new(1.0, 1.0, 50.0),
            Vec3::new(1.0, 1.0, -50.0),
            &part,
        )
        .unwrap();
        assert!((t0 - 0.4).abs() < 1e-5);
    }

    #[test]
    fn square_prism_matches_box_clip() {
        let cube = unit_box();
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let reversed: Vec<Vec2> = pts.iter().rev().copied().collect();
        let segments = [
            (Vec3::new(-5.0, 3.0, 2.0), Vec3::new(15.0, 6.0, 8.0)),
            (Vec3::new(5.0, 5.0, 100.0), Vec3::new(5.0, 5.0, -100.0)),
            (Vec3::new(-5.0, -5.0, 30.0), Vec3::new(15.0, 15.0, -10.0)),
            (Vec3::new(-5.0, 15.0, 5.0), Vec3::new(15.0, 15.0, 5.0)),
        ];
        for (a, b) in segments {
            let expected = line_clip_aabb(a, b, &cube);
            for poly in [&pts[..], &reversed[..]] {
                let got = line_clip_convex_prism(a, b, poly, 0.0, 20.0);
                match (expected, got) {
                    (None, None) => {}
                    (Some(e), Some(g)) => {
                        assert!((e.0 - g.0).abs() < 1e-5 && (e.1 - g.1).abs() < 1e-5)
                    }
                    _ => panic!("mismatch for {a:?} -> {b:?}: {expected:?} vs {got:?}"),
                }
            }
        }
    }

    #[test]
    fn hexagon_prism_clip() {
        let part = Aabb::from_ranges(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0);
        let pts = regular_polygon_points(&part, 6, 0.0);
        // vertex on +Y at (0, 1)
        let (t0, _) =
            line_clip_convex_prism(Vec3::new(0.0, 3.0, 0.5), Vec3::new(0.0, -3.0, 0.5), &pts, 0.0, 1.0)
                .unwrap();
        assert!((t0 - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn segment_distance() {
        let (a, b) = (Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert_eq!(pt_segment_dist_xy(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(pt_segment_dist_xy(Vec2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(pt_segment_dist_xy(Vec2::new(1.0, 1.0), a, a), 2f32.sqrt());
    }

    #[test]
    fn push_out_uses_entry_face() {
        let cube = unit_box();
        // moving in +X from outside
        let out = sphere_cube_push_out(Vec3::new(0.5, 5.0, 10.0), Vec3::new(-3.0, 5.0, 10.0), 1.0, &cube)
            .unwrap();
        assert_eq!(out, Vec3::new(-1.0, 5.0, 10.0));
        // resting on the roof
        let out = sphere_cube_push_out(Vec3::new(5.0, 5.0, 20.5), Vec3::new(5.0, 5.0, 22.0), 1.0, &cube)
            .unwrap();
        assert_eq!(out, Vec3::new(5.0, 5.0, 21.0));
        assert!(sphere_cube_push_out(Vec3::new(-2.0, 5.0, 10.0), Vec3::new(-2.0, 5.0, 10.0), 1.0, &cube)
            .is_none());
    }

    #[test]
    fn push_out_from_inside_takes_nearest_face() {
        let cube = unit_box();
        let p = Vec3::new(9.0, 5.0, 10.0);
        let out = sphere_cube_push_out(p, p, 0.5, &cube).unwrap();
        assert_eq!(out, Vec3::new(10.5, 5.0, 10.0));
        assert!(!sphere_intersects_cube(out, 0.5, &cube));
    }
}
