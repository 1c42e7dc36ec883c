//! Regular-polygon outlines and 2D point-in-polygon tests.
//!
//! N-gon buildings are drawn and collided as a regular polygon inscribed in
//! each part's footprint box. The same outline routine feeds both the render
//! descriptors and the collision tests so the two can never disagree.

use crate::aabb::Aabb;
use glam::Vec2;
use std::f32::consts::TAU;

/// Unit directions `(sin, cos)` for `ndiv` evenly spaced angles starting at 0.
pub fn polygon_normals(ndiv: u32) -> Vec<Vec2> {
    let step = TAU / ndiv as f32;
    (0..ndiv)
        .map(|i| {
            let (s, c) = (i as f32 * step).sin_cos();
            Vec2::new(s, c)
        })
        .collect()
}

/// Outline of the regular `ndiv`-gon inscribed in `cube`'s footprint, optionally
/// grown by `expand` (a sphere radius) along both radii.
pub fn regular_polygon_points(cube: &Aabb, ndiv: u32, expand: f32) -> Vec<Vec2> {
    assert!(ndiv >= 3, "polygon needs at least 3 sides, got {ndiv}");
    let size = cube.size();
    let center = cube.center().truncate();
    let rx = 0.5 * size.x + expand;
    let ry = 0.5 * size.y + expand;
    polygon_normals(ndiv)
        .into_iter()
        .map(|n| Vec2::new(center.x + rx * n.x, center.y + ry * n.y))
        .collect()
}

/// Even-odd crossing test.
pub fn point_in_polygon_2d(p: Vec2, points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
