//! Probes run against a generated field: a walking sphere and a fan of rays.

use engine_core::{Vec2, Vec3};
use physics::{CollisionWorld, HitKind};
use procgen::Terrain;

use crate::config::{RayFanSettings, WalkerSettings};

/// Outcome of walking a sphere across the field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WalkReport {
    pub steps: u32,
    /// Steps on which the sphere touched a building.
    pub collisions: u32,
    pub final_pos: Vec3,
}

/// Outcome of one ray fan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RayFanReport {
    pub rays: u32,
    pub roof_hits: u32,
    pub side_hits: u32,
    /// Closest hit distance over all rays.
    pub nearest: Option<f32>,
}

/// Walk a sphere in straight steps, keeping it on the ground and letting
/// buildings push it around.
pub fn walk<T: Terrain + ?Sized>(world: &CollisionWorld, terrain: &T, s: &WalkerSettings) -> WalkReport {
    let ground = |p: Vec2| p.extend(terrain.height_at(p.x, p.y) + s.radius);
    let step = Vec2::from(s.step);
    let mut pos = ground(Vec2::from(s.start));
    let mut report = WalkReport::default();

    for _ in 0..s.steps {
        let p_last = pos;
        pos = ground(pos.truncate() + step);
        if let Some(ix) = world.sphere_coll_building(&mut pos, p_last, s.radius, false) {
            report.collisions += 1;
            log::trace!("walker bumped building {} at {:?}", ix, pos);
        }
        report.steps += 1;
    }
    report.final_pos = pos;
    report
}

/// Cast `count` rays evenly around the vertical axis.
pub fn ray_fan(world: &CollisionWorld, s: &RayFanSettings) -> RayFanReport {
    let origin = Vec3::from(s.origin);
    let (sin_p, cos_p) = s.pitch_degrees.to_radians().sin_cos();
    let mut report = RayFanReport::default();

    for i in 0..s.count {
        let yaw = std::f32::consts::TAU * i as f32 / s.count as f32;
        let (sy, cy) = yaw.sin_cos();
        let dir = Vec3::new(cy * cos_p, sy * cos_p, -sin_p);
        let end = origin + dir * s.length;
        report.rays += 1;
        let Some(hit) = world.check_line_coll(origin, end) else {
            continue;
        };
        match hit.kind {
            HitKind::Roof => report.roof_hits += 1,
            HitKind::Side => report.side_hits += 1,
        }
        let dist = hit.t * s.length;
        report.nearest = Some(report.nearest.map_or(dist, |d: f32| d.min(dist)));
        if let Some(color) = world.line_hit_color(origin, end) {
            log::debug!(
                "ray {i}: {:?} of building {} at {:.1} m, color {:?}",
                hit.kind,
                hit.building,
                dist,
                color.to_array()
            );
        }
    }
    report
}
