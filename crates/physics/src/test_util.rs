//! Small hand-built worlds for query tests.

use std::sync::Arc;

use engine_core::{Aabb, Color, Vec2, XyRotation};
use procgen::{
    Building, BuildingField, BuildingParams, FlatTerrain, MaterialProfile, PlacementParams, Terrain,
};
use rand::prelude::*;

use crate::collision_world::CollisionWorld;

pub fn cube_params(size: f32, height: f32) -> Arc<BuildingParams> {
    let mat = MaterialProfile {
        size_range: Aabb::from_ranges(size, size, size, size, height, height),
        ..Default::default()
    };
    Arc::new(BuildingParams::with_material(PlacementParams::default(), mat))
}

fn build(params: Arc<BuildingParams>, centers: &[Vec2], terrain: &mut dyn Terrain) -> CollisionWorld {
    let mut field = BuildingField::empty(params);
    let mut rng = StdRng::seed_from_u64(0);
    for &c in centers {
        field.place_at(0, c, &*terrain, &mut rng);
    }
    field.finalize(terrain);
    CollisionWorld::new(Arc::new(field))
}

/// One unrotated `size x size x height` box standing on flat ground at z = 0.
pub fn single_cube_world(center: Vec2, size: f32, height: f32) -> CollisionWorld {
    build(cube_params(size, height), &[center], &mut FlatTerrain::default())
}

pub fn world_with(mat: MaterialProfile, centers: &[Vec2]) -> CollisionWorld {
    let params = Arc::new(BuildingParams::with_material(PlacementParams::default(), mat));
    build(params, centers, &mut FlatTerrain::default())
}

/// Like [`world_with`], with every texture resolving to `avg_color`.
pub fn world_with_textures(mat: MaterialProfile, centers: &[Vec2], avg_color: Color) -> CollisionWorld {
    let mut params = BuildingParams::with_material(PlacementParams::default(), mat);
    params.resolve_texture_colors(|_| avg_color);
    build(Arc::new(params), centers, &mut FlatTerrain::default())
}

/// A 10 x 10 x 10 box at the origin turned 45 degrees.
pub fn diamond_world() -> CollisionWorld {
    let params = cube_params(10.0, 10.0);
    let base = Aabb::from_ranges(-5.0, 5.0, -5.0, 5.0, 0.0, 10.0);
    let r = 5.0 * std::f32::consts::SQRT_2;
    let mut b = Building::from_bcube(0, base);
    b.rotation = XyRotation::from_angle(std::f32::consts::FRAC_PI_4);
    b.bcube = Aabb::from_ranges(-r, r, -r, r, 0.0, 10.0);

    let mut field = BuildingField::empty(params);
    field.try_insert(b, &mut StdRng::seed_from_u64(0));
    field.finalize(&mut FlatTerrain::default());
    CollisionWorld::new(Arc::new(field))
}

/// Ground rising along X with slope 1.
struct Slope;

impl Terrain for Slope {
    fn height_at(&self, x: f32, _y: f32) -> f32 {
        x
    }

    fn water_level(&self) -> f32 {
        -100.0
    }
}

/// A single building at x = 20 on steep ground, dropped by terrain conforming.
pub fn sloped_world_with_invalid_building() -> CollisionWorld {
    let placement = PlacementParams {
        flatten_mesh: true,
        max_delta_z: 1.0,
        ..Default::default()
    };
    let mat = MaterialProfile {
        size_range: Aabb::from_ranges(10.0, 10.0, 10.0, 10.0, 10.0, 10.0),
        ..Default::default()
    };
    let params = Arc::new(BuildingParams::with_material(placement, mat));
    build(params, &[Vec2::new(20.0, 0.0)], &mut Slope)
}
