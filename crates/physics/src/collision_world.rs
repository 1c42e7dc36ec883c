//! The collision world: a shared, read-only building field plus sphere queries.

use std::sync::Arc;

use engine_core::{Aabb, Vec3};
use procgen::{BuildingField, BuildingParams};

use crate::collision::BuildingCollision;

/// Query front end over one generated [`BuildingField`].
///
/// Queries take `&self` and may run concurrently. A regenerated field is
/// swapped in whole with [`replace_field`](Self::replace_field); queries that
/// cloned the previous `Arc` keep seeing the old field until they finish.
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    field: Arc<BuildingField>,
}

impl CollisionWorld {
    pub fn new(field: Arc<BuildingField>) -> Self {
        Self { field }
    }

    /// A world with no buildings.
    pub fn empty(params: Arc<BuildingParams>) -> Self {
        Self::new(Arc::new(BuildingField::empty(params)))
    }

    pub fn field(&self) -> &Arc<BuildingField> {
        &self.field
    }

    /// Swap in a freshly generated field, returning the previous one.
    pub fn replace_field(&mut self, field: Arc<BuildingField>) -> Arc<BuildingField> {
        log::debug!(
            "Swapping building field: {} -> {} buildings",
            self.field.buildings().len(),
            field.buildings().len()
        );
        std::mem::replace(&mut self.field, field)
    }

    /// Largest building half-width (X/Y) and height (Z).
    pub fn max_extent(&self) -> Vec3 {
        self.field.max_extent()
    }

    /// Sweep a sphere from `p_last` to `*pos`. On contact with a building,
    /// `pos` is corrected and the building index returned. The first building
    /// hit ends the query.
    pub fn sphere_coll_building(
        &self,
        pos: &mut Vec3,
        p_last: Vec3,
        radius: f32,
        xy_only: bool,
    ) -> Option<usize> {
        let field = &*self.field;
        let buildings = field.buildings();
        let query = Aabb::from_sphere(*pos, radius);
        let swept = Aabb::from_sphere(*pos, radius + pos.distance(p_last));

        for (_, cell) in field.grid().cells_in(&query) {
            if cell.is_empty() {
                continue;
            }
            let reaches = if xy_only {
                cell.bcube.touches_xy(&swept)
            } else {
                cell.bcube.touches(&swept)
            };
            if !reaches {
                continue;
            }
            for &ix in &cell.members {
                if buildings[ix].sphere_coll(pos, p_last, radius, xy_only) {
                    return Some(ix);
                }
            }
        }
        None
    }

    /// [`sphere_coll_building`](Self::sphere_coll_building) without the index.
    pub fn check_sphere_coll(&self, pos: &mut Vec3, p_last: Vec3, radius: f32, xy_only: bool) -> bool {
        self.sphere_coll_building(pos, p_last, radius, xy_only).is_some()
    }

    /// Does a resting sphere touch any building? No correction is applied.
    pub fn check_sphere_overlap(&self, pos: Vec3, radius: f32, xy_only: bool) -> Option<usize> {
        let mut p = pos;
        self.sphere_coll_building(&mut p, pos, radius, xy_only)
    }

    /// Is `pos` inside any building?
    pub fn check_point_coll(&self, pos: Vec3, xy_only: bool) -> bool {
        self.check_sphere_overlap(pos, 0.0, xy_only).is_some()
    }
}
