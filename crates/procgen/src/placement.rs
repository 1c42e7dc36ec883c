//! Placement engine: rejection-samples non-overlapping buildings over the placement rectangle.
//!
//! A pass has three phases:
//! 1. sequential placement, using the [`PlacementGrid`] to reject overlaps;
//! 2. terrain conforming (parallel, except for the flattening path);
//! 3. geometry generation, parallel over building indices.
//!
//! The resulting [`BuildingField`] is immutable from the point of view of
//! collision queries. Regenerating produces a new field; callers swap it in
//! whole.

use std::sync::Arc;
use std::time::Instant;

use engine_core::{Aabb, Vec2, Vec3};
use rand::prelude::*;
use rayon::prelude::*;

use crate::building::Building;
use crate::grid::PlacementGrid;
use crate::params::BuildingParams;
use crate::shape::rand_uniform;
use crate::terrain::Terrain;

/// Conformed buildings with more underwater corners than this are dropped.
const MAX_UNDERWATER_CORNERS: usize = 2;

/// Counters for one placement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementStats {
    /// Buildings asked for (`num_place`).
    pub requested: u32,
    /// Outer placement attempts made.
    pub attempts: u32,
    /// Candidates that passed center sampling and the terrain checks.
    pub generated: u32,
    /// Candidates accepted into the field.
    pub placed: u32,
    /// Placed buildings later invalidated by terrain conforming.
    pub invalidated: u32,
}

impl PlacementStats {
    pub fn num_valid(&self) -> u32 {
        self.placed - self.invalidated
    }
}

/// The generated building list and its spatial index.
#[derive(Debug, Clone)]
pub struct BuildingField {
    params: Arc<BuildingParams>,
    buildings: Vec<Building>,
    grid: PlacementGrid,
    /// Largest half-width in X/Y and largest height over all placed buildings.
    max_extent: Vec3,
    stats: PlacementStats,
}

impl BuildingField {
    pub fn empty(params: Arc<BuildingParams>) -> Self {
        let grid = PlacementGrid::new(params.placement.pos_range);
        Self {
            params,
            buildings: Vec::new(),
            grid,
            max_extent: Vec3::ZERO,
            stats: PlacementStats::default(),
        }
    }

    /// Run a full generation pass.
    pub fn generate<T: Terrain + ?Sized>(
        params: Arc<BuildingParams>,
        terrain: &mut T,
        world_seed: u64,
    ) -> Self {
        let mut field = Self::empty(params);
        field.place(terrain, world_seed);
        field
    }

    /// Replace the contents of this field with a fresh pass.
    pub fn place<T: Terrain + ?Sized>(&mut self, terrain: &mut T, world_seed: u64) {
        let start = Instant::now();
        self.clear();
        let mut rng = StdRng::seed_from_u64(world_seed);
        let num_place = self.params.placement.num_place;
        let num_tries = self.params.placement.num_tries;

        for _ in 0..num_place {
            self.stats.requested += 1;
            let mat_ix = self.params.choose_material(&mut rng);
            for _ in 0..num_tries {
                self.stats.attempts += 1;
                let Some(center) = self.sample_center(&mut rng) else {
                    continue;
                };
                if self.place_at(mat_ix, center, &*terrain, &mut rng).is_some() {
                    break;
                }
            }
        }
        let placed_time = start.elapsed();
        self.finalize(terrain);

        let s = &self.stats;
        log::info!(
            "Buildings: requested {} attempts {} generated {} placed {} valid {}",
            s.requested,
            s.attempts,
            s.generated,
            s.placed,
            s.num_valid()
        );
        log::info!(
            "Building generation took {:.2?} (placement {:.2?})",
            start.elapsed(),
            placed_time
        );
    }

    /// Pick a center in the placement rectangle, honoring `place_radius`.
    fn sample_center<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2> {
        let placement = &self.params.placement;
        let range = &placement.pos_range;
        let center = range.center().truncate();
        (0..placement.num_tries).find_map(|_| {
            let p = Vec2::new(
                rand_uniform(rng, range.min.x, range.max.x),
                rand_uniform(rng, range.min.y, range.max.y),
            );
            (placement.place_radius == 0.0 || p.distance(center) <= placement.place_radius)
                .then_some(p)
        })
    }

    /// Build an unplaced candidate of material `mat_ix` centered at `center`.
    ///
    /// `None` if the ground there is underwater or outside the material's altitude band.
    pub fn candidate_at<T: Terrain + ?Sized, R: Rng + ?Sized>(
        &self,
        mat_ix: usize,
        center: Vec2,
        terrain: &T,
        rng: &mut R,
    ) -> Option<Building> {
        let mat = self.params.material(mat_ix);
        let z = terrain.height_at(center.x, center.y);
        if terrain.is_underwater(z) || !mat.altitude_ok(z - terrain.water_level()) {
            return None;
        }
        let [sx, sy, sz] = mat.sample_size(rng);
        let (hx, hy) = (0.5 * sx, 0.5 * sy);
        let bcube = Aabb::from_ranges(
            center.x - hx,
            center.x + hx,
            center.y - hy,
            center.y + hy,
            z,
            z + sz,
        );
        let mut building = Building::from_bcube(mat_ix, bcube);
        building.gen_rotation(self.params.placement.max_rot_angle, rng);
        Some(building)
    }

    /// Candidate generation plus insertion. Returns the new building's index.
    pub fn place_at<T: Terrain + ?Sized, R: Rng + ?Sized>(
        &mut self,
        mat_ix: usize,
        center: Vec2,
        terrain: &T,
        rng: &mut R,
    ) -> Option<usize> {
        let candidate = self.candidate_at(mat_ix, center, terrain, rng)?;
        self.stats.generated += 1;
        self.try_insert(candidate, rng)
    }

    /// First existing building the candidate would overlap, using its placement margin.
    pub fn find_overlap(&self, candidate: &Building) -> Option<usize> {
        let expand = candidate.placement_margin();
        let test_bc = candidate.bcube.expanded(candidate.bcube.size() * expand);
        self.grid
            .cells_in(&test_bc)
            .filter(|(_, cell)| !cell.is_empty() && cell.bcube.intersects_xy(&test_bc))
            .flat_map(|(_, cell)| cell.members.iter().copied())
            .find(|&ix| candidate.overlaps(&self.buildings[ix], expand))
    }

    /// Accept `candidate` unless it overlaps an existing building.
    pub fn try_insert<R: Rng + ?Sized>(&mut self, mut candidate: Building, rng: &mut R) -> Option<usize> {
        if !candidate.is_valid() {
            return None;
        }
        if let Some(other) = self.find_overlap(&candidate) {
            log::trace!("candidate at {:?} overlaps building {}", candidate.bcube.center(), other);
            return None;
        }
        let mat = self.params.material(candidate.material);
        candidate.side_color = mat.side_color.gen_color(rng);
        candidate.roof_color = mat.roof_color.gen_color(rng);

        let size = candidate.bcube.size();
        self.max_extent = self
            .max_extent
            .max(Vec3::new(0.5 * size.x, 0.5 * size.y, size.z));
        let ix = self.buildings.len();
        self.grid.insert(ix, &candidate.bcube);
        self.buildings.push(candidate);
        self.stats.placed += 1;
        Some(ix)
    }

    /// Phases 2 and 3: conform to the terrain (if enabled), then generate geometry.
    pub fn finalize<T: Terrain + ?Sized>(&mut self, terrain: &mut T) {
        if self.params.placement.flatten_mesh {
            let start = Instant::now();
            self.conform_to_terrain(terrain);
            log::debug!(
                "Conformed {} buildings to terrain in {:.2?} ({} invalidated)",
                self.buildings.len(),
                start.elapsed(),
                self.stats.invalidated
            );
        }
        let start = Instant::now();
        self.generate_geometry();
        log::debug!("Generated building geometry in {:.2?}", start.elapsed());
    }

    fn conform_to_terrain<T: Terrain + ?Sized>(&mut self, terrain: &mut T) {
        if terrain.can_flatten() {
            // the flattener mutates shared terrain state
            for b in self.buildings.iter().filter(|b| b.is_valid()) {
                terrain.flatten_region(&b.bcube);
            }
        } else {
            let max_delta_z = self.params.placement.max_delta_z;
            let terrain: &T = terrain;
            let invalidated = self
                .buildings
                .par_iter_mut()
                .filter(|b| b.is_valid())
                .map(|b| u32::from(!lower_to_terrain(b, terrain, max_delta_z)))
                .sum::<u32>();
            self.stats.invalidated += invalidated;
        }
        self.grid.lower_floor(terrain.water_level());
    }

    fn generate_geometry(&mut self) {
        let params = &*self.params;
        let min_level_height = params.placement.min_level_height;
        self.buildings
            .par_iter_mut()
            .enumerate()
            .filter(|(_, b)| b.is_valid())
            .for_each(|(ix, b)| b.gen_geometry(ix, params.material(b.material), min_level_height));
    }

    /// Drop all buildings, reset the grid and the stats.
    pub fn clear(&mut self) {
        self.buildings.clear();
        self.grid.clear();
        self.max_extent = Vec3::ZERO;
        self.stats = PlacementStats::default();
    }

    pub fn params(&self) -> &Arc<BuildingParams> {
        &self.params
    }

    /// All buildings, invalidated ones included, so indices stay stable.
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Valid buildings with their indices.
    pub fn valid_buildings(&self) -> impl Iterator<Item = (usize, &Building)> {
        self.buildings.iter().enumerate().filter(|(_, b)| b.is_valid())
    }

    pub fn grid(&self) -> &PlacementGrid {
        &self.grid
    }

    /// Largest half-width in X/Y and largest height over the placed buildings.
    pub fn max_extent(&self) -> Vec3 {
        self.max_extent
    }

    pub fn stats(&self) -> PlacementStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

/// Drop the base to the lowest footprint corner (not below water).
/// Returns false, after invalidating, if the site is too steep or too wet.
fn lower_to_terrain<T: Terrain + ?Sized>(b: &mut Building, terrain: &T, max_delta_z: f32) -> bool {
    let water = terrain.water_level();
    let base = b.footprint_parts()[0];
    let z = b.bcube.min.z;
    let mut min_z = z;
    let mut num_underwater = 0;
    for corner in base.corners_xy() {
        let c = b.to_world(corner.extend(z));
        let h = terrain.height_at(c.x, c.y);
        if terrain.is_underwater(h) {
            num_underwater += 1;
        }
        min_z = min_z.min(h);
    }
    let min_z = min_z.max(water);
    if num_underwater > MAX_UNDERWATER_CORNERS || (max_delta_z > 0.0 && z - min_z > max_delta_z) {
        b.invalidate();
        return false;
    }
    b.bcube.min.z = min_z;
    for p in &mut b.parts {
        p.min.z = min_z;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialProfile;
    use crate::params::PlacementParams;
    use crate::terrain::{FlatTerrain, NoiseTerrain, NoiseTerrainConfig};

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

    fn cube_material(sx: f32, sy: f32, sz: f32) -> MaterialProfile {
        MaterialProfile {
            size_range: Aabb::from_ranges(sx, sx, sy, sy, sz, sz),
            ..Default::default()
        }
    }

    fn params(placement: PlacementParams, mat: MaterialProfile) -> Arc<BuildingParams> {
        Arc::new(BuildingParams::with_material(placement, mat))
    }

    fn city_params(max_rot_angle: f32) -> Arc<BuildingParams> {
        let placement = PlacementParams {
            num_place: 300,
            num_tries: 10,
            pos_range: Aabb::from_ranges(-500.0, 500.0, -500.0, 500.0, 0.0, 0.0),
            max_rot_angle,
            ..Default::default()
        };
        let mat = MaterialProfile {
            min_levels: 1,
            max_levels: 4,
            split_prob: 0.3,
            size_range: Aabb::from_ranges(10.0, 60.0, 10.0, 60.0, 10.0, 80.0),
            ..Default::default()
        };
        let round = MaterialProfile {
            round_prob: 0.5,
            cube_prob: 0.2,
            min_sides: 3,
            max_sides: 8,
            size_range: Aabb::from_ranges(10.0, 30.0, 10.0, 30.0, 20.0, 50.0),
            ..Default::default()
        };
        Arc::new(BuildingParams::new(placement, vec![mat, round]).unwrap())
    }

    #[test]
    fn single_cube_fills_its_sampled_box() {
        let p = params(PlacementParams::default(), cube_material(10.0, 10.0, 20.0));
        let mut field = BuildingField::empty(p);
        let mut terrain = FlatTerrain::default();
        let mut rng = StdRng::seed_from_u64(0);
        let ix = field
            .place_at(0, Vec2::ZERO, &terrain, &mut rng)
            .expect("empty field accepts a building");
        field.finalize(&mut terrain);
        let expected = Aabb::from_ranges(-5.0, 5.0, -5.0, 5.0, 0.0, 20.0);
        let b = &field.buildings()[ix];
        assert_eq!(b.bcube, expected);
        assert_eq!(b.parts, vec![expected]);
        assert_eq!(field.max_extent(), Vec3::new(5.0, 5.0, 20.0));
    }

    #[test]
    fn identical_candidate_is_rejected() {
        let p = params(PlacementParams::default(), cube_material(10.0, 10.0, 10.0));
        let mut field = BuildingField::empty(p);
        let terrain = FlatTerrain::default();
        let mut rng = StdRng::seed_from_u64(0);
        let center = Vec2::new(20.0, -30.0);
        assert_eq!(field.place_at(0, center, &terrain, &mut rng), Some(0));
        assert_eq!(field.place_at(0, center, &terrain, &mut rng), None);
        assert_eq!(field.buildings().len(), 1);
        assert!(field
            .grid()
            .iter()
            .all(|c| c.members.is_empty() || c.members == vec![0]));
        let stats = field.stats();
        assert_eq!((stats.generated, stats.placed), (2, 1));
    }

    #[test]
    fn unrotated_buildings_never_overlap() {
        let mut terrain = FlatTerrain::default();
        let field = BuildingField::generate(city_params(0.0), &mut terrain, 1234);
        assert!(field.stats().placed > 50, "placed {}", field.stats().placed);
        let valid: Vec<_> = field.valid_buildings().collect();
        for (i, (_, a)) in valid.iter().enumerate() {
            for (_, b) in &valid[i + 1..] {
                assert!(!a.bcube.intersects_xy(&b.bcube), "{:?} overlaps {:?}", a.bcube, b.bcube);
            }
        }
    }

    #[test]
    fn accepted_candidates_never_overlap_at_their_margin() {
        for max_rot_angle in [0.0, 1.2] {
            let p = city_params(max_rot_angle);
            let mut field = BuildingField::empty(p.clone());
            let terrain = FlatTerrain::default();
            let mut rng = StdRng::seed_from_u64(2024);
            for _ in 0..4000 {
                let mat_ix = p.choose_material(&mut rng);
                let center = Vec2::new(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0));
                field.place_at(mat_ix, center, &terrain, &mut rng);
            }
            let bs = field.buildings();
            assert!(bs.len() > 100, "placed {}", bs.len());
            if max_rot_angle > 0.0 {
                assert!(bs.iter().any(Building::is_rotated));
            }
            // each later building was the candidate when tested against earlier ones
            for j in 1..bs.len() {
                for i in 0..j {
                    assert!(
                        !bs[j].overlaps(&bs[i], bs[j].placement_margin()),
                        "building {j} overlaps {i} (max_rot_angle {max_rot_angle})"
                    );
                }
            }
        }
    }

    #[test]
    fn rotated_building_centers_stay_outside_other_footprints() {
        let mut terrain = FlatTerrain::default();
        let field = BuildingField::generate(city_params(1.2), &mut terrain, 99);
        let valid: Vec<_> = field.valid_buildings().collect();
        assert!(valid.iter().any(|(_, b)| b.is_rotated()));
        for (i, (_, a)) in valid.iter().enumerate() {
            for (j, (_, b)) in valid.iter().enumerate() {
                if i == j {
                    continue;
                }
                let c = b.to_local(a.bcube.center()).truncate();
                assert!(
                    !b.parts.iter().any(|p| p.contains_pt_xy(c)),
                    "center of {i} lies inside {j}"
                );
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let mut t1 = FlatTerrain::default();
        let mut t2 = FlatTerrain::default();
        let a = BuildingField::generate(city_params(0.7), &mut t1, 42);
        let b = BuildingField::generate(city_params(0.7), &mut t2, 42);
        assert_eq!(a.buildings(), b.buildings());
        assert_eq!(a.stats(), b.stats());
        let c = BuildingField::generate(city_params(0.7), &mut t1, 43);
        assert_ne!(a.buildings(), c.buildings());
    }

    #[test]
    fn grid_is_a_superset_index() {
        let mut terrain = FlatTerrain::default();
        let field = BuildingField::generate(city_params(0.5), &mut terrain, 7);
        let grid = field.grid();
        for (ix, b) in field.valid_buildings() {
            for (_, cell) in grid.cells_in(&b.bcube) {
                assert!(cell.members.contains(&ix), "building {ix} missing from cell");
                assert!(cell.bcube.contains_cube(&b.bcube));
            }
        }
    }

    #[test]
    fn parts_stay_inside_rotated_bcube() {
        let mut terrain = FlatTerrain::default();
        let field = BuildingField::generate(city_params(1.0), &mut terrain, 5);
        for (_, b) in field.valid_buildings() {
            let bc = b.bcube.expanded(Vec3::splat(1e-3));
            for p in &b.parts {
                for c in p.corners_xy() {
                    let w = b.to_world(c.extend(p.min.z));
                    assert!(bc.contains_pt_xy(w.truncate()), "{w:?} outside {:?}", b.bcube);
                }
                assert!(p.min.z >= bc.min.z && p.max.z <= bc.max.z);
            }
        }
    }

    #[test]
    fn underwater_sites_are_skipped() {
        let placement = PlacementParams {
            num_place: 5,
            num_tries: 4,
            ..Default::default()
        };
        let p = params(placement, cube_material(5.0, 5.0, 5.0));
        let mut terrain = FlatTerrain::new(-5.0, 0.0);
        let field = BuildingField::generate(p, &mut terrain, 1);
        assert!(field.is_empty());
        let stats = field.stats();
        assert_eq!(stats.requested, 5);
        assert_eq!(stats.attempts, 20);
        assert_eq!(stats.generated, 0);
    }

    #[test]
    fn radial_constraint_limits_centers() {
        let placement = PlacementParams {
            num_place: 40,
            num_tries: 20,
            place_radius: 30.0,
            ..Default::default()
        };
        let p = params(placement, cube_material(4.0, 4.0, 4.0));
        let field = BuildingField::generate(p, &mut FlatTerrain::default(), 3);
        assert!(!field.is_empty());
        for (_, b) in field.valid_buildings() {
            assert!(b.bcube.center().truncate().length() <= 30.0 + 1e-3);
        }
    }

    #[test]
    fn steep_sites_are_invalidated_when_conforming() {
        let placement = PlacementParams {
            flatten_mesh: true,
            max_delta_z: 1.0,
            ..Default::default()
        };
        let p = params(placement, cube_material(10.0, 10.0, 10.0));
        let mut field = BuildingField::empty(p);
        let mut rng = StdRng::seed_from_u64(0);
        let ix = field.place_at(0, Vec2::new(20.0, 0.0), &Slope, &mut rng).unwrap();
        field.finalize(&mut Slope);
        assert!(!field.buildings()[ix].is_valid());
        assert_eq!(field.stats().invalidated, 1);
        assert_eq!(field.valid_buildings().count(), 0);
    }

    #[test]
    fn conforming_lowers_base_to_lowest_corner() {
        let placement = PlacementParams {
            flatten_mesh: true,
            ..Default::default()
        };
        let p = params(placement, cube_material(10.0, 10.0, 10.0));
        let mut field = BuildingField::empty(p);
        let mut rng = StdRng::seed_from_u64(0);
        let ix = field.place_at(0, Vec2::new(20.0, 0.0), &Slope, &mut rng).unwrap();
        field.finalize(&mut Slope);
        let b = &field.buildings()[ix];
        assert!(b.is_valid());
        assert_eq!(b.bcube.min.z, 15.0);
        assert_eq!(b.bcube.max.z, 30.0);
        assert!(b.parts.iter().all(|p| p.min.z == 15.0));
    }

    #[test]
    fn flattening_terrain_records_each_footprint() {
        let placement = PlacementParams {
            flatten_mesh: true,
            num_place: 20,
            num_tries: 10,
            ..Default::default()
        };
        let p = params(placement, cube_material(8.0, 8.0, 12.0));
        let mut terrain = NoiseTerrain::new(NoiseTerrainConfig {
            base_height: 10.0,
            water_level: 0.0,
            ..Default::default()
        });
        let field = BuildingField::generate(p, &mut terrain, 11);
        assert_eq!(terrain.num_flattened() as u32, field.stats().num_valid());
        assert_eq!(field.stats().invalidated, 0);
    }
}
