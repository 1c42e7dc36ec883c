//! Immutable generation parameters: global placement settings plus the material list.
//!
//! Built once (usually by the config parser) and shared by reference with the
//! placement engine and shape generator.

use engine_core::{Aabb, Color};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::ConfigError;
use crate::material::MaterialProfile;

/// Global placement settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementParams {
    /// Conform buildings to the terrain after placement.
    pub flatten_mesh: bool,
    /// Number of buildings requested.
    pub num_place: u32,
    /// Attempt budget for both the outer (position) and inner (radial sample) loops.
    pub num_tries: u32,
    /// Placement rectangle in XY. Z is unused.
    pub pos_range: Aabb,
    /// If non-zero, centers must lie within this distance of the rectangle center.
    pub place_radius: f32,
    /// Largest allowed drop from the sampled center height to the lowest corner.
    pub max_delta_z: f32,
    pub ao_factor: f32,
    /// Radians. Zero disables rotation.
    pub max_rot_angle: f32,
    /// Caps the level count so that each level is at least this tall.
    pub min_level_height: f32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            flatten_mesh: false,
            num_place: 0,
            num_tries: 10,
            pos_range: Aabb::from_ranges(-100.0, 100.0, -100.0, 100.0, 0.0, 0.0),
            place_radius: 0.0,
            max_delta_z: 0.0,
            ao_factor: 0.0,
            max_rot_angle: 0.0,
            min_level_height: 0.0,
        }
    }
}

/// Placement settings plus the weighted material list.
#[derive(Debug, Clone)]
pub struct BuildingParams {
    pub placement: PlacementParams,
    materials: Vec<MaterialProfile>,
    chooser: WeightedIndex<u32>,
}

impl BuildingParams {
    /// Fails if no material has a non-zero [`MaterialProfile::probability`].
    pub fn new(
        placement: PlacementParams,
        materials: Vec<MaterialProfile>,
    ) -> Result<Self, ConfigError> {
        let chooser = WeightedIndex::new(materials.iter().map(|m| m.probability))
            .map_err(|_| ConfigError::NoSelectableMaterial)?;
        Ok(Self {
            placement,
            materials,
            chooser,
        })
    }

    /// Single-material parameters; the material's weight is ignored.
    pub fn with_material(placement: PlacementParams, material: MaterialProfile) -> Self {
        let material = MaterialProfile {
            probability: material.probability.max(1),
            ..material
        };
        Self::new(placement, vec![material]).expect("a material with non-zero weight is selectable")
    }

    pub fn materials(&self) -> &[MaterialProfile] {
        &self.materials
    }

    /// Panics on an out-of-range index: building material indices are only ever
    /// produced by [`choose_material`](Self::choose_material).
    pub fn material(&self, ix: usize) -> &MaterialProfile {
        assert!(
            ix < self.materials.len(),
            "material index {ix} out of range ({} materials)",
            self.materials.len()
        );
        &self.materials[ix]
    }

    pub fn choose_material<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.chooser.sample(rng)
    }

    /// Fill in each texture's average color from the host's texture store.
    /// Surfaces without a texture stay white.
    pub fn resolve_texture_colors(&mut self, mut avg_color: impl FnMut(&str) -> Color) {
        for mat in &mut self.materials {
            for tex in [&mut mat.side_tex, &mut mat.roof_tex] {
                if let Some(name) = &tex.tid {
                    tex.avg_color = avg_color(name);
                }
            }
        }
    }
}
