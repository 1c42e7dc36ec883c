//! citygen - procedural building field generator with a headless collision probe

mod config;
mod demo;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use engine_core::Color;
use physics::CollisionWorld;
use procgen::{
    instance_bytes, load_buildings_config, parse_buildings_config, BuildingField, BuildingParams,
    ConfigLoad, NoiseTerrain,
};

use config::DemoConfig;

const DEFAULT_BUILDINGS: &str = include_str!("../assets/buildings.txt");

fn load_params(cfg: &DemoConfig) -> Result<BuildingParams> {
    let load: ConfigLoad = match &cfg.buildings_config {
        Some(path) => load_buildings_config(path)?,
        None => parse_buildings_config(DEFAULT_BUILDINGS)?,
    };
    for err in &load.errors {
        log::warn!("buildings config: {err}");
    }
    let mut params = load.params;
    params.resolve_texture_colors(texture_tint);
    Ok(params)
}

/// Stand-in for a texture store: a stable light tint per texture name.
fn texture_tint(name: &str) -> Color {
    let h = name
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3));
    let channel = |shift: u32| 0.6 + 0.4 * ((h >> shift) & 0xff) as f32 / 255.0;
    Color::new(channel(0), channel(8), channel(16), 1.0)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = DemoConfig::load();
    log::info!("Starting citygen (world seed {})", cfg.world_seed);

    let params = Arc::new(load_params(&cfg)?);
    log::info!(
        "{} building materials, {} placements requested",
        params.materials().len(),
        params.placement.num_place
    );

    let mut world = CollisionWorld::empty(params.clone());
    let mut terrain = NoiseTerrain::new(cfg.terrain.to_noise_config());

    for i in 0..cfg.regenerations.max(1) {
        let seed = cfg.world_seed.wrapping_add(i as u64);
        terrain.reset_flattening();
        let start = Instant::now();
        let field = BuildingField::generate(params.clone(), &mut terrain, seed);
        let instances = field.part_instances();
        log::info!(
            "Field {} (seed {}): {} valid buildings, {} parts ({} bytes of instance data) in {:.2?}",
            i,
            seed,
            field.valid_buildings().count(),
            instances.len(),
            instance_bytes(&instances).len(),
            start.elapsed()
        );
        world.replace_field(Arc::new(field));
    }

    let extent = world.max_extent();
    log::info!(
        "Largest building: {:.1} x {:.1} half-size, {:.1} tall",
        extent.x,
        extent.y,
        extent.z
    );

    let walk = demo::walk(&world, &terrain, &cfg.walker);
    log::info!(
        "Walker: {} steps, {} collisions, ended at ({:.1}, {:.1}, {:.1})",
        walk.steps,
        walk.collisions,
        walk.final_pos.x,
        walk.final_pos.y,
        walk.final_pos.z
    );

    let fan = demo::ray_fan(&world, &cfg.ray_fan);
    match fan.nearest {
        Some(d) => log::info!(
            "Ray fan: {} rays, {} roof hits, {} side hits, nearest at {:.1} m",
            fan.rays,
            fan.roof_hits,
            fan.side_hits,
            d
        ),
        None => log::info!("Ray fan: {} rays, nothing hit", fan.rays),
    }

    Ok(())
}
