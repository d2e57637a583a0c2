use std::{f32::consts::FRAC_PI_8, path::Path};

use nalgebra::Vector3;

use transform_tree::{Config, LocalTransform, Space3, TransformTree};

const STEPS: usize = 16;

fn main() -> Result<(), failure::Error> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_path(path)?,
        None => Config::from_path(Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.ron"))?,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("transform_tree", config.log_level_filter()?)
        .init();

    log::info!("Propagation: {:?}", config.propagation);

    let mut tree = TransformTree::<Space3>::from_config(&config);
    let sun = tree.create_root();
    let planet = tree.create_child_with(
        sun,
        LocalTransform::from_position(Vector3::new(10.0, 0.0, 0.0)),
    )?;
    let moon = tree.create_child_with(
        planet,
        LocalTransform::from_position(Vector3::new(2.0, 0.0, 0.0))
            .with_scale(Vector3::repeat(0.25)),
    )?;

    for step in 0..STEPS {
        let angle = step as f32 * FRAC_PI_8;
        tree.set_rotation_axis(sun, 2, angle)?;
        tree.set_rotation_axis(planet, 2, angle * 4.0)?;

        // top-down, so OneHop trees see the same state as the others
        for id in &[sun, planet, moon] {
            tree.global_matrix(*id)?;
        }
        let p = tree.global_position(moon)?;
        log::info!(
            "Step {}: moon at ({:.3}, {:.3}, {:.3})",
            step,
            p.x,
            p.y,
            p.z
        );
    }

    log::info!("Recompute stats: {:?}", tree.stats());
    Ok(())
}
