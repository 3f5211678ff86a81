//! `lumen [settings.json]`: render a preset scene to an image file.

mod scenes;
mod settings;

use anyhow::{Context, Result};
use lumen_renderer::Hittable;
use scenes::Scene;
use settings::RenderSettings;
use std::path::PathBuf;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => RenderSettings::load(&path)?,
        None => RenderSettings::default(),
    };

    log::info!("Starting Lumen: scene '{}'", settings.scene);

    let start = Instant::now();
    let scene = Scene::build(settings.scene, settings.seed());
    log::info!(
        "Scene built in {:.2?} (BVH depth {})",
        start.elapsed(),
        scene.world.depth()
    );

    let mut config = settings.camera_config(scene.camera.clone().with_progress(true))?;
    if config.output.is_none() {
        config.output = Some(PathBuf::from(format!("{}.bmp", settings.scene)));
    }

    let camera = config
        .initialize()
        .context("Failed to set up the camera")?;
    let lights = scene.lights.as_ref().map(|l| l as &dyn Hittable);

    camera
        .render(&scene.world, lights)
        .with_context(|| format!("Failed to render '{}'", settings.scene))?;

    Ok(())
}
