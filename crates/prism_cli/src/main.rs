use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use prism_core::{demo_scene, SceneDesc};
use prism_renderer::{RenderStats, Renderer};

mod cli;
mod output;

use cli::Args;
use output::{save_png, save_raw};

/// Initialize the logger with the specified level
fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into());

    log::info!("Starting Prism");

    let desc = match &args.scene {
        Some(path) => SceneDesc::load(path)
            .with_context(|| format!("Failed to load scene {}", path.display()))?,
        None => {
            log::info!("No scene file given, using the demo scene");
            demo_scene()
        }
    };
    let (scene, camera) = desc.build().context("Invalid scene")?;
    for (id, (sphere, material)) in scene.spheres().iter().zip(scene.materials()).enumerate() {
        log::debug!(
            "Sphere {}: center {:?}, radius {}, albedo {:?}, emissive {:?}",
            id,
            sphere.center(),
            sphere.radius(),
            material.albedo(),
            material.emissive()
        );
    }

    let mut renderer = Renderer::new(&scene, &camera, args.render_config()?)?;
    let config = *renderer.config();
    let mut backbuffer = renderer.new_backbuffer();
    log::debug!(
        "Camera at {:?}, lens radius {}",
        renderer.camera().origin(),
        renderer.camera().lens_radius()
    );
    log::info!(
        "Rendering {} spheres at {}x{}, {} spp, depth {}, {} frames{}",
        scene.len(),
        config.width,
        config.height,
        config.samples_per_pixel,
        config.max_depth,
        config.frame_count,
        if config.progressive { " (progressive)" } else { "" }
    );

    let start = Instant::now();
    let mut stats = RenderStats::default();
    for frame in 0..config.frame_count {
        let frame_stats = renderer.render_frame(frame, &mut backbuffer)?;
        stats.record(&frame_stats);

        if args.preview_due(frame, config.frame_count) {
            save_png(&backbuffer, &args.output)?;
            log::info!("Preview after {} frames written to {}", frame + 1, args.output.display());
        }
    }
    let elapsed = start.elapsed();

    let mrays = stats.rays as f64 / elapsed.as_secs_f64().max(f64::EPSILON) / 1.0e6;
    log::info!(
        "Rendered {} frames in {:.2?}: {} rays, {:.1} Mrays/s",
        stats.frames,
        elapsed,
        stats.rays,
        mrays
    );
    if stats.invalid_paths > 0 {
        log::warn!(
            "{} paths hit an unrecognized material and were cut short",
            stats.invalid_paths
        );
    }

    save_png(&backbuffer, &args.output)?;
    log::info!("Saved to {}", args.output.display());

    if let Some(raw) = &args.raw {
        save_raw(&backbuffer, raw)?;
    }

    Ok(())
}
