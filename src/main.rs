// Example runner: tracks objects through a directory of mask images.
//
// Usage: blob_tracker <mask_dir> [config.json] [fps]
//
// Every image in <mask_dir> is loaded in file-name order and fed to the
// pipeline as one frame, with timestamps spaced 1/fps seconds apart.

use anyhow::{Context, bail};
use blob_tracker::core_modules::utils::image_helper;
use blob_tracker::{TrackerConfig, TrackingPipeline};
use log::info;
use std::env;
use std::path::PathBuf;

const DEFAULT_FPS: f64 = 15.0;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: blob_tracker <mask_dir> [config.json] [fps]");
        return Ok(());
    }
    let mask_dir = PathBuf::from(&args[1]);
    let config = match args.get(2) {
        Some(path) => TrackerConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => TrackerConfig::default(),
    };
    let fps = match args.get(3) {
        Some(fps) => fps.parse::<f64>().with_context(|| format!("invalid fps {fps:?}"))?,
        None => DEFAULT_FPS,
    };
    if !(fps > 0.0) {
        bail!("fps must be positive, got {fps}");
    }

    // --- 2. Frame Discovery ---
    let mut frames: Vec<PathBuf> = std::fs::read_dir(&mask_dir)
        .with_context(|| format!("reading {}", mask_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    frames.sort();
    info!("{} frames found in {}", frames.len(), mask_dir.display());

    // --- 3. Main Processing Loop ---
    let mut pipeline = TrackingPipeline::new(config)?;
    for (index, path) in frames.iter().enumerate() {
        let mask = image_helper::load_mask(path)
            .with_context(|| format!("loading {}", path.display()))?;
        let timestamp = index as f64 / fps;
        let report = pipeline.process_frame(&mask.as_mask(), timestamp);

        for blob in report.accepted() {
            info!(
                "frame {:>5}  object {:>4}  box {:?}  velocity ({:.1}, {:.1}) px/s  age {:.2}s",
                report.frame_number,
                blob.id,
                blob.bounds,
                blob.velocity.0,
                blob.velocity.1,
                blob.age(timestamp)
            );
        }
        for blob in &report.lost {
            info!("frame {:>5}  object {:>4} lost", report.frame_number, blob.id);
        }
    }

    Ok(())
}
