use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;
use tracing::{info, warn};

use crate::consts::MIN_STITCH_IMAGES;
use crate::equirect::pad_to_equirect;
use crate::error::{PanoramaError, Result};
use crate::io::image_io::{list_frame_files, write_image};
use crate::normalize::normalize_frames;
use crate::preprocess::preprocess_frames;
use crate::sampler::extract_frames;
use crate::stitch::{PanoramaStitcher, PhaseCorrelationEngine, StitchEngine};

use super::config::PipelineConfig;
use super::types::{NoOpReporter, PipelineOutput, PipelineStage, ProgressReporter};

fn require_images(available: usize) -> Result<()> {
    if available < MIN_STITCH_IMAGES {
        return Err(PanoramaError::InsufficientInput {
            available,
            required: MIN_STITCH_IMAGES,
        });
    }
    Ok(())
}

/// Run the full pipeline with the given stitch engine and a thread-safe
/// progress reporter.
///
/// Stages: optional sampling of `config.video` into `config.frames_dir`,
/// listing, normalization and smoothing on a pool of `config.workers`
/// threads, stitching with grouped fallback, then writing the composite
/// (and the optional equirectangular copy). Nothing is written to
/// `config.output` unless stitching succeeds.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    engine: &dyn StitchEngine,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineOutput> {
    config.validate()?;
    let started = Instant::now();

    let sampled = match &config.video {
        Some(video) => {
            reporter.begin_stage(PipelineStage::Sampling, None);
            let report = extract_frames(video, &config.frames_dir, config.sampling.interval)?;
            reporter.finish_stage();
            Some(report)
        }
        None => None,
    };

    reporter.begin_stage(PipelineStage::Listing, None);
    let paths = list_frame_files(&config.frames_dir)?;
    reporter.finish_stage();
    info!(
        frames = paths.len(),
        dir = %config.frames_dir.display(),
        workers = config.workers,
        "Found frame files"
    );
    require_images(paths.len())?;

    reporter.begin_stage(PipelineStage::Normalizing, Some(paths.len()));
    let normalized = normalize_frames(
        &paths,
        config.workers,
        config.normalized_dir.as_deref(),
        |done| reporter.advance(done),
    )?;
    reporter.finish_stage();
    let mut skipped = normalized.skipped;
    if !skipped.is_empty() {
        warn!(skipped = skipped.len(), "Some frames could not be normalized");
    }
    require_images(normalized.items.len())?;

    reporter.begin_stage(PipelineStage::Preprocessing, Some(normalized.items.len()));
    let smoothed = preprocess_frames(
        normalized.items,
        config.workers,
        config.preprocess.kernel_size,
        |done| reporter.advance(done),
    )?;
    reporter.finish_stage();
    skipped.extend(smoothed.skipped);
    require_images(smoothed.items.len())?;

    let images: Vec<RgbImage> = smoothed.items.into_iter().map(|f| f.pixels).collect();
    let frames_used = images.len();

    reporter.begin_stage(PipelineStage::Stitching, None);
    let stitcher = PanoramaStitcher::new(engine, config.stitch.params(), config.stitch.fallback());
    let outcome = stitcher.stitch(&images)?;
    reporter.finish_stage();
    drop(images);

    reporter.begin_stage(PipelineStage::Writing, None);
    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_image(&config.output, &outcome.composite)?;
    reporter.finish_stage();
    info!(path = %config.output.display(), "Composite written");

    let equirect_path = match &config.equirect_output {
        Some(path) => {
            reporter.begin_stage(PipelineStage::Projecting, None);
            write_image(path, &pad_to_equirect(&outcome.composite))?;
            reporter.finish_stage();
            info!(path = %path.display(), "Equirectangular copy written");
            Some(path.clone())
        }
        None => None,
    };

    info!(
        frames = frames_used,
        skipped = skipped.len(),
        attempts = outcome.attempts.len(),
        used_fallback = outcome.used_fallback,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Pipeline complete"
    );

    Ok(PipelineOutput {
        composite_path: config.output.clone(),
        equirect_path,
        width: outcome.composite.width(),
        height: outcome.composite.height(),
        frames_used,
        skipped,
        attempts: outcome.attempts,
        used_fallback: outcome.used_fallback,
        sampled,
    })
}

/// Run the full pipeline with the built-in engine and no progress output.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    run_pipeline_reported(config, &PhaseCorrelationEngine::new(), Arc::new(NoOpReporter))
}
