use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use panorama_core::pipeline::config::PipelineConfig;
use panorama_core::pipeline::run_pipeline_reported;
use panorama_core::stitch::{CompositingResolution, PhaseCorrelationEngine, StitchEngine};

use crate::progress::BarReporter;
use crate::summary::{print_pipeline_summary, print_run_result};

#[derive(Args)]
pub struct RunArgs {
    /// Directory holding the frames (filled from --video when given)
    pub frames_dir: Option<PathBuf>,

    /// Video to sample into the frames directory first
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Pipeline config file (TOML); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Worker threads for the per-frame stages
    #[arg(long)]
    pub workers: Option<usize>,

    /// Keep one frame out of every N when sampling
    #[arg(long)]
    pub interval: Option<usize>,

    /// Minimum pairwise match confidence
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Registration resolution in megapixels
    #[arg(long = "registration-resol")]
    pub registration_resol: Option<f64>,

    /// Seam estimation resolution in megapixels
    #[arg(long = "seam-resol")]
    pub seam_resol: Option<f64>,

    /// Compositing resolution in megapixels (default: original size)
    #[arg(long = "compositing-resol")]
    pub compositing_resol: Option<f64>,

    /// Frames per fallback group
    #[arg(long)]
    pub group_size: Option<usize>,

    /// Keep resized copies of the frames in this directory
    #[arg(long)]
    pub normalized_dir: Option<PathBuf>,

    /// Also write a 2:1 padded copy here
    #[arg(long)]
    pub equirect: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;
    config.validate().context("Invalid pipeline config")?;

    let engine = PhaseCorrelationEngine::new();
    print_pipeline_summary(&config, engine.name());

    let reporter = Arc::new(BarReporter::new());
    let result = run_pipeline_reported(&config, &engine, reporter.clone());
    reporter.finish();
    let output = result.context("Panorama stitching failed")?;

    print_run_result(&output);
    Ok(())
}

fn build_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&contents).context("Invalid pipeline config")?
        }
        None => {
            let Some(ref frames_dir) = args.frames_dir else {
                bail!("A frames directory is required when no --config is given");
            };
            PipelineConfig::new(frames_dir, "panorama.jpg")
        }
    };

    if let Some(ref dir) = args.frames_dir {
        config.frames_dir = dir.clone();
    }
    if let Some(ref output) = args.output {
        config.output = output.clone();
    }
    if args.video.is_some() {
        config.video = args.video.clone();
    }
    if args.normalized_dir.is_some() {
        config.normalized_dir = args.normalized_dir.clone();
    }
    if args.equirect.is_some() {
        config.equirect_output = args.equirect.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(interval) = args.interval {
        config.sampling.interval = interval;
    }
    if let Some(confidence) = args.confidence {
        config.stitch.confidence_threshold = confidence;
    }
    if let Some(resol) = args.registration_resol {
        config.stitch.registration_resolution = resol;
    }
    if let Some(resol) = args.seam_resol {
        config.stitch.seam_estimation_resolution = resol;
    }
    if let Some(resol) = args.compositing_resol {
        config.stitch.compositing_resolution = CompositingResolution::Megapixels(resol);
    }
    if let Some(size) = args.group_size {
        config.stitch.group_size = size;
    }
    Ok(config)
}
