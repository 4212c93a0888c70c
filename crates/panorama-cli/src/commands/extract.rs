use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use panorama_core::consts::DEFAULT_SAMPLING_INTERVAL;
use panorama_core::sampler::extract_frames;

#[derive(Args)]
pub struct ExtractArgs {
    /// Input video (SER) or directory of images
    pub video: PathBuf,

    /// Directory for the sampled frames (emptied first)
    #[arg(long, default_value = "frames")]
    pub out: PathBuf,

    /// Keep one frame out of every N
    #[arg(long, default_value_t = DEFAULT_SAMPLING_INTERVAL)]
    pub interval: usize,
}

pub fn run(args: &ExtractArgs) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message(format!("Sampling every {} frame(s)", args.interval));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = extract_frames(&args.video, &args.out, args.interval)
        .with_context(|| format!("Failed to sample {}", args.video.display()))?;
    spinner.finish_and_clear();

    println!(
        "Saved {} of {} frames to {} ({} rotated to portrait)",
        report.saved.len(),
        report.frames_read,
        args.out.display(),
        report.rotated
    );
    Ok(())
}
