use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_FALLBACK_MIN_ITEMS,
    DEFAULT_GROUP_SIZE, DEFAULT_REGISTRATION_RESOLUTION, DEFAULT_SAMPLING_INTERVAL,
    DEFAULT_SEAM_ESTIMATION_RESOLUTION, DEFAULT_WORKERS,
};
use crate::error::{PanoramaError, Result};
use crate::io::image_io::resolve_path;
use crate::sampler::check_output_dir;
use crate::stitch::{CompositingResolution, FallbackConfig, StitchParams};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Video to sample into `frames_dir` first. Without it, `frames_dir`
    /// must already hold the frames.
    pub video: Option<PathBuf>,
    pub frames_dir: PathBuf,
    pub output: PathBuf,
    /// Where to write the 2:1 padded copy of the composite, if anywhere.
    pub equirect_output: Option<PathBuf>,
    /// Directory for resized frame copies. Resized frames stay in memory
    /// when unset.
    pub normalized_dir: Option<PathBuf>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub stitch: StitchConfig,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl PipelineConfig {
    /// Defaults for everything except the paths.
    pub fn new(frames_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            video: None,
            frames_dir: frames_dir.into(),
            output: output.into(),
            equirect_output: None,
            normalized_dir: None,
            workers: DEFAULT_WORKERS,
            sampling: SamplingConfig::default(),
            preprocess: PreprocessConfig::default(),
            stitch: StitchConfig::default(),
        }
    }

    /// Reject settings no stage can run with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PanoramaError::Config("workers must be at least 1".into()));
        }
        if self.sampling.interval == 0 {
            return Err(PanoramaError::Config(
                "sampling interval must be at least 1".into(),
            ));
        }
        if self.preprocess.kernel_size == 0 || self.preprocess.kernel_size % 2 == 0 {
            return Err(PanoramaError::Config(format!(
                "blur kernel size must be odd and positive, got {}",
                self.preprocess.kernel_size
            )));
        }
        if let Some(video) = &self.video {
            check_output_dir(video, &self.frames_dir)?;
        }
        if let Some(normalized) = &self.normalized_dir {
            if resolve_path(normalized) == resolve_path(&self.frames_dir) {
                return Err(PanoramaError::Config(
                    "normalized directory must differ from the frames directory".into(),
                ));
            }
        }
        self.stitch.validate()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Keep one frame out of every `interval`.
    pub interval: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLING_INTERVAL,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Gaussian kernel size in pixels (odd).
    pub kernel_size: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_BLUR_KERNEL_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StitchConfig {
    pub confidence_threshold: f64,
    pub registration_resolution: f64,
    pub seam_estimation_resolution: f64,
    #[serde(default)]
    pub compositing_resolution: CompositingResolution,
    pub group_size: usize,
    pub fallback_min_items: usize,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            registration_resolution: DEFAULT_REGISTRATION_RESOLUTION,
            seam_estimation_resolution: DEFAULT_SEAM_ESTIMATION_RESOLUTION,
            compositing_resolution: CompositingResolution::Original,
            group_size: DEFAULT_GROUP_SIZE,
            fallback_min_items: DEFAULT_FALLBACK_MIN_ITEMS,
        }
    }
}

impl StitchConfig {
    pub fn params(&self) -> StitchParams {
        StitchParams {
            confidence_threshold: self.confidence_threshold,
            registration_resolution: self.registration_resolution,
            seam_estimation_resolution: self.seam_estimation_resolution,
            compositing_resolution: self.compositing_resolution,
        }
    }

    pub fn fallback(&self) -> FallbackConfig {
        FallbackConfig {
            group_size: self.group_size,
            min_items: self.fallback_min_items,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0) {
            return Err(PanoramaError::Config(format!(
                "confidence threshold must be in (0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.registration_resolution <= 0.0 || self.seam_estimation_resolution <= 0.0 {
            return Err(PanoramaError::Config(
                "registration and seam resolutions must be positive".into(),
            ));
        }
        if let CompositingResolution::Megapixels(m) = self.compositing_resolution {
            if m <= 0.0 {
                return Err(PanoramaError::Config(
                    "compositing resolution must be positive".into(),
                ));
            }
        }
        if self.group_size < 2 {
            return Err(PanoramaError::Config(format!(
                "group size must be at least 2, got {}",
                self.group_size
            )));
        }
        Ok(())
    }
}
