use std::path::PathBuf;

use crate::batch::SkippedItem;
use crate::sampler::SampleReport;
use crate::stitch::AttemptRecord;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Sampling,
    Listing,
    Normalizing,
    Preprocessing,
    Stitching,
    Writing,
    Projecting,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sampling => write!(f, "Sampling frames"),
            Self::Listing => write!(f, "Listing frames"),
            Self::Normalizing => write!(f, "Normalizing frames"),
            Self::Preprocessing => write!(f, "Smoothing frames"),
            Self::Stitching => write!(f, "Stitching"),
            Self::Writing => write!(f, "Writing output"),
            Self::Projecting => write!(f, "Writing equirectangular copy"),
        }
    }
}

/// What a finished pipeline run produced.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub composite_path: PathBuf,
    pub equirect_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Frames that reached the stitcher.
    pub frames_used: usize,
    /// Frames dropped by the normalize and smoothing stages.
    pub skipped: Vec<SkippedItem>,
    pub attempts: Vec<AttemptRecord>,
    pub used_fallback: bool,
    /// Present when the run sampled a video first.
    pub sampled: Option<SampleReport>,
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage, if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` work items of the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Progress reporter that ignores everything.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
