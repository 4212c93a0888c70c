//! Panorama stitching. [`StitchEngine`] is the capability seam;
//! [`PanoramaStitcher`] drives an engine with the grouped fallback.

mod composite;
pub mod engine;
pub mod fallback;
mod phase;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_REGISTRATION_RESOLUTION,
    DEFAULT_SEAM_ESTIMATION_RESOLUTION,
};

pub use engine::PhaseCorrelationEngine;
pub use fallback::{
    plan_groups, AttemptRecord, AttemptScope, FallbackConfig, Group, PanoramaStitcher,
    StitchOutcome,
};

/// Outcome code of a single stitch attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StitchStatus {
    Success,
    InsufficientFeatures,
    HomographyFailed,
    CameraAdjustFailed,
    InsufficientInput,
}

impl StitchStatus {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl std::fmt::Display for StitchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::InsufficientFeatures => write!(f, "Not enough features found in images"),
            Self::HomographyFailed => write!(f, "Homography estimation failed"),
            Self::CameraAdjustFailed => write!(f, "Camera parameters adjustment failed"),
            Self::InsufficientInput => write!(f, "Need at least 2 images"),
        }
    }
}

/// Result of one stitch attempt. `composite` is set exactly when the status
/// is `Success`.
#[derive(Clone, Debug)]
pub struct StitchResult {
    pub status: StitchStatus,
    pub composite: Option<RgbImage>,
}

impl StitchResult {
    pub fn success(composite: RgbImage) -> Self {
        Self {
            status: StitchStatus::Success,
            composite: Some(composite),
        }
    }

    pub fn failed(status: StitchStatus) -> Self {
        Self {
            status,
            composite: None,
        }
    }
}

/// Resolution of the final blend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CompositingResolution {
    /// Blend at full input resolution.
    #[default]
    Original,
    /// Blend at roughly this many megapixels per frame.
    Megapixels(f64),
}

impl std::fmt::Display for CompositingResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Original => write!(f, "Original"),
            Self::Megapixels(m) => write!(f, "{m} Mpx"),
        }
    }
}

/// Tuning handed to the stitch engine on every attempt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StitchParams {
    /// Minimum pairwise match confidence to accept a pairing.
    pub confidence_threshold: f64,
    /// Working resolution for registration, in megapixels.
    pub registration_resolution: f64,
    /// Working resolution for seam estimation, in megapixels.
    pub seam_estimation_resolution: f64,
    pub compositing_resolution: CompositingResolution,
}

impl Default for StitchParams {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            registration_resolution: DEFAULT_REGISTRATION_RESOLUTION,
            seam_estimation_resolution: DEFAULT_SEAM_ESTIMATION_RESOLUTION,
            compositing_resolution: CompositingResolution::Original,
        }
    }
}

/// A stitching capability: turns an ordered list of overlapping images into
/// one composite, or reports why it could not.
///
/// Each call is a blocking, self-contained operation. Implementations may
/// parallelize internally but must not keep state between calls.
pub trait StitchEngine: Send + Sync {
    fn name(&self) -> &str;

    fn stitch(&self, images: &[RgbImage], params: &StitchParams) -> StitchResult;
}
