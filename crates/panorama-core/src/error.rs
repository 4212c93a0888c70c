use std::path::PathBuf;

use thiserror::Error;

use crate::stitch::StitchStatus;

#[derive(Error, Debug)]
pub enum PanoramaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Cannot open frame source {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("No frames were saved from {} ({frames_read} frames read)", origin.display())]
    NoFramesProduced { origin: PathBuf, frames_read: usize },

    #[error("Cannot decode {source_id}: {reason}")]
    Decode { source_id: String, reason: String },

    #[error("Not enough images for stitching: {available} usable, need at least {required}")]
    InsufficientInput { available: usize, required: usize },

    #[error(
        "Stitching failed for {frames} frames after {attempts} attempt(s), last status: {last_status}. \
         Tips: 1) keep 20-30% overlap between frames 2) check the capture order \
         3) make sure all frames show the same scene 4) try fewer frames"
    )]
    TotalStitchFailure {
        frames: usize,
        attempts: usize,
        last_status: StitchStatus,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PanoramaError>;
