use std::path::PathBuf;

use image::RgbImage;

use crate::consts::COLOR_CHANNEL_COUNT;

/// A single captured frame.
/// Pixels are 8-bit RGB, row-major.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Ordinal position in capture order.
    pub index: usize,
    /// Stable identifier, usually the file name the frame was read from.
    pub source_id: String,
    pub pixels: RgbImage,
}

impl Frame {
    pub fn new(index: usize, source_id: impl Into<String>, pixels: RgbImage) -> Self {
        Self {
            index,
            source_id: source_id.into(),
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn channel_depth(&self) -> usize {
        COLOR_CHANNEL_COUNT
    }

    /// Decoded size in bytes: height x width x channel depth.
    pub fn byte_footprint(&self) -> u64 {
        self.height() as u64 * self.width() as u64 * self.channel_depth() as u64
    }

    pub fn is_landscape(&self) -> bool {
        self.width() > self.height()
    }

    /// Replace the pixel buffer, keeping identity and order.
    pub fn with_pixels(self, pixels: RgbImage) -> Self {
        Self { pixels, ..self }
    }
}

/// Color/Bayer mode of the source data.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ColorMode {
    Mono,
    BayerRGGB,
    BayerGRBG,
    BayerGBRG,
    BayerBGGR,
    RGB,
    BGR,
}

/// Metadata about a video source.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub total_frames: usize,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_mode: ColorMode,
    pub observer: Option<String>,
    pub instrument: Option<String>,
}
