use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use crate::batch::{run_batch, BatchResult};
use crate::consts::{
    COLOR_CHANNEL_COUNT, ENLARGE_FACTOR, OVERSIZED_FOOTPRINT_BYTES, UNDERSIZED_FOOTPRINT_BYTES,
};
use crate::error::Result;
use crate::frame::Frame;
use crate::io::image_io::{read_image, source_id, write_image};

/// Size policy chosen for one frame from its byte footprint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalePolicy {
    /// Footprint at or below 1 MiB: scale both dimensions by `factor`.
    Enlarge { factor: f64 },
    /// Footprint above 32 MiB: resize to the first candidate under the bound.
    Shrink { width: u32, height: u32, steps: u32 },
    /// Already within bounds.
    Keep,
}

/// Decoded size in bytes of a `width x height` image with `channels` planes.
pub fn byte_footprint(width: u32, height: u32, channels: usize) -> u64 {
    height as u64 * width as u64 * channels as u64
}

/// Pick the size policy for an image of the given dimensions.
pub fn choose_policy(width: u32, height: u32, channels: usize) -> ScalePolicy {
    let footprint = byte_footprint(width, height, channels);
    if footprint <= UNDERSIZED_FOOTPRINT_BYTES {
        ScalePolicy::Enlarge {
            factor: ENLARGE_FACTOR,
        }
    } else if footprint > OVERSIZED_FOOTPRINT_BYTES {
        let (width, height, steps) = shrink_dimensions(width, height, channels);
        ScalePolicy::Shrink {
            width,
            height,
            steps,
        }
    } else {
        ScalePolicy::Keep
    }
}

/// Shrink both dimensions by `1/sqrt(i)` for `i = 2, 3, ...` until the
/// footprint fits under the oversize bound. Returns the final dimensions and
/// the number of steps taken.
///
/// Each step divides by at least `sqrt(2)`, so the loop ends after a
/// logarithmic number of steps; dimensions never drop below 1.
pub fn shrink_dimensions(width: u32, height: u32, channels: usize) -> (u32, u32, u32) {
    let mut w = width;
    let mut h = height;
    let mut i = 2u32;
    let mut steps = 0u32;
    while byte_footprint(w, h, channels) > OVERSIZED_FOOTPRINT_BYTES {
        let divisor = (i as f64).sqrt();
        h = ((h as f64 / divisor) as u32).max(1);
        w = ((w as f64 / divisor) as u32).max(1);
        i += 1;
        steps += 1;
    }
    (w, h, steps)
}

/// Apply a policy. `None` means the image is unchanged.
pub fn apply_policy(image: &RgbImage, policy: ScalePolicy) -> Option<RgbImage> {
    match policy {
        ScalePolicy::Enlarge { factor } => {
            let w = (image.width() as f64 * factor).round() as u32;
            let h = (image.height() as f64 * factor).round() as u32;
            Some(imageops::resize(image, w, h, FilterType::CatmullRom))
        }
        ScalePolicy::Shrink { width, height, .. } => {
            Some(imageops::resize(image, width, height, FilterType::Triangle))
        }
        ScalePolicy::Keep => None,
    }
}

/// Bring one decoded image within the size bounds.
pub fn normalize_image(image: RgbImage) -> (RgbImage, ScalePolicy) {
    let policy = choose_policy(image.width(), image.height(), COLOR_CHANNEL_COUNT);
    match apply_policy(&image, policy) {
        Some(resized) => (resized, policy),
        None => (image, policy),
    }
}

/// Where the write-back copy of `source` goes: `<dir>/<stem>_resized.<ext>`.
pub fn resized_path(source: &Path, dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".into());
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jpg".into());
    dir.join(format!("{stem}_resized.{ext}"))
}

/// Decode and normalize the frame file at `path`.
///
/// With `write_back` set, a resized buffer is persisted next to the other
/// normalized frames and re-read, so later stages see exactly what is on
/// disk. Frames kept as-is are never rewritten.
pub fn normalize_file(index: usize, path: &Path, write_back: Option<&Path>) -> Result<Frame> {
    let id = source_id(path);
    let decoded = read_image(path)?;
    let (width, height) = decoded.dimensions();
    let (pixels, policy) = normalize_image(decoded);

    let pixels = match (policy, write_back) {
        (ScalePolicy::Keep, _) | (_, None) => pixels,
        (_, Some(dir)) => {
            let out = resized_path(path, dir);
            write_image(&out, &pixels)?;
            read_image(&out)?
        }
    };

    debug!(
        source_id = %id,
        from = %format!("{width}x{height}"),
        to = %format!("{}x{}", pixels.width(), pixels.height()),
        ?policy,
        "Normalized frame"
    );
    Ok(Frame::new(index, id, pixels))
}

/// Normalize every listed frame file on a pool of `workers` threads.
///
/// Frames come back in the order of `paths`; undecodable files are dropped
/// into `skipped`.
pub fn normalize_frames(
    paths: &[PathBuf],
    workers: usize,
    write_back: Option<&Path>,
    on_progress: impl Fn(usize) + Sync,
) -> Result<BatchResult<Frame>> {
    if let Some(dir) = write_back {
        std::fs::create_dir_all(dir)?;
    }
    let items: Vec<(usize, &PathBuf)> = paths.iter().enumerate().collect();
    run_batch(
        items,
        workers,
        |(_, path)| source_id(path),
        |(index, path)| normalize_file(index, path, write_back),
        on_progress,
    )
}
