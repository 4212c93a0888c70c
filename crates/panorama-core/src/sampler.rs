use std::fs;
use std::path::{Path, PathBuf};

use image::imageops;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::error::{PanoramaError, Result};
use crate::io::image_io::{resolve_path, write_image};
use crate::io::source::{open_source, FrameSource};

/// Outcome of a sampling run.
#[derive(Clone, Debug, Default)]
pub struct SampleReport {
    /// Persisted frame files, in capture order.
    pub saved: Vec<PathBuf>,
    /// Frames consumed from the source, sampled or not.
    pub frames_read: usize,
    /// Sampled frames that were rotated from landscape to portrait.
    pub rotated: usize,
}

/// Rotate landscape frames 90 degrees clockwise so every stored frame is
/// portrait. Returns the frame and whether it was rotated.
pub fn normalize_orientation(image: RgbImage) -> (RgbImage, bool) {
    if image.width() > image.height() {
        (imageops::rotate90(&image), true)
    } else {
        (image, false)
    }
}

/// File name for the frame at `index`: zero-padded so lexicographic order
/// equals capture order.
pub fn frame_file_name(index: usize) -> String {
    format!("{index:05}.jpg")
}

/// Remove and recreate `dir`, so repeated runs start from an empty store.
pub fn reset_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
        debug!(dir = %dir.display(), "Removed previous frame store");
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Refuse an output directory that is, or contains, the source: resetting
/// it would delete the frames before they are read.
pub fn check_output_dir(source: &Path, output_dir: &Path) -> Result<()> {
    let source = resolve_path(source);
    let output = resolve_path(output_dir);
    if source.starts_with(&output) {
        return Err(PanoramaError::Config(format!(
            "output directory {} would overwrite the source {}",
            output.display(),
            source.display()
        )));
    }
    Ok(())
}

/// Keep every `interval`-th frame of `source` (indices 0, k, 2k, ...) and
/// persist it to `output_dir` as `{index:05}.jpg`.
///
/// Frames that fail to decode or to save are logged and skipped. Producing
/// no frames at all is fatal.
pub fn sample_frames(
    source: &mut dyn FrameSource,
    output_dir: &Path,
    interval: usize,
) -> Result<SampleReport> {
    if interval == 0 {
        return Err(PanoramaError::Config(
            "sampling interval must be at least 1".into(),
        ));
    }

    info!(
        origin = %source.origin().display(),
        output = %output_dir.display(),
        interval,
        total_frames = ?source.frame_count(),
        "Sampling frames"
    );
    check_output_dir(source.origin(), output_dir)?;
    reset_output_dir(output_dir)?;

    let mut report = SampleReport::default();
    let mut index = 0usize;

    loop {
        if index % interval != 0 {
            if !source.skip_frame() {
                break;
            }
            report.frames_read += 1;
            index += 1;
            continue;
        }

        let Some(next) = source.next_frame() else {
            break;
        };
        report.frames_read += 1;

        match next {
            Ok(image) => {
                let (image, rotated) = normalize_orientation(image);
                if rotated {
                    debug!(index, "Landscape frame rotated to portrait");
                    report.rotated += 1;
                }
                let path = output_dir.join(frame_file_name(index));
                match write_image(&path, &image) {
                    Ok(()) => {
                        debug!(path = %path.display(), "Saved frame");
                        report.saved.push(path);
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "Frame save failed"),
                }
            }
            Err(e) => warn!(index, error = %e, "Frame decode failed, skipping"),
        }
        index += 1;
    }

    if report.saved.is_empty() {
        return Err(PanoramaError::NoFramesProduced {
            origin: source.origin().to_path_buf(),
            frames_read: report.frames_read,
        });
    }

    info!(
        saved = report.saved.len(),
        frames_read = report.frames_read,
        rotated = report.rotated,
        "Sampling complete"
    );
    Ok(report)
}

/// Open `video` and sample it into `output_dir`.
pub fn extract_frames(video: &Path, output_dir: &Path, interval: usize) -> Result<SampleReport> {
    let mut source = open_source(video)?;
    sample_frames(source.as_mut(), output_dir, interval)
}
