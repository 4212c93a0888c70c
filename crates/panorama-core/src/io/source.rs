use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::{PanoramaError, Result};
use crate::frame::{ColorMode, SourceInfo};

use super::image_io::{list_frame_files, read_image};
use super::ser::SerReader;

/// A sequential source of captured frames.
pub trait FrameSource {
    /// Where the frames come from, for logging.
    fn origin(&self) -> &Path;

    /// Total number of frames, if known up front.
    fn frame_count(&self) -> Option<usize>;

    /// Decode the next frame in capture order; `None` once exhausted.
    fn next_frame(&mut self) -> Option<Result<RgbImage>>;

    /// Advance past the next frame without decoding it; `false` once
    /// exhausted.
    fn skip_frame(&mut self) -> bool {
        self.next_frame().is_some()
    }

    /// The underlying SER source, if this is one.
    fn as_ser(&self) -> Option<&SerSource> {
        None
    }
}

/// Frames stored in a SER video container.
pub struct SerSource {
    path: PathBuf,
    reader: SerReader,
    cursor: usize,
}

impl SerSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = SerReader::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            cursor: 0,
        })
    }

    pub fn reader(&self) -> &SerReader {
        &self.reader
    }
}

impl FrameSource for SerSource {
    fn origin(&self) -> &Path {
        &self.path
    }

    fn as_ser(&self) -> Option<&SerSource> {
        Some(self)
    }

    fn frame_count(&self) -> Option<usize> {
        Some(self.reader.frame_count())
    }

    fn next_frame(&mut self) -> Option<Result<RgbImage>> {
        if self.cursor >= self.reader.frame_count() {
            return None;
        }
        let frame = self.reader.read_frame(self.cursor);
        self.cursor += 1;
        Some(frame)
    }

    fn skip_frame(&mut self) -> bool {
        if self.cursor >= self.reader.frame_count() {
            return false;
        }
        self.cursor += 1;
        true
    }
}

/// A directory of still images played back as consecutive frames, in
/// lexicographic file name order.
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let files = list_frame_files(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            cursor: 0,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn origin(&self) -> &Path {
        &self.dir
    }

    fn frame_count(&self) -> Option<usize> {
        Some(self.files.len())
    }

    fn next_frame(&mut self) -> Option<Result<RgbImage>> {
        let path = self.files.get(self.cursor)?;
        self.cursor += 1;
        Some(read_image(path))
    }

    fn skip_frame(&mut self) -> bool {
        if self.cursor >= self.files.len() {
            return false;
        }
        self.cursor += 1;
        true
    }
}

/// Open a frame source by path: directories are image sequences, `.ser`
/// files are SER videos. Anything that cannot be opened is
/// `SourceUnreadable`.
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    let unreadable = |reason: String| PanoramaError::SourceUnreadable {
        path: path.to_path_buf(),
        reason,
    };

    if path.is_dir() {
        let source = ImageSequenceSource::open(path).map_err(|e| unreadable(e.to_string()))?;
        return Ok(Box::new(source));
    }

    let is_ser = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ser"));
    if !is_ser {
        return Err(unreadable("unsupported video container".into()));
    }

    let source = SerSource::open(path).map_err(|e| unreadable(e.to_string()))?;
    Ok(Box::new(source))
}

/// Describe the source at `path` without sampling it. Image sequences
/// report the size of their first frame.
pub fn probe_source(path: &Path) -> Result<SourceInfo> {
    let mut source = open_source(path)?;
    if let Some(ser) = source.as_ser() {
        return Ok(ser.reader().source_info(path));
    }

    let total_frames = source.frame_count().unwrap_or(0);
    let (width, height) = match source.next_frame() {
        Some(frame) => frame?.dimensions(),
        None => (0, 0),
    };
    Ok(SourceInfo {
        filename: path.to_path_buf(),
        total_frames,
        width,
        height,
        bit_depth: 8,
        color_mode: ColorMode::RGB,
        observer: None,
        instrument: None,
    })
}
