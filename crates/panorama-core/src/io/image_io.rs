use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

use crate::consts::{FRAME_EXTENSIONS, JPEG_QUALITY};
use crate::error::{PanoramaError, Result};

/// Choose the output encoding from the file extension. Unknown or missing
/// extensions fall back to JPEG.
pub fn output_format(path: &Path) -> ImageFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => ImageFormat::Png,
        Some("tif" | "tiff") => ImageFormat::Tiff,
        _ => ImageFormat::Jpeg,
    }
}

/// Encode an image into an in-memory buffer.
pub fn encode_image(image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
            image.write_with_encoder(encoder)?;
        }
        other => image.write_to(&mut buf, other)?,
    }
    Ok(buf.into_inner())
}

/// Save an RGB image, choosing format from file extension.
///
/// The image is encoded in memory and written with a single `fs::write`, so
/// the encoder never has to interpret the path. Non-ASCII directory names
/// are handled like any other `OsStr`.
pub fn write_image(path: &Path, image: &RgbImage) -> Result<()> {
    let bytes = encode_image(image, output_format(path))?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Load an image file as 8-bit RGB.
///
/// The file is read into memory first and decoded from the byte buffer with
/// the format sniffed from its contents, not from the path.
pub fn read_image(path: &Path) -> Result<RgbImage> {
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(PanoramaError::Decode {
            source_id: source_id(path),
            reason: "file is empty".into(),
        });
    }
    let decoded = image::load_from_memory(&bytes).map_err(|e| PanoramaError::Decode {
        source_id: source_id(path),
        reason: e.to_string(),
    })?;
    Ok(decoded.to_rgb8())
}

/// Stable identifier for a frame file: its file name.
pub fn source_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            FRAME_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// List the raster frames in a directory, sorted lexicographically by file
/// name. The sort fixes capture order for every later stage.
pub fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PanoramaError::SourceUnreadable {
            path: dir.to_path_buf(),
            reason: "frames directory not found".into(),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_frame_file(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Absolute, symlink-free form of `path`, which need not exist yet: the
/// deepest existing ancestor is canonicalized and the rest appended.
pub fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut tail: Vec<std::ffi::OsString> = Vec::new();
    let mut cursor = absolute.as_path();
    loop {
        if let Ok(canonical) = cursor.canonicalize() {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }
        match (cursor.parent(), cursor.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                cursor = parent;
            }
            _ => return absolute,
        }
    }
}
