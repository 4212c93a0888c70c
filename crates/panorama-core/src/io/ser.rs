use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use image::{Rgb, RgbImage};
use memmap2::Mmap;

use crate::error::{PanoramaError, Result};
use crate::frame::{ColorMode, SourceInfo};

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// SER video header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
    pub date_time: u64,
    pub date_time_utc: u64,
}

impl SerHeader {
    /// Bytes per sample (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Number of planes per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            100 | 101 => 3,
            _ => 1,
        }
    }

    /// Total bytes per frame. Overflow is rejected when the header is parsed.
    pub fn frame_byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_sample() * self.planes_per_pixel()
    }

    pub fn color_mode(&self) -> ColorMode {
        match self.color_id {
            0 => ColorMode::Mono,
            8 => ColorMode::BayerRGGB,
            9 => ColorMode::BayerGRBG,
            10 => ColorMode::BayerGBRG,
            11 => ColorMode::BayerBGGR,
            100 => ColorMode::RGB,
            101 => ColorMode::BGR,
            _ => ColorMode::Mono,
        }
    }
}

/// Memory-mapped SER video reader.
pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(PanoramaError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(PanoramaError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;

        let expected_data_size =
            SER_HEADER_SIZE + header.frame_byte_size() * header.frame_count as usize;
        if mmap.len() < expected_data_size {
            return Err(PanoramaError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(PanoramaError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        let offset = SER_HEADER_SIZE + index * self.header.frame_byte_size();
        let end = offset + self.header.frame_byte_size();
        Ok(&self.mmap[offset..end])
    }

    /// Read a single frame as 8-bit RGB.
    ///
    /// Mono and Bayer data are replicated across the three channels (no
    /// demosaicing); 16-bit samples are scaled down to 8 bits.
    pub fn read_frame(&self, index: usize) -> Result<RgbImage> {
        let raw = self.frame_raw(index)?;
        let h = self.header.height;
        let w = self.header.width;
        let planes = self.header.planes_per_pixel();
        let channel_order = match self.header.color_mode() {
            ColorMode::BGR => [2, 1, 0],
            _ => [0, 1, 2],
        };

        let mut image = RgbImage::new(w, h);
        for row in 0..h as usize {
            for col in 0..w as usize {
                let pixel_index = row * w as usize + col;
                let rgb = if planes == 1 {
                    let v = self.sample(raw, pixel_index);
                    [v, v, v]
                } else {
                    let base = pixel_index * planes;
                    [
                        self.sample(raw, base + channel_order[0]),
                        self.sample(raw, base + channel_order[1]),
                        self.sample(raw, base + channel_order[2]),
                    ]
                };
                image.put_pixel(col as u32, row as u32, Rgb(rgb));
            }
        }
        Ok(image)
    }

    /// Decode the `sample_index`-th sample of a frame to 8 bits.
    fn sample(&self, raw: &[u8], sample_index: usize) -> u8 {
        let bps = self.header.bytes_per_sample();
        let idx = sample_index * bps;
        if bps == 1 {
            return raw[idx];
        }
        let pair = [raw[idx], raw[idx + 1]];
        let val = if self.header.little_endian {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        };
        let max_val = ((1u32 << self.header.pixel_depth.min(16)) - 1) as f32;
        ((val as f32 / max_val).clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Build SourceInfo from the header.
    pub fn source_info(&self, path: &Path) -> SourceInfo {
        SourceInfo {
            filename: path.to_path_buf(),
            total_frames: self.frame_count(),
            width: self.header.width,
            height: self.header.height,
            bit_depth: self.header.pixel_depth as u8,
            color_mode: self.header.color_mode(),
            observer: non_empty(&self.header.observer),
            instrument: non_empty(&self.header.instrument),
        }
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()? as u32;
    let height = cursor.read_i32::<LittleEndian>()? as u32;
    let pixel_depth = cursor.read_i32::<LittleEndian>()? as u32;
    let frame_count = cursor.read_i32::<LittleEndian>()? as u32;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    let mut cursor = std::io::Cursor::new(&buf[162..]);
    let date_time = cursor.read_u64::<LittleEndian>()?;
    let date_time_utc = cursor.read_u64::<LittleEndian>()?;

    if width == 0 || height == 0 {
        return Err(PanoramaError::InvalidDimensions { width, height });
    }
    if pixel_depth == 0 || pixel_depth > 16 {
        return Err(PanoramaError::InvalidSer(format!(
            "Unsupported pixel depth {pixel_depth}"
        )));
    }

    // LittleEndian = 0 is written by most capture tools for little-endian
    // data, so only an explicit 1 selects big-endian.
    let little_endian = le_flag != 1;

    let header = SerHeader {
        color_id,
        little_endian,
        width,
        height,
        pixel_depth,
        frame_count,
        observer,
        instrument,
        telescope,
        date_time,
        date_time_utc,
    };

    (width as usize)
        .checked_mul(height as usize)
        .and_then(|p| p.checked_mul(header.bytes_per_sample() * header.planes_per_pixel()))
        .and_then(|f| f.checked_mul(frame_count as usize))
        .ok_or_else(|| PanoramaError::InvalidSer("Frame size calculation overflow".into()))?;

    Ok(header)
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}
