#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{imageops, Rgb, RgbImage};
use panorama_core::io::ser::SER_HEADER_SIZE;
use panorama_core::io::write_image;
use panorama_core::stitch::{StitchEngine, StitchParams, StitchResult, StitchStatus};

/// Build a SER file header with configurable bit depth and color mode.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 100=RGB, 101=BGR
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 means little-endian data
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, instrument, telescope (40 bytes each)
    let mut observer = [0u8; 40];
    observer[..4].copy_from_slice(b"test");
    buf.extend_from_slice(&observer);
    buf.extend_from_slice(&[0u8; 40]);
    buf.extend_from_slice(&[0u8; 40]);
    // DateTime, DateTimeUTC
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Synthetic mono 8-bit SER file with the given frame data.
pub fn build_ser_with_frames(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_ser_header_full(width, height, 8, frames.len(), 0);
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Mono frames whose every pixel equals the frame index times 10.
pub fn numbered_mono_frames(width: u32, height: u32, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| vec![(i * 10) as u8; (width * height) as usize])
        .collect()
}

/// Write a SER buffer to a temporary `.ser` file. The file lives as long as
/// the returned handle.
pub fn write_test_ser(data: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".ser")
        .tempfile()
        .expect("create temp file");
    f.write_all(data).expect("write SER data");
    f.flush().expect("flush");
    f
}

fn lcg(state: &mut u64) -> f32 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((*state >> 33) as f32) / (1u64 << 31) as f32
}

/// Deterministic value-noise scene: random values on a coarse grid,
/// bilinearly interpolated, plus a finer noise octave.
pub fn world_texture(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut state = seed;
    let octave = |cell: u32, state: &mut u64| {
        let gw = width / cell + 2;
        let gh = height / cell + 2;
        let grid: Vec<f32> = (0..gw * gh).map(|_| lcg(state)).collect();
        move |x: u32, y: u32| {
            let fx = x as f32 / cell as f32;
            let fy = y as f32 / cell as f32;
            let (x0, y0) = (fx.floor() as u32, fy.floor() as u32);
            let (tx, ty) = (fx - x0 as f32, fy - y0 as f32);
            let at = |gx: u32, gy: u32| grid[(gy * gw + gx) as usize];
            at(x0, y0) * (1.0 - tx) * (1.0 - ty)
                + at(x0 + 1, y0) * tx * (1.0 - ty)
                + at(x0, y0 + 1) * (1.0 - tx) * ty
                + at(x0 + 1, y0 + 1) * tx * ty
        }
    };
    let coarse = octave(12, &mut state);
    let fine = octave(4, &mut state);

    RgbImage::from_fn(width, height, |x, y| {
        let v = 0.65 * coarse(x, y) + 0.35 * fine(x, y);
        let r = (v * 255.0) as u8;
        let g = ((1.0 - v) * 200.0 + 30.0) as u8;
        let b = ((v * 0.5 + 0.25) * 255.0) as u8;
        Rgb([r, g, b])
    })
}

/// Horizontal crops of `world` of the given width at each x offset.
pub fn pan_frames(world: &RgbImage, width: u32, offsets: &[u32]) -> Vec<RgbImage> {
    offsets
        .iter()
        .map(|&x| imageops::crop_imm(world, x, 0, width, world.height()).to_image())
        .collect()
}

/// A small image filled with one value, used to track frame identity
/// through mock stitching.
pub fn tagged_image(tag: u8, width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([tag, tag, tag]))
}

/// Write `images` as numbered PNG frames into `dir` and return the paths.
pub fn write_frames(dir: &Path, images: &[RgbImage]) -> Vec<PathBuf> {
    std::fs::create_dir_all(dir).expect("create frames dir");
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let path = dir.join(format!("{i:05}.png"));
            write_image(&path, image).expect("write frame");
            path
        })
        .collect()
}

/// Place images side by side, top-aligned.
pub fn hconcat(images: &[RgbImage]) -> RgbImage {
    let width = images.iter().map(|i| i.width()).sum();
    let height = images.iter().map(|i| i.height()).max().unwrap_or(0);
    let mut out = RgbImage::new(width, height);
    let mut x = 0i64;
    for image in images {
        imageops::replace(&mut out, image, x, 0);
        x += image.width() as i64;
    }
    out
}

type Rule = dyn Fn(&[RgbImage]) -> StitchStatus + Send + Sync;

/// Engine double: records the first-pixel tag of every input image per
/// call and answers with `rule`. Successful calls return the inputs
/// concatenated left to right.
pub struct RecordingEngine {
    rule: Box<Rule>,
    calls: Mutex<Vec<Vec<u8>>>,
}

impl RecordingEngine {
    pub fn new(rule: impl Fn(&[RgbImage]) -> StitchStatus + Send + Sync + 'static) -> Self {
        Self {
            rule: Box::new(rule),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(status: StitchStatus) -> Self {
        Self::new(move |_| status)
    }

    pub fn calls(&self) -> Vec<Vec<u8>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl StitchEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn stitch(&self, images: &[RgbImage], _params: &StitchParams) -> StitchResult {
        let tags = images.iter().map(|i| i.get_pixel(0, 0).0[0]).collect();
        self.calls.lock().unwrap().push(tags);
        match (self.rule)(images) {
            StitchStatus::Success => StitchResult::success(hconcat(images)),
            status => StitchResult::failed(status),
        }
    }
}
