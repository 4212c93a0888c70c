use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::{Array2, Array3};
use rayon::prelude::*;

use crate::consts::{
    COLOR_CHANNEL_COUNT, EPSILON, FEATHER_WEIGHT_FLOOR, LUMINANCE_B, LUMINANCE_G, LUMINANCE_R,
    PARALLEL_PIXEL_THRESHOLD,
};

/// Scale that brings an image of `area` pixels down to about `megapixels`.
/// Never enlarges.
pub(super) fn scale_for(megapixels: f64, area: u64) -> f64 {
    if area == 0 || megapixels <= 0.0 {
        return 1.0;
    }
    (megapixels * 1e6 / area as f64).sqrt().min(1.0)
}

pub(super) fn scaled_dims(width: u32, height: u32, scale: f64) -> (u32, u32) {
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}

pub(super) fn rescale(image: &RgbImage, scale: f64) -> RgbImage {
    if scale >= 1.0 {
        return image.clone();
    }
    let (w, h) = scaled_dims(image.width(), image.height(), scale);
    imageops::resize(image, w, h, FilterType::Triangle)
}

/// Luminance plane in [0, 1] at the given scale.
pub(super) fn luminance_plane(image: &RgbImage, scale: f64) -> Array2<f32> {
    let scaled = rescale(image, scale);
    let (w, h) = scaled.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        let Rgb([r, g, b]) = *scaled.get_pixel(col as u32, row as u32);
        (LUMINANCE_R * r as f32 + LUMINANCE_G * g as f32 + LUMINANCE_B * b as f32) / 255.0
    })
}

pub(super) fn std_dev(plane: &Array2<f32>) -> f64 {
    let n = plane.len();
    if n == 0 {
        return 0.0;
    }
    let mean = plane.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let var = plane.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n as f64;
    var.sqrt()
}

/// Feather mask: distance to the nearest edge, normalized to 1 at the
/// centre of the shorter side.
pub(super) fn seam_mask(width: usize, height: usize) -> Array2<f32> {
    let half = (width.min(height) as f32 / 2.0).max(0.5);
    Array2::from_shape_fn((height, width), |(row, col)| {
        let dx = (col as f32 + 0.5).min(width as f32 - col as f32 - 0.5);
        let dy = (row as f32 + 0.5).min(height as f32 - row as f32 - 0.5);
        (dx.min(dy) / half).min(1.0)
    })
}

pub(super) fn bilinear_sample(data: &Array2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |r: i64, c: i64| -> f32 {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    let v00 = sample(y0, x0);
    let v10 = sample(y0, x1);
    let v01 = sample(y1, x0);
    let v11 = sample(y1, x1);

    v00 * (1.0 - fx) * (1.0 - fy)
        + v10 * fx * (1.0 - fy)
        + v01 * (1.0 - fx) * fy
        + v11 * fx * fy
}

/// An image placed on the canvas at an integer offset.
pub(super) struct Placement<'a> {
    pub image: &'a RgbImage,
    pub x: usize,
    pub y: usize,
}

/// Weighted average of all placements on a `width x height` canvas.
///
/// `seam_scale` is the size of each feather mask relative to its image; the
/// mask is computed at that resolution and sampled bilinearly.
pub(super) fn blend(placements: &[Placement<'_>], width: usize, height: usize, seam_scale: f64) -> RgbImage {
    let mut acc = Array3::<f32>::zeros((height, width, COLOR_CHANNEL_COUNT));
    let mut weights = Array2::<f32>::zeros((height, width));

    for placement in placements {
        let (iw, ih) = placement.image.dimensions();
        let (mw, mh) = scaled_dims(iw, ih, seam_scale);
        let mask = seam_mask(mw as usize, mh as usize);
        let sx = mw as f64 / iw as f64;
        let sy = mh as f64 / ih as f64;

        for (col, row, pixel) in placement.image.enumerate_pixels() {
            let cy = placement.y + row as usize;
            let cx = placement.x + col as usize;
            if cy >= height || cx >= width {
                continue;
            }
            let my = (row as f64 + 0.5) * sy - 0.5;
            let mx = (col as f64 + 0.5) * sx - 0.5;
            let weight = bilinear_sample(&mask, my, mx) + FEATHER_WEIGHT_FLOOR;
            for ch in 0..COLOR_CHANNEL_COUNT {
                acc[[cy, cx, ch]] += pixel.0[ch] as f32 * weight;
            }
            weights[[cy, cx]] += weight;
        }
    }

    let mut raw = vec![0u8; width * height * COLOR_CHANNEL_COUNT];
    let stride = width * COLOR_CHANNEL_COUNT;
    let fill_row = |row: usize, out: &mut [u8]| {
        for col in 0..width {
            let wsum = weights[[row, col]];
            if wsum <= EPSILON {
                continue;
            }
            for ch in 0..COLOR_CHANNEL_COUNT {
                out[col * COLOR_CHANNEL_COUNT + ch] =
                    (acc[[row, col, ch]] / wsum).round().clamp(0.0, 255.0) as u8;
            }
        }
    };
    if width * height >= PARALLEL_PIXEL_THRESHOLD {
        raw.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(row, out)| fill_row(row, out));
    } else {
        for (row, out) in raw.chunks_mut(stride).enumerate() {
            fill_row(row, out);
        }
    }

    RgbImage::from_raw(width as u32, height as u32, raw)
        .unwrap_or_else(|| RgbImage::new(width as u32, height as u32))
}
