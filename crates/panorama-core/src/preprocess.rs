use image::RgbImage;
use rayon::prelude::*;

use crate::batch::{run_batch, BatchResult};
use crate::consts::{COLOR_CHANNEL_COUNT, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{PanoramaError, Result};
use crate::frame::Frame;

/// Sigma used for a kernel of `size` taps when none is given explicitly,
/// following the usual `0.3 * ((k - 1) * 0.5 - 1) + 0.8` rule.
pub fn default_sigma(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian kernel with `size` taps.
pub fn gaussian_kernel(size: usize) -> Result<Vec<f32>> {
    if size == 0 || size % 2 == 0 {
        return Err(PanoramaError::Config(format!(
            "blur kernel size must be odd and positive, got {size}"
        )));
    }
    let sigma = default_sigma(size);
    let radius = size / 2;
    let s2 = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    Ok(kernel)
}

/// Smooth an RGB image with a separable Gaussian (clamp-to-edge borders).
pub fn gaussian_blur(image: &RgbImage, kernel: &[f32]) -> RgbImage {
    let (w, h) = image.dimensions();
    let (w, h) = (w as usize, h as usize);
    if w == 0 || h == 0 {
        return image.clone();
    }
    let src: Vec<f32> = image.as_raw().iter().map(|&v| v as f32).collect();

    let row_pass = convolve(&src, w, h, kernel, Axis::Horizontal);
    let col_pass = convolve(&row_pass, w, h, kernel, Axis::Vertical);

    let raw: Vec<u8> = col_pass
        .into_iter()
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    RgbImage::from_raw(w as u32, h as u32, raw).unwrap_or_else(|| image.clone())
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn convolve(data: &[f32], w: usize, h: usize, kernel: &[f32], axis: Axis) -> Vec<f32> {
    let radius = kernel.len() / 2;
    let stride = w * COLOR_CHANNEL_COUNT;

    let filter_row = |row: usize, out: &mut [f32]| {
        for col in 0..w {
            for ch in 0..COLOR_CHANNEL_COUNT {
                let mut sum = 0.0f32;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let offset = ki as isize - radius as isize;
                    let (r, c) = match axis {
                        Axis::Horizontal => (row, (col as isize + offset).clamp(0, w as isize - 1) as usize),
                        Axis::Vertical => ((row as isize + offset).clamp(0, h as isize - 1) as usize, col),
                    };
                    sum += data[r * stride + c * COLOR_CHANNEL_COUNT + ch] * kv;
                }
                out[col * COLOR_CHANNEL_COUNT + ch] = sum;
            }
        }
    };

    let mut result = vec![0.0f32; data.len()];
    if w * h >= PARALLEL_PIXEL_THRESHOLD {
        result
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(row, out)| filter_row(row, out));
    } else {
        for (row, out) in result.chunks_mut(stride).enumerate() {
            filter_row(row, out);
        }
    }
    result
}

/// Blur every frame on a pool of `workers` threads, preserving order.
pub fn preprocess_frames(
    frames: Vec<Frame>,
    workers: usize,
    kernel_size: usize,
    on_progress: impl Fn(usize) + Sync,
) -> Result<BatchResult<Frame>> {
    let kernel = gaussian_kernel(kernel_size)?;
    run_batch(
        frames,
        workers,
        |frame| frame.source_id.clone(),
        |frame| {
            let blurred = gaussian_blur(&frame.pixels, &kernel);
            Ok(frame.with_pixels(blurred))
        },
        on_progress,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_tap_sigma_matches_convention() {
        assert!((default_sigma(5) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn even_kernel_is_rejected() {
        assert!(gaussian_kernel(4).is_err());
        assert!(gaussian_kernel(0).is_err());
    }
}
