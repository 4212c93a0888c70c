use image::RgbImage;
use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{
    MIN_FEATURE_STDDEV, MIN_OVERLAP_FRACTION, MIN_STITCH_IMAGES, PAN_REVERSAL_TOLERANCE,
};

use super::composite::{blend, luminance_plane, rescale, scale_for, std_dev, Placement};
use super::phase::correlate;
use super::{CompositingResolution, StitchEngine, StitchParams, StitchResult, StitchStatus};

/// Number of correlation peaks tried per frame pair.
const CANDIDATE_PEAKS: usize = 4;

/// Canvas larger than this many pixels is treated as a failed adjustment.
const MAX_CANVAS_PIXELS: u64 = 1 << 28;

/// Translation-only stitcher for handheld pans.
///
/// Neighbouring frames are registered by FFT phase correlation at the
/// registration resolution. Every correlation peak yields placement
/// candidates (the surface wraps, so each peak is ambiguous by one period);
/// the candidate with the best normalized cross-correlation over its
/// overlap wins and must clear the confidence threshold. Frames are then
/// chained, checked for a consistent panning direction, and blended with
/// feathered seams.
#[derive(Clone, Debug, Default)]
pub struct PhaseCorrelationEngine;

impl PhaseCorrelationEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Placement of one frame's origin relative to its predecessor, in
/// registration pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Step {
    x: f64,
    y: f64,
}

impl StitchEngine for PhaseCorrelationEngine {
    fn name(&self) -> &str {
        "phase-correlation"
    }

    fn stitch(&self, images: &[RgbImage], params: &StitchParams) -> StitchResult {
        if images.len() < MIN_STITCH_IMAGES {
            return StitchResult::failed(StitchStatus::InsufficientInput);
        }

        let max_area = images
            .iter()
            .map(|i| i.width() as u64 * i.height() as u64)
            .max()
            .unwrap_or(0);
        let work_scale = scale_for(params.registration_resolution, max_area);

        let planes: Vec<Array2<f32>> = images
            .par_iter()
            .map(|image| luminance_plane(image, work_scale))
            .collect();

        if let Some(flat) = planes.iter().position(|p| std_dev(p) < MIN_FEATURE_STDDEV) {
            debug!(image = flat, "Featureless image");
            return StitchResult::failed(StitchStatus::InsufficientFeatures);
        }

        let steps: Vec<Step> = match planes
            .par_windows(2)
            .map(|pair| register_pair(&pair[0], &pair[1], params.confidence_threshold))
            .collect::<Result<Vec<_>, StitchStatus>>()
        {
            Ok(steps) => steps,
            Err(status) => return StitchResult::failed(status),
        };

        if let Err(status) = check_pan_direction(&steps, &planes) {
            return StitchResult::failed(status);
        }

        let compose_scale = match params.compositing_resolution {
            CompositingResolution::Original => 1.0,
            CompositingResolution::Megapixels(m) => scale_for(m, max_area),
        };
        let seam_scale = scale_for(params.seam_estimation_resolution, max_area) / compose_scale;
        let to_compose = compose_scale / work_scale;

        let composed: Vec<RgbImage> = images
            .par_iter()
            .map(|image| rescale(image, compose_scale))
            .collect();

        let mut origins = Vec::with_capacity(composed.len());
        let (mut x, mut y) = (0.0f64, 0.0f64);
        origins.push((x, y));
        for step in &steps {
            x += step.x * to_compose;
            y += step.y * to_compose;
            origins.push((x, y));
        }

        let min_x = origins.iter().map(|o| o.0).fold(f64::INFINITY, f64::min);
        let min_y = origins.iter().map(|o| o.1).fold(f64::INFINITY, f64::min);
        let placements: Vec<Placement<'_>> = composed
            .iter()
            .zip(&origins)
            .map(|(image, &(ox, oy))| Placement {
                image,
                x: (ox - min_x).round() as usize,
                y: (oy - min_y).round() as usize,
            })
            .collect();

        let width = placements
            .iter()
            .map(|p| p.x + p.image.width() as usize)
            .max()
            .unwrap_or(0);
        let height = placements
            .iter()
            .map(|p| p.y + p.image.height() as usize)
            .max()
            .unwrap_or(0);
        if width == 0 || height == 0 || width as u64 * height as u64 > MAX_CANVAS_PIXELS {
            debug!(width, height, "Canvas out of bounds");
            return StitchResult::failed(StitchStatus::CameraAdjustFailed);
        }

        debug!(
            images = images.len(),
            width,
            height,
            work_scale,
            compose_scale,
            "Blending composite"
        );
        StitchResult::success(blend(&placements, width, height, seam_scale.min(1.0)))
    }
}

/// Register `target` against `reference`, returning where the target's
/// origin sits in reference coordinates.
fn register_pair(
    reference: &Array2<f32>,
    target: &Array2<f32>,
    confidence_threshold: f64,
) -> Result<Step, StitchStatus> {
    let (peaks, (h, w)) = correlate(reference, target, CANDIDATE_PEAKS);
    let (h, w) = (h as i64, w as i64);

    // Ranked by NCC, then by correlation peak height.
    let mut best: Option<(f64, f64, Step)> = None;
    for peak in &peaks {
        // target(p) = reference(p - d): the target origin sits at -d.
        for py in [-peak.dy, -peak.dy + h, -peak.dy - h] {
            for px in [-peak.dx, -peak.dx + w, -peak.dx - w] {
                let Some(score) = overlap_ncc(reference, target, px, py) else {
                    continue;
                };
                let better = best.map_or(true, |(s, v, _)| {
                    score > s || (score == s && peak.value > v)
                });
                if better {
                    best = Some((
                        score,
                        peak.value,
                        Step {
                            x: px as f64,
                            y: py as f64,
                        },
                    ));
                }
            }
        }
    }

    match best {
        None => Err(StitchStatus::HomographyFailed),
        Some((score, _, _)) if score < confidence_threshold => {
            debug!(score, confidence_threshold, "Pair below confidence threshold");
            Err(StitchStatus::InsufficientFeatures)
        }
        Some((_, _, step)) => Ok(step),
    }
}

/// Normalized cross-correlation of the region where `target`, placed at
/// `(px, py)` in reference coordinates, overlaps `reference`. `None` when
/// the overlap is smaller than the minimum fraction of the smaller plane.
fn overlap_ncc(reference: &Array2<f32>, target: &Array2<f32>, px: i64, py: i64) -> Option<f64> {
    let (rh, rw) = reference.dim();
    let (th, tw) = target.dim();

    let x0 = px.max(0);
    let y0 = py.max(0);
    let x1 = (px + tw as i64).min(rw as i64);
    let y1 = (py + th as i64).min(rh as i64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let area = ((x1 - x0) * (y1 - y0)) as f64;
    let smaller = (rh * rw).min(th * tw) as f64;
    if area < MIN_OVERLAP_FRACTION * smaller {
        return None;
    }

    let (mut sa, mut sb, mut saa, mut sbb, mut sab) = (0.0f64, 0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for y in y0..y1 {
        for x in x0..x1 {
            let a = reference[[y as usize, x as usize]] as f64;
            let b = target[[(y - py) as usize, (x - px) as usize]] as f64;
            sa += a;
            sb += b;
            saa += a * a;
            sbb += b * b;
            sab += a * b;
        }
    }

    let cov = sab - sa * sb / area;
    let var_a = saa - sa * sa / area;
    let var_b = sbb - sb * sb / area;
    let denom = (var_a * var_b).sqrt();
    if denom <= f64::EPSILON {
        return Some(0.0);
    }
    Some(cov / denom)
}

/// The chained steps must keep moving the same way along the dominant
/// panning axis; a step backwards means the frames are out of order.
fn check_pan_direction(steps: &[Step], planes: &[Array2<f32>]) -> Result<(), StitchStatus> {
    let total_x: f64 = steps.iter().map(|s| s.x).sum();
    let total_y: f64 = steps.iter().map(|s| s.y).sum();
    let horizontal = total_x.abs() >= total_y.abs();
    let direction = if horizontal { total_x.signum() } else { total_y.signum() };
    if direction == 0.0 {
        return Ok(());
    }

    for (i, step) in steps.iter().enumerate() {
        let (h, w) = planes[i].dim();
        let (along, extent) = if horizontal {
            (step.x, w as f64)
        } else {
            (step.y, h as f64)
        };
        if along * direction < -PAN_REVERSAL_TOLERANCE * extent {
            debug!(pair = i, along, "Pan direction reversed");
            return Err(StitchStatus::CameraAdjustFailed);
        }
    }
    Ok(())
}
