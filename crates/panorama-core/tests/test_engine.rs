mod common;

use image::RgbImage;
use panorama_core::stitch::{
    CompositingResolution, PhaseCorrelationEngine, StitchEngine, StitchParams, StitchStatus,
};

use common::{pan_frames, world_texture};

const FRAME_WIDTH: u32 = 160;

fn panned_scene() -> (RgbImage, Vec<RgbImage>) {
    let world = world_texture(256, 120, 7);
    let frames = pan_frames(&world, FRAME_WIDTH, &[0, 48, 96]);
    (world, frames)
}

#[test]
fn test_stitches_horizontal_pan() {
    let (world, frames) = panned_scene();
    let result = PhaseCorrelationEngine::new().stitch(&frames, &StitchParams::default());

    assert_eq!(result.status, StitchStatus::Success);
    let composite = result.composite.unwrap();
    assert!(
        (254..=258).contains(&composite.width()),
        "width {}",
        composite.width()
    );
    assert!((120..=122).contains(&composite.height()));

    // Blending identical overlaps must reproduce the scene.
    let mut diff = 0u64;
    let mut count = 0u64;
    for y in 10..110 {
        for x in 20..236 {
            let a = composite.get_pixel(x, y).0;
            let b = world.get_pixel(x, y).0;
            for ch in 0..3 {
                diff += (a[ch] as i64 - b[ch] as i64).unsigned_abs();
                count += 1;
            }
        }
    }
    let mean = diff as f64 / count as f64;
    assert!(mean < 3.0, "mean abs diff {mean}");
}

#[test]
fn test_out_of_order_frames_fail_adjustment() {
    let (_, frames) = panned_scene();
    let shuffled = vec![frames[0].clone(), frames[2].clone(), frames[1].clone()];
    let result = PhaseCorrelationEngine::new().stitch(&shuffled, &StitchParams::default());
    assert_eq!(result.status, StitchStatus::CameraAdjustFailed);
    assert!(result.composite.is_none());
}

#[test]
fn test_featureless_frames_are_rejected() {
    let flat = RgbImage::from_pixel(64, 48, image::Rgb([90, 90, 90]));
    let result = PhaseCorrelationEngine::new().stitch(&[flat.clone(), flat], &StitchParams::default());
    assert_eq!(result.status, StitchStatus::InsufficientFeatures);
}

#[test]
fn test_single_image_is_insufficient_input() {
    let (_, frames) = panned_scene();
    let result = PhaseCorrelationEngine::new().stitch(&frames[..1], &StitchParams::default());
    assert_eq!(result.status, StitchStatus::InsufficientInput);
}

#[test]
fn test_compositing_resolution_limits_output() {
    let (_, frames) = panned_scene();
    let params = StitchParams {
        compositing_resolution: CompositingResolution::Megapixels(0.005),
        ..StitchParams::default()
    };
    let result = PhaseCorrelationEngine::new().stitch(&frames, &params);
    assert_eq!(result.status, StitchStatus::Success);
    let composite = result.composite.unwrap();
    assert!(composite.width() < 200, "width {}", composite.width());
    assert!(composite.height() < 120);
}
