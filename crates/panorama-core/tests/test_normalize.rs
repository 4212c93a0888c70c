mod common;

use image::{Rgb, RgbImage};
use panorama_core::consts::{COLOR_CHANNEL_COUNT, OVERSIZED_FOOTPRINT_BYTES};
use panorama_core::io::read_image;
use panorama_core::normalize::{
    byte_footprint, choose_policy, normalize_file, normalize_frames, normalize_image,
    resized_path, shrink_dimensions, ScalePolicy,
};

use common::write_frames;

// 700 x 700 x 3 = 1.47 MB, inside both bounds.
const IN_BOUNDS: (u32, u32) = (700, 700);

#[test]
fn test_in_bounds_image_is_untouched_twice() {
    let image = RgbImage::from_fn(IN_BOUNDS.0, IN_BOUNDS.1, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 7])
    });
    let (once, policy) = normalize_image(image.clone());
    assert_eq!(policy, ScalePolicy::Keep);
    assert_eq!(once, image);
    let (twice, policy) = normalize_image(once);
    assert_eq!(policy, ScalePolicy::Keep);
    assert_eq!(twice, image);
}

#[test]
fn test_undersized_image_is_enlarged_to_four_times_footprint() {
    let image = RgbImage::from_pixel(120, 90, Rgb([50, 60, 70]));
    let before = byte_footprint(120, 90, COLOR_CHANNEL_COUNT);
    let (enlarged, policy) = normalize_image(image);
    assert!(matches!(policy, ScalePolicy::Enlarge { .. }));
    assert_eq!(enlarged.dimensions(), (240, 180));
    let after = byte_footprint(enlarged.width(), enlarged.height(), COLOR_CHANNEL_COUNT);
    assert_eq!(after, 4 * before);
}

#[test]
fn test_boundaries_of_the_policy() {
    // Exactly 1 MiB is still undersized; one row more is not.
    assert!(matches!(choose_policy(1024, 1024, 1), ScalePolicy::Enlarge { .. }));
    assert!(matches!(choose_policy(1024, 342, 3), ScalePolicy::Keep));
    assert!(matches!(choose_policy(512, 512, 4), ScalePolicy::Enlarge { .. }));
    assert!(matches!(choose_policy(4096, 4096, 2), ScalePolicy::Keep));
    assert!(matches!(choose_policy(4096, 4096, 3), ScalePolicy::Shrink { .. }));
}

#[test]
fn test_shrink_terminates_under_bound() {
    for (w, h) in [(4096, 4096), (8000, 6000), (20000, 3000), (60000, 60000)] {
        let (nw, nh, steps) = shrink_dimensions(w, h, COLOR_CHANNEL_COUNT);
        assert!(byte_footprint(nw, nh, COLOR_CHANNEL_COUNT) <= OVERSIZED_FOOTPRINT_BYTES);
        assert!(steps >= 1 && steps < 16, "{w}x{h} took {steps} steps");
        assert!(nw >= 1 && nh >= 1);
    }
}

#[test]
fn test_first_shrink_step_divides_by_sqrt_two() {
    // 4000 x 3000 x 3 = 36 MB; one step is enough.
    let (w, h, steps) = shrink_dimensions(4000, 3000, COLOR_CHANNEL_COUNT);
    assert_eq!(steps, 1);
    assert_eq!((w, h), (2828, 2121));
}

#[test]
fn test_resized_path_keeps_stem_and_extension() {
    let p = resized_path("frames/00030.jpg".as_ref(), "norm".as_ref());
    assert_eq!(p, std::path::Path::new("norm/00030_resized.jpg"));
}

#[test]
fn test_write_back_persists_and_rereads() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_frames(&dir.path().join("frames"), &[common::tagged_image(90, 20, 30)]);
    let norm = dir.path().join("norm");
    std::fs::create_dir_all(&norm).unwrap();

    let frame = normalize_file(0, &paths[0], Some(norm.as_path())).unwrap();
    let written = norm.join("00000_resized.png");
    assert!(written.exists());
    assert_eq!(read_image(&written).unwrap(), frame.pixels);
    assert_eq!((frame.width(), frame.height()), (40, 60));
    assert_eq!(frame.byte_footprint(), 40 * 60 * 3);
    assert!(!frame.is_landscape());
    assert_eq!(frame.source_id, "00000.png");
}

#[test]
fn test_kept_frames_are_not_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let image = RgbImage::from_pixel(IN_BOUNDS.0, IN_BOUNDS.1, Rgb([1, 2, 3]));
    let paths = write_frames(&dir.path().join("frames"), &[image]);
    let norm = dir.path().join("norm");

    let result = normalize_frames(&paths, 2, Some(norm.as_path()), |_| {}).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(std::fs::read_dir(&norm).unwrap().count(), 0);
}

#[test]
fn test_frames_keep_listing_order_and_skip_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    let images: Vec<RgbImage> = (0..6u8)
        .map(|i| common::tagged_image(i * 40, 16 + i as u32 * 4, 12))
        .collect();
    let mut paths = write_frames(&dir.path().join("frames"), &images);
    let bad = dir.path().join("frames").join("00006.jpg");
    std::fs::write(&bad, b"").unwrap();
    paths.push(bad);

    for workers in 1..=paths.len() {
        let result = normalize_frames(&paths, workers, None, |_| {}).unwrap();
        let ids: Vec<&str> = result.items.iter().map(|f| f.source_id.as_str()).collect();
        assert_eq!(
            ids,
            ["00000.png", "00001.png", "00002.png", "00003.png", "00004.png", "00005.png"],
            "workers = {workers}"
        );
        let widths: Vec<u32> = result.items.iter().map(|f| f.width()).collect();
        assert_eq!(widths, [32, 40, 48, 56, 64, 72]);
        let indices: Vec<usize> = result.items.iter().map(|f| f.index).collect();
        assert_eq!(indices, [0, 1, 2, 3, 4, 5]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].source_id, "00006.jpg");
    }
}
