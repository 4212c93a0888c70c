mod common;

use panorama_core::error::PanoramaError;
use panorama_core::io::{list_frame_files, open_source, read_image};
use panorama_core::sampler::{
    check_output_dir, extract_frames, frame_file_name, normalize_orientation, sample_frames,
};

use common::{build_ser_with_frames, numbered_mono_frames, write_frames, write_test_ser};

#[test]
fn test_frame_file_names_sort_in_capture_order() {
    assert_eq!(frame_file_name(0), "00000.jpg");
    assert_eq!(frame_file_name(30), "00030.jpg");
    assert!(frame_file_name(90) < frame_file_name(120));
}

#[test]
fn test_landscape_frame_is_rotated_to_portrait() {
    let image = image::RgbImage::new(40, 20);
    let (rotated, did_rotate) = normalize_orientation(image);
    assert!(did_rotate);
    assert_eq!(rotated.dimensions(), (20, 40));

    let (kept, did_rotate) = normalize_orientation(image::RgbImage::new(20, 40));
    assert!(!did_rotate);
    assert_eq!(kept.dimensions(), (20, 40));
}

#[test]
fn test_rotation_is_clockwise() {
    let mut image = image::RgbImage::new(40, 20);
    image.put_pixel(0, 0, image::Rgb([255, 0, 0]));

    let (rotated, _) = normalize_orientation(image);

    // Top-left moves to top-right under a clockwise quarter turn.
    assert_eq!(rotated.get_pixel(19, 0).0, [255, 0, 0]);
    assert_eq!(rotated.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(rotated.get_pixel(0, 39).0, [0, 0, 0]);
}

#[test]
fn test_sample_ser_every_interval() {
    let (w, h) = (40, 20);
    let ser = write_test_ser(&build_ser_with_frames(w, h, &numbered_mono_frames(w, h, 7)));
    let out = tempfile::tempdir().unwrap();
    let frames_dir = out.path().join("frames");

    let report = extract_frames(ser.path(), &frames_dir, 3).unwrap();

    assert_eq!(report.frames_read, 7);
    assert_eq!(report.rotated, 3);
    let names: Vec<String> = report
        .saved
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["00000.jpg", "00003.jpg", "00006.jpg"]);

    // Landscape SER frames are stored portrait.
    let first = read_image(&report.saved[0]).unwrap();
    assert!(first.height() > first.width());
    assert_eq!(first.dimensions(), (20, 40));

    // Frame 3 was filled with 30.
    let third = read_image(&report.saved[1]).unwrap();
    let v = third.get_pixel(10, 20).0[0] as i32;
    assert!((v - 30).abs() <= 2, "got {v}");
}

#[test]
fn test_sampling_resets_output_dir() {
    let (w, h) = (16, 16);
    let ser = write_test_ser(&build_ser_with_frames(w, h, &numbered_mono_frames(w, h, 4)));
    let out = tempfile::tempdir().unwrap();
    let frames_dir = out.path().join("frames");
    std::fs::create_dir_all(&frames_dir).unwrap();
    std::fs::write(frames_dir.join("99999.jpg"), b"stale").unwrap();

    let report = extract_frames(ser.path(), &frames_dir, 2).unwrap();

    let listed = list_frame_files(&frames_dir).unwrap();
    assert_eq!(listed, report.saved);
    assert!(!frames_dir.join("99999.jpg").exists());
}

#[test]
fn test_interval_of_one_keeps_every_frame() {
    let (w, h) = (8, 8);
    let ser = write_test_ser(&build_ser_with_frames(w, h, &numbered_mono_frames(w, h, 5)));
    let out = tempfile::tempdir().unwrap();

    let report = extract_frames(ser.path(), out.path(), 1).unwrap();
    assert_eq!(report.saved.len(), 5);
    assert_eq!(report.rotated, 0);
}

#[test]
fn test_zero_interval_is_rejected() {
    let (w, h) = (8, 8);
    let ser = write_test_ser(&build_ser_with_frames(w, h, &numbered_mono_frames(w, h, 2)));
    let out = tempfile::tempdir().unwrap();
    let err = extract_frames(ser.path(), out.path(), 0).unwrap_err();
    assert!(matches!(err, PanoramaError::Config(_)));
}

#[test]
fn test_empty_video_produces_no_frames_error() {
    let ser = write_test_ser(&build_ser_with_frames(8, 8, &[]));
    let out = tempfile::tempdir().unwrap();
    let err = extract_frames(ser.path(), out.path(), 30).unwrap_err();
    match err {
        PanoramaError::NoFramesProduced { frames_read, .. } => assert_eq!(frames_read, 0),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unreadable_sources() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.ser");
    assert!(matches!(
        open_source(&missing).err(),
        Some(PanoramaError::SourceUnreadable { .. })
    ));

    let not_video = dir.path().join("clip.mp4");
    std::fs::write(&not_video, b"not a container we read").unwrap();
    assert!(matches!(
        open_source(&not_video).err(),
        Some(PanoramaError::SourceUnreadable { .. })
    ));

    let bad_ser = dir.path().join("bad.ser");
    std::fs::write(&bad_ser, vec![0u8; 200]).unwrap();
    assert!(matches!(
        open_source(&bad_ser).err(),
        Some(PanoramaError::SourceUnreadable { .. })
    ));
}

#[test]
fn test_image_directory_source() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let images: Vec<_> = (0..4u8).map(|i| common::tagged_image(i * 50, 30, 10)).collect();
    write_frames(&input, &images);

    let mut source = open_source(&input).unwrap();
    assert_eq!(source.frame_count(), Some(4));

    let report = sample_frames(source.as_mut(), &dir.path().join("out"), 2).unwrap();
    assert_eq!(report.frames_read, 4);
    assert_eq!(report.saved.len(), 2);
    assert_eq!(report.rotated, 2);
}

#[test]
fn test_undecodable_frames_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    write_frames(&input, &[common::tagged_image(10, 8, 8)]);
    std::fs::write(input.join("00001.jpg"), b"garbage").unwrap();
    std::fs::copy(input.join("00000.png"), input.join("00002.png")).unwrap();

    let mut source = open_source(&input).unwrap();
    let report = sample_frames(source.as_mut(), &dir.path().join("out"), 1).unwrap();
    assert_eq!(report.frames_read, 3);
    assert_eq!(report.saved.len(), 2);
}

#[test]
fn test_skip_frame_does_not_decode() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    write_frames(&input, &[common::tagged_image(10, 8, 8)]);
    std::fs::write(input.join("00001.jpg"), b"garbage").unwrap();

    let mut source = open_source(&input).unwrap();
    assert!(source.next_frame().unwrap().is_ok());
    assert!(source.skip_frame());
    assert!(source.next_frame().is_none());
    assert!(!source.skip_frame());
}

#[test]
fn test_output_dir_over_source_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let shots = dir.path().join("shots");
    let images: Vec<_> = (0..4u8).map(|i| common::tagged_image(i * 50, 30, 10)).collect();
    write_frames(&shots, &images);

    let err = extract_frames(&shots, &shots, 1).unwrap_err();
    assert!(matches!(err, PanoramaError::Config(_)), "got {err}");
    let err = extract_frames(&shots, dir.path(), 1).unwrap_err();
    assert!(matches!(err, PanoramaError::Config(_)), "got {err}");
    let err = extract_frames(&shots, &shots.join("."), 1).unwrap_err();
    assert!(matches!(err, PanoramaError::Config(_)), "got {err}");

    // The input frames are untouched.
    assert_eq!(list_frame_files(&shots).unwrap().len(), 4);

    // A sibling directory is fine.
    let report = extract_frames(&shots, &dir.path().join("frames"), 1).unwrap();
    assert_eq!(report.saved.len(), 4);
}

#[test]
fn test_video_inside_output_dir_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let frames = dir.path().join("frames");
    std::fs::create_dir_all(&frames).unwrap();
    let video = frames.join("clip.ser");
    std::fs::write(&video, build_ser_with_frames(8, 8, &numbered_mono_frames(8, 8, 2))).unwrap();

    assert!(check_output_dir(&video, &frames).is_err());
    assert!(extract_frames(&video, &frames, 1).is_err());
    assert!(video.exists());

    assert!(check_output_dir(&video, &dir.path().join("frames_out")).is_ok());
}
