use image::{Rgb, RgbImage};
use panorama_core::equirect::{equirect_padding, pad_to_equirect, EquirectPadding};

#[test]
fn test_padding_splits_remainder_to_bottom() {
    assert_eq!(
        equirect_padding(400, 100),
        Some(EquirectPadding { top: 50, bottom: 50 })
    );
    assert_eq!(
        equirect_padding(401, 97),
        Some(EquirectPadding { top: 51, bottom: 52 })
    );
    assert_eq!(equirect_padding(400, 200), None);
    assert_eq!(equirect_padding(400, 300), None);
}

#[test]
fn test_padded_image_is_two_to_one_and_centered() {
    let image = RgbImage::from_pixel(300, 50, Rgb([200, 100, 50]));
    let padded = pad_to_equirect(&image);

    assert_eq!(padded.dimensions(), (300, 150));
    assert_eq!(padded.get_pixel(10, 0).0, [0, 0, 0]);
    assert_eq!(padded.get_pixel(10, 49).0, [0, 0, 0]);
    assert_eq!(padded.get_pixel(10, 50).0, [200, 100, 50]);
    assert_eq!(padded.get_pixel(10, 99).0, [200, 100, 50]);
    assert_eq!(padded.get_pixel(10, 100).0, [0, 0, 0]);
}

#[test]
fn test_tall_image_is_returned_unchanged() {
    let image = RgbImage::from_pixel(100, 80, Rgb([1, 2, 3]));
    assert_eq!(pad_to_equirect(&image), image);
}
