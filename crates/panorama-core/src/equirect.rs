use image::{imageops, RgbImage};
use tracing::warn;

/// Vertical padding that brings an image to a 2:1 width:height ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EquirectPadding {
    pub top: u32,
    pub bottom: u32,
}

/// Padding needed for `width x height`, or `None` when the image is already
/// at least as tall as 2:1 allows. Odd remainders go to the bottom.
pub fn equirect_padding(width: u32, height: u32) -> Option<EquirectPadding> {
    let target = width / 2;
    if target <= height {
        return None;
    }
    let total = target - height;
    let top = total / 2;
    Some(EquirectPadding {
        top,
        bottom: total - top,
    })
}

/// Pad a panorama with black bands above and below so it can be shown as
/// an equirectangular image. Images that are already tall enough are
/// returned unchanged.
pub fn pad_to_equirect(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let Some(padding) = equirect_padding(width, height) else {
        warn!(width, height, "Image is already 2:1 or taller, not padding");
        return image.clone();
    };

    let mut canvas = RgbImage::new(width, height + padding.top + padding.bottom);
    imageops::replace(&mut canvas, image, 0, padding.top as i64);
    canvas
}
