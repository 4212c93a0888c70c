/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Number of channels in a stored frame (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Frames with a byte footprint at or below this (1 MiB) are enlarged.
pub const UNDERSIZED_FOOTPRINT_BYTES: u64 = 1 << 20;

/// Frames with a byte footprint above this (32 MiB) are shrunk.
pub const OVERSIZED_FOOTPRINT_BYTES: u64 = 1 << 25;

/// Scale factor applied to undersized frames.
pub const ENLARGE_FACTOR: f64 = 2.0;

/// Default number of worker threads for per-frame stages.
pub const DEFAULT_WORKERS: usize = 4;

/// Default sampling interval, in source frames.
pub const DEFAULT_SAMPLING_INTERVAL: usize = 30;

/// Default Gaussian kernel size for the preprocessing blur.
pub const DEFAULT_BLUR_KERNEL_SIZE: usize = 5;

/// Minimum number of images the stitcher accepts.
pub const MIN_STITCH_IMAGES: usize = 2;

/// Default minimum pairwise match confidence.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Default registration working resolution, in megapixels.
pub const DEFAULT_REGISTRATION_RESOLUTION: f64 = 0.6;

/// Default seam estimation resolution, in megapixels.
pub const DEFAULT_SEAM_ESTIMATION_RESOLUTION: f64 = 0.1;

/// Default number of frames per fallback group.
pub const DEFAULT_GROUP_SIZE: usize = 3;

/// Grouped fallback only runs when more than this many items failed to stitch.
pub const DEFAULT_FALLBACK_MIN_ITEMS: usize = 5;

/// JPEG quality used when persisting frames and composites.
pub const JPEG_QUALITY: u8 = 95;

/// Luminance standard deviation below which a plane is considered featureless.
pub const MIN_FEATURE_STDDEV: f64 = 1e-3;

/// Minimum overlap between neighbouring frames, as a fraction of the smaller frame.
pub const MIN_OVERLAP_FRACTION: f64 = 0.05;

/// Backwards step tolerated along the panning axis, as a fraction of the frame extent.
pub const PAN_REVERSAL_TOLERANCE: f64 = 0.02;

/// Floor added to feather weights so single-coverage pixels are never dropped.
pub const FEATHER_WEIGHT_FLOOR: f32 = 1e-3;

/// Extensions accepted when listing a frames directory.
pub const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
