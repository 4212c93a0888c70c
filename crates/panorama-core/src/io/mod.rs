pub mod image_io;
pub mod ser;
pub mod source;

pub use image_io::{list_frame_files, read_image, resolve_path, write_image};
pub use source::{open_source, probe_source, FrameSource, ImageSequenceSource, SerSource};
