pub mod batch;
pub mod consts;
pub mod equirect;
pub mod error;
pub mod frame;
pub mod io;
pub mod normalize;
pub mod pipeline;
pub mod preprocess;
pub mod sampler;
pub mod stitch;
