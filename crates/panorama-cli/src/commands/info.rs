use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use panorama_core::io::probe_source;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file or frame directory
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let info = probe_source(&args.file)?;

    println!("Source:      {}", info.filename.display());
    println!("Frames:      {}", info.total_frames);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Bit depth:   {}", info.bit_depth);
    println!("Color mode:  {:?}", info.color_mode);

    if let Some(ref obs) = info.observer {
        println!("Observer:    {}", obs);
    }
    if let Some(ref inst) = info.instrument {
        println!("Instrument:  {}", inst);
    }
    if info.width > info.height {
        println!("Orientation: landscape (frames will be rotated when sampled)");
    }

    Ok(())
}
