use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use panorama_core::equirect::pad_to_equirect;
use panorama_core::io::{read_image, write_image};

#[derive(Args)]
pub struct EquirectArgs {
    /// Input panorama
    pub input: PathBuf,

    /// Output file path
    #[arg(short, long, default_value = "panorama_equirect.jpg")]
    pub output: PathBuf,
}

pub fn run(args: &EquirectArgs) -> Result<()> {
    let image = read_image(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let padded = pad_to_equirect(&image);
    write_image(&args.output, &padded)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "{}x{} -> {}x{}, saved to {}",
        image.width(),
        image.height(),
        padded.width(),
        padded.height(),
        args.output.display()
    );
    Ok(())
}
