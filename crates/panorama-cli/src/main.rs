mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "panorama", about = "Stitch panoramas from video frames")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample frames from a video into a directory
    Extract(commands::extract::ExtractArgs),
    /// Run the full stitching pipeline
    Run(commands::run::RunArgs),
    /// Pad a panorama to a 2:1 equirectangular image
    Equirect(commands::equirect::EquirectArgs),
    /// Show video or frame directory metadata
    Info(commands::info::InfoArgs),
    /// Print or save the default pipeline config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Equirect(args) => commands::equirect::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
