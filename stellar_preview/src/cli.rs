use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Headless host that plays a scroll script through the stellar scene engine",
    version
)]
pub struct Args {
    /// Scene description JSON (defaults to the built-in nebula-to-dyson object)
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// Write the active scene description as JSON before playing
    #[arg(long)]
    pub dump_scene: Option<PathBuf>,

    /// JSON array of scroll samples, one per frame (progress numbers,
    /// `null` gaps, or `{"scroll_top": .., "viewport_height": ..}` objects)
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Number of frames for the default 0 -> 1 sweep when no script is given
    #[arg(long, default_value_t = 240)]
    pub frames: usize,

    /// Simulated display refresh rate
    #[arg(long, default_value_t = 60.0)]
    pub fps: f32,

    /// Viewport width in pixels (drives the camera aspect ratio)
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Follow scroll input directly instead of easing towards it
    #[arg(long)]
    pub no_damping: bool,

    /// Path to write every frame snapshot as JSON
    #[arg(long)]
    pub snapshots_json: Option<PathBuf>,

    /// Path to write the final packed instance buffer
    #[arg(long)]
    pub instances_bin: Option<PathBuf>,

    /// Path to write the generated nebula/disk particle fields as JSON
    #[arg(long)]
    pub particles_json: Option<PathBuf>,

    /// Seed for particle generation
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Print every frame instead of only stage changes
    #[arg(long)]
    pub verbose: bool,
}

pub fn parse() -> Result<Args> {
    let args = Args::parse();
    args.validate()?;
    Ok(args)
}

impl Args {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.fps.is_finite() && self.fps > 0.0,
            "--fps must be positive (got {})",
            self.fps
        );
        ensure!(
            self.width > 0 && self.height > 0,
            "viewport must be non-empty (got {}x{})",
            self.width,
            self.height
        );
        ensure!(
            self.script.is_some() || self.frames > 0,
            "--frames must be at least 1 when no --script is given"
        );
        Ok(())
    }
}
