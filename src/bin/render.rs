//! Headless render: step a field on the CPU and save a top-down PNG.

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use rdtype::{render_image, AppConfig, Preset, Session, TextInput, DEFAULT_GRID};

#[derive(Parser, Debug)]
#[command(name = "rdtype-render", version, about = "Render a reaction-diffusion text still to PNG")]
struct Args {
    /// Seed text. `\n` starts a new line.
    #[arg(long, default_value = "")]
    text: String,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames to simulate before capturing
    #[arg(long, default_value_t = 200)]
    frames: u32,

    /// Cells per side of the simulation grid
    #[arg(long, default_value_t = DEFAULT_GRID)]
    grid: usize,

    /// Output image side length in pixels
    #[arg(long, default_value_t = 600)]
    size: u32,

    /// Feed/kill preset
    #[arg(long)]
    preset: Option<Preset>,

    /// Output PNG path
    #[arg(long)]
    out: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(preset) = &args.preset {
        config = config.with_preset(preset);
    }

    let text = args.text.replace("\\n", "\n");
    let mut input = TextInput::new();
    if !input.set(&text) {
        return Err(format!("text is longer than {} characters", input.max_chars()).into());
    }

    let mut session = Session::new(args.grid, args.grid, config.text_style())?;
    session.set_text(input.text());

    let params = config.simulation_params();
    let start = Instant::now();
    let mut cell_updates = 0u64;
    for _ in 0..args.frames {
        cell_updates += session.advance_frame(&params).cell_updates;
    }
    info!(
        "Simulated {} frames ({} cell updates) in {:.2?}",
        args.frames,
        cell_updates,
        start.elapsed()
    );

    let image = render_image(session.instance().field(), &config.surface_style(), args.size);
    image.save(&args.out)?;
    info!("Wrote {}", args.out.display());
    Ok(())
}
