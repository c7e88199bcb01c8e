use std::path::PathBuf;

use clap::Parser;
use log::info;

use rdtype::{AppConfig, Backend, Preset, Viewer, DEFAULT_GRID};

/// Type text and watch it grow into a reaction-diffusion surface.
#[derive(Parser, Debug)]
#[command(name = "rdtype", version, about)]
struct Args {
    /// Initial text. `\n` starts a new line.
    text: Option<String>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to step the field: gpu or cpu
    #[arg(long, default_value_t = Backend::Gpu)]
    backend: Backend,

    /// Cells per side of the simulation grid
    #[arg(long, default_value_t = DEFAULT_GRID)]
    grid: usize,

    /// Feed/kill preset (Coral, Mitosis, Mazes, Chaos, Worms, Spots)
    #[arg(long)]
    preset: Option<Preset>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };
    if let Some(preset) = &args.preset {
        config = config.with_preset(preset);
    }

    let text = args.text.unwrap_or_default().replace("\\n", "\n");

    Viewer::new(config)
        .with_text(text)
        .with_backend(args.backend)
        .with_grid(args.grid)
        .run()?;
    Ok(())
}
