use std::path::PathBuf;

use clap::Parser;
use ray_tracing_lib::{
    application::Application,
    config::{Config, ConfigSource, DEFAULT_CONFIG_PATH},
    logging, snapshot,
    viewport::{ViewportConfig, ViewportLayer},
};
use winit::{dpi::PhysicalSize, window::WindowBuilder};

#[derive(Debug, Parser)]
#[command(name = "ray_tracing", about = "Single sphere CPU ray tracer")]
struct Cli {
    /// Path to the config file; a missing default file is not an error
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Viewport height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Render a single frame to this image file and exit
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "ray_tracing_lib=trace"
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = match &cli.config {
        Some(path) => (Config::load(path)?, ConfigSource::File(path.clone())),
        None => Config::load_or_default(DEFAULT_CONFIG_PATH)?,
    };
    if let Some(width) = cli.width {
        config.window.width = width;
    }
    if let Some(height) = cli.height {
        config.window.height = height;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    logging::init(&config.log_level);
    match &source {
        ConfigSource::File(path) => tracing::info!(path = %path.display(), "config loaded"),
        ConfigSource::Defaults(path) => {
            tracing::info!(path = %path.display(), "no config file, using defaults")
        }
    }

    let controller = config.controller();

    if let Some(path) = cli.snapshot {
        snapshot::render_to_file(
            &controller.snapshot(),
            config.window.width,
            config.window.height,
            &path,
        )?;
        return Ok(());
    }

    let window = WindowBuilder::new()
        .with_title(config.window.title.clone())
        .with_inner_size(PhysicalSize::new(config.window.width, config.window.height));

    pollster::block_on(Application::<ViewportLayer>::init(
        window,
        ViewportConfig {
            title: config.window.title,
            controller,
            snapshot_path: config.controls.snapshot_path,
        },
    ))?;
    Ok(())
}
