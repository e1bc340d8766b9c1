mod context;
mod headful;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use maze_replay::{PlayerConfig, RgbaBufferSurface, SurfaceSize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::context::AppContext;

#[derive(Debug, Parser)]
#[command(name = "maze_viewer")]
#[command(about = "Replays recorded maze generation and solving logs")]
struct Cli {
    /// JSON player config; `MAZE_REPLAY_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open a window and replay the log.
    Play {
        log: PathBuf,
        #[arg(long)]
        delay: Option<u64>,
        #[arg(long, default_value_t = false)]
        turbo: bool,
    },
    /// Render every frame of the log into an animated GIF without opening a window.
    Export {
        log: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        delay: Option<u64>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PlayerConfig> {
    let config = match path {
        Some(path) => PlayerConfig::load_json_file(path)
            .with_context(|| format!("failed loading player config {}", path.display()))?,
        None => PlayerConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn cmd_export(mut config: PlayerConfig, log: &Path, out: Option<PathBuf>, delay: Option<u64>) -> Result<()> {
    if let Some(out) = out {
        config.output_dir = out;
    }
    if let Some(delay) = delay {
        config.delay_ms = delay;
    }

    let mut ctx = AppContext::new(config, RgbaBufferSurface::new(SurfaceSize::new(1, 1)));
    ctx.load(log)?;
    ctx.player_mut().export_all()?;
    let path = ctx
        .player_mut()
        .wait_for_export()
        .ok_or_else(|| match ctx.status().latest() {
            Some(status) if status.is_error() => anyhow!(status.to_string()),
            _ => anyhow!("export did not produce a file"),
        })?;
    println!("{}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    info!(?config, "maze_viewer starting");

    match cli.command {
        Commands::Play { log, delay, turbo } => {
            if let Some(delay) = delay {
                config.delay_ms = delay;
            }
            config.turbo |= turbo;
            headful::run(config, &log)
        }
        Commands::Export { log, out, delay } => cmd_export(config, &log, out, delay),
    }
}
