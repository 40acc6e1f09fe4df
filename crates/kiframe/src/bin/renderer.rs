//! # KIFRAME Renderer
//!
//! Headless renderer: binds the rendezvous socket, waits for one producer
//! and draws its frames onto a recording surface until the producer shuts
//! down or disconnects.
//!
//! ```bash
//! # Defaults from the built-in configuration
//! kiframe_renderer
//!
//! # Custom config and socket, stop after a minute
//! kiframe_renderer --config kiframe.toml --socket /tmp/kiframe.sock --duration 60
//! ```
//!
//! `KIFRAME_DEBUG`, `KIFRAME_LOG_FRAMES` and `KIFRAME_SOCKET` override the
//! file; `--socket` overrides everything.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use kiframe::rendering::RecordingSurface;
use kiframe::shared::KiframeConfig;
use kiframe::{init_logging, RenderSession};

#[derive(Parser, Debug)]
#[command(
    name = "kiframe_renderer",
    about = "Draw streamed frames onto a bounded primitive pool",
    version
)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rendezvous socket path
    #[arg(short, long)]
    socket: Option<PathBuf>,

    /// Stop after this many seconds even if the producer is still running
    #[arg(short, long)]
    duration: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => KiframeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => KiframeConfig::default(),
    };
    let mut config = config.apply_env();
    if let Some(socket) = args.socket {
        config.transport.socket_path = socket;
    }

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    KIFRAME RENDERER");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("  Socket:   {}", config.transport.socket_path.display());
    println!(
        "  Pools:    {} lines, {} markers, {} labels, {} texts",
        config.pools.line_capacity,
        config.pools.marker_capacity,
        config.pools.label_capacity,
        config.pools.text_capacity
    );
    println!("  Tick:     {}ms", config.render.tick_interval_ms);
    println!();
    println!("Waiting up to {}ms for a producer...", config.transport.accept_timeout_ms);

    let mut session = RenderSession::open(&config, RecordingSurface::new())
        .context("Failed to start render session")?;

    let deadline = args
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    session.run_until(|| deadline.is_some_and(|deadline| Instant::now() >= deadline));

    let summary = session.close();
    println!();
    println!("{summary}");
    println!("  Sustainable:      {:.0} fps", summary.render.sustainable_fps());

    Ok(())
}
