//! # KIFRAME Simulation Peer
//!
//! Stands in for the simulation process: connects to a running renderer,
//! streams synthetic frames at a fixed rate and logs the key events it
//! gets back. Sends `SHUTDOWN` when done.
//!
//! ```bash
//! kiframe_sim_peer --frames 350 --rate 35
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use kiframe::networking::{NetworkError, SimulationPeer};
use kiframe::shared::config::ENV_SOCKET;
use kiframe::shared::constants::DEFAULT_SOCKET_PATH;
use kiframe::shared::MessageType;
use kiframe::{init_logging, SyntheticScene};

#[derive(Parser, Debug)]
#[command(
    name = "kiframe_sim_peer",
    about = "Stream synthetic frames to a KIFRAME renderer",
    version
)]
struct Args {
    /// Rendezvous socket path
    #[arg(short, long, env = ENV_SOCKET, default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Frames to send before shutting down
    #[arg(short, long, default_value_t = 350)]
    frames: u64,

    /// Frames per second
    #[arg(short, long, default_value_t = 35)]
    rate: u32,

    /// Wall columns per frame
    #[arg(long, default_value_t = 40)]
    walls: usize,

    /// Entities per frame
    #[arg(long, default_value_t = 6)]
    entities: usize,

    /// Projectiles per frame
    #[arg(long, default_value_t = 10)]
    projectiles: usize,

    /// How long to keep retrying the connection, in seconds
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let timeout = Duration::from_secs(args.connect_timeout);
    let mut peer = SimulationPeer::connect(&args.socket, timeout)
        .with_context(|| format!("No renderer at {}", args.socket.display()))?;
    peer.wait_for_init(timeout)
        .context("Renderer never sent INIT_COMPLETE")?;

    let period = Duration::from_secs(1) / args.rate.max(1);
    let scene = SyntheticScene::new(args.walls, args.entities, args.projectiles);
    let started = Instant::now();
    let mut next = started;
    let mut sent = 0u64;
    let mut keys = 0u64;

    println!(
        "Streaming {} frames at {} fps to {}",
        args.frames,
        args.rate,
        args.socket.display()
    );

    'stream: for frame in scene.take(usize::try_from(args.frames).unwrap_or(usize::MAX)) {
        match peer.send_frame(&frame) {
            Ok(()) => sent += 1,
            Err(NetworkError::Disconnected) => break,
            Err(e) => return Err(e).context("Failed to send frame"),
        }

        // Drain whatever the renderer sent meanwhile
        loop {
            match peer.recv(Duration::ZERO) {
                Ok(None) => break,
                Ok(Some(message)) => match message.kind() {
                    Some(MessageType::KeyEvent) => {
                        keys += 1;
                        if let Ok(event) = message.decode_key_event() {
                            tracing::info!("Key {} pressed={}", event.key, event.pressed);
                        }
                    }
                    Some(MessageType::Shutdown) => {
                        println!("Renderer asked us to stop");
                        break 'stream;
                    }
                    _ => tracing::debug!("Ignoring message type {}", message.message_type),
                },
                Err(NetworkError::Disconnected) => {
                    println!("Renderer went away");
                    break 'stream;
                }
                Err(e) => return Err(e).context("Failed to read from renderer"),
            }
        }

        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            next = now;
        }
    }

    if peer.send_shutdown().is_err() {
        tracing::debug!("Renderer already closed the connection");
    }
    let stats = peer.stats();
    peer.close();

    let elapsed = started.elapsed().as_secs_f64();
    println!();
    println!("  Frames sent:  {sent}");
    println!("  Key events:   {keys}");
    println!("  Bytes sent:   {}", stats.bytes_sent);
    #[allow(clippy::cast_precision_loss)]
    let fps = if elapsed > 0.0 { sent as f64 / elapsed } else { 0.0 };
    println!("  Actual rate:  {fps:.1} fps");

    Ok(())
}
