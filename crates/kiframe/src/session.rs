//! # Render Session
//!
//! One producer connection, rendered on the thread that opened it.
//!
//! ```text
//! open()
//!   ├─ validate config
//!   ├─ build primitive pools        (before the producer is accepted)
//!   └─ Bridge::open                 (listen → accept → INIT_COMPLETE → receive thread)
//!
//! run_until(stop)
//!   └─ tick every tick_interval until stop() or (bridge STOPPED and queue drained)
//!
//! close()
//!   ├─ bridge.stop()                (idempotent)
//!   └─ renderer.cleanup()           (hide everything, one refresh)
//! ```
//!
//! The session owns the primitive pools, so it is neither `Send` nor `Sync`.

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;

use kiframe_networking::{Bridge, BridgeState, BridgeStats, EndReason, NetworkError};
use kiframe_rendering::{FrameRenderer, RenderDispatcher, RenderStats, Surface, TickOutcome};
use kiframe_shared::{ConfigError, KiframeConfig};

/// Errors that prevent a session from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The bridge failed to bind, accept or start.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Result type for session setup.
pub type SessionResult<T> = Result<T, SessionError>;

/// A connected bridge feeding a dispatcher.
pub struct RenderSession<S: Surface> {
    bridge: Bridge,
    dispatcher: RenderDispatcher<S>,
    started: Instant,
}

impl<S: Surface> RenderSession<S> {
    /// Builds the pools on `surface`, then waits for the producer.
    ///
    /// Blocks for up to `transport.accept_timeout_ms`.
    ///
    /// # Errors
    ///
    /// `Config` for an invalid configuration, `Network` if the endpoint
    /// cannot be bound or nobody connects in time. The rendezvous path is
    /// removed in both network cases.
    pub fn open(config: &KiframeConfig, surface: S) -> SessionResult<Self> {
        config.validate()?;

        let renderer = FrameRenderer::new(surface, config);
        let bridge = Bridge::open(&config.transport)?;
        let dispatcher = RenderDispatcher::new(
            renderer,
            bridge.frame_queue(),
            config.render.tick_interval(),
        );

        tracing::info!("Session started on {}", bridge.socket_path().display());

        Ok(Self {
            bridge,
            dispatcher,
            started: Instant::now(),
        })
    }

    /// Runs a single dispatcher tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.dispatcher.tick()
    }

    /// True once the bridge has stopped and every queued frame is drawn.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.bridge.state() == BridgeState::Stopped && self.bridge.frame_queue().is_empty()
    }

    /// Ticks until the producer goes away.
    pub fn run(&mut self) {
        self.run_until(|| false);
    }

    /// Ticks until `stop` returns true or the session finishes.
    pub fn run_until(&mut self, mut stop: impl FnMut() -> bool) {
        let bridge = &self.bridge;
        let queue = bridge.frame_queue();

        self.dispatcher.run_until(|| {
            stop() || (bridge.state() == BridgeState::Stopped && queue.is_empty())
        });
    }

    /// The bridge, for key events and stats.
    #[must_use]
    pub const fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// The renderer.
    #[must_use]
    pub const fn renderer(&self) -> &FrameRenderer<S> {
        self.dispatcher.renderer()
    }

    /// Current counters.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            end_reason: self.bridge.end_reason(),
            elapsed: self.started.elapsed(),
            ticks: self.dispatcher.ticks(),
            bridge: self.bridge.stats(),
            render: self.dispatcher.renderer().stats(),
        }
    }

    /// Stops the bridge and clears the surface.
    pub fn close(self) -> SessionSummary {
        let Self {
            bridge,
            dispatcher,
            started,
        } = self;

        bridge.stop();
        let ticks = dispatcher.ticks();
        let mut renderer = dispatcher.into_renderer();
        renderer.cleanup();

        let summary = SessionSummary {
            end_reason: bridge.end_reason(),
            elapsed: started.elapsed(),
            ticks,
            bridge: bridge.stats(),
            render: renderer.stats(),
        };
        tracing::info!(
            "Session closed after {:.1}s: {} frames received, {} rendered",
            summary.elapsed.as_secs_f64(),
            summary.bridge.frames_received,
            summary.render.frames_rendered
        );
        summary
    }
}

impl<S: Surface> fmt::Debug for RenderSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSession")
            .field("state", &self.bridge.state())
            .field("ticks", &self.dispatcher.ticks())
            .finish_non_exhaustive()
    }
}

/// Final or in-flight session counters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSummary {
    /// Why the bridge stopped, if it has.
    pub end_reason: Option<EndReason>,
    /// Time since the producer connected.
    pub elapsed: Duration,
    /// Dispatcher ticks.
    pub ticks: u64,
    /// Bridge counters.
    pub bridge: BridgeStats,
    /// Renderer counters.
    pub render: RenderStats,
}

impl SessionSummary {
    /// Frames that arrived but were never drawn.
    #[must_use]
    pub const fn frames_skipped(&self) -> u64 {
        self.bridge
            .frames_received
            .saturating_sub(self.render.frames_rendered + self.render.frames_aborted)
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = self
            .end_reason
            .map_or_else(|| "still running".to_string(), |r| format!("{r:?}"));

        writeln!(f, "Session ended: {reason}")?;
        writeln!(f, "  Duration:         {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "  Ticks:            {}", self.ticks)?;
        writeln!(f, "  Frames received:  {}", self.bridge.frames_received)?;
        writeln!(f, "  Frames rendered:  {}", self.render.frames_rendered)?;
        writeln!(f, "  Frames skipped:   {}", self.frames_skipped())?;
        writeln!(f, "  Frames aborted:   {}", self.render.frames_aborted)?;
        writeln!(f, "  Frames truncated: {}", self.render.frames_truncated)?;
        writeln!(f, "  Receive errors:   {}", self.bridge.receive_errors)?;
        writeln!(f, "  Key events sent:  {}", self.bridge.key_events_sent)?;
        writeln!(
            f,
            "  Avg decode:       {:.2}ms",
            self.bridge.avg_decode_time().as_secs_f64() * 1000.0
        )?;
        writeln!(
            f,
            "  Avg update:       {:.2}ms",
            self.render.avg_update_time().as_secs_f64() * 1000.0
        )?;
        write!(
            f,
            "  Avg refresh:      {:.2}ms",
            self.render.avg_refresh_time().as_secs_f64() * 1000.0
        )
    }
}
