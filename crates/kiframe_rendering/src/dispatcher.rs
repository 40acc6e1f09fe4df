//! # Render Dispatcher
//!
//! Fixed-rate tick on the dispatch thread.
//!
//! ```text
//!  every tick_interval:
//!    queue.try_pop()
//!      ├── None          → Idle       (no render, no refresh)
//!      └── Some(frame)   → render
//!                            ├── Ok  → refresh exactly once → Rendered
//!                            └── Err → log, drop frame      → Aborted
//! ```
//!
//! Ticks never overlap: a slow tick delays the next one instead of
//! stacking up behind it.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use kiframe_core::DropOldestQueue;
use kiframe_shared::Frame;

use crate::error::RenderError;
use crate::renderer::FrameRenderer;
use crate::stats::FrameReport;
use crate::surface::Surface;

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Queue was empty.
    Idle,
    /// A frame was rendered and the surface refreshed.
    Rendered(FrameReport),
    /// A frame was popped and dropped.
    Aborted(RenderError),
}

/// Drains the frame queue into a renderer, one frame per tick.
pub struct RenderDispatcher<S: Surface> {
    renderer: FrameRenderer<S>,
    queue: Arc<DropOldestQueue<Frame>>,
    tick_interval: Duration,
    ticks: u64,
}

impl<S: Surface> RenderDispatcher<S> {
    /// Creates a dispatcher ticking every `tick_interval`.
    pub fn new(
        renderer: FrameRenderer<S>,
        queue: Arc<DropOldestQueue<Frame>>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            renderer,
            queue,
            tick_interval,
            ticks: 0,
        }
    }

    /// Runs one tick: at most one frame, at most one refresh.
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks += 1;

        let Some(frame) = self.queue.try_pop() else {
            return TickOutcome::Idle;
        };

        match self.renderer.render(&frame) {
            Ok(report) => {
                self.renderer.refresh();
                TickOutcome::Rendered(report)
            }
            Err(e) => {
                tracing::warn!("Dropping frame: {}", e);
                TickOutcome::Aborted(e)
            }
        }
    }

    /// Ticks at the configured rate until `should_stop` returns true.
    ///
    /// `should_stop` is checked before every tick.
    pub fn run_until(&mut self, mut should_stop: impl FnMut() -> bool) {
        tracing::info!(
            "Dispatcher running every {}ms",
            self.tick_interval.as_millis()
        );
        let mut next = Instant::now();

        while !should_stop() {
            self.tick();

            next += self.tick_interval;
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            } else {
                // Overran: schedule from now rather than bursting to catch up.
                next = now;
            }
        }

        tracing::info!("Dispatcher stopped after {} ticks", self.ticks);
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The renderer.
    #[must_use]
    pub const fn renderer(&self) -> &FrameRenderer<S> {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut FrameRenderer<S> {
        &mut self.renderer
    }

    /// Gives the renderer back, e.g. for a final cleanup.
    pub fn into_renderer(self) -> FrameRenderer<S> {
        self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use kiframe_shared::{KiframeConfig, Point, WallSegment};

    fn dispatcher(depth: usize) -> (RenderDispatcher<RecordingSurface>, Arc<DropOldestQueue<Frame>>) {
        let config = KiframeConfig::default();
        let queue = Arc::new(DropOldestQueue::new(depth));
        let renderer = FrameRenderer::new(RecordingSurface::new(), &config);
        (
            RenderDispatcher::new(renderer, Arc::clone(&queue), Duration::from_millis(1)),
            queue,
        )
    }

    fn numbered(sequence: u64) -> Frame {
        Frame {
            sequence: Some(sequence),
            walls: vec![WallSegment::Segment {
                x1: 0.0,
                y1: 0.0,
                x2: 10.0,
                y2: 10.0,
                distance: 5.0,
            }],
            ..Frame::default()
        }
    }

    #[test]
    fn test_empty_queue_is_a_noop() {
        let (mut dispatcher, _queue) = dispatcher(2);

        assert_eq!(dispatcher.tick(), TickOutcome::Idle);
        assert_eq!(dispatcher.renderer().surface().stats().refreshes, 0);
        assert_eq!(dispatcher.renderer().stats().frames_rendered, 0);
    }

    #[test]
    fn test_one_frame_one_refresh_per_tick() {
        let (mut dispatcher, queue) = dispatcher(2);
        queue.push(numbered(1));
        queue.push(numbered(2));

        assert!(matches!(dispatcher.tick(), TickOutcome::Rendered(_)));
        assert_eq!(dispatcher.renderer().surface().stats().refreshes, 1);
        assert_eq!(queue.len(), 1);

        assert!(matches!(dispatcher.tick(), TickOutcome::Rendered(_)));
        assert_eq!(dispatcher.tick(), TickOutcome::Idle);
        assert_eq!(dispatcher.renderer().surface().stats().refreshes, 2);
        assert_eq!(dispatcher.ticks(), 3);
    }

    #[test]
    fn test_drop_oldest_burst() {
        let (mut dispatcher, queue) = dispatcher(2);
        for sequence in 1..=5 {
            queue.push(numbered(sequence));
        }

        let mut seen = Vec::new();
        while let TickOutcome::Rendered(report) = dispatcher.tick() {
            seen.push(report.sequence.unwrap());
        }

        assert_eq!(seen, vec![4, 5]);
    }

    #[test]
    fn test_bad_frame_skips_refresh() {
        let (mut dispatcher, queue) = dispatcher(2);
        queue.push(Frame {
            projectiles: vec![Point::new(f64::INFINITY, 0.0)],
            ..Frame::default()
        });
        queue.push(numbered(2));

        assert!(matches!(dispatcher.tick(), TickOutcome::Aborted(_)));
        assert_eq!(dispatcher.renderer().surface().stats().refreshes, 0);

        // The next tick is unaffected
        assert!(matches!(dispatcher.tick(), TickOutcome::Rendered(_)));
        assert_eq!(dispatcher.renderer().surface().stats().refreshes, 1);
    }

    #[test]
    fn test_concurrent_producer_yields_increasing_subsequence() {
        let (mut dispatcher, queue) = dispatcher(2);
        let producer_queue = Arc::clone(&queue);

        let producer = thread::spawn(move || {
            for sequence in 0..200 {
                producer_queue.push(numbered(sequence));
                if sequence % 10 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            }
        });

        let mut seen = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !(producer.is_finished() && queue.is_empty()) && Instant::now() < deadline {
            if let TickOutcome::Rendered(report) = dispatcher.tick() {
                seen.extend(report.sequence);
            }
        }
        producer.join().unwrap();

        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(seen.last(), Some(&199));
        let stats = dispatcher.renderer().stats();
        assert_eq!(stats.frames_rendered, stats.refreshes);
    }

    #[test]
    fn test_run_until_stops_and_paces() {
        let (mut dispatcher, queue) = dispatcher(2);
        queue.push(numbered(7));

        let start = Instant::now();
        let mut checks = 0;
        dispatcher.run_until(|| {
            checks += 1;
            checks > 5
        });

        assert_eq!(dispatcher.ticks(), 5);
        // Five ticks at 1ms apart
        assert!(start.elapsed() >= Duration::from_millis(4));
        assert_eq!(dispatcher.renderer().stats().last_sequence, Some(7));
        assert_eq!(dispatcher.renderer().surface().stats().refreshes, 1);
    }
}
