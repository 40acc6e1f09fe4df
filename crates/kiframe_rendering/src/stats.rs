//! Rendering statistics.

use std::time::Duration;

/// Counters kept by the renderer, polled by the supervisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames mapped onto primitives.
    pub frames_rendered: u64,
    /// Frames dropped by a render error.
    pub frames_aborted: u64,
    /// Frames cut short by the line pool.
    pub frames_truncated: u64,
    /// Frames slower than the slow-frame threshold (update plus refresh).
    pub slow_frames: u64,
    /// Surface refreshes.
    pub refreshes: u64,
    /// HUD redraws.
    pub hud_updates: u64,
    /// Maintenance passes run.
    pub maintenance_passes: u64,
    /// Maintenance passes that found too many primitives.
    pub maintenance_warnings: u64,
    /// Wrapped accesses across the wrapping pools.
    pub wrapped_slots: u64,
    /// Producer frame number of the last rendered frame.
    pub last_sequence: Option<u64>,
    /// Time spent mapping frames.
    pub update_time: Duration,
    /// Time spent refreshing the surface.
    pub refresh_time: Duration,
}

impl RenderStats {
    /// Mean mapping time per rendered frame.
    #[must_use]
    pub fn avg_update_time(&self) -> Duration {
        average(self.update_time, self.frames_rendered)
    }

    /// Mean refresh time.
    #[must_use]
    pub fn avg_refresh_time(&self) -> Duration {
        average(self.refresh_time, self.refreshes)
    }

    /// Frames per second the pipeline could sustain at the current averages.
    #[must_use]
    pub fn sustainable_fps(&self) -> f64 {
        let per_frame = self.avg_update_time() + self.avg_refresh_time();
        if per_frame.is_zero() {
            0.0
        } else {
            1.0 / per_frame.as_secs_f64()
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn average(total: Duration, count: u64) -> Duration {
    if count == 0 {
        Duration::ZERO
    } else {
        total / count.min(u64::from(u32::MAX)) as u32
    }
}

/// Outcome of mapping one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Producer frame number.
    pub sequence: Option<u64>,
    /// Line slots used by walls.
    pub wall_lines: usize,
    /// Line slots used by entity wireframes.
    pub entity_lines: usize,
    /// Labeled markers placed.
    pub labels: usize,
    /// Point markers placed.
    pub markers: usize,
    /// HUD lines drawn, `None` when the HUD was throttled.
    pub hud_lines: Option<usize>,
    /// The line pool ran out before the frame was complete.
    pub truncated: bool,
    /// Mapping time.
    pub update_time: Duration,
}

impl FrameReport {
    /// Line slots used in total.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.wall_lines + self.entity_lines
    }
}
