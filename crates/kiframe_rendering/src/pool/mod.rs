//! # Primitive Pools
//!
//! Four fixed-capacity pools, built once against a surface and reused for
//! every frame afterwards.
//!
//! ```text
//! ┌───────────────┬─────────────────┬───────────────────────────────┐
//! │ Pool          │ Overflow policy │ Why                           │
//! ├───────────────┼─────────────────┼───────────────────────────────┤
//! │ lines         │ Err (truncate)  │ reused edges corrupt geometry │
//! │ markers       │ wrap            │ aliasing is cosmetic          │
//! │ labels (×3)   │ wrap per class  │ aliasing is cosmetic          │
//! │ texts         │ wrap            │ aliasing is cosmetic          │
//! └───────────────┴─────────────────┴───────────────────────────────┘
//! ```
//!
//! ## Thread Affinity
//!
//! [`PrimitivePools`] is neither `Send` nor `Sync`. It is built on the
//! dispatch thread and can never leave it, so mutating primitives from the
//! receive thread does not compile:
//!
//! ```compile_fail
//! use kiframe_rendering::{PrimitivePools, RecordingSurface};
//!
//! fn assert_send<T: Send>() {}
//! assert_send::<PrimitivePools<RecordingSurface>>();
//! ```

mod label;
mod line;
mod wrapping;

pub use label::{LabelPool, LabelUsage};
pub use line::LinePool;
pub use wrapping::WrappingPool;

use std::marker::PhantomData;

use kiframe_shared::{PoolConfig, RenderConfig};

use crate::surface::Surface;

/// All four pools for one surface.
pub struct PrimitivePools<S: Surface> {
    /// Wall and entity edges.
    pub lines: LinePool<S::Line>,
    /// Projectiles.
    pub markers: WrappingPool<S::Marker>,
    /// Entity markers, per class.
    pub labels: LabelPool<S::Label>,
    /// HUD lines.
    pub texts: WrappingPool<S::Text>,
    /// Pins the pools to the thread that built them.
    _thread_bound: PhantomData<*const ()>,
}

impl<S: Surface> PrimitivePools<S> {
    /// Creates every primitive the session will ever use.
    ///
    /// # Panics
    ///
    /// Panics if a capacity is zero; validated configuration never has one.
    pub fn new(surface: &mut S, pools: &PoolConfig, render: &RenderConfig) -> Self {
        let lines = LinePool::new(pools.line_capacity, |_| surface.create_line());
        let markers = WrappingPool::new(pools.marker_capacity, |_| {
            surface.create_marker(render.marker_diameter)
        });
        let labels = LabelPool::new(pools.label_capacity, |class| surface.create_label(class));
        let texts = WrappingPool::new(pools.text_capacity, |_| {
            surface.create_text(render.text_size)
        });

        tracing::info!(
            "Primitive pools ready: {} lines, {} markers, {} labels, {} texts",
            lines.capacity(),
            markers.capacity(),
            labels.capacity(),
            texts.capacity()
        );

        Self {
            lines,
            markers,
            labels,
            texts,
            _thread_bound: PhantomData,
        }
    }

    /// Hides every primitive in every pool.
    pub fn reset_all(&mut self) {
        self.lines.reset_all();
        self.markers.reset_all();
        self.labels.reset_all();
        self.texts.reset_all();
    }

    /// Total primitives owned by the pools.
    #[must_use]
    pub fn total_capacity(&self) -> usize {
        self.lines.capacity()
            + self.markers.capacity()
            + self.labels.capacity()
            + self.texts.capacity()
    }

    /// Wrapped accesses across the wrapping pools.
    #[must_use]
    pub fn wrapped(&self) -> u64 {
        self.markers.wrapped() + self.labels.wrapped() + self.texts.wrapped()
    }
}

impl<S: Surface> std::fmt::Debug for PrimitivePools<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitivePools")
            .field("lines", &self.lines.capacity())
            .field("markers", &self.markers.capacity())
            .field("labels", &self.labels.capacity())
            .field("texts", &self.texts.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    #[test]
    fn test_construction_creates_everything_once() {
        let mut surface = RecordingSurface::new();
        let config = PoolConfig::default();
        let pools = PrimitivePools::new(&mut surface, &config, &RenderConfig::default());

        assert_eq!(pools.total_capacity(), config.total());
        assert_eq!(surface.stats().constructed(), config.total() as u64);
        assert_eq!(surface.stats().lines_created, 320);
        assert_eq!(surface.stats().labels_created, 20);
    }

    #[test]
    fn test_reset_all() {
        use crate::surface::MarkerPrimitive;
        use kiframe_shared::TargetPoint;

        let mut surface = RecordingSurface::new();
        let mut pools =
            PrimitivePools::new(&mut surface, &PoolConfig::default(), &RenderConfig::default());
        pools.markers.get(0).set_position(TargetPoint::new(1, 1));
        assert_eq!(pools.markers.visible_count(), 1);

        pools.reset_all();
        assert_eq!(pools.markers.visible_count(), 0);
    }
}
