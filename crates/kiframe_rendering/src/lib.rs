//! # KIFRAME Rendering
//!
//! Turns decoded frames into updates of a fixed set of reusable primitives.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DISPATCH THREAD                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DropOldestQueue → RenderDispatcher.tick()                   │
//! │                        ↓                                     │
//! │                   FrameRenderer.render(frame)                │
//! │                        ↓                                     │
//! │   PrimitivePools: lines | markers | labels ×3 | texts        │
//! │                        ↓                                     │
//! │                   Surface.refresh()   (once per frame)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## House Rules
//!
//! - Every primitive is created when the pools are built
//! - Pools never leave the thread that built them
//! - A bad frame is dropped; the next tick carries on
//!
//! ## Example
//!
//! ```rust
//! use kiframe_rendering::{FrameRenderer, RecordingSurface};
//! use kiframe_shared::{Frame, KiframeConfig, WallSegment};
//!
//! let config = KiframeConfig::default();
//! let mut renderer = FrameRenderer::new(RecordingSurface::new(), &config);
//!
//! let frame = Frame {
//!     walls: vec![WallSegment::Quad {
//!         x1: 0.0, y_top1: 10.0, y_bottom1: 90.0,
//!         x2: 40.0, y_top2: 20.0, y_bottom2: 80.0,
//!         distance: 12.0, silhouette: 3,
//!     }],
//!     ..Frame::default()
//! };
//!
//! let report = renderer.render(&frame).unwrap();
//! renderer.refresh();
//! assert_eq!(report.lines(), 4);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod dispatcher;
pub mod error;
pub mod pool;
pub mod renderer;
pub mod stats;
pub mod style;
pub mod surface;

pub use dispatcher::{RenderDispatcher, TickOutcome};
pub use error::{PoolError, PoolResult, RenderError, RenderResult};
pub use pool::{LabelPool, LabelUsage, LinePool, PrimitivePools, WrappingPool};
pub use renderer::FrameRenderer;
pub use stats::{FrameReport, RenderStats};
pub use style::LabelClass;
pub use surface::{
    LabelPrimitive, LinePrimitive, MarkerPrimitive, Primitive, RecordedLabel, RecordedLine,
    RecordedMarker, RecordedText, RecordingSurface, Surface, SurfaceStats, TextPrimitive,
};
