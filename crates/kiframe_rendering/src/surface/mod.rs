//! # Surface
//!
//! The host graphical surface, seen from the renderer.
//!
//! ```text
//! ┌──────────────┐  create_* (construction only)   ┌──────────────┐
//! │ PrimitivePools│ ─────────────────────────────► │   Surface    │
//! │              │                                  │              │
//! │ FrameRenderer│ ── set_* / hide (every frame) ──►│  primitives  │
//! │              │ ── refresh (once per frame) ────►│              │
//! └──────────────┘                                  └──────────────┘
//! ```
//!
//! Nothing is assumed about how a surface stores or shows primitives beyond
//! "last mutation wins" and "hidden primitives are not visible".

mod recording;

pub use recording::{
    RecordedLabel, RecordedLine, RecordedMarker, RecordedText, RecordingSurface, SurfaceStats,
};

use kiframe_shared::{LineStyle, TargetPoint};

use crate::style::LabelClass;

/// Behaviour every primitive shares.
pub trait Primitive {
    /// Moves the primitive off the surface and makes it invisible.
    fn hide(&mut self);

    /// True if the primitive is currently hidden.
    fn is_hidden(&self) -> bool;
}

/// A line segment.
pub trait LinePrimitive: Primitive {
    /// Sets both endpoints and the visual weight, making the line visible.
    fn set_segment(&mut self, start: TargetPoint, end: TargetPoint, style: LineStyle);
}

/// A point marker.
pub trait MarkerPrimitive: Primitive {
    /// Places the marker, making it visible.
    fn set_position(&mut self, at: TargetPoint);
}

/// A labeled marker. Its class is fixed when it is created.
pub trait LabelPrimitive: Primitive {
    /// Places and orients the marker, making it visible.
    fn place(&mut self, at: TargetPoint, angle_degrees: f64);
}

/// A text label.
pub trait TextPrimitive: Primitive {
    /// Places the label and sets its content, making it visible.
    fn set_text(&mut self, at: TargetPoint, text: &str);
}

/// The host surface.
///
/// `create_*` is only called while pools are being built. `refresh` is only
/// called from the dispatch thread, once per rendered frame.
pub trait Surface {
    /// Line primitive type.
    type Line: LinePrimitive;
    /// Point marker type.
    type Marker: MarkerPrimitive;
    /// Labeled marker type.
    type Label: LabelPrimitive;
    /// Text type.
    type Text: TextPrimitive;

    /// Creates a hidden line.
    fn create_line(&mut self) -> Self::Line;

    /// Creates a hidden point marker.
    fn create_marker(&mut self, diameter: i64) -> Self::Marker;

    /// Creates a hidden labeled marker bound to `class`'s visual style.
    fn create_label(&mut self, class: LabelClass) -> Self::Label;

    /// Creates a hidden text label.
    fn create_text(&mut self, size: i64) -> Self::Text;

    /// Commits pending mutations to the display.
    fn refresh(&mut self);

    /// Hint that now is a good time to reclaim memory.
    fn reclaim_hint(&mut self) {}

    /// Number of primitives the surface currently holds, whoever created
    /// them.
    fn primitive_count(&self) -> usize;
}
