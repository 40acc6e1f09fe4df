//! Headless surface that records primitive state in memory.
//!
//! Used by the headless renderer binary, tests and benchmarks. It counts
//! every primitive it constructs, so "no allocation after construction" can
//! be checked directly.

use kiframe_shared::constants::OFF_SURFACE;
use kiframe_shared::{LineStyle, TargetPoint};

use super::{LabelPrimitive, LinePrimitive, MarkerPrimitive, Primitive, Surface, TextPrimitive};
use crate::style::LabelClass;

const OFF: TargetPoint = TargetPoint::new(OFF_SURFACE, OFF_SURFACE);

/// A line segment held in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedLine {
    /// Start point.
    pub start: TargetPoint,
    /// End point.
    pub end: TargetPoint,
    /// Width; zero while hidden.
    pub style: LineStyle,
    visible: bool,
}

impl Primitive for RecordedLine {
    fn hide(&mut self) {
        self.start = OFF;
        self.end = OFF;
        self.style.width = 0;
        self.visible = false;
    }

    fn is_hidden(&self) -> bool {
        !self.visible
    }
}

impl LinePrimitive for RecordedLine {
    fn set_segment(&mut self, start: TargetPoint, end: TargetPoint, style: LineStyle) {
        self.start = start;
        self.end = end;
        self.style = style;
        self.visible = true;
    }
}

/// A point marker held in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedMarker {
    /// Position.
    pub at: TargetPoint,
    /// Diameter.
    pub diameter: i64,
    visible: bool,
}

impl Primitive for RecordedMarker {
    fn hide(&mut self) {
        self.at = OFF;
        self.visible = false;
    }

    fn is_hidden(&self) -> bool {
        !self.visible
    }
}

impl MarkerPrimitive for RecordedMarker {
    fn set_position(&mut self, at: TargetPoint) {
        self.at = at;
        self.visible = true;
    }
}

/// A labeled marker held in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedLabel {
    /// Class the marker was created for.
    pub class: LabelClass,
    /// Position.
    pub at: TargetPoint,
    /// Orientation in degrees.
    pub angle: f64,
    visible: bool,
}

impl Primitive for RecordedLabel {
    fn hide(&mut self) {
        self.at = OFF;
        self.visible = false;
    }

    fn is_hidden(&self) -> bool {
        !self.visible
    }
}

impl LabelPrimitive for RecordedLabel {
    fn place(&mut self, at: TargetPoint, angle_degrees: f64) {
        self.at = at;
        self.angle = angle_degrees;
        self.visible = true;
    }
}

/// A text label held in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedText {
    /// Position.
    pub at: TargetPoint,
    /// Content; empty while hidden.
    pub text: String,
    /// Glyph height.
    pub size: i64,
    visible: bool,
}

impl Primitive for RecordedText {
    fn hide(&mut self) {
        self.at = OFF;
        self.text.clear();
        self.visible = false;
    }

    fn is_hidden(&self) -> bool {
        !self.visible
    }
}

impl TextPrimitive for RecordedText {
    fn set_text(&mut self, at: TargetPoint, text: &str) {
        self.at = at;
        // Reuses the existing buffer once it is large enough.
        self.text.clear();
        self.text.push_str(text);
        self.visible = true;
    }
}

/// Surface counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Lines constructed.
    pub lines_created: u64,
    /// Point markers constructed.
    pub markers_created: u64,
    /// Labeled markers constructed.
    pub labels_created: u64,
    /// Text labels constructed.
    pub texts_created: u64,
    /// Refreshes.
    pub refreshes: u64,
    /// Memory reclaim hints received.
    pub reclaim_hints: u64,
}

impl SurfaceStats {
    /// Primitives constructed, all kinds.
    #[must_use]
    pub const fn constructed(&self) -> u64 {
        self.lines_created + self.markers_created + self.labels_created + self.texts_created
    }
}

/// In-memory surface.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    stats: SurfaceStats,
    /// Primitives owned by someone other than the pools.
    foreign: usize,
}

impl RecordingSurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> SurfaceStats {
        self.stats
    }

    /// Pretends `count` primitives were added behind the pools' back, as a
    /// leaking host plugin would.
    pub fn add_foreign_primitives(&mut self, count: usize) {
        self.foreign += count;
    }
}

impl Surface for RecordingSurface {
    type Line = RecordedLine;
    type Marker = RecordedMarker;
    type Label = RecordedLabel;
    type Text = RecordedText;

    fn create_line(&mut self) -> RecordedLine {
        self.stats.lines_created += 1;
        RecordedLine {
            start: OFF,
            end: OFF,
            style: LineStyle {
                width: 0,
                ..LineStyle::far()
            },
            visible: false,
        }
    }

    fn create_marker(&mut self, diameter: i64) -> RecordedMarker {
        self.stats.markers_created += 1;
        RecordedMarker {
            at: OFF,
            diameter,
            visible: false,
        }
    }

    fn create_label(&mut self, class: LabelClass) -> RecordedLabel {
        self.stats.labels_created += 1;
        RecordedLabel {
            class,
            at: OFF,
            angle: 0.0,
            visible: false,
        }
    }

    fn create_text(&mut self, size: i64) -> RecordedText {
        self.stats.texts_created += 1;
        RecordedText {
            at: OFF,
            text: String::new(),
            size,
            visible: false,
        }
    }

    fn refresh(&mut self) {
        self.stats.refreshes += 1;
    }

    fn reclaim_hint(&mut self) {
        self.stats.reclaim_hints += 1;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn primitive_count(&self) -> usize {
        self.stats.constructed() as usize + self.foreign
    }
}
