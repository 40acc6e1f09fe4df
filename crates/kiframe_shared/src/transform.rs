//! # Coordinate Transform
//!
//! Affine mapping from source screen space to target surface space.
//!
//! ```text
//! source (pixels)                      target (nm)
//! (0,0) ───────── (320,0)              centred on (148.5mm, 105mm)
//!   │      (160,100)   │     ──►       0.5 mm per pixel
//! (0,200) ─────── (320,200)            Y grows downwards in both
//! ```
//!
//! Stateless apart from the constants it is built from.

use crate::config::TransformConfig;

/// A point on the target surface, in target units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TargetPoint {
    /// X.
    pub x: i64,
    /// Y.
    pub y: i64,
}

impl TargetPoint {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Target-space bounding box of the source screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetBounds {
    /// Top-left corner.
    pub min: TargetPoint,
    /// Bottom-right corner.
    pub max: TargetPoint,
}

impl TargetBounds {
    /// Width in target units.
    #[must_use]
    pub const fn width(&self) -> i64 {
        self.max.x - self.min.x
    }

    /// Height in target units.
    #[must_use]
    pub const fn height(&self) -> i64 {
        self.max.y - self.min.y
    }
}

/// Source screen dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceBounds {
    /// Width in source units.
    pub width: f64,
    /// Height in source units.
    pub height: f64,
}

/// Source → target affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateTransform {
    source: SourceBounds,
    scale: f64,
    target_center: TargetPoint,
}

impl CoordinateTransform {
    /// Builds a transform from configuration.
    #[must_use]
    pub const fn new(config: &TransformConfig) -> Self {
        Self {
            source: SourceBounds {
                width: config.source_width,
                height: config.source_height,
            },
            scale: config.scale,
            target_center: TargetPoint::new(config.target_center_x, config.target_center_y),
        }
    }

    /// Source screen dimensions.
    #[inline]
    #[must_use]
    pub const fn source(&self) -> SourceBounds {
        self.source
    }

    /// Maps a source point to the target surface.
    ///
    /// The scaled offset is truncated toward zero before the centre is added.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_target(&self, x: f64, y: f64) -> TargetPoint {
        let dx = ((x - self.source.width / 2.0) * self.scale) as i64;
        let dy = ((y - self.source.height / 2.0) * self.scale) as i64;
        TargetPoint::new(self.target_center.x + dx, self.target_center.y + dy)
    }

    /// Maps a target point back to source space.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_source(&self, point: TargetPoint) -> (f64, f64) {
        let x = (point.x - self.target_center.x) as f64 / self.scale + self.source.width / 2.0;
        let y = (point.y - self.target_center.y) as f64 / self.scale + self.source.height / 2.0;
        (x, y)
    }

    /// Target-space box covering the whole source screen.
    #[must_use]
    pub fn target_bounds(&self) -> TargetBounds {
        let a = self.to_target(0.0, 0.0);
        let b = self.to_target(self.source.width, self.source.height);
        TargetBounds {
            min: TargetPoint::new(a.x.min(b.x), a.y.min(b.y)),
            max: TargetPoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// True if the source point lies on the source screen.
    #[must_use]
    pub fn is_on_screen(&self, x: f64, y: f64) -> bool {
        (0.0..self.source.width).contains(&x) && (0.0..self.source.height).contains(&y)
    }

    /// Clamps a source point onto the last visible row/column.
    #[must_use]
    pub fn clamp_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(0.0, self.source.width - 1.0),
            y.clamp(0.0, self.source.height - 1.0),
        )
    }
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::new(&TransformConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_and_centre() {
        let transform = CoordinateTransform::default();

        assert_eq!(transform.to_target(0.0, 0.0), TargetPoint::new(68_500_000, 55_000_000));
        assert_eq!(
            transform.to_target(160.0, 100.0),
            TargetPoint::new(148_500_000, 105_000_000)
        );
        assert_eq!(
            transform.to_target(320.0, 200.0),
            TargetPoint::new(228_500_000, 155_000_000)
        );
    }

    #[test]
    fn test_fractional_offsets_truncate_toward_zero() {
        let transform = CoordinateTransform::new(&TransformConfig {
            scale: 3.0,
            ..TransformConfig::default()
        });

        // (0.5 * 3) = 1.5 → 1 ; (-0.5 * 3) = -1.5 → -1
        assert_eq!(transform.to_target(160.5, 99.5).x, 148_500_001);
        assert_eq!(transform.to_target(160.5, 99.5).y, 104_999_999);
    }

    #[test]
    fn test_inverse() {
        let transform = CoordinateTransform::default();
        let point = transform.to_target(37.0, 151.0);
        assert_eq!(transform.to_source(point), (37.0, 151.0));
    }

    #[test]
    fn test_bounds() {
        let bounds = CoordinateTransform::default().target_bounds();
        // 320 × 0.5 mm by 200 × 0.5 mm
        assert_eq!(bounds.width(), 160_000_000);
        assert_eq!(bounds.height(), 100_000_000);
    }

    #[test]
    fn test_on_screen_and_clamp() {
        let transform = CoordinateTransform::default();

        assert!(transform.is_on_screen(0.0, 0.0));
        assert!(transform.is_on_screen(319.0, 199.0));
        assert!(!transform.is_on_screen(320.0, 10.0));
        assert!(!transform.is_on_screen(-1.0, 10.0));

        assert_eq!(transform.clamp_to_screen(-5.0, 500.0), (0.0, 199.0));
    }
}
