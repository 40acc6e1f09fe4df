//! # Frame Renderer
//!
//! Maps one [`Frame`] onto the primitive pools. Pure mapping: no I/O, no
//! waiting, no primitive creation.
//!
//! ## Passes
//!
//! ```text
//! walls     ──► lines[0 .. w)          near/far by distance, portals skipped
//! entities  ──► lines[w .. w+e)        always near style
//!               lines.hide_unused(w+e) exactly once
//! entities  ──► labels[class][..]      one marker per entity
//! projectiles ► markers[..]
//! hud       ──► texts[..]              only every `hud_interval` frames
//! ```
//!
//! When the line pool runs out, the remaining edges are dropped for this
//! frame and the frame is counted as truncated. Every other pass still runs.

use std::time::{Duration, Instant};

use kiframe_shared::{
    CoordinateTransform, EntityShape, Frame, HudState, KiframeConfig, LineStyle, RenderConfig,
};

use crate::error::{PoolError, PoolResult, RenderError, RenderResult};
use crate::pool::{LabelUsage, LinePool, PrimitivePools};
use crate::stats::{FrameReport, RenderStats};
use crate::style::LabelClass;
use crate::surface::{LabelPrimitive, LinePrimitive, MarkerPrimitive, Surface, TextPrimitive};

/// Source-space edge: start and end points.
type Edge = ((f64, f64), (f64, f64));

/// Owns a surface and its pools; lives on the dispatch thread.
pub struct FrameRenderer<S: Surface> {
    surface: S,
    pools: PrimitivePools<S>,
    transform: CoordinateTransform,
    config: RenderConfig,
    stats: RenderStats,
    /// Mapping time of the frame awaiting its refresh.
    pending_update: Duration,
    /// A maintenance pass runs after the next refresh.
    maintenance_due: bool,
}

impl<S: Surface> FrameRenderer<S> {
    /// Builds every pool against `surface`.
    ///
    /// # Panics
    ///
    /// Panics if a pool capacity is zero; run [`KiframeConfig::validate`]
    /// first.
    pub fn new(mut surface: S, config: &KiframeConfig) -> Self {
        let pools = PrimitivePools::new(&mut surface, &config.pools, &config.render);

        Self {
            surface,
            pools,
            transform: CoordinateTransform::new(&config.transform),
            config: config.render.clone(),
            stats: RenderStats::default(),
            pending_update: Duration::ZERO,
            maintenance_due: false,
        }
    }

    /// Maps `frame` onto the pools. Does not refresh the surface.
    ///
    /// # Errors
    ///
    /// `NonFiniteGeometry` if the frame carries NaN or infinite numbers. The
    /// pools are untouched in that case.
    pub fn render(&mut self, frame: &Frame) -> RenderResult<FrameReport> {
        if !frame.is_finite() {
            self.stats.frames_aborted += 1;
            return Err(RenderError::NonFiniteGeometry {
                sequence: frame.sequence,
            });
        }

        let start = Instant::now();
        let mut report = FrameReport {
            sequence: frame.sequence,
            ..FrameReport::default()
        };

        self.draw_lines(frame, &mut report);
        report.labels = self.draw_labels(frame);
        report.markers = self.draw_projectiles(frame);

        if self.hud_due() {
            report.hud_lines = Some(self.draw_hud(frame.hud.as_ref()));
            self.stats.hud_updates += 1;
        }

        report.update_time = start.elapsed();

        self.stats.frames_rendered += 1;
        self.stats.update_time += report.update_time;
        self.stats.last_sequence = frame.sequence;
        if report.truncated {
            self.stats.frames_truncated += 1;
        }
        if self.config.cleanup_interval > 0
            && self.stats.frames_rendered % self.config.cleanup_interval == 0
        {
            self.maintenance_due = true;
        }
        self.pending_update = report.update_time;

        Ok(report)
    }

    /// Commits the last rendered frame to the display.
    pub fn refresh(&mut self) {
        let start = Instant::now();
        self.surface.refresh();
        let refresh_time = start.elapsed();

        self.stats.refreshes += 1;
        self.stats.refresh_time += refresh_time;

        let frame_time = std::mem::take(&mut self.pending_update) + refresh_time;
        if frame_time > self.config.slow_frame() {
            self.stats.slow_frames += 1;
            if self.config.log_frame_times {
                tracing::warn!(
                    "Slow frame {:?}: {:.1}ms",
                    self.stats.last_sequence,
                    frame_time.as_secs_f64() * 1000.0
                );
            }
        }

        if self.config.log_frame_times
            && self.config.stats_log_interval > 0
            && self.stats.refreshes % self.config.stats_log_interval == 0
        {
            let stats = self.stats();
            tracing::info!(
                "Rendered {} frames: update {:.2}ms, refresh {:.2}ms, {} slow, {} truncated, {} aborted",
                stats.frames_rendered,
                stats.avg_update_time().as_secs_f64() * 1000.0,
                stats.avg_refresh_time().as_secs_f64() * 1000.0,
                stats.slow_frames,
                stats.frames_truncated,
                stats.frames_aborted
            );
        }

        if std::mem::take(&mut self.maintenance_due) {
            self.maintenance();
        }
    }

    /// Reclaim hint plus a sanity check on the surface's primitive count.
    ///
    /// Returns false if the surface holds more primitives than the pools
    /// account for.
    pub fn maintenance(&mut self) -> bool {
        self.surface.reclaim_hint();
        self.stats.maintenance_passes += 1;

        let count = self.surface.primitive_count();
        let limit = self.pools.total_capacity() + self.config.primitive_slack;
        if count > limit {
            self.stats.maintenance_warnings += 1;
            tracing::warn!(
                "Surface holds {} primitives, expected at most {}: pool accounting is off",
                count,
                limit
            );
            false
        } else {
            tracing::debug!("Maintenance: {} primitives on surface", count);
            true
        }
    }

    /// Hides everything and refreshes once. Used at teardown.
    pub fn cleanup(&mut self) {
        self.pools.reset_all();
        self.surface.refresh();
        self.stats.refreshes += 1;
        tracing::info!(
            "Renderer cleaned up after {} frames",
            self.stats.frames_rendered
        );
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> RenderStats {
        RenderStats {
            wrapped_slots: self.pools.wrapped(),
            ..self.stats
        }
    }

    /// The pools, for inspection.
    #[must_use]
    pub const fn pools(&self) -> &PrimitivePools<S> {
        &self.pools
    }

    /// The surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The surface, mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The source → target transform in use.
    #[must_use]
    pub const fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    fn hud_due(&self) -> bool {
        self.stats.frames_rendered % self.config.hud_interval.max(1) == 0
    }

    fn draw_lines(&mut self, frame: &Frame, report: &mut FrameReport) {
        let mut used = 0;

        let walls = self.draw_walls(frame, &mut used);
        report.wall_lines = used;
        let outcome = walls.and_then(|()| self.draw_entity_boxes(frame, &mut used));
        report.entity_lines = used - report.wall_lines;

        if let Err(PoolError::CapacityExceeded { index, capacity }) = outcome {
            report.truncated = true;
            if self.config.debug_mode {
                tracing::warn!(
                    "Frame {:?} needs {} edges, line pool holds {}; truncated at {}",
                    frame.sequence,
                    frame.edge_demand(),
                    capacity,
                    index
                );
            } else {
                tracing::debug!("Frame {:?} truncated at edge {}", frame.sequence, index);
            }
        }

        self.pools.lines.hide_unused(used);
    }

    fn draw_walls(&mut self, frame: &Frame, used: &mut usize) -> PoolResult<()> {
        for wall in frame.walls.iter().filter(|wall| !wall.is_portal()) {
            let style = if wall.distance() < self.config.distance_threshold {
                self.config.near_style
            } else {
                self.config.far_style
            };
            let edges = wall.edges();
            emit_edges(
                &mut self.pools.lines,
                &self.transform,
                &edges[..wall.edge_count()],
                style,
                used,
            )?;
        }
        Ok(())
    }

    fn draw_entity_boxes(&mut self, frame: &Frame, used: &mut usize) -> PoolResult<()> {
        let boxes = frame
            .entities
            .iter()
            .filter(|entity| entity.shape == EntityShape::Wireframe);

        for entity in boxes {
            emit_edges(
                &mut self.pools.lines,
                &self.transform,
                &entity.edges(),
                self.config.near_style,
                used,
            )?;
        }
        Ok(())
    }

    fn draw_labels(&mut self, frame: &Frame) -> usize {
        let mut usage = LabelUsage::default();

        for entity in &frame.entities {
            // Anchors have no box, the marker is all there is of them.
            if entity.shape == EntityShape::Wireframe && !self.config.entity_markers {
                continue;
            }
            let index = usage.next(LabelClass::for_category(entity.category));
            let (x, y) = entity.centre();
            self.pools
                .labels
                .get(index, entity.category)
                .place(self.transform.to_target(x, y), entity.angle);
        }

        self.pools.labels.hide_unused(&usage);
        usage.total()
    }

    fn draw_projectiles(&mut self, frame: &Frame) -> usize {
        for (index, point) in frame.projectiles.iter().enumerate() {
            self.pools
                .markers
                .get(index)
                .set_position(self.transform.to_target(point.x, point.y));
        }
        self.pools.markers.hide_unused(frame.projectiles.len());
        frame.projectiles.len()
    }

    fn draw_hud(&mut self, hud: Option<&HudState>) -> usize {
        let lines = hud.map(HudState::layout).unwrap_or_default();

        for (index, line) in lines.iter().enumerate() {
            self.pools
                .texts
                .get(index)
                .set_text(self.transform.to_target(line.x, line.y), &line.text);
        }
        self.pools.texts.hide_unused(lines.len());
        lines.len()
    }
}

impl<S: Surface> std::fmt::Debug for FrameRenderer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("pools", &self.pools)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Writes `edges` into consecutive line slots starting at `*used`.
fn emit_edges<L: LinePrimitive>(
    lines: &mut LinePool<L>,
    transform: &CoordinateTransform,
    edges: &[Edge],
    style: LineStyle,
    used: &mut usize,
) -> PoolResult<()> {
    for &((x1, y1), (x2, y2)) in edges {
        lines
            .get(*used)?
            .set_segment(transform.to_target(x1, y1), transform.to_target(x2, y2), style);
        *used += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Primitive, RecordingSurface};
    use kiframe_shared::{
        Entity, EntityCategory, HudState, PoolConfig, Point, WallSegment,
    };

    fn quad(distance: f64, silhouette: i64) -> WallSegment {
        WallSegment::Quad {
            x1: 10.0,
            y_top1: 50.0,
            y_bottom1: 150.0,
            x2: 60.0,
            y_top2: 60.0,
            y_bottom2: 140.0,
            distance,
            silhouette,
        }
    }

    fn imp() -> Entity {
        Entity::wireframe(160.0, 80.0, 120.0, 20.0, EntityCategory::Enemy, 500.0)
    }

    fn config() -> KiframeConfig {
        KiframeConfig::default()
    }

    fn renderer(config: &KiframeConfig) -> FrameRenderer<RecordingSurface> {
        FrameRenderer::new(RecordingSurface::new(), config)
    }

    #[test]
    fn test_portals_contribute_nothing() {
        let mut renderer = renderer(&config());

        let portal = Frame {
            walls: vec![quad(10.0, 0)],
            ..Frame::default()
        };
        assert_eq!(renderer.render(&portal).unwrap().lines(), 0);
        assert_eq!(renderer.pools().lines.visible_count(), 0);

        let solid = Frame {
            walls: vec![quad(10.0, 3)],
            ..Frame::default()
        };
        assert_eq!(renderer.render(&solid).unwrap().lines(), 4);
        assert_eq!(renderer.pools().lines.visible_count(), 4);
    }

    #[test]
    fn test_wall_edges_and_styles() {
        let mut renderer = renderer(&config());
        let frame = Frame {
            walls: vec![quad(50.0, 3), quad(150.0, 1)],
            ..Frame::default()
        };

        renderer.render(&frame).unwrap();

        let lines = &renderer.pools().lines;
        let t = renderer.transform();
        // Top edge of the first wall
        let top = lines.slot(0).unwrap();
        assert_eq!(top.start, t.to_target(10.0, 50.0));
        assert_eq!(top.end, t.to_target(60.0, 60.0));
        // Right edge of the first wall
        assert_eq!(lines.slot(3).unwrap().start, t.to_target(60.0, 60.0));

        assert_eq!(lines.slot(0).unwrap().style, LineStyle::near());
        assert_eq!(lines.slot(4).unwrap().style, LineStyle::far());
    }

    #[test]
    fn test_entities_follow_walls_in_near_style() {
        let mut renderer = renderer(&config());
        let frame = Frame {
            walls: vec![quad(500.0, 3), quad(500.0, 0)],
            entities: vec![imp()],
            ..Frame::default()
        };

        let report = renderer.render(&frame).unwrap();

        assert_eq!(report.wall_lines, 4);
        assert_eq!(report.entity_lines, 4);
        let lines = &renderer.pools().lines;
        for index in 4..8 {
            assert_eq!(lines.slot(index).unwrap().style, LineStyle::near());
        }
        // Box is `height` wide, centred on x
        let t = renderer.transform();
        let top = lines.slot(4).unwrap();
        assert_eq!(top.start, t.to_target(150.0, 80.0));
        assert_eq!(top.end, t.to_target(170.0, 80.0));
    }

    #[test]
    fn test_line_pool_truncates() {
        let config = KiframeConfig {
            pools: PoolConfig {
                line_capacity: 10,
                ..PoolConfig::default()
            },
            ..config()
        };
        let mut renderer = renderer(&config);
        let frame = Frame {
            walls: vec![quad(10.0, 3); 3],
            entities: vec![imp()],
            projectiles: vec![Point::new(5.0, 5.0)],
            ..Frame::default()
        };

        let report = renderer.render(&frame).unwrap();

        assert!(report.truncated);
        assert_eq!(report.lines(), 10);
        assert_eq!(report.entity_lines, 0);
        assert_eq!(renderer.pools().lines.visible_count(), 10);
        assert_eq!(renderer.stats().frames_truncated, 1);
        // Other passes still ran
        assert_eq!(renderer.pools().markers.visible_count(), 1);
        assert_eq!(renderer.pools().labels.visible_count(), 1);
    }

    #[test]
    fn test_large_then_small_frame_hides_tail() {
        let mut renderer = renderer(&config());
        let large = Frame {
            walls: vec![quad(10.0, 3); 20],
            entities: vec![imp(); 5],
            projectiles: vec![Point::new(1.0, 1.0); 12],
            hud: Some(HudState {
                health: Some(100),
                ammo: Some(50),
                armor: Some(0),
                keys: vec!["blue".into()],
                lines: Vec::new(),
            }),
            ..Frame::default()
        };
        let small = Frame {
            walls: vec![quad(10.0, 3)],
            projectiles: vec![Point::new(1.0, 1.0)],
            hud: Some(HudState {
                health: Some(10),
                ..HudState::default()
            }),
            ..Frame::default()
        };

        renderer.render(&large).unwrap();
        assert_eq!(renderer.pools().lines.visible_count(), 100);
        assert_eq!(renderer.pools().texts.visible_count(), 4);

        // Both frames draw the HUD
        let config = KiframeConfig {
            render: RenderConfig {
                hud_interval: 1,
                ..RenderConfig::default()
            },
            ..config()
        };
        let mut renderer = FrameRenderer::new(RecordingSurface::new(), &config);
        renderer.render(&large).unwrap();
        renderer.render(&small).unwrap();

        let pools = renderer.pools();
        assert_eq!(pools.lines.visible_count(), 4);
        assert!((4..pools.lines.capacity()).all(|i| pools.lines.slot(i).unwrap().is_hidden()));
        assert_eq!(pools.markers.visible_count(), 1);
        assert_eq!(pools.labels.visible_count(), 0);
        assert_eq!(pools.texts.visible_count(), 1);
        assert_eq!(pools.texts.slot(0).unwrap().text, "HEALTH: 10%");
    }

    #[test]
    fn test_no_primitives_created_after_construction() {
        let mut renderer = renderer(&config());
        let constructed = renderer.surface().stats().constructed();

        for n in 0..500usize {
            let frame = Frame {
                sequence: Some(n as u64),
                walls: vec![quad(10.0 * (n % 20) as f64, 3); n % 70],
                entities: vec![imp(); n % 10],
                projectiles: vec![Point::new(3.0, 4.0); n % 60],
                hud: Some(HudState {
                    health: Some(n as i64),
                    ..HudState::default()
                }),
            };
            renderer.render(&frame).unwrap();
            renderer.refresh();
        }

        assert_eq!(renderer.surface().stats().constructed(), constructed);
        assert_eq!(renderer.stats().frames_truncated, 0);
        assert_eq!(renderer.stats().last_sequence, Some(499));
    }

    #[test]
    fn test_hud_throttle() {
        let mut renderer = renderer(&config());
        let frame = |health| Frame {
            hud: Some(HudState {
                health: Some(health),
                ..HudState::default()
            }),
            ..Frame::default()
        };

        let hud_lines: Vec<Option<usize>> = (0..11)
            .map(|i| renderer.render(&frame(i)).unwrap().hud_lines)
            .collect();

        let drawn: Vec<usize> = hud_lines
            .iter()
            .enumerate()
            .filter_map(|(i, lines)| lines.map(|_| i))
            .collect();
        assert_eq!(drawn, vec![0, 5, 10]);
        assert_eq!(renderer.stats().hud_updates, 3);
        // Throttled frames leave the last drawn text in place
        assert_eq!(renderer.pools().texts.slot(0).unwrap().text, "HEALTH: 10%");
    }

    #[test]
    fn test_anchor_entities_get_marker_only() {
        let config = KiframeConfig {
            render: RenderConfig {
                entity_markers: false,
                ..RenderConfig::default()
            },
            ..config()
        };
        let mut renderer = renderer(&config);
        let frame = Frame {
            entities: vec![
                imp(),
                Entity::anchor(100.0, 100.0, EntityCategory::Collectible, 90.0),
            ],
            ..Frame::default()
        };

        let report = renderer.render(&frame).unwrap();

        assert_eq!(report.entity_lines, 4);
        assert_eq!(report.labels, 1);
        let marker = renderer
            .pools()
            .labels
            .class(LabelClass::Collectible)
            .slot(0)
            .unwrap();
        assert_eq!(marker.at, renderer.transform().to_target(100.0, 100.0));
        assert!((marker.angle - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_entity_markers_by_category() {
        let mut renderer = renderer(&config());
        let frame = Frame {
            entities: vec![
                imp(),
                imp(),
                Entity::wireframe(10.0, 10.0, 20.0, 5.0, EntityCategory::Unknown, 1.0),
            ],
            ..Frame::default()
        };

        renderer.render(&frame).unwrap();

        let labels = &renderer.pools().labels;
        assert_eq!(labels.class(LabelClass::Enemy).visible_count(), 2);
        assert_eq!(labels.class(LabelClass::Decoration).visible_count(), 1);
        assert_eq!(
            labels.class(LabelClass::Enemy).slot(0).unwrap().at,
            renderer.transform().to_target(160.0, 100.0)
        );
    }

    #[test]
    fn test_non_finite_frame_is_rejected_untouched() {
        let mut renderer = renderer(&config());
        renderer
            .render(&Frame {
                walls: vec![quad(10.0, 3)],
                ..Frame::default()
            })
            .unwrap();

        let bad = Frame {
            sequence: Some(9),
            walls: vec![quad(f64::NAN, 3); 3],
            ..Frame::default()
        };
        let err = renderer.render(&bad).unwrap_err();

        assert_eq!(err, RenderError::NonFiniteGeometry { sequence: Some(9) });
        assert_eq!(renderer.pools().lines.visible_count(), 4);
        assert_eq!(renderer.stats().frames_aborted, 1);
        assert_eq!(renderer.stats().frames_rendered, 1);
    }

    #[test]
    fn test_maintenance_runs_on_interval() {
        let config = KiframeConfig {
            render: RenderConfig {
                cleanup_interval: 3,
                primitive_slack: 10,
                ..RenderConfig::default()
            },
            ..config()
        };
        let mut renderer = renderer(&config);

        for _ in 0..6 {
            renderer.render(&Frame::default()).unwrap();
            renderer.refresh();
        }
        assert_eq!(renderer.stats().maintenance_passes, 2);
        assert_eq!(renderer.surface().stats().reclaim_hints, 2);
        assert_eq!(renderer.stats().maintenance_warnings, 0);

        renderer.surface_mut().add_foreign_primitives(11);
        assert!(!renderer.maintenance());
        assert_eq!(renderer.stats().maintenance_warnings, 1);
    }

    #[test]
    fn test_cleanup_hides_everything() {
        let mut renderer = renderer(&config());
        renderer
            .render(&Frame {
                walls: vec![quad(10.0, 3)],
                projectiles: vec![Point::new(1.0, 1.0)],
                ..Frame::default()
            })
            .unwrap();
        renderer.refresh();

        renderer.cleanup();

        let pools = renderer.pools();
        assert_eq!(pools.lines.visible_count(), 0);
        assert_eq!(pools.markers.visible_count(), 0);
        assert_eq!(renderer.surface().stats().refreshes, 2);
    }

    #[test]
    fn test_projectile_overflow_wraps() {
        let config = KiframeConfig {
            pools: PoolConfig {
                marker_capacity: 4,
                ..PoolConfig::default()
            },
            ..config()
        };
        let mut renderer = renderer(&config);
        let frame = Frame {
            projectiles: (0..6).map(|i| Point::new(f64::from(i), 0.0)).collect(),
            ..Frame::default()
        };

        let report = renderer.render(&frame).unwrap();

        assert_eq!(report.markers, 6);
        assert!(!report.truncated);
        assert_eq!(renderer.pools().markers.visible_count(), 4);
        assert_eq!(renderer.stats().wrapped_slots, 2);
        // Slot 0 now shows projectile 4
        assert_eq!(
            renderer.pools().markers.slot(0).unwrap().at,
            renderer.transform().to_target(4.0, 0.0)
        );
    }
}
