//! # Synthetic Scene
//!
//! Deterministic frame generator standing in for a simulation process.
//!
//! Each frame is a corridor of wall columns spanning the source viewport
//! whose depth breathes over time, with every seventh column left open as a
//! portal. Entities drift left to right cycling through the categories and
//! projectiles orbit the centre. The HUD counts down health and ammo.

use std::f64::consts::TAU;

use kiframe_shared::constants::{SOURCE_HEIGHT, SOURCE_WIDTH};
use kiframe_shared::frame::SOLID_SILHOUETTE;
use kiframe_shared::{Entity, EntityCategory, Frame, HudState, Point, WallSegment};

/// Every n-th wall column is a portal.
const PORTAL_STRIDE: usize = 7;

/// Nearest and farthest wall distance.
const MIN_DISTANCE: f64 = 40.0;
const MAX_DISTANCE: f64 = 160.0;

/// Radians advanced per frame.
const PHASE_STEP: f64 = 0.05;

const ENTITY_CATEGORIES: [EntityCategory; 3] = [
    EntityCategory::Enemy,
    EntityCategory::Collectible,
    EntityCategory::Decoration,
];

/// Endless frame source.
#[derive(Clone, Debug)]
pub struct SyntheticScene {
    walls: usize,
    entities: usize,
    projectiles: usize,
    sequence: u64,
}

impl SyntheticScene {
    /// Creates a scene with fixed element counts.
    #[must_use]
    pub const fn new(walls: usize, entities: usize, projectiles: usize) -> Self {
        Self {
            walls,
            entities,
            projectiles,
            sequence: 0,
        }
    }

    /// Frame number the next frame will carry.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Produces the next frame.
    #[allow(clippy::cast_precision_loss)]
    pub fn next_frame(&mut self) -> Frame {
        let sequence = self.sequence;
        self.sequence += 1;
        let phase = sequence as f64 * PHASE_STEP;

        Frame {
            sequence: Some(sequence),
            walls: self.walls(phase),
            entities: self.entities(sequence, phase),
            projectiles: self.projectiles(phase),
            hud: Some(hud(sequence)),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn walls(&self, phase: f64) -> Vec<WallSegment> {
        if self.walls == 0 {
            return Vec::new();
        }
        let column = SOURCE_WIDTH / self.walls as f64;
        let horizon = SOURCE_HEIGHT / 2.0;

        let depth = |x: f64| {
            let wave = 0.5 + 0.5 * (phase + x / SOURCE_WIDTH * TAU).sin();
            MIN_DISTANCE + (MAX_DISTANCE - MIN_DISTANCE) * wave
        };
        let half_height = |distance: f64| (4000.0 / distance).min(horizon - 1.0);

        (0..self.walls)
            .map(|i| {
                let x1 = column * i as f64;
                let x2 = x1 + column;
                let (d1, d2) = (depth(x1), depth(x2));
                WallSegment::Quad {
                    x1,
                    y_top1: horizon - half_height(d1),
                    y_bottom1: horizon + half_height(d1),
                    x2,
                    y_top2: horizon - half_height(d2),
                    y_bottom2: horizon + half_height(d2),
                    distance: (d1 + d2) / 2.0,
                    silhouette: if i % PORTAL_STRIDE == PORTAL_STRIDE - 1 {
                        0
                    } else {
                        SOLID_SILHOUETTE
                    },
                }
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn entities(&self, sequence: u64, phase: f64) -> Vec<Entity> {
        let spacing = SOURCE_WIDTH / (self.entities.max(1) as f64);
        let drift = (sequence % 320) as f64;

        (0..self.entities)
            .map(|i| {
                let x = (spacing * i as f64 + drift) % SOURCE_WIDTH;
                let distance = MIN_DISTANCE + 20.0 * i as f64;
                let height = (1600.0 / distance).clamp(4.0, 60.0);
                let bob = 4.0 * (phase + i as f64).sin();
                let bottom = SOURCE_HEIGHT / 2.0 + height / 2.0 + bob;
                Entity::wireframe(
                    x,
                    bottom - height,
                    bottom,
                    height,
                    ENTITY_CATEGORIES[i % ENTITY_CATEGORIES.len()],
                    distance,
                )
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn projectiles(&self, phase: f64) -> Vec<Point> {
        let (cx, cy) = (SOURCE_WIDTH / 2.0, SOURCE_HEIGHT / 2.0);

        (0..self.projectiles)
            .map(|i| {
                let angle = phase + TAU * i as f64 / self.projectiles as f64;
                let radius = 30.0 + 5.0 * (i % 8) as f64;
                Point::new(cx + radius * angle.cos(), cy + radius * angle.sin())
            })
            .collect()
    }
}

impl Default for SyntheticScene {
    fn default() -> Self {
        Self::new(40, 6, 10)
    }
}

impl Iterator for SyntheticScene {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        Some(self.next_frame())
    }
}

#[allow(clippy::cast_possible_wrap)]
fn hud(sequence: u64) -> HudState {
    let tick = (sequence % 100) as i64;
    HudState {
        health: Some(100 - tick),
        ammo: Some(50 - tick / 2),
        armor: (tick % 2 == 0).then_some(tick),
        keys: if tick >= 50 {
            vec!["blue".to_string()]
        } else {
            Vec::new()
        },
        lines: Vec::new(),
    }
}
