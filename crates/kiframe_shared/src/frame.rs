//! # Frame Model
//!
//! One simulation tick's renderable state, as carried in a `FRAME_DATA`
//! payload.
//!
//! ## Wire Forms
//!
//! Producers in the field emit several shapes for the same data. All of them
//! decode into the same types:
//!
//! ```text
//! walls:        [x1,y1,x2,y2,d]                         → Segment
//!               [x1,yt1,yb1,x2,yt2,yb2,d]               → Quad (solid)
//!               [x1,yt1,yb1,x2,yt2,yb2,d,silhouette]    → Quad
//!               {x1,y1,x2,y2,distance}                  → Segment
//!               {x1,y_top1,y_bottom1,...,silhouette}    → Quad
//!
//! entities:     {x,y_top,y_bottom,height,category,distance}   → Wireframe
//!               {x,y,type,angle[,size][,distance]}            → Anchor / boxed
//!               [x,y,type,angle]                              → Anchor
//!
//! projectiles:  {x,y} or [x,y]
//!
//! hud:          {health,ammo,armor,keys} or [{text}, ...]
//! ```

use serde::{Deserialize, Serialize};

use crate::category::{EntityCategory, EntityKind};

/// Silhouette value assumed when the producer does not send one.
pub const SOLID_SILHOUETTE: i64 = 3;

/// One simulation tick's renderable state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    /// Producer's frame counter, if sent.
    #[serde(rename = "frame", skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// Wall segments in encounter order.
    pub walls: Vec<WallSegment>,
    /// Visible entities.
    pub entities: Vec<Entity>,
    /// Projectile positions.
    pub projectiles: Vec<Point>,
    /// HUD state. `None` when the producer sent none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hud: Option<HudState>,
}

impl Frame {
    /// Decodes a frame document.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the document is malformed or a member has
    /// an unsupported shape.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encodes the frame as a JSON document.
    ///
    /// # Errors
    ///
    /// Only fails on non-finite numbers.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Number of line edges this frame asks for (portals excluded).
    #[must_use]
    pub fn edge_demand(&self) -> usize {
        let walls: usize = self.walls.iter().map(WallSegment::edge_count).sum();
        let entities = self
            .entities
            .iter()
            .filter(|entity| entity.shape == EntityShape::Wireframe)
            .count()
            * 4;
        walls + entities
    }

    /// True if every coordinate in the frame is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.walls.iter().all(WallSegment::is_finite)
            && self.entities.iter().all(Entity::is_finite)
            && self.projectiles.iter().all(Point::is_finite)
    }
}

// =============================================================================
// WALLS
// =============================================================================

/// A wall as seen from the player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WallRepr", into = "WallRepr")]
pub enum WallSegment {
    /// Single line, legacy producers.
    Segment {
        /// Start X.
        x1: f64,
        /// Start Y.
        y1: f64,
        /// End X.
        x2: f64,
        /// End Y.
        y2: f64,
        /// Distance from the player.
        distance: f64,
    },
    /// Wireframe quad: top edge, bottom edge and both verticals.
    Quad {
        /// Left X.
        x1: f64,
        /// Top Y at `x1`.
        y_top1: f64,
        /// Bottom Y at `x1`.
        y_bottom1: f64,
        /// Right X.
        x2: f64,
        /// Top Y at `x2`.
        y_top2: f64,
        /// Bottom Y at `x2`.
        y_bottom2: f64,
        /// Distance from the player.
        distance: f64,
        /// Solidity; zero marks a portal.
        silhouette: i64,
    },
}

impl WallSegment {
    /// Distance from the player.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        match self {
            Self::Segment { distance, .. } | Self::Quad { distance, .. } => *distance,
        }
    }

    /// True for a quad with `silhouette == 0`.
    #[must_use]
    pub const fn is_portal(&self) -> bool {
        matches!(self, Self::Quad { silhouette: 0, .. })
    }

    /// Line edges this wall contributes: 4 per solid quad, 1 per segment,
    /// 0 per portal.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        match self {
            Self::Segment { .. } => 1,
            Self::Quad { silhouette: 0, .. } => 0,
            Self::Quad { .. } => 4,
        }
    }

    /// Source-space edges in emission order: top, bottom, left, right.
    /// A segment yields only its first slot.
    #[must_use]
    pub fn edges(&self) -> [((f64, f64), (f64, f64)); 4] {
        match *self {
            Self::Segment { x1, y1, x2, y2, .. } => {
                let edge = ((x1, y1), (x2, y2));
                [edge; 4]
            }
            Self::Quad {
                x1,
                y_top1,
                y_bottom1,
                x2,
                y_top2,
                y_bottom2,
                ..
            } => [
                ((x1, y_top1), (x2, y_top2)),
                ((x1, y_bottom1), (x2, y_bottom2)),
                ((x1, y_top1), (x1, y_bottom1)),
                ((x2, y_top2), (x2, y_bottom2)),
            ],
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            Self::Segment {
                x1,
                y1,
                x2,
                y2,
                distance,
            } => [x1, y1, x2, y2, distance].iter().all(|v| v.is_finite()),
            Self::Quad {
                x1,
                y_top1,
                y_bottom1,
                x2,
                y_top2,
                y_bottom2,
                distance,
                ..
            } => [x1, y_top1, y_bottom1, x2, y_top2, y_bottom2, distance]
                .iter()
                .all(|v| v.is_finite()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WallRepr {
    Array(Vec<f64>),
    Quad {
        x1: f64,
        y_top1: f64,
        y_bottom1: f64,
        x2: f64,
        y_top2: f64,
        y_bottom2: f64,
        #[serde(default)]
        distance: f64,
        #[serde(default = "solid_silhouette")]
        silhouette: i64,
    },
    Segment {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        #[serde(default)]
        distance: f64,
    },
}

const fn solid_silhouette() -> i64 {
    SOLID_SILHOUETTE
}

impl TryFrom<WallRepr> for WallSegment {
    type Error = String;

    #[allow(clippy::cast_possible_truncation)]
    fn try_from(repr: WallRepr) -> Result<Self, Self::Error> {
        Ok(match repr {
            WallRepr::Quad {
                x1,
                y_top1,
                y_bottom1,
                x2,
                y_top2,
                y_bottom2,
                distance,
                silhouette,
            } => Self::Quad {
                x1,
                y_top1,
                y_bottom1,
                x2,
                y_top2,
                y_bottom2,
                distance,
                silhouette,
            },
            WallRepr::Segment {
                x1,
                y1,
                x2,
                y2,
                distance,
            } => Self::Segment {
                x1,
                y1,
                x2,
                y2,
                distance,
            },
            WallRepr::Array(values) => match values.as_slice() {
                &[x1, y1, x2, y2, distance] => Self::Segment {
                    x1,
                    y1,
                    x2,
                    y2,
                    distance,
                },
                &[x1, y_top1, y_bottom1, x2, y_top2, y_bottom2, distance] => Self::Quad {
                    x1,
                    y_top1,
                    y_bottom1,
                    x2,
                    y_top2,
                    y_bottom2,
                    distance,
                    silhouette: SOLID_SILHOUETTE,
                },
                &[x1, y_top1, y_bottom1, x2, y_top2, y_bottom2, distance, silhouette, ..] => {
                    Self::Quad {
                        x1,
                        y_top1,
                        y_bottom1,
                        x2,
                        y_top2,
                        y_bottom2,
                        distance,
                        silhouette: silhouette as i64,
                    }
                }
                other => return Err(format!("wall array has {} elements", other.len())),
            },
        })
    }
}

impl From<WallSegment> for WallRepr {
    fn from(wall: WallSegment) -> Self {
        match wall {
            WallSegment::Segment {
                x1,
                y1,
                x2,
                y2,
                distance,
            } => Self::Segment {
                x1,
                y1,
                x2,
                y2,
                distance,
            },
            WallSegment::Quad {
                x1,
                y_top1,
                y_bottom1,
                x2,
                y_top2,
                y_bottom2,
                distance,
                silhouette,
            } => Self::Quad {
                x1,
                y_top1,
                y_bottom1,
                x2,
                y_top2,
                y_bottom2,
                distance,
                silhouette,
            },
        }
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// How an entity is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EntityShape {
    /// Four-edge box around the sprite plus a labeled marker.
    #[default]
    Wireframe,
    /// Labeled marker only (legacy producers without extent).
    Anchor,
}

/// A visible entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntityRepr", into = "EntityRepr")]
pub struct Entity {
    /// Centre X.
    pub x: f64,
    /// Top of the sprite.
    pub y_top: f64,
    /// Bottom of the sprite.
    pub y_bottom: f64,
    /// Box width, centred on `x`.
    pub height: f64,
    /// Resolved category.
    pub category: EntityCategory,
    /// Distance from the player.
    pub distance: f64,
    /// Facing, degrees counter-clockwise from east.
    pub angle: f64,
    /// Wireframe box or marker only.
    pub shape: EntityShape,
}

impl Entity {
    /// Creates a wireframe entity.
    #[must_use]
    pub const fn wireframe(
        x: f64,
        y_top: f64,
        y_bottom: f64,
        height: f64,
        category: EntityCategory,
        distance: f64,
    ) -> Self {
        Self {
            x,
            y_top,
            y_bottom,
            height,
            category,
            distance,
            angle: 0.0,
            shape: EntityShape::Wireframe,
        }
    }

    /// Creates a marker-only entity.
    #[must_use]
    pub const fn anchor(x: f64, y: f64, category: EntityCategory, angle: f64) -> Self {
        Self {
            x,
            y_top: y,
            y_bottom: y,
            height: 0.0,
            category,
            distance: 0.0,
            angle,
            shape: EntityShape::Anchor,
        }
    }

    /// Centre of the box.
    #[must_use]
    pub fn centre(&self) -> (f64, f64) {
        (self.x, (self.y_top + self.y_bottom) / 2.0)
    }

    /// Source-space box edges: top, bottom, left, right.
    #[must_use]
    pub fn edges(&self) -> [((f64, f64), (f64, f64)); 4] {
        let half = self.height / 2.0;
        let (left, right) = (self.x - half, self.x + half);
        [
            ((left, self.y_top), (right, self.y_top)),
            ((left, self.y_bottom), (right, self.y_bottom)),
            ((left, self.y_top), (left, self.y_bottom)),
            ((right, self.y_top), (right, self.y_bottom)),
        ]
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y_top, self.y_bottom, self.height, self.distance, self.angle]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EntityRepr {
    Tuple(f64, f64, EntityKind, f64),
    Wireframe {
        x: f64,
        y_top: f64,
        y_bottom: f64,
        height: f64,
        #[serde(alias = "type", default)]
        category: EntityKind,
        #[serde(default)]
        distance: f64,
    },
    Legacy {
        x: f64,
        y: f64,
        #[serde(rename = "type", alias = "category", default)]
        kind: EntityKind,
        #[serde(default)]
        angle: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<f64>,
        #[serde(default)]
        distance: f64,
    },
}

impl From<EntityRepr> for Entity {
    fn from(repr: EntityRepr) -> Self {
        match repr {
            EntityRepr::Wireframe {
                x,
                y_top,
                y_bottom,
                height,
                category,
                distance,
            } => Self::wireframe(x, y_top, y_bottom, height, category.category(), distance),
            EntityRepr::Legacy {
                x,
                y,
                kind,
                angle,
                size,
                distance,
            } => match size {
                Some(size) if size > 0.0 => Self {
                    angle,
                    ..Self::wireframe(
                        x,
                        y - size / 2.0,
                        y + size / 2.0,
                        size,
                        kind.category(),
                        distance,
                    )
                },
                _ => Self {
                    distance,
                    ..Self::anchor(x, y, kind.category(), angle)
                },
            },
            EntityRepr::Tuple(x, y, kind, angle) => Self::anchor(x, y, kind.category(), angle),
        }
    }
}

impl From<Entity> for EntityRepr {
    fn from(entity: Entity) -> Self {
        match entity.shape {
            EntityShape::Wireframe => Self::Wireframe {
                x: entity.x,
                y_top: entity.y_top,
                y_bottom: entity.y_bottom,
                height: entity.height,
                category: entity.category.into(),
                distance: entity.distance,
            },
            EntityShape::Anchor => Self::Legacy {
                x: entity.x,
                y: entity.y_top,
                kind: entity.category.into(),
                angle: entity.angle,
                size: None,
                distance: entity.distance,
            },
        }
    }
}

// =============================================================================
// PROJECTILES
// =============================================================================

/// A projectile position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointRepr")]
pub struct Point {
    /// X.
    pub x: f64,
    /// Y.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Array(Vec<f64>),
    Object { x: f64, y: f64 },
}

impl TryFrom<PointRepr> for Point {
    type Error = String;

    fn try_from(repr: PointRepr) -> Result<Self, Self::Error> {
        match repr {
            PointRepr::Object { x, y } => Ok(Self { x, y }),
            PointRepr::Array(values) => match values.as_slice() {
                &[x, y, ..] => Ok(Self { x, y }),
                other => Err(format!("projectile array has {} elements", other.len())),
            },
        }
    }
}

// =============================================================================
// HUD
// =============================================================================

/// A free-form HUD line sent by list-style producers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HudText {
    /// Line content.
    pub text: String,
    /// Optional source-space X.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Optional source-space Y.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// HUD fields. Absent fields produce no line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HudRepr")]
pub struct HudState {
    /// Health percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<i64>,
    /// Ammo for the current weapon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ammo: Option<i64>,
    /// Armor percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub armor: Option<i64>,
    /// Held keys.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    /// Free-form lines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<HudText>,
}

/// A laid-out HUD line in source space.
#[derive(Clone, Debug, PartialEq)]
pub struct HudLine {
    /// Source-space X.
    pub x: f64,
    /// Source-space Y.
    pub y: f64,
    /// Text.
    pub text: String,
}

/// Status bar row.
const STATUS_ROW_Y: f64 = 190.0;

/// First free-form row and row pitch.
const FREE_ROW_Y: f64 = 10.0;
const FREE_ROW_PITCH: f64 = 12.0;

impl HudState {
    /// Lays out the HUD in fixed order: HEALTH, AMMO, ARMOR, KEYS, then
    /// free-form lines.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn layout(&self) -> Vec<HudLine> {
        let mut out = Vec::with_capacity(4 + self.lines.len());
        let mut status = |x: f64, text: String| {
            out.push(HudLine {
                x,
                y: STATUS_ROW_Y,
                text,
            });
        };

        if let Some(health) = self.health {
            status(10.0, format!("HEALTH: {health}%"));
        }
        if let Some(ammo) = self.ammo {
            status(80.0, format!("AMMO: {ammo}"));
        }
        if let Some(armor) = self.armor {
            status(150.0, format!("ARMOR: {armor}%"));
        }
        if !self.keys.is_empty() {
            let keys: Vec<String> = self.keys.iter().map(|k| k.to_uppercase()).collect();
            status(220.0, format!("KEYS: {}", keys.join(" ")));
        }

        for (row, line) in self.lines.iter().enumerate() {
            out.push(HudLine {
                x: line.x.unwrap_or(10.0),
                y: line
                    .y
                    .unwrap_or(FREE_ROW_Y + FREE_ROW_PITCH * row as f64),
                text: line.text.clone(),
            });
        }
        out
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HudRepr {
    Lines(Vec<HudText>),
    Fields {
        #[serde(default)]
        health: Option<i64>,
        #[serde(default)]
        ammo: Option<i64>,
        #[serde(default)]
        armor: Option<i64>,
        #[serde(default)]
        keys: Vec<String>,
        #[serde(default)]
        lines: Vec<HudText>,
    },
}

impl From<HudRepr> for HudState {
    fn from(repr: HudRepr) -> Self {
        match repr {
            HudRepr::Lines(lines) => Self {
                lines,
                ..Self::default()
            },
            HudRepr::Fields {
                health,
                ammo,
                armor,
                keys,
                lines,
            } => Self {
                health,
                ammo,
                armor,
                keys,
                lines,
            },
        }
    }
}
