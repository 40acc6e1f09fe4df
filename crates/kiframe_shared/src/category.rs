//! # Entity Categories
//!
//! The producer tags every entity either with a numeric map-object code or a
//! name. Both collapse into a closed set of categories here; anything the
//! table does not know becomes [`EntityCategory::Unknown`] instead of an
//! error.
//!
//! ```text
//! code 0..=22 (monsters)        → Enemy
//! code 33..=67 (pickups)        → Collectible
//! code 68, 71..=128 (scenery)   → Decoration
//! everything else               → Unknown
//! ```

use serde::{Deserialize, Serialize};

/// Closed set of entity categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    /// Monsters and the player.
    Enemy,
    /// Health, armor, ammo, weapons, keys, powerups.
    Collectible,
    /// Barrels, pillars, bodies, torches.
    Decoration,
    /// Anything not in the table.
    #[default]
    Unknown,
}

impl EntityCategory {
    /// Every category, in table order.
    pub const ALL: [Self; 4] = [
        Self::Enemy,
        Self::Collectible,
        Self::Decoration,
        Self::Unknown,
    ];

    /// Maps a numeric map-object code.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0..=3 | 5 | 8 | 10..=15 | 17..=22 => Self::Enemy,
            33..=67 => Self::Collectible,
            68 | 71..=128 => Self::Decoration,
            _ => Self::Unknown,
        }
    }

    /// Maps a name. Matching is case-insensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "enemy" | "player" | "imp" | "demon" | "baron" | "cacodemon" | "zombieman"
            | "shotgunner" => Self::Enemy,
            "collectible" | "pickup" | "item" => Self::Collectible,
            "decoration" | "barrel" | "pillar" => Self::Decoration,
            _ => Self::Unknown,
        }
    }

    /// Returns the lowercase name used on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Enemy => "enemy",
            Self::Collectible => "collectible",
            Self::Decoration => "decoration",
            Self::Unknown => "unknown",
        }
    }
}

/// Raw category tag as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKind {
    /// Numeric map-object code.
    Code(i64),
    /// Category or monster name.
    Name(String),
}

impl EntityKind {
    /// Resolves the tag to a category.
    #[must_use]
    pub fn category(&self) -> EntityCategory {
        match self {
            Self::Code(code) => EntityCategory::from_code(*code),
            Self::Name(name) => EntityCategory::from_name(name),
        }
    }
}

impl Default for EntityKind {
    fn default() -> Self {
        Self::Name(EntityCategory::Unknown.name().to_string())
    }
}

impl From<EntityCategory> for EntityKind {
    fn from(category: EntityCategory) -> Self {
        Self::Name(category.name().to_string())
    }
}
