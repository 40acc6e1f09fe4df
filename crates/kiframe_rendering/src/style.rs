//! # Label Styles
//!
//! Closed mapping from entity category to labeled-marker sub-pool and the
//! package outline that marks it on the surface.
//!
//! | Category      | Sub-pool     | Share     | Package  |
//! |---------------|--------------|-----------|----------|
//! | `Enemy`       | `Enemy`      | 1/2       | `QFP-64` |
//! | `Collectible` | `Collectible`| 1/3       | `SOT-23` |
//! | `Decoration`  | `Decoration` | remainder | `SOIC-8` |
//! | `Unknown`     | `Decoration` | -         | `SOIC-8` |

use kiframe_shared::EntityCategory;

/// Labeled-marker sub-pool, each with its own visual style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelClass {
    /// Large outline for monsters.
    Enemy,
    /// Small outline for pickups.
    Collectible,
    /// Medium outline for scenery and anything unrecognised.
    Decoration,
}

impl LabelClass {
    /// Every class, in sub-pool order.
    pub const ALL: [Self; 3] = [Self::Enemy, Self::Collectible, Self::Decoration];

    /// Sub-pool for `category`. Unknown categories share the decoration
    /// sub-pool.
    #[must_use]
    pub const fn for_category(category: EntityCategory) -> Self {
        match category {
            EntityCategory::Enemy => Self::Enemy,
            EntityCategory::Collectible => Self::Collectible,
            EntityCategory::Decoration | EntityCategory::Unknown => Self::Decoration,
        }
    }

    /// Package outline drawn for this class.
    #[must_use]
    pub const fn package(self) -> &'static str {
        match self {
            Self::Enemy => "QFP-64",
            Self::Collectible => "SOT-23",
            Self::Decoration => "SOIC-8",
        }
    }

    /// Position in [`LabelClass::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// This class's share of `total` labeled markers.
    ///
    /// Enemy takes half, collectible a third, decoration the remainder.
    #[must_use]
    pub const fn share(self, total: usize) -> usize {
        match self {
            Self::Enemy => total / 2,
            Self::Collectible => total / 3,
            Self::Decoration => total - total / 2 - total / 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_class() {
        for category in EntityCategory::ALL {
            let class = LabelClass::for_category(category);
            assert!(LabelClass::ALL.contains(&class));
        }
        assert_eq!(
            LabelClass::for_category(EntityCategory::Unknown),
            LabelClass::Decoration
        );
    }

    #[test]
    fn test_default_split() {
        let shares: Vec<usize> = LabelClass::ALL.iter().map(|c| c.share(20)).collect();
        assert_eq!(shares, vec![10, 6, 4]);
    }

    #[test]
    fn test_split_covers_total() {
        for total in 3..100 {
            let sum: usize = LabelClass::ALL.iter().map(|c| c.share(total)).sum();
            assert_eq!(sum, total);
            assert!(LabelClass::ALL.iter().all(|c| c.share(total) > 0));
        }
    }

    #[test]
    fn test_packages_are_distinct() {
        assert_ne!(LabelClass::Enemy.package(), LabelClass::Collectible.package());
        assert_ne!(LabelClass::Collectible.package(), LabelClass::Decoration.package());
        assert_ne!(LabelClass::Enemy.package(), LabelClass::Decoration.package());
    }
}
