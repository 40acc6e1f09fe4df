//! Labeled-marker pool, split into one wrapping sub-pool per class.

use kiframe_shared::EntityCategory;

use super::WrappingPool;
use crate::style::LabelClass;
use crate::surface::Primitive;

/// Per-class usage counts for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LabelUsage([usize; 3]);

impl LabelUsage {
    /// Claims the next index in `class` and returns it.
    pub fn next(&mut self, class: LabelClass) -> usize {
        let slot = &mut self.0[class.index()];
        let index = *slot;
        *slot += 1;
        index
    }

    /// Markers claimed in `class`.
    #[must_use]
    pub const fn used(&self, class: LabelClass) -> usize {
        self.0[class.index()]
    }

    /// Markers claimed, all classes.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.0[0] + self.0[1] + self.0[2]
    }
}

/// Labeled markers grouped by class; each class keeps its own style.
#[derive(Debug)]
pub struct LabelPool<P> {
    classes: [WrappingPool<P>; 3],
}

impl<P: Primitive> LabelPool<P> {
    /// Splits `capacity` across the classes and builds every marker.
    ///
    /// Each class needs at least one slot, so `capacity` must be at least 3.
    pub(crate) fn new(capacity: usize, mut create: impl FnMut(LabelClass) -> P) -> Self {
        Self {
            classes: LabelClass::ALL
                .map(|class| WrappingPool::new(class.share(capacity).max(1), |_| create(class))),
        }
    }

    /// Marker `index` of the sub-pool serving `category`, wrapping within
    /// that sub-pool.
    #[inline]
    pub fn get(&mut self, index: usize, category: EntityCategory) -> &mut P {
        self.class_mut(LabelClass::for_category(category)).get(index)
    }

    /// Hides unused markers in every class.
    pub fn hide_unused(&mut self, usage: &LabelUsage) {
        for class in LabelClass::ALL {
            self.class_mut(class).hide_unused(usage.used(class));
        }
    }

    /// Hides every marker.
    pub fn reset_all(&mut self) {
        self.hide_unused(&LabelUsage::default());
    }

    /// Sub-pool for `class`.
    #[must_use]
    pub fn class(&self, class: LabelClass) -> &WrappingPool<P> {
        &self.classes[class.index()]
    }

    fn class_mut(&mut self, class: LabelClass) -> &mut WrappingPool<P> {
        &mut self.classes[class.index()]
    }

    /// Total capacity across classes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.classes.iter().map(WrappingPool::capacity).sum()
    }

    /// Markers currently visible, all classes.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.classes.iter().map(WrappingPool::visible_count).sum()
    }

    /// Wrapped accesses, all classes.
    #[must_use]
    pub fn wrapped(&self) -> u64 {
        self.classes.iter().map(WrappingPool::wrapped).sum()
    }
}
