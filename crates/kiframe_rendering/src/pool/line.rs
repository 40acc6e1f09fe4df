//! Strict line-segment pool.
//!
//! Walls and entity wireframes share one index space here. Reusing a slot
//! within a frame would tear a wall in half, so running out is reported
//! rather than wrapped.

use kiframe_core::SlotPool;

use crate::error::{PoolError, PoolResult};
use crate::surface::Primitive;

/// Fixed-capacity line pool with hard overflow.
#[derive(Debug)]
pub struct LinePool<L> {
    slots: SlotPool<L>,
}

impl<L: Primitive> LinePool<L> {
    /// Builds the pool, creating every line up front.
    pub(crate) fn new(capacity: usize, create: impl FnMut(usize) -> L) -> Self {
        Self {
            slots: SlotPool::new(capacity, create),
        }
    }

    /// Line at `index`.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` if `index >= capacity`.
    #[inline]
    pub fn get(&mut self, index: usize) -> PoolResult<&mut L> {
        let capacity = self.slots.capacity();
        self.slots
            .get_mut(index)
            .ok_or(PoolError::CapacityExceeded { index, capacity })
    }

    /// Hides every line from `used` to the end.
    pub fn hide_unused(&mut self, used: usize) {
        self.slots.for_each_from(used, Primitive::hide);
    }

    /// Hides every line.
    pub fn reset_all(&mut self) {
        self.hide_unused(0);
    }

    /// Fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Line at `index` for inspection.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&L> {
        self.slots.get(index)
    }

    /// Lines currently visible.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.slots.iter().filter(|line| !line.is_hidden()).count()
    }
}
