//! Wrap-around pool for point markers, text and each labeled-marker class.
//!
//! Overflow here only aliases a cosmetic primitive, so indices past the end
//! land on `index % capacity` and are counted instead of refused.

use kiframe_core::SlotPool;

use crate::surface::Primitive;

/// Fixed-capacity pool with modulo indexing.
#[derive(Debug)]
pub struct WrappingPool<P> {
    slots: SlotPool<P>,
    /// Accesses that landed past the end.
    wrapped: u64,
}

impl<P: Primitive> WrappingPool<P> {
    /// Builds the pool, creating every member up front.
    pub(crate) fn new(capacity: usize, create: impl FnMut(usize) -> P) -> Self {
        Self {
            slots: SlotPool::new(capacity, create),
            wrapped: 0,
        }
    }

    /// Member at `index % capacity`.
    #[inline]
    pub fn get(&mut self, index: usize) -> &mut P {
        if index >= self.slots.capacity() {
            self.wrapped += 1;
        }
        self.slots.get_wrapping(index)
    }

    /// Hides every member from `used` to the end. A `used` past capacity
    /// hides nothing.
    pub fn hide_unused(&mut self, used: usize) {
        self.slots.for_each_from(used, Primitive::hide);
    }

    /// Hides every member.
    pub fn reset_all(&mut self) {
        self.hide_unused(0);
    }

    /// Fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Member at `index` for inspection, without wrapping.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&P> {
        self.slots.get(index)
    }

    /// Members currently visible.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.slots.iter().filter(|p| !p.is_hidden()).count()
    }

    /// Accesses that wrapped since construction.
    #[must_use]
    pub const fn wrapped(&self) -> u64 {
        self.wrapped
    }
}
