//! # Slot Pool
//!
//! Fixed-capacity array of reusable members, addressed by index.
//!
//! Unlike an allocator, a slot pool never hands out "free" slots: every slot
//! holds a live member from construction until the pool is dropped. Callers
//! claim slots `0..used` each frame and retract the rest.

/// A fixed array of pre-built members.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It is meant to be owned by exactly one thread.
///
/// # Example
///
/// ```rust
/// use kiframe_core::SlotPool;
///
/// let mut pool: SlotPool<(i32, bool)> = SlotPool::new(3, |_| (0, false));
///
/// // Strict access - out of range is reported, not wrapped
/// assert!(pool.get_mut(3).is_none());
///
/// // Wrapping access - index 4 lands on slot 1
/// pool.get_wrapping(4).0 = 7;
/// assert_eq!(pool.get(1).map(|slot| slot.0), Some(7));
///
/// // Retract everything from slot 1 onwards
/// pool.for_each_from(1, |slot| slot.1 = true);
/// assert_eq!(pool.get(0).map(|slot| slot.1), Some(false));
/// ```
#[derive(Debug)]
pub struct SlotPool<T> {
    /// The members, created once.
    slots: Box<[T]>,
}

impl<T> SlotPool<T> {
    /// Creates a pool by calling `factory` once per slot.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Configuration validation rejects zero
    /// capacities long before a pool is built.
    #[must_use]
    pub fn new(capacity: usize, factory: impl FnMut(usize) -> T) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        let slots: Vec<T> = (0..capacity).map(factory).collect();

        Self {
            slots: slots.into_boxed_slice(),
        }
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot at `index`, or `None` past capacity.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// Returns the slot at `index` mutably, or `None` past capacity.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)
    }

    /// Returns the slot at `index % capacity`.
    #[inline]
    pub fn get_wrapping(&mut self, index: usize) -> &mut T {
        let len = self.slots.len();
        &mut self.slots[index % len]
    }

    /// Applies `f` to every slot from `start` to the end.
    ///
    /// A `start` at or past capacity touches nothing.
    pub fn for_each_from(&mut self, start: usize, mut f: impl FnMut(&mut T)) {
        if let Some(tail) = self.slots.get_mut(start..) {
            tail.iter_mut().for_each(&mut f);
        }
    }

    /// Iterates over all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    /// Iterates mutably over all slots in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_called_once_per_slot() {
        let mut calls = 0;
        let pool = SlotPool::new(5, |index| {
            calls += 1;
            index
        });

        assert_eq!(calls, 5);
        assert_eq!(pool.capacity(), 5);
        assert_eq!(pool.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_strict_access_reports_overflow() {
        let mut pool = SlotPool::new(2, |_| 0u8);

        assert!(pool.get_mut(1).is_some());
        assert!(pool.get_mut(2).is_none());
        assert!(pool.get(usize::MAX).is_none());
    }

    #[test]
    fn test_wrapping_access() {
        let mut pool = SlotPool::new(3, |_| 0u32);

        for index in 0..7 {
            *pool.get_wrapping(index) += 1;
        }

        // 0,3,6 → slot 0; 1,4 → slot 1; 2,5 → slot 2
        assert_eq!(pool.iter().copied().collect::<Vec<_>>(), vec![3, 2, 2]);
    }

    #[test]
    fn test_for_each_from() {
        let mut pool = SlotPool::new(4, |_| false);

        pool.for_each_from(2, |hidden| *hidden = true);
        assert_eq!(
            pool.iter().copied().collect::<Vec<_>>(),
            vec![false, false, true, true]
        );

        // Past capacity is a no-op
        pool.for_each_from(9, |hidden| *hidden = false);
        assert!(pool.get(3).copied().unwrap_or(false));
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than zero")]
    fn test_zero_capacity_rejected() {
        let _ = SlotPool::new(0, |_| ());
    }
}
