//! # Memory Management
//!
//! Pre-allocated slot pools for zero-allocation rendering.
//!
//! ## Design Philosophy
//!
//! Every member is created once at startup. While frames are flowing:
//! - No member is created
//! - No member is destroyed
//! - Only existing members are mutated

mod slot_pool;

pub use slot_pool::SlotPool;
