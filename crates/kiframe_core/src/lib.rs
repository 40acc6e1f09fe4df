//! # KIFRAME Core
//!
//! Bounded storage shared by the transport and rendering crates:
//! - Fixed-capacity slot pools whose members are created exactly once
//! - A drop-oldest queue that always prefers the freshest item
//!
//! ## Architecture Rules
//!
//! 1. **No allocation after construction** - pools and queues size themselves up front
//! 2. **Freshness over completeness** - a full queue evicts, it never blocks the producer
//! 3. **Capacity is a policy decision** - callers choose between strict and wrapping access
//!
//! ## Example
//!
//! ```rust
//! use kiframe_core::{DropOldestQueue, SlotPool};
//!
//! let mut pool = SlotPool::new(4, |index| index * 10);
//! assert_eq!(*pool.get_wrapping(5), 10);
//!
//! let queue = DropOldestQueue::new(2);
//! queue.push(1);
//! queue.push(2);
//! assert_eq!(queue.push(3), Some(1));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;
pub mod sync;

pub use memory::SlotPool;
pub use sync::{DropOldestQueue, QueueStats};
