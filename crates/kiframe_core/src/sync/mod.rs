//! # Cross-Thread Hand-off
//!
//! ## The Problem
//!
//! ```text
//! Receive thread:   decodes frames as fast as the peer sends them
//! Dispatch thread:  renders one frame per tick
//!
//! Unbounded queue:  latency grows without limit → stale display
//! Blocking queue:   receive thread stalls → socket backs up
//! ```
//!
//! ## The Solution: Drop-Oldest
//!
//! ```text
//! capacity = 2
//!
//! push F1  → [F1]
//! push F2  → [F1, F2]
//! push F3  → [F2, F3]      (F1 evicted)
//! pop      → F2, [F3]
//! ```
//!
//! The producer never waits. The consumer always sees items in the order they
//! were pushed, with gaps under load.

mod drop_oldest;

pub use drop_oldest::{DropOldestQueue, QueueStats};
