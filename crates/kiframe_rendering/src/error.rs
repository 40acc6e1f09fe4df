//! Error types for pools and the renderer.

use thiserror::Error;

/// Pool access errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A strict pool was asked for a slot past its end.
    #[error("slot {index} is past pool capacity {capacity}")]
    CapacityExceeded {
        /// Requested slot.
        index: usize,
        /// Pool capacity.
        capacity: usize,
    },
}

/// Result type for pool access.
pub type PoolResult<T> = Result<T, PoolError>;

/// Reasons a frame is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The frame carries NaN or infinite coordinates.
    #[error("frame {sequence:?} has non-finite geometry")]
    NonFiniteGeometry {
        /// Producer's frame number, if sent.
        sequence: Option<u64>,
    },
}

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;
