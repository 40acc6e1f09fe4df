//! # KIFRAME Shared
//!
//! Types used by both ends of the frame stream.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - a rendering surface
//! - socket or thread management
//!
//! If you need primitives, put them in `kiframe_rendering`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod category;
pub mod config;
pub mod constants;
pub mod frame;
pub mod transform;

pub use category::{EntityCategory, EntityKind};
pub use config::{
    ConfigError, ConfigResult, KiframeConfig, Layer, LineStyle, PoolConfig, RenderConfig,
    TransformConfig, TransportConfig,
};
pub use constants::MessageType;
pub use frame::{Entity, EntityShape, Frame, HudLine, HudState, HudText, Point, WallSegment};
pub use transform::{CoordinateTransform, SourceBounds, TargetBounds, TargetPoint};
