//! # Wire & Default Constants
//!
//! Values both peers must agree on, plus the defaults the configuration
//! falls back to.
//!
//! **CRITICAL:** The message type codes are baked into the producer binary.
//! Changing them breaks interoperability.

use serde::{Deserialize, Serialize};

// =============================================================================
// WIRE PROTOCOL
// =============================================================================

/// Message type carried in the first header word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum MessageType {
    /// Producer → renderer, payload is a frame document.
    FrameData = 0x01,
    /// Renderer → producer, payload is `{pressed, key}`.
    KeyEvent = 0x02,
    /// Renderer → producer, empty payload, sent once after accept.
    InitComplete = 0x03,
    /// Either direction, empty payload, graceful termination.
    Shutdown = 0x04,
}

impl MessageType {
    /// Returns the wire code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Parses a wire code. Unknown codes return `None`.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0x01 => Some(Self::FrameData),
            0x02 => Some(Self::KeyEvent),
            0x03 => Some(Self::InitComplete),
            0x04 => Some(Self::Shutdown),
            _ => None,
        }
    }
}

/// Size of the message header (type + length).
pub const HEADER_SIZE: usize = 8;

/// Largest payload accepted by default (16 MiB).
pub const DEFAULT_MAX_PAYLOAD_LEN: u32 = 16 * 1024 * 1024;

// =============================================================================
// TRANSPORT DEFAULTS
// =============================================================================

/// Rendezvous path shared with the unmodified producer.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/kicad_doom.sock";

/// How long `accept` waits for the producer.
pub const DEFAULT_ACCEPT_TIMEOUT_MS: u64 = 10_000;

/// Idle timeout on each socket read.
pub const DEFAULT_RECV_TIMEOUT_MS: u64 = 1_000;

/// Cap on a single blocking write to a peer that stopped reading.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 1_000;

/// Bounded wait when joining the receive thread.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 2_000;

/// Frame queue depth.
pub const DEFAULT_QUEUE_DEPTH: usize = 2;

// =============================================================================
// POOL DEFAULTS
// =============================================================================

/// Line pool: 70 walls × 4 edges + 10 entities × 4 edges.
pub const DEFAULT_LINE_CAPACITY: usize = 320;

/// Point markers (projectiles).
pub const DEFAULT_MARKER_CAPACITY: usize = 50;

/// Labeled markers (entities), split across categories.
pub const DEFAULT_LABEL_CAPACITY: usize = 20;

/// Text slots (HUD lines).
pub const DEFAULT_TEXT_CAPACITY: usize = 10;

// =============================================================================
// RENDER DEFAULTS
// =============================================================================

/// Walls closer than this use the near style.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 100.0;

/// Near line width (0.3 mm).
pub const NEAR_LINE_WIDTH: i64 = 300_000;

/// Far line width (0.15 mm).
pub const FAR_LINE_WIDTH: i64 = 150_000;

/// Point marker diameter (0.6 mm).
pub const MARKER_DIAMETER: i64 = 600_000;

/// Text glyph height (2 mm).
pub const TEXT_SIZE: i64 = 2_000_000;

/// HUD is re-rendered every N frames.
pub const DEFAULT_HUD_INTERVAL: u64 = 5;

/// Maintenance pass every N frames.
pub const DEFAULT_CLEANUP_INTERVAL: u64 = 500;

/// Statistics log line every N frames.
pub const DEFAULT_STATS_LOG_INTERVAL: u64 = 100;

/// Frames slower than this are counted as slow.
pub const DEFAULT_SLOW_FRAME_MS: u64 = 50;

/// Dispatcher tick period (~30 Hz).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 30;

/// Extra primitives tolerated in the surface before the maintenance pass warns.
pub const DEFAULT_PRIMITIVE_SLACK: usize = 500;

// =============================================================================
// TRANSFORM DEFAULTS
// =============================================================================

/// Source screen width.
pub const SOURCE_WIDTH: f64 = 320.0;

/// Source screen height.
pub const SOURCE_HEIGHT: f64 = 200.0;

/// Target units (nm) per source unit (0.5 mm per pixel).
pub const SOURCE_TO_TARGET_SCALE: f64 = 500_000.0;

/// Target X the source centre lands on (A4 centre, 148.5 mm).
pub const TARGET_CENTER_X: i64 = 148_500_000;

/// Target Y the source centre lands on (A4 centre, 105 mm).
pub const TARGET_CENTER_Y: i64 = 105_000_000;

/// Where hidden point/label/text primitives are parked.
pub const OFF_SURFACE: i64 = -1_000_000_000;
