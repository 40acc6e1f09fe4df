//! # Configuration
//!
//! One [`KiframeConfig`] is built at startup and handed to every component
//! that needs it. Nothing reads settings from globals.
//!
//! ```toml
//! [transport]
//! socket_path = "/tmp/kicad_doom.sock"
//! accept_timeout_ms = 10000
//!
//! [pools]
//! line_capacity = 320
//!
//! [render]
//! hud_interval = 5
//! near_style = { width = 300000, layer = "front" }
//! ```
//!
//! Every field is optional; missing fields take the production defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_ACCEPT_TIMEOUT_MS, DEFAULT_CLEANUP_INTERVAL, DEFAULT_DISTANCE_THRESHOLD,
    DEFAULT_HUD_INTERVAL, DEFAULT_JOIN_TIMEOUT_MS, DEFAULT_LABEL_CAPACITY,
    DEFAULT_LINE_CAPACITY, DEFAULT_MARKER_CAPACITY, DEFAULT_MAX_PAYLOAD_LEN,
    DEFAULT_PRIMITIVE_SLACK, DEFAULT_QUEUE_DEPTH, DEFAULT_RECV_TIMEOUT_MS,
    DEFAULT_SEND_TIMEOUT_MS, DEFAULT_SLOW_FRAME_MS, DEFAULT_SOCKET_PATH,
    DEFAULT_STATS_LOG_INTERVAL, DEFAULT_TEXT_CAPACITY, DEFAULT_TICK_INTERVAL_MS, FAR_LINE_WIDTH,
    MARKER_DIAMETER, NEAR_LINE_WIDTH, SOURCE_HEIGHT, SOURCE_TO_TARGET_SCALE, SOURCE_WIDTH,
    TARGET_CENTER_X, TARGET_CENTER_Y, TEXT_SIZE,
};

/// Environment variable enabling debug diagnostics.
pub const ENV_DEBUG: &str = "KIFRAME_DEBUG";

/// Environment variable enabling per-frame timing logs.
pub const ENV_LOG_FRAMES: &str = "KIFRAME_LOG_FRAMES";

/// Environment variable overriding the rendezvous path.
pub const ENV_SOCKET: &str = "KIFRAME_SOCKET";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML or has wrong field types.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KiframeConfig {
    /// Socket and receive-thread settings.
    pub transport: TransportConfig,
    /// Primitive pool capacities.
    pub pools: PoolConfig,
    /// Renderer and dispatcher settings.
    pub render: RenderConfig,
    /// Source → target mapping.
    pub transform: TransformConfig,
}

/// Socket and receive-thread settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Filesystem path of the rendezvous socket.
    pub socket_path: PathBuf,
    /// How long to wait for the producer to connect.
    pub accept_timeout_ms: u64,
    /// Idle timeout on each read; expiry is not an error.
    pub recv_timeout_ms: u64,
    /// Longest a single send may block; the write side is dead after expiry.
    pub send_timeout_ms: u64,
    /// Bounded wait for the receive thread on stop.
    pub join_timeout_ms: u64,
    /// Payloads above this are skipped and counted as receive errors.
    pub max_payload_len: u32,
    /// Depth of the drop-oldest frame queue.
    pub queue_depth: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            accept_timeout_ms: DEFAULT_ACCEPT_TIMEOUT_MS,
            recv_timeout_ms: DEFAULT_RECV_TIMEOUT_MS,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl TransportConfig {
    /// Accept timeout as a duration.
    #[must_use]
    pub const fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }

    /// Read idle timeout as a duration.
    #[must_use]
    pub const fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }

    /// Send timeout as a duration.
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Join timeout as a duration.
    #[must_use]
    pub const fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Primitive pool capacities. Fixed for the lifetime of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Line segments shared by wall and entity wireframes.
    pub line_capacity: usize,
    /// Point markers (projectiles).
    pub marker_capacity: usize,
    /// Labeled markers, split ½ enemy, ⅓ collectible, rest decoration.
    pub label_capacity: usize,
    /// Text lines (HUD).
    pub text_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            line_capacity: DEFAULT_LINE_CAPACITY,
            marker_capacity: DEFAULT_MARKER_CAPACITY,
            label_capacity: DEFAULT_LABEL_CAPACITY,
            text_capacity: DEFAULT_TEXT_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Total number of primitives a surface holds once pools are built.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.line_capacity + self.marker_capacity + self.label_capacity + self.text_capacity
    }
}

/// Surface layer a line is drawn on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Top copper; bright, used for near geometry.
    #[default]
    Front,
    /// Bottom copper; dim, used for far geometry.
    Back,
    /// Silkscreen; used for text.
    Silk,
}

/// Visual weight of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineStyle {
    /// Line width in target units.
    pub width: i64,
    /// Layer the line is drawn on.
    pub layer: Layer,
}

impl LineStyle {
    /// Thick front-layer style.
    #[must_use]
    pub const fn near() -> Self {
        Self {
            width: NEAR_LINE_WIDTH,
            layer: Layer::Front,
        }
    }

    /// Thin back-layer style.
    #[must_use]
    pub const fn far() -> Self {
        Self {
            width: FAR_LINE_WIDTH,
            layer: Layer::Back,
        }
    }
}

/// Renderer and dispatcher settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Walls with `distance` below this use `near_style`.
    pub distance_threshold: f64,
    /// Style for near walls and every entity wireframe.
    pub near_style: LineStyle,
    /// Style for far walls.
    pub far_style: LineStyle,
    /// Point marker diameter in target units.
    pub marker_diameter: i64,
    /// Text glyph height in target units.
    pub text_size: i64,
    /// HUD is redrawn when `frame_index % hud_interval == 0`.
    pub hud_interval: u64,
    /// Maintenance pass every N rendered frames.
    pub cleanup_interval: u64,
    /// Statistics log line every N rendered frames.
    pub stats_log_interval: u64,
    /// Frames slower than this count as slow.
    pub slow_frame_ms: u64,
    /// Dispatcher tick period.
    pub tick_interval_ms: u64,
    /// Place a labeled marker at every entity.
    pub entity_markers: bool,
    /// Maintenance warns when the surface holds more than
    /// `pools.total() + primitive_slack` primitives.
    pub primitive_slack: usize,
    /// Extra diagnostics (pool exhaustion warnings).
    pub debug_mode: bool,
    /// Log slow frames and periodic statistics.
    pub log_frame_times: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            near_style: LineStyle::near(),
            far_style: LineStyle::far(),
            marker_diameter: MARKER_DIAMETER,
            text_size: TEXT_SIZE,
            hud_interval: DEFAULT_HUD_INTERVAL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            stats_log_interval: DEFAULT_STATS_LOG_INTERVAL,
            slow_frame_ms: DEFAULT_SLOW_FRAME_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            entity_markers: true,
            primitive_slack: DEFAULT_PRIMITIVE_SLACK,
            debug_mode: false,
            log_frame_times: false,
        }
    }
}

impl RenderConfig {
    /// Dispatcher tick period as a duration.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Slow-frame threshold as a duration.
    #[must_use]
    pub const fn slow_frame(&self) -> Duration {
        Duration::from_millis(self.slow_frame_ms)
    }
}

/// Source screen → target surface mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Source screen width.
    pub source_width: f64,
    /// Source screen height.
    pub source_height: f64,
    /// Target units per source unit.
    pub scale: f64,
    /// Target X of the source centre.
    pub target_center_x: i64,
    /// Target Y of the source centre.
    pub target_center_y: i64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            source_width: SOURCE_WIDTH,
            source_height: SOURCE_HEIGHT,
            scale: SOURCE_TO_TARGET_SCALE,
            target_center_x: TARGET_CENTER_X,
            target_center_y: TARGET_CENTER_Y,
        }
    }
}

impl KiframeConfig {
    /// Production configuration; identical to `Default`.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Parses a TOML document and validates it.
    ///
    /// # Errors
    ///
    /// Returns `Parse` on malformed TOML, `Invalid` on out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Read` if the file cannot be read, otherwise as
    /// [`KiframeConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Applies `KIFRAME_DEBUG`, `KIFRAME_LOG_FRAMES` and `KIFRAME_SOCKET`.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup. `apply_env` uses the
    /// process environment.
    #[must_use]
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_DEBUG) {
            self.render.debug_mode = is_truthy(&value);
        }
        if let Some(value) = lookup(ENV_LOG_FRAMES) {
            self.render.log_frame_times = is_truthy(&value);
        }
        if let Some(path) = lookup(ENV_SOCKET).filter(|path| !path.is_empty()) {
            self.transport.socket_path = PathBuf::from(path);
        }
        self
    }

    /// Checks ranges that would otherwise surface as panics or stalls later.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |msg: &str| -> ConfigResult<()> { Err(ConfigError::Invalid(msg.to_string())) };

        if self.transport.queue_depth == 0 {
            return invalid("transport.queue_depth must be at least 1");
        }
        if self.transport.recv_timeout_ms == 0 {
            return invalid("transport.recv_timeout_ms must be non-zero");
        }
        if self.transport.send_timeout_ms == 0 {
            return invalid("transport.send_timeout_ms must be non-zero");
        }
        if self.transport.socket_path.as_os_str().is_empty() {
            return invalid("transport.socket_path must not be empty");
        }
        if self.pools.line_capacity == 0
            || self.pools.marker_capacity == 0
            || self.pools.text_capacity == 0
        {
            return invalid("pool capacities must be non-zero");
        }
        // One slot per sub-pool at minimum.
        if self.pools.label_capacity < 3 {
            return invalid("pools.label_capacity must be at least 3");
        }
        if self.render.hud_interval == 0
            || self.render.cleanup_interval == 0
            || self.render.stats_log_interval == 0
        {
            return invalid("render intervals must be non-zero");
        }
        if self.render.tick_interval_ms == 0 {
            return invalid("render.tick_interval_ms must be non-zero");
        }
        if !self.render.distance_threshold.is_finite() {
            return invalid("render.distance_threshold must be finite");
        }
        if !(self.transform.scale.is_finite() && self.transform.scale > 0.0) {
            return invalid("transform.scale must be positive");
        }
        if !(self.transform.source_width > 0.0 && self.transform.source_height > 0.0) {
            return invalid("transform source dimensions must be positive");
        }
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
