//! # Bridge Lifecycle
//!
//! ```text
//! CREATED ──listen──► LISTENING ──accept──► CONNECTED ──start──► RUNNING
//!    │                    │                     │                   │
//!    └────────────────────┴──── stop / error ───┴───────────────────┘
//!                                     │
//!                                     ▼
//!                                 STOPPING ──join──► STOPPED
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

/// Bridge lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BridgeState {
    /// Constructed, nothing bound.
    #[default]
    Created = 0,
    /// Endpoint bound, waiting for the producer.
    Listening = 1,
    /// Producer connected, handshake not yet sent.
    Connected = 2,
    /// Receive thread running.
    Running = 3,
    /// Teardown in progress.
    Stopping = 4,
    /// Everything released.
    Stopped = 5,
}

impl BridgeState {
    /// Decodes the atomic representation.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Listening,
            2 => Self::Connected,
            3 => Self::Running,
            4 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    /// True while key events may be sent.
    #[must_use]
    pub const fn can_send(self) -> bool {
        matches!(self, Self::Connected | Self::Running)
    }

    /// True once teardown has begun.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}

/// Lock-free cell holding a [`BridgeState`].
#[derive(Debug, Default)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn load(&self) -> BridgeState {
        BridgeState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: BridgeState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Moves `from → to`; returns the actual state on mismatch.
    pub(crate) fn transition(&self, from: BridgeState, to: BridgeState) -> Result<(), BridgeState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(BridgeState::from_u8)
    }
}

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndReason {
    /// `stop()` was called.
    Requested,
    /// Peer sent `SHUTDOWN`.
    PeerShutdown,
    /// Peer closed the connection.
    PeerDisconnected,
    /// Unrecoverable transport failure.
    TransportError,
    /// No producer connected in time.
    AcceptTimeout,
}

impl EndReason {
    /// True if the end was not asked for by either side.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::TransportError | Self::AcceptTimeout)
    }

    /// True if sending `SHUTDOWN` to the peer is still worth trying.
    #[must_use]
    pub const fn notify_peer(self) -> bool {
        matches!(self, Self::Requested | Self::PeerShutdown | Self::TransportError)
    }
}
