//! # KIFRAME Networking
//!
//! Moves frames from the simulation process to the renderer.
//!
//! ## Architecture
//!
//! - **Protocol**: `[u32 type][u32 len][UTF-8 JSON]`, native byte order
//! - **Transport**: one Unix stream socket at a well-known path
//! - **Bridge**: handshake, background receive thread, orderly shutdown
//! - **Peer**: the producer side, for tests and the simulation tool
//!
//! ## Threading Model
//!
//! ```text
//! PRODUCER                  RECEIVE THREAD                 DISPATCH THREAD
//!    |                            |                              |
//!    |--- FRAME_DATA ------------>| decode                       |
//!    |                            |--- push (drop-oldest) ------>| try_pop
//!    |<-- KEY_EVENT (any thread) -|                              |
//!    |--- SHUTDOWN -------------->| teardown, report once        |
//! ```
//!
//! The receive thread never touches render state. The queue is the only
//! thing it shares with the dispatch thread.
//!
//! ## Example
//!
//! ```rust,ignore
//! use kiframe_networking::Bridge;
//! use kiframe_shared::KiframeConfig;
//!
//! let config = KiframeConfig::default();
//! let bridge = Bridge::open(&config.transport)?;
//! let frames = bridge.frame_queue();
//! // hand `frames` to the dispatcher, poll `bridge.stats()` from the supervisor
//! bridge.stop();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bridge;
pub mod error;
pub mod peer;
pub mod protocol;
pub mod transport;

pub use bridge::{Bridge, BridgeEvent, BridgeState, BridgeStats, EndReason, KeySender};
pub use error::{NetworkError, NetworkResult};
pub use peer::SimulationPeer;
pub use protocol::{KeyEvent, Message, MessageHeader, MessageReader, ReadEvent};
pub use transport::{FramedStream, RendezvousListener, TransportStats};
