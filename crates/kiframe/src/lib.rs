//! # KIFRAME
//!
//! Streams rendered frames from a simulation process into a bounded set of
//! editor primitives.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐  [type][len][JSON]  ┌──────────────────────────────┐
//! │ Simulation process │ ──────────────────▶ │ kiframe_networking::Bridge    │
//! │ (SimulationPeer)   │ ◀────────────────── │   receive thread              │
//! └────────────────────┘   KEY_EVENT,        └──────────────┬───────────────┘
//!                          SHUTDOWN                         │ push
//!                                                           ▼
//!                                            ┌──────────────────────────────┐
//!                                            │ kiframe_core::DropOldestQueue │
//!                                            │   depth 2                     │
//!                                            └──────────────┬───────────────┘
//!                                                           │ pop ≤ 1 per tick
//!                                                           ▼
//!                                            ┌──────────────────────────────┐
//!                                            │ kiframe_rendering             │
//!                                            │   RenderDispatcher            │
//!                                            │   FrameRenderer → Surface     │
//!                                            └──────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `session`: bridge plus dispatcher on the calling thread
//! - `synthetic`: deterministic frame generator for the simulation tool
//! - `logging`: subscriber setup shared by the binaries

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod logging;
pub mod session;
pub mod synthetic;

// Re-export the layers
pub use kiframe_core as core;
pub use kiframe_networking as networking;
pub use kiframe_rendering as rendering;
pub use kiframe_shared as shared;

pub use logging::init_logging;
pub use session::{RenderSession, SessionError, SessionResult, SessionSummary};
pub use synthetic::SyntheticScene;
