//! # Frame Protocol
//!
//! Fixed, versionless framing shared with the producer.
//!
//! ## Message Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (8 bytes, native byte order)                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ message_type (4) │ payload_len (4)                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Payload (payload_len bytes of UTF-8 JSON, may be empty)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! - Reads are resumable: a timeout mid-message keeps the bytes already read
//! - A bad payload spoils one message, never the stream
//! - A header is always followed by its full payload in one write

mod codec;
mod message;

pub use codec::{write_message, MessageReader, ReadEvent};
pub use message::{KeyEvent, Message, MessageHeader};
