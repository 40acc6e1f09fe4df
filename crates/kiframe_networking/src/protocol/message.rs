//! # Message Definitions
//!
//! The header is a `Pod` struct so it can be read straight from the wire
//! in the host's byte order, exactly as the producer writes it.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use kiframe_shared::{Frame, MessageType};

use crate::error::NetworkResult;

/// Message header - present in every message.
///
/// Total size: 8 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct MessageHeader {
    /// Raw message type code.
    pub message_type: u32,
    /// Payload length in bytes.
    pub payload_len: u32,
}

impl MessageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = kiframe_shared::constants::HEADER_SIZE;

    /// Creates a header.
    #[inline]
    #[must_use]
    pub const fn new(message_type: u32, payload_len: u32) -> Self {
        Self {
            message_type,
            payload_len,
        }
    }

    /// Header bytes in native order.
    #[inline]
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        bytemuck::cast(self)
    }

    /// Reads a header from native-order bytes.
    #[inline]
    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        bytemuck::cast(bytes)
    }

    /// Known message type, if any.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> Option<MessageType> {
        MessageType::from_code(self.message_type)
    }
}

/// Key press or release sent to the producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// True on press, false on release.
    pub pressed: bool,
    /// Producer key code.
    pub key: i32,
}

/// A decoded message: raw type code plus payload bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Raw message type code.
    pub message_type: u32,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl Message {
    /// Creates a message with an arbitrary type code.
    #[must_use]
    pub fn new(message_type: u32, payload: Vec<u8>) -> Self {
        Self {
            message_type,
            payload,
        }
    }

    /// `FRAME_DATA` carrying `frame`.
    ///
    /// # Errors
    ///
    /// Fails only if the frame holds non-finite numbers.
    pub fn frame(frame: &Frame) -> NetworkResult<Self> {
        Ok(Self::new(MessageType::FrameData.code(), frame.to_json()?))
    }

    /// `KEY_EVENT` carrying `event`.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the error is kept for symmetry.
    pub fn key_event(event: KeyEvent) -> NetworkResult<Self> {
        Ok(Self::new(
            MessageType::KeyEvent.code(),
            serde_json::to_vec(&event)?,
        ))
    }

    /// Empty `INIT_COMPLETE`.
    #[must_use]
    pub fn init_complete() -> Self {
        Self::new(MessageType::InitComplete.code(), Vec::new())
    }

    /// Empty `SHUTDOWN`.
    #[must_use]
    pub fn shutdown() -> Self {
        Self::new(MessageType::Shutdown.code(), Vec::new())
    }

    /// Known message type, if any.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> Option<MessageType> {
        MessageType::from_code(self.message_type)
    }

    /// Payload as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUtf8` if the payload is not UTF-8.
    pub fn text(&self) -> NetworkResult<&str> {
        Ok(std::str::from_utf8(&self.payload)?)
    }

    /// Decodes the payload as a frame.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUtf8` or `MalformedPayload`; both are recoverable.
    pub fn decode_frame(&self) -> NetworkResult<Frame> {
        Ok(serde_json::from_str(self.text()?)?)
    }

    /// Decodes the payload as a key event.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUtf8` or `MalformedPayload`.
    pub fn decode_key_event(&self) -> NetworkResult<KeyEvent> {
        Ok(serde_json::from_str(self.text()?)?)
    }
}
