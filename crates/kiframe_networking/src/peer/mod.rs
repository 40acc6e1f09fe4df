//! # Simulation Peer
//!
//! The producer's end of the connection: connects to the rendezvous path,
//! waits for `INIT_COMPLETE`, then streams frames and reads key events.
//! Used by the simulation tool and by tests that drive a real bridge.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use kiframe_shared::{Frame, MessageType};

use crate::error::{NetworkError, NetworkResult};
use crate::protocol::{Message, MessageReader, ReadEvent};
use crate::transport::{FramedStream, TransportStats};

/// Granularity of peer-side reads, so `recv` can honour its deadline.
const PEER_READ_TIMEOUT: Duration = Duration::from_millis(20);

/// Longest a frame send may block on a renderer that stopped reading.
const PEER_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between connection attempts while the renderer is not yet listening.
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Largest payload the peer accepts from the renderer.
const PEER_MAX_PAYLOAD: u32 = 64 * 1024;

/// Producer-side connection.
#[derive(Debug)]
pub struct SimulationPeer {
    stream: FramedStream,
    reader: MessageReader,
}

impl SimulationPeer {
    /// Connects to `path`, retrying until `timeout` while nothing listens.
    ///
    /// # Errors
    ///
    /// `Timeout` if no listener appears in time.
    pub fn connect(path: impl AsRef<Path>, timeout: Duration) -> NetworkResult<Self> {
        let path = path.as_ref();
        let deadline = Instant::now() + timeout;

        loop {
            match FramedStream::connect(path, PEER_READ_TIMEOUT, PEER_SEND_TIMEOUT) {
                Ok(stream) => {
                    tracing::info!("Connected to {}", path.display());
                    return Ok(Self {
                        stream,
                        reader: MessageReader::new(PEER_MAX_PAYLOAD),
                    });
                }
                Err(e) if Instant::now() >= deadline => {
                    tracing::debug!("Last connect attempt: {}", e);
                    return Err(NetworkError::Timeout("connecting to renderer"));
                }
                Err(_) => thread::sleep(CONNECT_RETRY_INTERVAL),
            }
        }
    }

    /// Blocks until the renderer's `INIT_COMPLETE` arrives.
    ///
    /// # Errors
    ///
    /// `Timeout` if it does not arrive in time, `Disconnected` if the
    /// renderer goes away first.
    pub fn wait_for_init(&mut self, timeout: Duration) -> NetworkResult<()> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.recv(remaining)? {
                Some(message) if message.kind() == Some(MessageType::InitComplete) => {
                    tracing::debug!("Renderer ready");
                    return Ok(());
                }
                Some(message) => {
                    tracing::debug!("Ignoring type {} before init", message.message_type);
                }
                None => return Err(NetworkError::Timeout("waiting for INIT_COMPLETE")),
            }
        }
    }

    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Serialization or I/O errors.
    pub fn send_frame(&self, frame: &Frame) -> NetworkResult<()> {
        self.stream.send_message(&Message::frame(frame)?)
    }

    /// Sends arbitrary bytes under an arbitrary type code.
    ///
    /// # Errors
    ///
    /// I/O errors.
    pub fn send_raw(&self, message_type: u32, payload: &[u8]) -> NetworkResult<()> {
        self.stream.send(message_type, payload)
    }

    /// Asks the renderer to end the session.
    ///
    /// # Errors
    ///
    /// I/O errors.
    pub fn send_shutdown(&self) -> NetworkResult<()> {
        self.stream.send_message(&Message::shutdown())
    }

    /// Waits up to `timeout` for the next message. `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// `Disconnected` if the renderer closed the connection.
    pub fn recv(&mut self, timeout: Duration) -> NetworkResult<Option<Message>> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.stream.poll(&mut self.reader)? {
                ReadEvent::Message(message) => return Ok(Some(message)),
                ReadEvent::Disconnected => return Err(NetworkError::Disconnected),
                ReadEvent::Idle if Instant::now() >= deadline => return Ok(None),
                ReadEvent::Idle => {}
                ReadEvent::Discarded { message_type, len } => {
                    tracing::warn!("Skipped oversized type {} ({} bytes)", message_type, len);
                }
            }
        }
    }

    /// Transport statistics.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.stream.stats()
    }

    /// Closes the connection without a `SHUTDOWN`.
    pub fn close(self) {
        self.stream.shutdown();
    }
}
