//! # Transport Layer
//!
//! Unix stream sockets at a well-known filesystem path.
//!
//! ## Design
//!
//! - The listener removes a stale socket file before binding and removes its
//!   own file when dropped
//! - Accept polls a non-blocking listener so `stop()` can cancel it
//! - A connected stream is shared: one reader thread, any number of writers,
//!   with a write lock keeping each framed message contiguous
//! - Writes are bounded by a send timeout. A failed write may have left half
//!   a frame on the wire, so the write side refuses further sends

use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{NetworkError, NetworkResult};
use crate::protocol::{write_message, Message, MessageReader, ReadEvent};

/// How often a pending accept re-checks for a connection or cancellation.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Listening endpoint at a filesystem path.
#[derive(Debug)]
pub struct RendezvousListener {
    /// The underlying socket, non-blocking.
    listener: UnixListener,
    /// Path the socket file lives at.
    path: PathBuf,
}

impl RendezvousListener {
    /// Binds `path`, first removing a socket file left by a crashed session.
    ///
    /// # Errors
    ///
    /// Returns `Bind` if the path is occupied by something that is not a
    /// socket, or the bind itself fails.
    pub fn bind(path: impl AsRef<Path>) -> NetworkResult<Self> {
        let path = path.as_ref().to_path_buf();
        let bind_error = |source| NetworkError::Bind {
            path: path.clone(),
            source,
        };

        match std::fs::symlink_metadata(&path) {
            Ok(meta) if meta.file_type().is_socket() => {
                tracing::info!("Removing stale endpoint {}", path.display());
                std::fs::remove_file(&path).map_err(bind_error)?;
            }
            _ => {}
        }

        let listener = UnixListener::bind(&path).map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;

        tracing::info!("Listening on {}", path.display());
        Ok(Self { listener, path })
    }

    /// Path the listener is bound to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits up to `timeout` for one connection, giving up early if `cancel`
    /// is raised.
    ///
    /// # Errors
    ///
    /// `AcceptTimeout` when the deadline passes, `Cancelled` when `cancel`
    /// is raised, `Io` on socket failure.
    pub fn accept(&self, timeout: Duration, cancel: &AtomicBool) -> NetworkResult<UnixStream> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    stream.set_nonblocking(false)?;
                    tracing::info!("Peer connected on {}", self.path.display());
                    return Ok(stream);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if cancel.load(Ordering::Acquire) {
                        return Err(NetworkError::Cancelled);
                    }
                    if Instant::now() >= deadline {
                        return Err(NetworkError::AcceptTimeout {
                            path: self.path.clone(),
                            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                        });
                    }
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => return Err(NetworkError::Io(e)),
            }
        }
    }
}

impl Drop for RendezvousListener {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed endpoint {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Messages sent.
    pub messages_sent: u64,
    /// Messages received.
    pub messages_received: u64,
    /// Bytes sent, headers included.
    pub bytes_sent: u64,
    /// Bytes received, headers included.
    pub bytes_received: u64,
    /// Send errors.
    pub send_errors: u64,
    /// Receive errors (oversized messages skipped, socket failures).
    pub recv_errors: u64,
}

/// A connected stream speaking the framed protocol.
///
/// `send` may be called from any thread. `poll` belongs to whichever single
/// thread owns the [`MessageReader`].
#[derive(Debug)]
pub struct FramedStream {
    /// The socket.
    stream: UnixStream,
    /// Keeps concurrent writers from interleaving frames.
    write_lock: Mutex<()>,
    /// Set after a failed write; the peer's framing can no longer be trusted.
    write_failed: AtomicBool,
    /// Counters.
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    send_errors: AtomicU64,
    recv_errors: AtomicU64,
}

impl FramedStream {
    /// Wraps a connected socket. Reads time out after `recv_timeout`, which
    /// surfaces as [`ReadEvent::Idle`]. A write that cannot finish within
    /// `send_timeout` fails.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a timeout cannot be set.
    pub fn new(
        stream: UnixStream,
        recv_timeout: Duration,
        send_timeout: Duration,
    ) -> NetworkResult<Self> {
        stream.set_read_timeout(Some(recv_timeout))?;
        stream.set_write_timeout(Some(send_timeout))?;

        Ok(Self {
            stream,
            write_lock: Mutex::new(()),
            write_failed: AtomicBool::new(false),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            recv_errors: AtomicU64::new(0),
        })
    }

    /// Connects to a listener at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if nothing is listening.
    pub fn connect(
        path: impl AsRef<Path>,
        recv_timeout: Duration,
        send_timeout: Duration,
    ) -> NetworkResult<Self> {
        Self::new(UnixStream::connect(path)?, recv_timeout, send_timeout)
    }

    /// Sends one framed message, blocking at most the send timeout.
    ///
    /// # Errors
    ///
    /// Returns the I/O error that broke the connection, or `Disconnected`
    /// once an earlier write has failed.
    pub fn send(&self, message_type: u32, payload: &[u8]) -> NetworkResult<()> {
        let _guard = self.write_lock.lock();
        self.write_frame(message_type, payload)
    }

    /// Best-effort last message before [`FramedStream::shutdown`].
    ///
    /// Never waits: returns `Ok(false)` if another writer holds the lock.
    /// The socket is switched to non-blocking first, so a full send buffer
    /// fails at once instead of waiting out the send timeout.
    ///
    /// # Errors
    ///
    /// As [`FramedStream::send`].
    pub fn send_final(&self, message: &Message) -> NetworkResult<bool> {
        let Some(_guard) = self.write_lock.try_lock() else {
            return Ok(false);
        };
        self.stream.set_nonblocking(true)?;
        self.write_frame(message.message_type, &message.payload)
            .map(|()| true)
    }

    /// Writes with the lock held.
    fn write_frame(&self, message_type: u32, payload: &[u8]) -> NetworkResult<()> {
        if self.write_failed.load(Ordering::Acquire) {
            self.send_errors.fetch_add(1, Ordering::Relaxed);
            return Err(NetworkError::Disconnected);
        }

        match write_message(&mut &self.stream, message_type, payload) {
            Ok(()) => {
                self.messages_sent.fetch_add(1, Ordering::Relaxed);
                self.bytes_sent
                    .fetch_add((8 + payload.len()) as u64, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                if matches!(e, NetworkError::Io(_)) {
                    self.write_failed.store(true, Ordering::Release);
                }
                self.send_errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Sends a prepared message.
    ///
    /// # Errors
    ///
    /// As [`FramedStream::send`].
    pub fn send_message(&self, message: &Message) -> NetworkResult<()> {
        self.send(message.message_type, &message.payload)
    }

    /// Reads until a message completes, the read times out, or the peer
    /// disconnects.
    ///
    /// # Errors
    ///
    /// As [`MessageReader::poll`].
    pub fn poll(&self, reader: &mut MessageReader) -> NetworkResult<ReadEvent> {
        let result = reader.poll(&mut &self.stream);

        match &result {
            Ok(ReadEvent::Message(message)) => {
                self.messages_received.fetch_add(1, Ordering::Relaxed);
                self.bytes_received
                    .fetch_add((8 + message.payload.len()) as u64, Ordering::Relaxed);
            }
            Ok(ReadEvent::Discarded { len, .. }) => {
                self.recv_errors.fetch_add(1, Ordering::Relaxed);
                self.bytes_received
                    .fetch_add(8 + u64::from(*len), Ordering::Relaxed);
            }
            Ok(_) => {}
            Err(_) => {
                self.recv_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    /// Shuts both directions down, waking any blocked reader with EOF and
    /// any blocked writer with an error.
    pub fn shutdown(&self) {
        if let Err(e) = self.stream.shutdown(std::net::Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                tracing::debug!("Stream shutdown: {}", e);
            }
        }
    }

    /// Returns statistics.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        TransportStats {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
        }
    }
}
