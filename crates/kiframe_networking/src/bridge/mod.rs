//! # Bridge
//!
//! Owns the rendezvous endpoint, the connection and the background receive
//! thread.
//!
//! ## Responsibilities
//!
//! - Bind and accept exactly one producer connection
//! - Send `INIT_COMPLETE`, then decode messages on a dedicated thread
//! - Push decoded frames onto the drop-oldest queue
//! - Forward key events from any thread
//! - Tear everything down exactly once, whoever asks first
//!
//! ## Shutdown
//!
//! ```text
//! stop() / peer SHUTDOWN / peer gone / I/O failure
//!        │
//!        ▼
//! teardown (first caller wins, later callers wait for it)
//!   running = false
//!   SHUTDOWN → peer      → skipped if a writer is mid-send or the buffer is full
//!   shutdown socket      → wakes the blocked read with EOF, blocked writers with an error
//!   drop listener        → socket file removed
//!        │
//!        ▼
//! join receive thread (bounded, abandoned on timeout; concurrent stop()
//! callers wait for the one joining)
//!        │
//!        ▼
//! STOPPED, SessionEnded reported once
//! ```
//!
//! Nothing on this path waits on the peer: sends are bounded by
//! `send_timeout_ms` and the final SHUTDOWN never blocks.

mod state;
mod stats;

pub use state::{BridgeState, EndReason};
pub use stats::BridgeStats;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use kiframe_core::DropOldestQueue;
use kiframe_shared::{Frame, MessageType, TransportConfig};

use crate::error::{NetworkError, NetworkResult};
use crate::protocol::{KeyEvent, Message, MessageReader, ReadEvent};
use crate::transport::{FramedStream, RendezvousListener, TransportStats};
use state::AtomicState;
use stats::BridgeCounters;

/// Lifecycle notifications for the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeEvent {
    /// The producer connected.
    Connected,
    /// The session is over. Sent exactly once.
    SessionEnded(EndReason),
}

/// What the receive loop should do after a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

/// State shared between the bridge handle, key senders and the receive
/// thread.
struct Shared {
    /// Transport settings.
    config: TransportConfig,
    /// Lifecycle state.
    state: AtomicState,
    /// Receive loop keeps going while set.
    running: AtomicBool,
    /// Aborts a pending accept.
    cancel: AtomicBool,
    /// Hand-off to the dispatch thread.
    queue: Arc<DropOldestQueue<Frame>>,
    /// Bound endpoint. Shared so accept can run without holding the lock.
    listener: Mutex<Option<Arc<RendezvousListener>>>,
    /// Connected stream.
    stream: Mutex<Option<Arc<FramedStream>>>,
    /// Transport counters captured at teardown.
    final_transport: Mutex<TransportStats>,
    /// Serializes teardown; held across its socket work.
    teardown_lock: Mutex<()>,
    /// Why the session ended. Only ever locked briefly.
    ended: Mutex<Option<EndReason>>,
    /// Session end already reported.
    reported: AtomicBool,
    /// Counters.
    counters: BridgeCounters,
    /// Lifecycle notifications.
    events_tx: Sender<BridgeEvent>,
    events_rx: Receiver<BridgeEvent>,
}

impl Shared {
    /// Releases every resource. Only the first call does anything.
    /// Later callers block until the first one is done.
    fn teardown(&self, reason: EndReason) -> bool {
        let _teardown = self.teardown_lock.lock();
        {
            let mut ended = self.ended.lock();
            if ended.is_some() {
                return false;
            }
            *ended = Some(reason);
        }

        self.state.store(BridgeState::Stopping);
        self.running.store(false, Ordering::Release);
        self.cancel.store(true, Ordering::Release);

        let stream = self.stream.lock().take();
        if let Some(stream) = stream {
            if reason.notify_peer() {
                match stream.send_final(&Message::shutdown()) {
                    Ok(true) => {}
                    Ok(false) => tracing::debug!("SHUTDOWN skipped, a send is in flight"),
                    Err(e) => tracing::debug!("SHUTDOWN not delivered: {}", e),
                }
            }
            stream.shutdown();
            *self.final_transport.lock() = stream.stats();
        }

        // Dropping the last handle removes the socket file.
        drop(self.listener.lock().take());

        tracing::debug!("Bridge torn down ({:?})", reason);
        true
    }

    /// Marks the bridge stopped and reports the end of the session once.
    fn finish(&self) {
        let Some(reason) = *self.ended.lock() else {
            return;
        };
        self.state.store(BridgeState::Stopped);

        if !self.reported.swap(true, Ordering::AcqRel) {
            if reason.is_failure() {
                tracing::warn!("Session ended: {:?}", reason);
            } else {
                tracing::info!("Session ended: {:?}", reason);
            }
            // The receiver lives in `self`, so this cannot fail.
            let _ = self.events_tx.send(BridgeEvent::SessionEnded(reason));
        }
    }

    /// Tears down and finishes in one go, for failures before the receive
    /// thread exists.
    fn fail(&self, reason: EndReason) {
        self.teardown(reason);
        self.finish();
    }

    fn require(&self, expected: BridgeState) -> NetworkResult<()> {
        let found = self.state.load();
        if found == expected {
            Ok(())
        } else {
            Err(NetworkError::InvalidState { expected, found })
        }
    }

    fn dispatch(&self, message: &Message) -> Flow {
        match message.kind() {
            Some(MessageType::FrameData) => {
                let start = Instant::now();
                match message.decode_frame() {
                    Ok(frame) => {
                        self.counters.record_frame(start.elapsed());
                        if let Some(stale) = self.queue.push(frame) {
                            tracing::trace!("Evicted stale frame {:?}", stale.sequence);
                        }
                    }
                    Err(e) => {
                        BridgeCounters::bump(&self.counters.receive_errors);
                        tracing::warn!("Skipping malformed frame: {}", e);
                    }
                }
            }
            Some(MessageType::Shutdown) => {
                tracing::info!("Peer requested shutdown");
                return Flow::Shutdown;
            }
            Some(kind @ (MessageType::KeyEvent | MessageType::InitComplete)) => {
                BridgeCounters::bump(&self.counters.ignored_messages);
                tracing::debug!("Ignoring {:?} from peer", kind);
            }
            None => {
                BridgeCounters::bump(&self.counters.ignored_messages);
                tracing::warn!("Ignoring unknown message type {}", message.message_type);
            }
        }
        Flow::Continue
    }

    fn send_key(&self, pressed: bool, key: i32) -> bool {
        let state = self.state.load();
        if !state.can_send() {
            tracing::debug!("Key event {} dropped in state {:?}", key, state);
            BridgeCounters::bump(&self.counters.key_events_failed);
            return false;
        }
        let Some(stream) = self.stream.lock().clone() else {
            BridgeCounters::bump(&self.counters.key_events_failed);
            return false;
        };

        let result = Message::key_event(KeyEvent { pressed, key })
            .and_then(|message| stream.send_message(&message));

        match result {
            Ok(()) => {
                BridgeCounters::bump(&self.counters.key_events_sent);
                true
            }
            Err(e) => {
                BridgeCounters::bump(&self.counters.key_events_failed);
                tracing::warn!("Key event {} dropped: {}", key, e);
                false
            }
        }
    }

    fn stats(&self) -> BridgeStats {
        let transport = match self.stream.lock().as_ref() {
            Some(stream) => stream.stats(),
            None => *self.final_transport.lock(),
        };
        self.counters.snapshot(
            self.running.load(Ordering::Acquire),
            self.queue.stats(),
            transport,
        )
    }
}

/// Background receive thread plus its exit signal.
struct Worker {
    handle: JoinHandle<()>,
    /// Disconnects when the thread exits, however it exits.
    exited: Receiver<()>,
}

/// The renderer's end of the frame stream.
///
/// # Example
///
/// ```rust,ignore
/// let bridge = Bridge::new(&config.transport);
/// bridge.listen()?;
/// bridge.accept()?;   // blocks up to accept_timeout
/// bridge.start()?;    // INIT_COMPLETE, then the receive thread
/// // ...
/// bridge.stop();      // idempotent, safe from any thread
/// ```
pub struct Bridge {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl Bridge {
    /// Creates a bridge in `CREATED`.
    #[must_use]
    pub fn new(config: &TransportConfig) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();

        Self {
            shared: Arc::new(Shared {
                config: config.clone(),
                state: AtomicState::default(),
                running: AtomicBool::new(false),
                cancel: AtomicBool::new(false),
                queue: Arc::new(DropOldestQueue::new(config.queue_depth.max(1))),
                listener: Mutex::new(None),
                stream: Mutex::new(None),
                final_transport: Mutex::new(TransportStats::default()),
                teardown_lock: Mutex::new(()),
                ended: Mutex::new(None),
                reported: AtomicBool::new(false),
                counters: BridgeCounters::default(),
                events_tx,
                events_rx,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Listens, accepts and starts in one call.
    ///
    /// # Errors
    ///
    /// Any error from [`Bridge::listen`], [`Bridge::accept`] or
    /// [`Bridge::start`]; the bridge is `STOPPED` afterwards.
    pub fn open(config: &TransportConfig) -> NetworkResult<Self> {
        let bridge = Self::new(config);
        bridge.listen()?;
        bridge.accept()?;
        bridge.start()?;
        Ok(bridge)
    }

    /// `CREATED → LISTENING`: binds the rendezvous endpoint.
    ///
    /// # Errors
    ///
    /// `Bind` if the endpoint cannot be bound (the bridge stops),
    /// `InvalidState` if not in `CREATED`.
    pub fn listen(&self) -> NetworkResult<()> {
        self.shared.require(BridgeState::Created)?;

        let listener = match RendezvousListener::bind(&self.shared.config.socket_path) {
            Ok(listener) => Arc::new(listener),
            Err(e) => {
                tracing::error!("{}", e);
                self.shared.fail(EndReason::TransportError);
                return Err(e);
            }
        };

        *self.shared.listener.lock() = Some(listener);
        self.shared
            .state
            .transition(BridgeState::Created, BridgeState::Listening)
            .map_err(|found| {
                // Stopped while binding; teardown already ran, release here.
                drop(self.shared.listener.lock().take());
                NetworkError::InvalidState {
                    expected: BridgeState::Created,
                    found,
                }
            })
    }

    /// `LISTENING → CONNECTED`: waits for the producer.
    ///
    /// # Errors
    ///
    /// `AcceptTimeout` (the bridge stops), `Cancelled` if `stop()` was
    /// called meanwhile, `InvalidState` if not in `LISTENING`.
    pub fn accept(&self) -> NetworkResult<()> {
        self.shared.require(BridgeState::Listening)?;

        let Some(listener) = self.shared.listener.lock().clone() else {
            return Err(NetworkError::Cancelled);
        };

        let stream = listener
            .accept(self.shared.config.accept_timeout(), &self.shared.cancel)
            .and_then(|stream| {
                FramedStream::new(
                    stream,
                    self.shared.config.recv_timeout(),
                    self.shared.config.send_timeout(),
                )
            });
        drop(listener);

        let stream = match stream {
            Ok(stream) => Arc::new(stream),
            Err(NetworkError::Cancelled) => return Err(NetworkError::Cancelled),
            Err(e) => {
                let reason = if matches!(e, NetworkError::AcceptTimeout { .. }) {
                    EndReason::AcceptTimeout
                } else {
                    EndReason::TransportError
                };
                tracing::error!("{}", e);
                self.shared.fail(reason);
                return Err(e);
            }
        };

        *self.shared.stream.lock() = Some(Arc::clone(&stream));
        if self
            .shared
            .state
            .transition(BridgeState::Listening, BridgeState::Connected)
            .is_err()
        {
            stream.shutdown();
            drop(self.shared.stream.lock().take());
            return Err(NetworkError::Cancelled);
        }

        let _ = self.shared.events_tx.send(BridgeEvent::Connected);
        Ok(())
    }

    /// `CONNECTED → RUNNING`: sends `INIT_COMPLETE` and starts the receive
    /// thread.
    ///
    /// # Errors
    ///
    /// `Io` if the handshake or thread spawn fails (the bridge stops),
    /// `InvalidState` if not in `CONNECTED`.
    pub fn start(&self) -> NetworkResult<()> {
        self.shared.require(BridgeState::Connected)?;

        let Some(stream) = self.shared.stream.lock().clone() else {
            return Err(NetworkError::Cancelled);
        };

        if let Err(e) = stream.send_message(&Message::init_complete()) {
            tracing::error!("Handshake failed: {}", e);
            self.shared.fail(EndReason::TransportError);
            return Err(e);
        }

        // Held across spawn so a concurrent stop() always finds the worker.
        let mut worker = self.worker.lock();

        self.shared.running.store(true, Ordering::Release);
        if let Err(found) = self
            .shared
            .state
            .transition(BridgeState::Connected, BridgeState::Running)
        {
            self.shared.running.store(false, Ordering::Release);
            return Err(NetworkError::InvalidState {
                expected: BridgeState::Connected,
                found,
            });
        }

        let (exit_tx, exited) = crossbeam_channel::bounded::<()>(0);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("kiframe-recv".to_string())
            .spawn(move || {
                receive_loop(&shared, stream);
                drop(exit_tx);
            });

        match spawned {
            Ok(handle) => {
                *worker = Some(Worker { handle, exited });
                tracing::info!("Bridge running");
                Ok(())
            }
            Err(e) => {
                drop(worker);
                self.shared.fail(EndReason::TransportError);
                Err(NetworkError::Io(e))
            }
        }
    }

    /// Stops the bridge. Safe from any thread, any state, any number of
    /// times, including while the receive thread is mid-read or a key send
    /// is stuck on a peer that stopped reading.
    ///
    /// Returns once the receive thread has exited or been abandoned, for
    /// every concurrent caller.
    pub fn stop(&self) {
        self.shared.teardown(EndReason::Requested);

        // Held through finish() so no caller reports STOPPED mid-join.
        let mut slot = self.worker.lock();
        if let Some(worker) = slot.take() {
            self.join_worker(worker);
        }
        self.shared.finish();
    }

    fn join_worker(&self, worker: Worker) {
        if worker.handle.thread().id() == thread::current().id() {
            return;
        }

        match worker.exited.recv_timeout(self.shared.config.join_timeout()) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    tracing::error!("Receive thread panicked");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "Receive thread did not exit within {}ms, abandoning it",
                    self.shared.config.join_timeout_ms
                );
            }
        }
    }

    /// Sends a key event to the producer. Failures are logged and counted,
    /// never raised.
    pub fn send_key_event(&self, pressed: bool, key: i32) -> bool {
        self.shared.send_key(pressed, key)
    }

    /// A cloneable handle for input threads.
    #[must_use]
    pub fn key_sender(&self) -> KeySender {
        KeySender {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The queue the receive thread fills.
    #[must_use]
    pub fn frame_queue(&self) -> Arc<DropOldestQueue<Frame>> {
        Arc::clone(&self.shared.queue)
    }

    /// Lifecycle notifications.
    #[must_use]
    pub fn events(&self) -> Receiver<BridgeEvent> {
        self.shared.events_rx.clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BridgeState {
        self.shared.state.load()
    }

    /// True while the receive loop is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Why the session ended, once it has.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        *self.shared.ended.lock()
    }

    /// Rendezvous path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.shared.config.socket_path
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        self.shared.stats()
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Thread-safe, fire-and-forget key event sender.
#[derive(Clone)]
pub struct KeySender {
    shared: Arc<Shared>,
}

impl KeySender {
    /// Sends a key event. Returns false if it was dropped.
    pub fn send(&self, pressed: bool, key: i32) -> bool {
        self.shared.send_key(pressed, key)
    }
}

impl std::fmt::Debug for KeySender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySender")
            .field("state", &self.shared.state.load())
            .finish()
    }
}

/// Receive thread body.
fn receive_loop(shared: &Shared, stream: Arc<FramedStream>) {
    let mut reader = MessageReader::new(shared.config.max_payload_len);
    let running = || shared.running.load(Ordering::Acquire);

    let reason = loop {
        if !running() {
            break EndReason::Requested;
        }

        match stream.poll(&mut reader) {
            Ok(ReadEvent::Idle) => {}
            Ok(ReadEvent::Discarded { message_type, len }) => {
                BridgeCounters::bump(&shared.counters.receive_errors);
                tracing::warn!(
                    "Skipping oversized message type {} ({} bytes, limit {})",
                    message_type,
                    len,
                    shared.config.max_payload_len
                );
            }
            Ok(ReadEvent::Message(message)) => {
                if shared.dispatch(&message) == Flow::Shutdown {
                    break EndReason::PeerShutdown;
                }
            }
            Ok(ReadEvent::Disconnected) => {
                break if running() {
                    EndReason::PeerDisconnected
                } else {
                    EndReason::Requested
                };
            }
            Err(e) => {
                if !running() {
                    break EndReason::Requested;
                }
                tracing::error!("Receive failed: {}", e);
                break EndReason::TransportError;
            }
        }
    };

    drop(stream);
    shared.teardown(reason);
    shared.finish();
}
