//! Bridge statistics. Polled by the supervisor, never pushed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kiframe_core::QueueStats;

use crate::transport::TransportStats;

/// Snapshot of bridge counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Frames decoded and queued.
    pub frames_received: u64,
    /// Cumulative payload decode time.
    pub decode_time: Duration,
    /// Malformed payloads skipped.
    pub receive_errors: u64,
    /// Messages of unknown or unexpected type.
    pub ignored_messages: u64,
    /// Key events delivered to the producer.
    pub key_events_sent: u64,
    /// Key events dropped because sending failed.
    pub key_events_failed: u64,
    /// Receive loop is active.
    pub running: bool,
    /// Frame queue counters.
    pub queue: QueueStats,
    /// Socket counters.
    pub transport: TransportStats,
}

impl BridgeStats {
    /// Average decode time per frame.
    #[must_use]
    pub fn avg_decode_time(&self) -> Duration {
        if self.frames_received == 0 {
            return Duration::ZERO;
        }
        let frames = u32::try_from(self.frames_received).unwrap_or(u32::MAX);
        self.decode_time / frames
    }
}

/// Live counters updated by the receive thread and key senders.
#[derive(Debug, Default)]
pub(crate) struct BridgeCounters {
    pub(crate) frames_received: AtomicU64,
    pub(crate) decode_nanos: AtomicU64,
    pub(crate) receive_errors: AtomicU64,
    pub(crate) ignored_messages: AtomicU64,
    pub(crate) key_events_sent: AtomicU64,
    pub(crate) key_events_failed: AtomicU64,
}

impl BridgeCounters {
    pub(crate) fn record_frame(&self, decode_time: Duration) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(decode_time.as_nanos()).unwrap_or(u64::MAX);
        self.decode_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, running: bool, queue: QueueStats, transport: TransportStats) -> BridgeStats {
        BridgeStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            decode_time: Duration::from_nanos(self.decode_nanos.load(Ordering::Relaxed)),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            ignored_messages: self.ignored_messages.load(Ordering::Relaxed),
            key_events_sent: self.key_events_sent.load(Ordering::Relaxed),
            key_events_failed: self.key_events_failed.load(Ordering::Relaxed),
            running,
            queue,
            transport,
        }
    }
}
