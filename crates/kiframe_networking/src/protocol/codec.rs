//! # Framing Codec
//!
//! ## Read State Machine
//!
//! ```text
//!            8 header bytes               payload_len bytes
//! ┌──────────────┐ ────────────► ┌───────────────┐ ────────────► Message
//! │ ReadingHeader│               │ ReadingPayload│
//! └──────────────┘ ◄──────────── └───────────────┘
//!     │  │   ▲        message emitted       │
//!     │  │   └──── timeout: Idle, bytes kept ┘
//!     │  └──────── EOF / reset: Disconnected
//!     │
//!     │ payload_len > limit   ┌────────────┐  payload_len bytes dropped
//!     └─────────────────────► │ Discarding │ ─────────────────────────► Discarded
//!                             └────────────┘
//! ```
//!
//! A read timeout is reported as [`ReadEvent::Idle`] and the partial message
//! is kept, so the next `poll` resumes exactly where this one stopped. An
//! oversized payload is read and thrown away in chunks; the framing stays
//! intact and the next header is read as usual.

use std::io::{self, Read, Write};

use crate::error::{NetworkError, NetworkResult};
use crate::protocol::message::{Message, MessageHeader};

/// Outcome of one [`MessageReader::poll`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadEvent {
    /// A complete message.
    Message(Message),
    /// No data before the read timeout; try again.
    Idle,
    /// Peer closed the connection.
    Disconnected,
    /// A message above the payload limit was skipped.
    Discarded {
        /// Type from the skipped header.
        message_type: u32,
        /// Announced payload length.
        len: u32,
    },
}

/// Scratch size used while skipping an oversized payload.
const DISCARD_CHUNK: usize = 8 * 1024;

/// Where the reader is inside the current message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Header,
    Payload { message_type: u32 },
    Discard { message_type: u32, len: u32, remaining: u32 },
}

/// Resumable message reader.
///
/// One reader per connection. It owns the partial message between polls.
#[derive(Debug)]
pub struct MessageReader {
    /// Header bytes read so far.
    header: [u8; MessageHeader::SIZE],
    /// Bytes filled in the current phase.
    filled: usize,
    /// Current phase.
    phase: Phase,
    /// Payload being assembled, or scratch while discarding.
    payload: Vec<u8>,
    /// Largest acceptable payload.
    max_payload_len: u32,
}

impl MessageReader {
    /// Creates a reader that skips payloads above `max_payload_len`.
    #[must_use]
    pub fn new(max_payload_len: u32) -> Self {
        Self {
            header: [0; MessageHeader::SIZE],
            filled: 0,
            phase: Phase::Header,
            payload: Vec::new(),
            max_payload_len,
        }
    }

    /// True if a message has been partially read.
    #[must_use]
    pub const fn is_mid_message(&self) -> bool {
        self.filled > 0 || !matches!(self.phase, Phase::Header)
    }

    /// Reads until one message is complete, the source times out, or the
    /// peer disconnects.
    ///
    /// A header announcing more than the limit never allocates its payload:
    /// the bytes are drained and [`ReadEvent::Discarded`] is returned once
    /// they are gone.
    ///
    /// # Errors
    ///
    /// `Io` for failures other than timeouts and disconnects. The stream is
    /// unusable afterwards.
    pub fn poll<R: Read + ?Sized>(&mut self, source: &mut R) -> NetworkResult<ReadEvent> {
        loop {
            let buf = match self.phase {
                Phase::Header => &mut self.header[self.filled..],
                Phase::Payload { .. } => &mut self.payload[self.filled..],
                Phase::Discard { remaining, .. } => {
                    let chunk = self.payload.len().min(remaining as usize);
                    &mut self.payload[..chunk]
                }
            };

            // Zero-length payloads complete without touching the source.
            if !buf.is_empty() {
                match source.read(buf) {
                    Ok(0) => return Ok(ReadEvent::Disconnected),
                    Ok(n) => self.filled += n,
                    Err(e) => match e.kind() {
                        io::ErrorKind::Interrupted => continue,
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                            return Ok(ReadEvent::Idle)
                        }
                        io::ErrorKind::UnexpectedEof
                        | io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::BrokenPipe
                        | io::ErrorKind::NotConnected => return Ok(ReadEvent::Disconnected),
                        _ => return Err(NetworkError::Io(e)),
                    },
                }
            }

            match self.phase {
                Phase::Header if self.filled == MessageHeader::SIZE => {
                    let header = MessageHeader::from_bytes(self.header);
                    self.payload.clear();
                    self.filled = 0;
                    if header.payload_len > self.max_payload_len {
                        let len = header.payload_len;
                        self.payload.resize(DISCARD_CHUNK.min(len as usize), 0);
                        self.phase = Phase::Discard {
                            message_type: header.message_type,
                            len,
                            remaining: len,
                        };
                        continue;
                    }
                    self.payload.resize(header.payload_len as usize, 0);
                    self.phase = Phase::Payload {
                        message_type: header.message_type,
                    };
                }
                Phase::Payload { message_type } if self.filled == self.payload.len() => {
                    self.filled = 0;
                    self.phase = Phase::Header;
                    let payload = std::mem::take(&mut self.payload);
                    return Ok(ReadEvent::Message(Message::new(message_type, payload)));
                }
                Phase::Discard {
                    message_type,
                    len,
                    remaining,
                } => {
                    // A read never exceeds the chunk, so this cannot underflow.
                    let remaining = remaining - u32::try_from(self.filled).unwrap_or(remaining);
                    self.filled = 0;
                    if remaining == 0 {
                        self.phase = Phase::Header;
                        self.payload = Vec::new();
                        return Ok(ReadEvent::Discarded { message_type, len });
                    }
                    self.phase = Phase::Discard {
                        message_type,
                        len,
                        remaining,
                    };
                }
                _ => {}
            }
        }
    }
}

/// Writes one framed message: header immediately followed by the payload.
///
/// Both parts go out in a single `write_all`, which retries partial writes
/// and interrupted calls until done or the connection fails.
///
/// # Errors
///
/// `PayloadTooLarge` if the payload does not fit a `u32` length, otherwise
/// the I/O error that broke the connection.
pub fn write_message<W: Write + ?Sized>(
    sink: &mut W,
    message_type: u32,
    payload: &[u8],
) -> NetworkResult<()> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| NetworkError::PayloadTooLarge {
        len: payload.len() as u64,
        max: u32::MAX,
    })?;

    let mut framed = Vec::with_capacity(MessageHeader::SIZE + payload.len());
    framed.extend_from_slice(&MessageHeader::new(message_type, payload_len).to_bytes());
    framed.extend_from_slice(payload);

    sink.write_all(&framed)?;
    sink.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// Source that hands out scripted chunks, with `None` meaning "timed out".
    struct ChunkedSource {
        chunks: VecDeque<Option<Vec<u8>>>,
    }

    impl ChunkedSource {
        fn new(chunks: Vec<Option<Vec<u8>>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    impl Read for ChunkedSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(None) => Err(io::Error::new(io::ErrorKind::WouldBlock, "idle")),
                Some(Some(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(Some(chunk.split_off(n)));
                    }
                    Ok(n)
                }
            }
        }
    }

    fn framed(message_type: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_message(&mut out, message_type, payload).unwrap();
        out
    }

    #[test]
    fn test_write_then_read() {
        for (ty, payload) in [
            (1u32, br#"{"walls":[]}"#.to_vec()),
            (2, br#"{"pressed":false,"key":13}"#.to_vec()),
            (3, Vec::new()),
            (4, Vec::new()),
            (77, "ünïcödé".as_bytes().to_vec()),
        ] {
            let bytes = framed(ty, &payload);
            assert_eq!(bytes.len(), 8 + payload.len());

            let mut reader = MessageReader::new(1024);
            let event = reader.poll(&mut Cursor::new(bytes)).unwrap();
            assert_eq!(event, ReadEvent::Message(Message::new(ty, payload)));
        }
    }

    #[test]
    fn test_byte_at_a_time_matches_whole() {
        let payload = br#"{"walls":[[1,2,3,4,5]],"frame":9}"#;
        let bytes = framed(1, payload);

        let chunks = bytes.iter().map(|b| Some(vec![*b])).collect();
        let mut reader = MessageReader::new(1024);
        let event = reader.poll(&mut ChunkedSource::new(chunks)).unwrap();

        assert_eq!(event, ReadEvent::Message(Message::new(1, payload.to_vec())));
    }

    #[test]
    fn test_timeout_mid_message_resumes() {
        let bytes = framed(1, b"0123456789");
        let mut source = ChunkedSource::new(vec![
            Some(bytes[..3].to_vec()),
            None,
            Some(bytes[3..11].to_vec()),
            None,
            Some(bytes[11..].to_vec()),
        ]);
        let mut reader = MessageReader::new(1024);

        assert_eq!(reader.poll(&mut source).unwrap(), ReadEvent::Idle);
        assert!(reader.is_mid_message());
        assert_eq!(reader.poll(&mut source).unwrap(), ReadEvent::Idle);
        assert_eq!(
            reader.poll(&mut source).unwrap(),
            ReadEvent::Message(Message::new(1, b"0123456789".to_vec()))
        );
        assert!(!reader.is_mid_message());
    }

    #[test]
    fn test_back_to_back_messages() {
        let mut bytes = framed(3, b"");
        bytes.extend(framed(1, b"{}"));
        bytes.extend(framed(4, b""));
        let mut source = Cursor::new(bytes);
        let mut reader = MessageReader::new(1024);

        let types: Vec<u32> = (0..3)
            .map(|_| match reader.poll(&mut source).unwrap() {
                ReadEvent::Message(m) => m.message_type,
                other => panic!("unexpected {other:?}"),
            })
            .collect();

        assert_eq!(types, vec![3, 1, 4]);
        assert_eq!(reader.poll(&mut source).unwrap(), ReadEvent::Disconnected);
    }

    #[test]
    fn test_eof_in_header_or_payload_is_disconnect() {
        let bytes = framed(1, b"payload");

        let mut reader = MessageReader::new(1024);
        let event = reader.poll(&mut Cursor::new(bytes[..5].to_vec())).unwrap();
        assert_eq!(event, ReadEvent::Disconnected);

        let mut reader = MessageReader::new(1024);
        let event = reader.poll(&mut Cursor::new(bytes[..10].to_vec())).unwrap();
        assert_eq!(event, ReadEvent::Disconnected);
    }

    #[test]
    fn test_oversized_payload_skipped() {
        let mut bytes = framed(1, &[b'x'; 100]);
        bytes.extend(framed(1, b"{}"));
        let mut source = Cursor::new(bytes);
        let mut reader = MessageReader::new(64);

        assert_eq!(
            reader.poll(&mut source).unwrap(),
            ReadEvent::Discarded {
                message_type: 1,
                len: 100
            }
        );
        assert!(!reader.is_mid_message());
        assert_eq!(
            reader.poll(&mut source).unwrap(),
            ReadEvent::Message(Message::new(1, b"{}".to_vec()))
        );
        assert_eq!(reader.poll(&mut source).unwrap(), ReadEvent::Disconnected);
    }

    #[test]
    fn test_discard_spans_timeouts_and_chunks() {
        let big = vec![7u8; DISCARD_CHUNK * 2 + 5];
        let mut bytes = framed(9, &big);
        bytes.extend(framed(3, b""));

        let mut source = ChunkedSource::new(vec![
            Some(bytes[..20].to_vec()),
            None,
            Some(bytes[20..DISCARD_CHUNK + 3].to_vec()),
            None,
            Some(bytes[DISCARD_CHUNK + 3..].to_vec()),
        ]);
        let mut reader = MessageReader::new(1024);

        assert_eq!(reader.poll(&mut source).unwrap(), ReadEvent::Idle);
        assert!(reader.is_mid_message());
        assert_eq!(reader.poll(&mut source).unwrap(), ReadEvent::Idle);
        assert_eq!(
            reader.poll(&mut source).unwrap(),
            ReadEvent::Discarded {
                message_type: 9,
                len: u32::try_from(big.len()).unwrap()
            }
        );
        assert_eq!(
            reader.poll(&mut source).unwrap(),
            ReadEvent::Message(Message::new(3, Vec::new()))
        );
    }

    #[test]
    fn test_eof_while_discarding_is_disconnect() {
        let bytes = framed(1, &[0u8; 100]);
        let mut reader = MessageReader::new(10);

        let event = reader.poll(&mut Cursor::new(bytes[..50].to_vec())).unwrap();
        assert_eq!(event, ReadEvent::Disconnected);
    }
}
