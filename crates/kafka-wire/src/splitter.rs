//! Length-prefix framing over one direction of a byte stream.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::TimestampNs;
use crate::error::{WireError, WireResult};

/// Bytes of the length prefix that frames every Kafka message.
pub const LENGTH_PREFIX: usize = 4;

/// One fully-framed message, length prefix stripped.
///
/// The payload is never mutated downstream, only moved between queues;
/// `Bytes` makes that structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Capture timestamp of the first packet that started this message.
    pub timestamp: TimestampNs,
    /// Message body: request or response header plus API body.
    pub payload: Bytes,
}

impl RawMessage {
    /// On-wire size including the length prefix.
    pub fn wire_size(&self) -> usize {
        LENGTH_PREFIX + self.payload.len()
    }
}

/// Incremental framer for one direction of one connection.
///
/// Feed raw packet payloads with `feed()` and drain completed messages
/// with `try_pop()`. Packet boundaries carry no meaning: a message may
/// span many packets and a packet may complete a message.
///
/// When a message completes, the entire buffer is reset. Bytes past the
/// message boundary that arrived in the same `feed` call are dropped
/// with the reset; a later desynchronization recovers the stream.
#[derive(Debug)]
pub struct Splitter {
    buffer: Vec<u8>,
    /// Timestamp of the first packet of the message being buffered.
    message_timestamp: TimestampNs,
    completed: VecDeque<RawMessage>,
    max_buffer_size: usize,
    /// Set once the buffer cap is hit; every later `feed` fails.
    failed: bool,
}

impl Splitter {
    pub fn new(max_buffer_size: usize) -> Self {
        Splitter {
            buffer: Vec::new(),
            message_timestamp: TimestampNs(0),
            completed: VecDeque::new(),
            max_buffer_size,
            failed: false,
        }
    }

    /// Append packet bytes to the stream.
    ///
    /// Returns [`WireError::BufferTooLarge`] when buffering `data` would
    /// exceed the cap. That failure is permanent for this splitter: the
    /// caller must drop the connection.
    pub fn feed(&mut self, data: &[u8], timestamp: TimestampNs) -> WireResult<()> {
        if self.failed || self.buffer.len() + data.len() > self.max_buffer_size {
            if !self.failed {
                crate::trace_warn!(
                    buffered = self.buffer.len() + data.len(),
                    max = self.max_buffer_size,
                    "framing buffer over cap, stream failed"
                );
            }
            self.failed = true;
            return Err(WireError::BufferTooLarge {
                buffered: self.buffer.len() + data.len(),
                max: self.max_buffer_size,
            });
        }
        if self.buffer.is_empty() && !data.is_empty() {
            self.message_timestamp = timestamp;
        }
        self.buffer.extend_from_slice(data);
        self.split();
        Ok(())
    }

    /// Pop the next completed message, oldest first.
    pub fn try_pop(&mut self) -> Option<RawMessage> {
        self.completed.pop_front()
    }

    pub fn has_completed(&self) -> bool {
        !self.completed.is_empty()
    }

    /// Bytes currently buffered for an incomplete message.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn split(&mut self) {
        if self.buffer.len() < LENGTH_PREFIX {
            return;
        }
        let b = &self.buffer;
        let declared = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize;
        // An absurd declared length ends up here too: the message never
        // completes and the buffer cap trips on a later feed.
        if self.buffer.len() < LENGTH_PREFIX + declared {
            return;
        }
        let payload = Bytes::copy_from_slice(&self.buffer[LENGTH_PREFIX..LENGTH_PREFIX + declared]);
        self.completed.push_back(RawMessage {
            timestamp: self.message_timestamp,
            payload,
        });
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_single_feed_single_message() {
        let mut s = Splitter::new(1024);
        s.feed(&framed(b"hello"), TimestampNs(7)).unwrap();
        let msg = s.try_pop().unwrap();
        assert_eq!(msg.payload.as_ref(), b"hello");
        assert_eq!(msg.timestamp, TimestampNs(7));
        assert_eq!(msg.wire_size(), 9);
        assert!(s.try_pop().is_none());
    }

    #[test]
    fn test_byte_at_a_time_reassembly() {
        let wire = framed(b"one byte at a time");
        let mut s = Splitter::new(1024);
        for (i, byte) in wire.iter().enumerate() {
            s.feed(&[*byte], TimestampNs(i as u64)).unwrap();
        }
        let msg = s.try_pop().unwrap();
        assert_eq!(msg.payload.as_ref(), b"one byte at a time");
    }

    #[test]
    fn test_timestamp_pinned_to_first_packet() {
        let wire = framed(b"spans three packets");
        let mut s = Splitter::new(1024);
        s.feed(&wire[..5], TimestampNs(100)).unwrap();
        s.feed(&wire[5..9], TimestampNs(200)).unwrap();
        s.feed(&wire[9..], TimestampNs(300)).unwrap();
        assert_eq!(s.try_pop().unwrap().timestamp, TimestampNs(100));
    }

    #[test]
    fn test_messages_in_separate_feeds_all_emitted() {
        let mut s = Splitter::new(1024);
        s.feed(&framed(b"first"), TimestampNs(1)).unwrap();
        s.feed(&framed(b"second"), TimestampNs(2)).unwrap();
        assert_eq!(s.try_pop().unwrap().payload.as_ref(), b"first");
        assert_eq!(s.try_pop().unwrap().payload.as_ref(), b"second");
    }

    #[test]
    fn test_reset_drops_bytes_past_message_boundary() {
        // Two whole messages in one feed: the buffer reset after the
        // first discards the second.
        let mut wire = framed(b"kept");
        wire.extend(framed(b"dropped"));
        let mut s = Splitter::new(1024);
        s.feed(&wire, TimestampNs(1)).unwrap();
        assert_eq!(s.try_pop().unwrap().payload.as_ref(), b"kept");
        assert!(s.try_pop().is_none());
        assert_eq!(s.buffered(), 0);
    }

    #[test]
    fn test_oversize_failure_is_sticky() {
        let mut s = Splitter::new(8);
        let err = s.feed(&[0u8; 16], TimestampNs(1)).unwrap_err();
        assert_eq!(
            err,
            WireError::BufferTooLarge {
                buffered: 16,
                max: 8
            }
        );
        // within the cap, but the splitter already failed
        assert!(s.feed(&[0u8; 1], TimestampNs(2)).is_err());
    }

    #[test]
    fn test_huge_declared_length_trips_cap_across_feeds() {
        let mut s = Splitter::new(32);
        // prefix claims 1 MiB
        s.feed(&(1_048_576u32).to_be_bytes(), TimestampNs(1)).unwrap();
        let mut tripped = false;
        for _ in 0..8 {
            if s.feed(&[0u8; 8], TimestampNs(2)).is_err() {
                tripped = true;
                break;
            }
        }
        assert!(tripped, "buffer cap never tripped");
    }

    #[test]
    fn test_empty_message_allowed() {
        let mut s = Splitter::new(64);
        s.feed(&framed(b""), TimestampNs(3)).unwrap();
        let msg = s.try_pop().unwrap();
        assert!(msg.payload.is_empty());
        assert_eq!(msg.wire_size(), LENGTH_PREFIX);
    }
}
