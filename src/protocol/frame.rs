//! Frame markers and the frame transmitter.
//!
//! A frame on the wire is:
//! ```text
//! ┌───────┬──────────────────────────────┬──────┐
//! │ START │ payload (message_bytes, BE)  │ STOP │
//! └───────┴──────────────────────────────┴──────┘
//! ```
//! Any payload byte equal to START, STOP or ESCAPE is sent as
//! `ESCAPE, byte`.
//!
//! # Example
//!
//! ```
//! use stepwire::protocol::{encode_frame, FrameMarkers, MessageSpec};
//!
//! let spec = MessageSpec::new(32, 8).unwrap();
//! let markers = FrameMarkers::default();
//! let msg = spec.encode_addr_type(1, 88, 9).unwrap();
//!
//! let bytes = encode_frame(&spec, &markers, &msg);
//! assert_eq!(bytes, vec![0x12, 0x10, 0x00, 0x00, 0x05, 0x80, 0x90, 0x13]);
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::wire_format::{Message, MessageSpec};
use crate::error::{Result, StepwireError};
use crate::queue::ByteQueue;

/// Default start-of-frame marker.
pub const DEFAULT_START: u8 = 0x12;

/// Default end-of-frame marker.
pub const DEFAULT_STOP: u8 = 0x13;

/// Default escape marker.
pub const DEFAULT_ESCAPE: u8 = 0x7D;

/// The three reserved byte values of the framing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameMarkers {
    pub start: u8,
    pub stop: u8,
    pub escape: u8,
}

impl FrameMarkers {
    /// Create a marker set, rejecting duplicates.
    pub fn new(start: u8, stop: u8, escape: u8) -> Result<Self> {
        let markers = Self {
            start,
            stop,
            escape,
        };
        markers.validate()?;
        Ok(markers)
    }

    /// Check that the three markers are distinct.
    pub fn validate(&self) -> Result<()> {
        if self.start == self.stop || self.start == self.escape || self.stop == self.escape {
            return Err(StepwireError::InvalidMarkers(format!(
                "start {:#04x}, stop {:#04x} and escape {:#04x} must be distinct",
                self.start, self.stop, self.escape
            )));
        }
        Ok(())
    }

    /// Whether `byte` must be escaped inside a payload.
    #[inline]
    pub fn is_marker(&self, byte: u8) -> bool {
        byte == self.start || byte == self.stop || byte == self.escape
    }
}

impl Default for FrameMarkers {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            stop: DEFAULT_STOP,
            escape: DEFAULT_ESCAPE,
        }
    }
}

/// Build a complete escaped frame for one message.
pub fn encode_frame(spec: &MessageSpec, markers: &FrameMarkers, msg: &Message) -> Vec<u8> {
    let payload = msg.to_bytes(spec);
    let mut buf = Vec::with_capacity(2 + payload.len() * 2);
    buf.push(markers.start);
    for byte in payload {
        if markers.is_marker(byte) {
            buf.push(markers.escape);
        }
        buf.push(byte);
    }
    buf.push(markers.stop);
    buf
}

/// Transmitter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    SendStart,
    /// `escaped` is set once the escape for `payload[index]` has gone out.
    SendPayload { index: usize, escaped: bool },
    SendStop,
}

/// Serializes one message at a time into an escaped byte stream.
///
/// Each [`step`](Self::step) emits at most one byte and only when the output
/// queue has room; otherwise the current byte is held for the next attempt.
pub struct FrameTransmitter {
    spec: MessageSpec,
    markers: FrameMarkers,
    payload: Bytes,
    state: State,
}

impl FrameTransmitter {
    pub fn new(spec: MessageSpec, markers: FrameMarkers) -> Self {
        Self {
            spec,
            markers,
            payload: Bytes::new(),
            state: State::Idle,
        }
    }

    /// Ready to accept a new message.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == State::Idle
    }

    /// Latch `msg` for transmission.
    ///
    /// Returns `false` without side effects while a previous message is
    /// still being sent.
    pub fn transmit(&mut self, msg: &Message) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.payload = Bytes::from(msg.to_bytes(&self.spec));
        self.state = State::SendStart;
        true
    }

    /// Emit at most one byte into `out`. Returns whether a byte was emitted.
    pub fn step(&mut self, out: &mut ByteQueue) -> bool {
        if self.state == State::Idle || out.is_full() {
            return false;
        }

        let (byte, next) = match self.state {
            State::Idle => return false,
            State::SendStart => (
                self.markers.start,
                State::SendPayload {
                    index: 0,
                    escaped: false,
                },
            ),
            State::SendPayload { index, escaped } => {
                let byte = self.payload[index];
                if self.markers.is_marker(byte) && !escaped {
                    (
                        self.markers.escape,
                        State::SendPayload {
                            index,
                            escaped: true,
                        },
                    )
                } else if index + 1 == self.payload.len() {
                    (byte, State::SendStop)
                } else {
                    (
                        byte,
                        State::SendPayload {
                            index: index + 1,
                            escaped: false,
                        },
                    )
                }
            }
            State::SendStop => (self.markers.stop, State::Idle),
        };

        let accepted = out.enqueue(byte);
        debug_assert!(accepted);
        tracing::trace!(byte, "tx byte");
        self.state = next;
        true
    }

    /// Emit bytes until the frame is finished or `out` is full.
    ///
    /// Returns the number of bytes emitted.
    pub fn pump(&mut self, out: &mut ByteQueue) -> usize {
        let mut emitted = 0;
        while self.step(out) {
            emitted += 1;
        }
        emitted
    }

    /// Abandon any frame in progress.
    pub fn reset(&mut self) {
        self.payload = Bytes::new();
        self.state = State::Idle;
    }
}
