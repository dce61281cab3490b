//! Frame receiver for reassembling messages from a byte stream.
//!
//! Implements a state machine over single bytes:
//! - `AwaitStart`: skip bytes until an unescaped START
//! - `ReadingPayload`: collect `message_bytes` payload bytes, de-escaping
//! - `AwaitStop`: the next byte must be an unescaped STOP
//! - `Ready`: hold the message until the consumer calls `advance()`
//!
//! Malformed input never produces an error. The partial frame is dropped,
//! the receiver resynchronizes on the next START, and the drop is counted.
//!
//! # Example
//!
//! ```
//! use stepwire::protocol::{encode_frame, FrameMarkers, FrameReceiver, MessageSpec};
//! use stepwire::queue::ByteQueue;
//!
//! let spec = MessageSpec::new(32, 8).unwrap();
//! let markers = FrameMarkers::default();
//! let msg = spec.encode_value_type(3, 0).unwrap();
//!
//! let mut input = ByteQueue::new(32).unwrap();
//! for byte in encode_frame(&spec, &markers, &msg) {
//!     input.enqueue(byte);
//! }
//!
//! let mut rx = FrameReceiver::new(spec, markers);
//! rx.pump(&mut input);
//! assert_eq!(rx.take_message(), Some(msg));
//! ```

use bytes::BytesMut;

use super::frame::FrameMarkers;
use super::wire_format::{Message, MessageSpec};
use crate::queue::ByteQueue;

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitStart,
    ReadingPayload,
    AwaitStop,
    Ready,
}

/// Reassembles one message at a time from an escaped byte stream.
pub struct FrameReceiver {
    spec: MessageSpec,
    markers: FrameMarkers,
    state: State,
    /// The previous byte was an unconsumed escape marker.
    escaped: bool,
    payload: BytesMut,
    message: Option<Message>,
    discarded: u64,
}

impl FrameReceiver {
    pub fn new(spec: MessageSpec, markers: FrameMarkers) -> Self {
        Self {
            spec,
            markers,
            state: State::AwaitStart,
            escaped: false,
            payload: BytesMut::with_capacity(spec.message_bytes()),
            message: None,
            discarded: 0,
        }
    }

    /// A complete message is waiting to be consumed.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == State::Ready
    }

    /// The message held while ready.
    #[inline]
    pub fn message(&self) -> Option<Message> {
        self.message
    }

    /// Release the held message and resume reading input.
    pub fn advance(&mut self) {
        if self.state == State::Ready {
            self.message = None;
            self.state = State::AwaitStart;
        }
    }

    /// Take the held message, if any, and resume reading input.
    pub fn take_message(&mut self) -> Option<Message> {
        let msg = self.message.take();
        self.advance();
        msg
    }

    /// Number of partial or malformed frames dropped so far.
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Consume at most one byte from `input`.
    ///
    /// Nothing is consumed while a message is held.
    pub fn step(&mut self, input: &mut ByteQueue) -> bool {
        if self.is_ready() {
            return false;
        }
        match input.dequeue() {
            Some(byte) => self.push_byte(byte),
            None => false,
        }
    }

    /// Consume bytes until a message is ready or `input` runs dry.
    ///
    /// Returns the number of bytes consumed.
    pub fn pump(&mut self, input: &mut ByteQueue) -> usize {
        let mut consumed = 0;
        while self.step(input) {
            consumed += 1;
        }
        consumed
    }

    /// Feed a single byte. Returns `false` if the byte was refused because a
    /// message is being held.
    pub fn push_byte(&mut self, byte: u8) -> bool {
        let escaped = std::mem::take(&mut self.escaped);

        match self.state {
            State::Ready => {
                self.escaped = escaped;
                return false;
            }
            State::AwaitStart => self.await_start(byte, escaped),
            State::ReadingPayload => {
                if escaped {
                    self.append(byte);
                } else if byte == self.markers.escape {
                    self.escaped = true;
                } else if byte == self.markers.start {
                    if !self.payload.is_empty() {
                        self.discard("restart inside frame");
                    }
                    self.payload.clear();
                } else if byte == self.markers.stop {
                    self.discard("short frame");
                    self.state = State::AwaitStart;
                } else {
                    self.append(byte);
                }
            }
            State::AwaitStop => {
                if byte == self.markers.stop {
                    self.complete();
                } else {
                    self.discard("missing stop marker");
                    self.state = State::AwaitStart;
                    // The offending byte may itself open the next frame.
                    self.await_start(byte, false);
                }
            }
        }
        true
    }

    /// Drop any partial frame and return to `AwaitStart`.
    pub fn reset(&mut self) {
        self.state = State::AwaitStart;
        self.escaped = false;
        self.payload.clear();
        self.message = None;
    }

    fn await_start(&mut self, byte: u8, escaped: bool) {
        if escaped {
            return;
        }
        if byte == self.markers.escape {
            self.escaped = true;
        } else if byte == self.markers.start {
            self.payload.clear();
            self.state = State::ReadingPayload;
        } else {
            tracing::trace!(byte, "rx byte outside frame");
        }
    }

    fn append(&mut self, byte: u8) {
        self.payload.extend_from_slice(&[byte]);
        if self.payload.len() == self.spec.message_bytes() {
            self.state = State::AwaitStop;
        }
    }

    fn complete(&mut self) {
        match Message::from_bytes(&self.spec, &self.payload) {
            Some(msg) => {
                self.message = Some(msg);
                self.state = State::Ready;
            }
            None => {
                self.discard("payload length mismatch");
                self.state = State::AwaitStart;
            }
        }
        self.payload.clear();
    }

    fn discard(&mut self, reason: &'static str) {
        self.discarded += 1;
        tracing::debug!(
            reason,
            partial_bytes = self.payload.len(),
            "discarding frame"
        );
        self.payload.clear();
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::AwaitStart => "AwaitStart",
            State::ReadingPayload => "ReadingPayload",
            State::AwaitStop => "AwaitStop",
            State::Ready => "Ready",
        }
    }
}
