//! Protocol module - message codec, opcodes and framing.
//!
//! This module implements the wire side of the controller:
//! - fixed-width message encoding/decoding (address-type and value-type)
//! - command/response opcode tables
//! - escaped START/STOP framing in both directions

mod frame;
mod frame_buffer;
mod opcode;
mod wire_format;

pub use frame::{
    encode_frame, FrameMarkers, FrameTransmitter, DEFAULT_ESCAPE, DEFAULT_START, DEFAULT_STOP,
};
pub use frame_buffer::FrameReceiver;
pub use opcode::{Command, Layout, Response, OPCODE_WIDTH};
pub use wire_format::{
    CommandMessage, Message, MessageSpec, Payload, ResponseMessage, BYTE_WIDTH, MAX_FIELD_WIDTH,
    MAX_MESSAGE_WIDTH,
};

pub(crate) use wire_format::mask;
