//! Message codec.
//!
//! Packs and unpacks the two fixed-width message layouts:
//! ```text
//! address-type  ┌────────┬──────────────┬────────────┐
//!               │ opcode │ address      │ data       │
//!               │ 4 bits │ addr_width   │ data_width │
//!               └────────┴──────────────┴────────────┘
//! value-type    ┌────────┬───────────────────────────┐
//!               │ opcode │ value                     │
//!               │ 4 bits │ addr_width + data_width   │
//!               └────────┴───────────────────────────┘
//! ```
//!
//! The opcode always occupies the most significant bits. On the wire a
//! message is `message_bytes` bytes, Big Endian: the opcode's top bit is the
//! top bit of the first byte and any padding sits in the low bits of the last
//! byte.

use super::opcode::{Command, Layout, Response, OPCODE_WIDTH};
use crate::error::{Result, StepwireError};

/// Bits per wire byte.
pub const BYTE_WIDTH: u32 = 8;

/// Largest supported address or data width.
pub const MAX_FIELD_WIDTH: u32 = 64;

/// Largest supported message width (messages are held in a `u128`).
pub const MAX_MESSAGE_WIDTH: u32 = 128;

/// All-ones mask of `width` bits.
#[inline]
pub(crate) fn mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

fn check_field(field: &'static str, value: u128, width: u32) -> Result<()> {
    if value & !mask(width) != 0 {
        return Err(StepwireError::FieldOutOfRange {
            field,
            value,
            width,
        });
    }
    Ok(())
}

/// Field widths shared by both ends of the link.
///
/// Immutable once constructed; every offset used by the codec is derived from
/// `addr_width` and `data_width`.
///
/// # Example
///
/// ```
/// use stepwire::protocol::MessageSpec;
///
/// let spec = MessageSpec::new(32, 8).unwrap();
/// assert_eq!(spec.value_width(), 40);
/// assert_eq!(spec.message_width(), 44);
/// assert_eq!(spec.message_bytes(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpec {
    addr_width: u32,
    data_width: u32,
}

impl MessageSpec {
    /// Create a spec, rejecting widths the codec cannot represent.
    pub fn new(addr_width: u32, data_width: u32) -> Result<Self> {
        Self::check_width("address", addr_width)?;
        Self::check_width("data", data_width)?;

        if OPCODE_WIDTH + addr_width + data_width > MAX_MESSAGE_WIDTH {
            return Err(StepwireError::InvalidWidth {
                field: "message",
                width: OPCODE_WIDTH + addr_width + data_width,
                reason: "message must fit in 128 bits",
            });
        }

        Ok(Self {
            addr_width,
            data_width,
        })
    }

    fn check_width(field: &'static str, width: u32) -> Result<()> {
        if width < 1 {
            return Err(StepwireError::InvalidWidth {
                field,
                width,
                reason: "must be at least 1",
            });
        }
        if width > MAX_FIELD_WIDTH {
            return Err(StepwireError::InvalidWidth {
                field,
                width,
                reason: "must be at most 64",
            });
        }
        Ok(())
    }

    #[inline]
    pub fn opcode_width(&self) -> u32 {
        OPCODE_WIDTH
    }

    #[inline]
    pub fn addr_width(&self) -> u32 {
        self.addr_width
    }

    #[inline]
    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    #[inline]
    pub fn value_width(&self) -> u32 {
        self.addr_width + self.data_width
    }

    #[inline]
    pub fn message_width(&self) -> u32 {
        OPCODE_WIDTH + self.value_width()
    }

    /// Payload bytes per frame: `ceil(message_width / 8)`.
    #[inline]
    pub fn message_bytes(&self) -> usize {
        self.message_width().div_ceil(BYTE_WIDTH) as usize
    }

    /// Unused bits at the end of the wire payload.
    #[inline]
    pub fn padding_bits(&self) -> u32 {
        self.message_bytes() as u32 * BYTE_WIDTH - self.message_width()
    }

    /// Mask for the data field.
    #[inline]
    pub fn data_mask(&self) -> u64 {
        mask(self.data_width) as u64
    }

    /// Mask for the value field (also the cycle counter range).
    #[inline]
    pub fn value_mask(&self) -> u128 {
        mask(self.value_width())
    }

    /// Encode an address-type message.
    pub fn encode_addr_type(&self, opcode: u8, address: u64, data: u64) -> Result<Message> {
        check_field("opcode", opcode as u128, OPCODE_WIDTH)?;
        check_field("address", address as u128, self.addr_width)?;
        check_field("data", data as u128, self.data_width)?;

        let bits = ((opcode as u128) << self.value_width())
            | ((address as u128) << self.data_width)
            | data as u128;
        Ok(Message { bits })
    }

    /// Encode a value-type message.
    pub fn encode_value_type(&self, opcode: u8, value: u128) -> Result<Message> {
        check_field("opcode", opcode as u128, OPCODE_WIDTH)?;
        check_field("value", value, self.value_width())?;

        let bits = ((opcode as u128) << self.value_width()) | value;
        Ok(Message { bits })
    }

    /// Encode using whichever layout `payload` carries.
    pub fn encode_payload(&self, opcode: u8, payload: &Payload) -> Result<Message> {
        match *payload {
            Payload::Address { address, data } => self.encode_addr_type(opcode, address, data),
            Payload::Value(value) => self.encode_value_type(opcode, value),
        }
    }

    #[inline]
    pub fn parse_opcode(&self, msg: &Message) -> u8 {
        ((msg.bits >> self.value_width()) & mask(OPCODE_WIDTH)) as u8
    }

    #[inline]
    pub fn parse_addr(&self, msg: &Message) -> u64 {
        ((msg.bits >> self.data_width) & mask(self.addr_width)) as u64
    }

    #[inline]
    pub fn parse_data(&self, msg: &Message) -> u64 {
        (msg.bits & mask(self.data_width)) as u64
    }

    #[inline]
    pub fn parse_value(&self, msg: &Message) -> u128 {
        msg.bits & self.value_mask()
    }

    fn parse_payload(&self, msg: &Message, layout: Layout) -> Payload {
        match layout {
            Layout::Address => Payload::Address {
                address: self.parse_addr(msg),
                data: self.parse_data(msg),
            },
            Layout::Value => Payload::Value(self.parse_value(msg)),
        }
    }

    /// Decode a message as a command, using the command's layout.
    ///
    /// Returns `None` when the opcode is not a known command.
    pub fn decode_command(&self, msg: &Message) -> Option<CommandMessage> {
        let command = Command::from_code(self.parse_opcode(msg))?;
        Some(CommandMessage {
            command,
            payload: self.parse_payload(msg, command.layout()),
        })
    }

    /// Decode a message as a response, using the response's layout.
    ///
    /// Returns `None` when the opcode is not a known response.
    pub fn decode_response(&self, msg: &Message) -> Option<ResponseMessage> {
        let response = Response::from_code(self.parse_opcode(msg))?;
        Some(ResponseMessage {
            response,
            payload: self.parse_payload(msg, response.layout()),
        })
    }
}

/// A single fixed-width message.
///
/// Holds exactly `message_width` bits for the [`MessageSpec`] it was built
/// with; bits above that width are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Message {
    bits: u128,
}

impl Message {
    /// Build a message from raw bits, discarding anything above `message_width`.
    pub fn from_bits(spec: &MessageSpec, bits: u128) -> Self {
        Self {
            bits: bits & mask(spec.message_width()),
        }
    }

    /// Raw bits.
    #[inline]
    pub fn bits(&self) -> u128 {
        self.bits
    }

    /// Big Endian wire payload (`message_bytes` long).
    ///
    /// The opcode's top bit is the top bit of byte 0; unused low bits of the
    /// last byte are zero.
    pub fn to_bytes(&self, spec: &MessageSpec) -> Vec<u8> {
        let n = spec.message_bytes();
        let padded = self.bits << spec.padding_bits();
        padded.to_be_bytes()[16 - n..].to_vec()
    }

    /// Parse a Big Endian wire payload.
    ///
    /// Returns `None` if `bytes` is not exactly `message_bytes` long.
    /// Padding bits in the last byte are ignored.
    pub fn from_bytes(spec: &MessageSpec, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != spec.message_bytes() {
            return None;
        }
        let bits = bytes
            .iter()
            .fold(0u128, |acc, &b| (acc << BYTE_WIDTH) | b as u128);
        Some(Self::from_bits(spec, bits >> spec.padding_bits()))
    }
}

/// Layout-specific message fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Address { address: u64, data: u64 },
    Value(u128),
}

impl Payload {
    /// Address field, if this is an address-type payload.
    pub fn address(&self) -> Option<u64> {
        match *self {
            Payload::Address { address, .. } => Some(address),
            Payload::Value(_) => None,
        }
    }

    /// Data field, if this is an address-type payload.
    pub fn data(&self) -> Option<u64> {
        match *self {
            Payload::Address { data, .. } => Some(data),
            Payload::Value(_) => None,
        }
    }

    /// Value field, if this is a value-type payload.
    pub fn value(&self) -> Option<u128> {
        match *self {
            Payload::Value(value) => Some(value),
            Payload::Address { .. } => None,
        }
    }
}

/// A decoded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandMessage {
    pub command: Command,
    pub payload: Payload,
}

/// A decoded response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseMessage {
    pub response: Response,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec() -> MessageSpec {
        MessageSpec::new(32, 8).unwrap()
    }

    #[test]
    fn test_derived_widths() {
        let spec = spec();
        assert_eq!(spec.opcode_width(), 4);
        assert_eq!(spec.value_width(), 40);
        assert_eq!(spec.message_width(), 44);
        assert_eq!(spec.message_bytes(), 6);

        let small = MessageSpec::new(1, 1).unwrap();
        assert_eq!(small.message_width(), 6);
        assert_eq!(small.message_bytes(), 1);

        let exact = MessageSpec::new(2, 2).unwrap();
        assert_eq!(exact.message_bytes(), 1);

        assert_eq!(spec.padding_bits(), 4);
        assert_eq!(small.padding_bits(), 2);
        assert_eq!(exact.padding_bits(), 0);
    }

    #[test]
    fn test_invalid_widths_rejected() {
        assert!(matches!(
            MessageSpec::new(0, 8),
            Err(StepwireError::InvalidWidth {
                field: "address",
                ..
            })
        ));
        assert!(matches!(
            MessageSpec::new(8, 0),
            Err(StepwireError::InvalidWidth { field: "data", .. })
        ));
        assert!(MessageSpec::new(65, 8).is_err());
        assert!(MessageSpec::new(64, 64).is_err());
        assert!(MessageSpec::new(64, 60).is_ok());
    }

    #[test]
    fn test_addr_type_bit_layout() {
        let spec = spec();
        let msg = spec.encode_addr_type(0xF, 0x2212_4455, 0x7D).unwrap();
        assert_eq!(msg.bits(), 0xF_2212_4455_7D);
        assert_eq!(msg.to_bytes(&spec), vec![0xF2, 0x21, 0x24, 0x45, 0x57, 0xD0]);

        let aligned = MessageSpec::new(36, 8).unwrap();
        let msg = aligned.encode_addr_type(0xF, 0x2_2124_4557, 0xD0).unwrap();
        assert_eq!(msg.to_bytes(&aligned), vec![0xF2, 0x21, 0x24, 0x45, 0x57, 0xD0]);
    }

    #[test]
    fn test_value_type_bit_layout() {
        let spec = spec();
        let msg = spec.encode_value_type(5, 34524).unwrap();
        assert_eq!(msg.bits(), (5u128 << 40) | 34524);
        assert_eq!(spec.parse_opcode(&msg), 5);
        assert_eq!(spec.parse_value(&msg), 34524);
    }

    #[test]
    fn test_addr_type_roundtrip_at_bounds() {
        let spec = spec();
        for &(op, addr, data) in &[
            (0u8, 0u64, 0u64),
            (15, u32::MAX as u64, 0xFF),
            (1, 88, 9),
            (3, 0x8000_0000, 0x80),
        ] {
            let msg = spec.encode_addr_type(op, addr, data).unwrap();
            assert_eq!(spec.parse_opcode(&msg), op);
            assert_eq!(spec.parse_addr(&msg), addr);
            assert_eq!(spec.parse_data(&msg), data);
        }
    }

    #[test]
    fn test_value_type_roundtrip_at_bounds() {
        let spec = spec();
        for &value in &[0u128, 1, (1 << 40) - 1, 0x12_3456_789A] {
            let msg = spec.encode_value_type(11, value).unwrap();
            assert_eq!(spec.parse_opcode(&msg), 11);
            assert_eq!(spec.parse_value(&msg), value);
        }
    }

    #[test]
    fn test_out_of_range_fields_rejected() {
        let spec = spec();

        let err = spec.encode_addr_type(0, 1 << 32, 0).unwrap_err();
        assert!(matches!(
            err,
            StepwireError::FieldOutOfRange {
                field: "address",
                width: 32,
                ..
            }
        ));

        assert!(spec.encode_addr_type(0, 0, 0x100).is_err());
        assert!(spec.encode_addr_type(16, 0, 0).is_err());
        assert!(spec.encode_value_type(0, 1 << 40).is_err());
        assert!(spec.encode_value_type(16, 0).is_err());
    }

    #[test]
    fn test_decode_is_total() {
        let spec = spec();
        let msg = Message::from_bits(&spec, u128::MAX);
        assert_eq!(msg.bits(), (1u128 << 44) - 1);
        assert_eq!(spec.parse_opcode(&msg), 15);
        assert_eq!(spec.parse_addr(&msg), u32::MAX as u64);
        assert_eq!(spec.parse_data(&msg), 0xFF);
        assert_eq!(spec.parse_value(&msg), (1 << 40) - 1);

        assert!(spec.decode_command(&msg).is_none());
        assert!(spec.decode_response(&msg).is_none());
    }

    #[test]
    fn test_from_bytes() {
        let spec = spec();
        let msg = Message::from_bytes(&spec, &[0x10, 0x00, 0x00, 0x05, 0x80, 0x90]).unwrap();
        assert_eq!(
            spec.decode_command(&msg),
            Some(CommandMessage {
                command: Command::Write,
                payload: Payload::Address {
                    address: 88,
                    data: 9
                },
            })
        );

        // The low padding nibble of the last byte is ignored.
        let padded = Message::from_bytes(&spec, &[0x10, 0, 0, 0, 0, 0x0F]).unwrap();
        assert_eq!(spec.parse_opcode(&padded), 1);
        assert_eq!(spec.parse_data(&padded), 0);

        assert!(Message::from_bytes(&spec, &[0; 5]).is_none());
        assert!(Message::from_bytes(&spec, &[0; 7]).is_none());
    }

    #[test]
    fn test_decode_response_uses_layout() {
        let spec = spec();
        let msg = spec.encode_value_type(Response::StepSuccess.code(), 7).unwrap();
        let decoded = spec.decode_response(&msg).unwrap();
        assert_eq!(decoded.response, Response::StepSuccess);
        assert_eq!(decoded.payload.value(), Some(7));
        assert_eq!(decoded.payload.address(), None);

        let msg = spec
            .encode_payload(
                Response::ReadErrorMode.code(),
                &Payload::Address {
                    address: 234,
                    data: 0,
                },
            )
            .unwrap();
        let decoded = spec.decode_response(&msg).unwrap();
        assert_eq!(decoded.payload.address(), Some(234));
        assert_eq!(decoded.payload.data(), Some(0));
    }

    proptest! {
        #[test]
        fn addr_type_survives_wire_bytes(
            addr_width in 1u32..=62,
            data_width in 1u32..=62,
            opcode in 0u8..16,
            address in any::<u64>(),
            data in any::<u64>(),
        ) {
            let spec = MessageSpec::new(addr_width, data_width).unwrap();
            let address = address & mask(addr_width) as u64;
            let data = data & spec.data_mask();

            let msg = spec.encode_addr_type(opcode, address, data).unwrap();
            let bytes = msg.to_bytes(&spec);
            prop_assert_eq!(bytes.len(), spec.message_bytes());

            let back = Message::from_bytes(&spec, &bytes).unwrap();
            prop_assert_eq!(back, msg);
            prop_assert_eq!(spec.parse_opcode(&back), opcode);
            prop_assert_eq!(spec.parse_addr(&back), address);
            prop_assert_eq!(spec.parse_data(&back), data);
        }

        #[test]
        fn value_type_survives_wire_bytes(
            addr_width in 1u32..=62,
            data_width in 1u32..=62,
            opcode in 0u8..16,
            value in any::<u128>(),
        ) {
            let spec = MessageSpec::new(addr_width, data_width).unwrap();
            let value = value & spec.value_mask();

            let msg = spec.encode_value_type(opcode, value).unwrap();
            let back = Message::from_bytes(&spec, &msg.to_bytes(&spec)).unwrap();
            prop_assert_eq!(spec.parse_opcode(&back), opcode);
            prop_assert_eq!(spec.parse_value(&back), value);
        }

        #[test]
        fn padding_bits_are_ignored(
            addr_width in 1u32..=62,
            data_width in 1u32..=62,
            raw in prop::collection::vec(any::<u8>(), 16),
        ) {
            let spec = MessageSpec::new(addr_width, data_width).unwrap();
            let raw = &raw[..spec.message_bytes()];
            let msg = Message::from_bytes(&spec, raw).unwrap();

            let mut cleared = msg.to_bytes(&spec);
            let keep = 0xFFu8 << spec.padding_bits();
            prop_assert_eq!(cleared.pop(), raw.last().map(|b| b & keep));
            prop_assert_eq!(&cleared[..], &raw[..raw.len() - 1]);
        }
    }
}
