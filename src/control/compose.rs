//! Response composer.

use crate::error::Result;
use crate::protocol::{Message, MessageSpec, Response};

/// Build the response message for an accepted command.
///
/// `cycle_count` is the count *before* this tick's cycle transition, so a
/// successful step reports `cycle_count + 1`, the count after its own pulse.
/// `read_data` is masked to the data width of the bus.
pub fn compose(
    spec: &MessageSpec,
    response: Response,
    address: u64,
    read_data: u64,
    cycle_count: u128,
) -> Result<Message> {
    let opcode = response.code();

    match response {
        Response::ReadSuccess | Response::WriteSuccess => {
            spec.encode_addr_type(opcode, address, read_data & spec.data_mask())
        }
        Response::ReadErrorMode | Response::WriteErrorMode => {
            spec.encode_addr_type(opcode, address, 0)
        }
        Response::StepSuccess => spec.encode_value_type(
            opcode,
            cycle_count.wrapping_add(1) & spec.value_mask(),
        ),
        Response::StartSuccess | Response::PauseSuccess | Response::Status => {
            spec.encode_value_type(opcode, cycle_count & spec.value_mask())
        }
        Response::ResetSuccess
        | Response::StepErrorMode
        | Response::StartErrorMode
        | Response::PauseErrorMode => spec.encode_value_type(opcode, 0),
    }
}
