//! Command and response opcodes.
//!
//! Both sets live in the same 4-bit opcode field but are never compared
//! across sets: a host only ever sends [`Command`]s and the controller only
//! ever answers with [`Response`]s.

/// Width of the opcode field in bits.
pub const OPCODE_WIDTH: u32 = 4;

/// Which field layout a message uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `[opcode | address | data]`
    Address,
    /// `[opcode | value]`
    Value,
}

/// Commands sent by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Read = 0,
    Write = 1,
    Reset = 2,
    Step = 3,
    Start = 4,
    Pause = 5,
    Status = 6,
}

impl Command {
    /// All commands in opcode order.
    pub const ALL: [Command; 7] = [
        Command::Read,
        Command::Write,
        Command::Reset,
        Command::Step,
        Command::Start,
        Command::Pause,
        Command::Status,
    ];

    /// Numeric opcode.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a command by opcode.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Field layout used by this command.
    pub fn layout(self) -> Layout {
        match self {
            Command::Read | Command::Write => Layout::Address,
            Command::Reset
            | Command::Step
            | Command::Start
            | Command::Pause
            | Command::Status => Layout::Value,
        }
    }

    /// Responses the controller may send for this command.
    pub fn responses(self) -> &'static [Response] {
        match self {
            Command::Read => &[Response::ReadSuccess, Response::ReadErrorMode],
            Command::Write => &[Response::WriteSuccess, Response::WriteErrorMode],
            Command::Reset => &[Response::ResetSuccess],
            Command::Step => &[Response::StepSuccess, Response::StepErrorMode],
            Command::Start => &[Response::StartSuccess, Response::StartErrorMode],
            Command::Pause => &[Response::PauseSuccess, Response::PauseErrorMode],
            Command::Status => &[Response::Status],
        }
    }
}

/// Responses sent by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Response {
    ReadSuccess = 0,
    ReadErrorMode = 1,
    WriteSuccess = 2,
    WriteErrorMode = 3,
    ResetSuccess = 4,
    StepSuccess = 5,
    StepErrorMode = 6,
    StartSuccess = 7,
    StartErrorMode = 8,
    PauseSuccess = 9,
    PauseErrorMode = 10,
    Status = 11,
}

impl Response {
    /// All responses in opcode order.
    pub const ALL: [Response; 12] = [
        Response::ReadSuccess,
        Response::ReadErrorMode,
        Response::WriteSuccess,
        Response::WriteErrorMode,
        Response::ResetSuccess,
        Response::StepSuccess,
        Response::StepErrorMode,
        Response::StartSuccess,
        Response::StartErrorMode,
        Response::PauseSuccess,
        Response::PauseErrorMode,
        Response::Status,
    ];

    /// Numeric opcode.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a response by opcode.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Field layout used by this response.
    pub fn layout(self) -> Layout {
        match self {
            Response::ReadSuccess
            | Response::ReadErrorMode
            | Response::WriteSuccess
            | Response::WriteErrorMode => Layout::Address,
            Response::ResetSuccess
            | Response::StepSuccess
            | Response::StepErrorMode
            | Response::StartSuccess
            | Response::StartErrorMode
            | Response::PauseSuccess
            | Response::PauseErrorMode
            | Response::Status => Layout::Value,
        }
    }

    /// Whether this response reports a command refused in the current mode.
    pub fn is_mode_error(self) -> bool {
        matches!(
            self,
            Response::ReadErrorMode
                | Response::WriteErrorMode
                | Response::StepErrorMode
                | Response::StartErrorMode
                | Response::PauseErrorMode
        )
    }
}
