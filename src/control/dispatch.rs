//! Command dispatcher.
//!
//! A pure function of `(command, mode)`. It decides the response opcode and
//! which side effects the controller performs this tick; it never touches
//! state itself.

use super::cycle::{CycleInput, CycleMode};
use crate::protocol::{Command, Response};

/// Outcome of dispatching one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub response: Response,
    /// Pulse write-enable on the experiment bus.
    pub write_enable: bool,
    /// Pulse the experiment reset.
    pub experiment_reset: bool,
    /// Input for the cycle controller this tick.
    pub cycle_input: Option<CycleInput>,
}

impl Decision {
    fn respond(response: Response) -> Self {
        Self {
            response,
            write_enable: false,
            experiment_reset: false,
            cycle_input: None,
        }
    }

    fn with_cycle(mut self, input: CycleInput) -> Self {
        self.cycle_input = Some(input);
        self
    }
}

/// Map a command to its response and side effects in the given mode.
pub fn dispatch(command: Command, mode: CycleMode) -> Decision {
    let autonomous = mode == CycleMode::Autonomous;

    match (command, autonomous) {
        (Command::Read, false) => Decision::respond(Response::ReadSuccess),
        (Command::Read, true) => Decision::respond(Response::ReadErrorMode),

        (Command::Write, false) => Decision {
            write_enable: true,
            ..Decision::respond(Response::WriteSuccess)
        },
        (Command::Write, true) => Decision::respond(Response::WriteErrorMode),

        (Command::Reset, _) => Decision {
            experiment_reset: true,
            ..Decision::respond(Response::ResetSuccess)
        },

        (Command::Step, false) => {
            Decision::respond(Response::StepSuccess).with_cycle(CycleInput::Step)
        }
        (Command::Step, true) => Decision::respond(Response::StepErrorMode),

        (Command::Start, false) => {
            Decision::respond(Response::StartSuccess).with_cycle(CycleInput::Start)
        }
        (Command::Start, true) => Decision::respond(Response::StartErrorMode),

        (Command::Pause, true) => {
            Decision::respond(Response::PauseSuccess).with_cycle(CycleInput::Pause)
        }
        (Command::Pause, false) => Decision::respond(Response::PauseErrorMode),

        (Command::Status, _) => Decision::respond(Response::Status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use super::CycleMode::{Autonomous, Manual};

    /// (command, mode, response, write_enable, experiment_reset, cycle_input)
    const TABLE: [(Command, CycleMode, Response, bool, bool, Option<CycleInput>); 14] = [
        (Command::Read, Manual, Response::ReadSuccess, false, false, None),
        (Command::Read, Autonomous, Response::ReadErrorMode, false, false, None),
        (Command::Write, Manual, Response::WriteSuccess, true, false, None),
        (Command::Write, Autonomous, Response::WriteErrorMode, false, false, None),
        (Command::Reset, Manual, Response::ResetSuccess, false, true, None),
        (Command::Reset, Autonomous, Response::ResetSuccess, false, true, None),
        (Command::Step, Manual, Response::StepSuccess, false, false, Some(CycleInput::Step)),
        (Command::Step, Autonomous, Response::StepErrorMode, false, false, None),
        (Command::Start, Manual, Response::StartSuccess, false, false, Some(CycleInput::Start)),
        (Command::Start, Autonomous, Response::StartErrorMode, false, false, None),
        (Command::Pause, Manual, Response::PauseErrorMode, false, false, None),
        (Command::Pause, Autonomous, Response::PauseSuccess, false, false, Some(CycleInput::Pause)),
        (Command::Status, Manual, Response::Status, false, false, None),
        (Command::Status, Autonomous, Response::Status, false, false, None),
    ];

    #[test]
    fn test_decision_table() {
        for (command, mode, response, write_enable, experiment_reset, cycle_input) in TABLE {
            let decision = dispatch(command, mode);
            assert_eq!(
                decision,
                Decision {
                    response,
                    write_enable,
                    experiment_reset,
                    cycle_input,
                },
                "{:?} in {:?}",
                command,
                mode
            );
        }
    }

    #[test]
    fn test_table_covers_every_command_and_mode() {
        for command in Command::ALL {
            for mode in [Manual, Autonomous] {
                assert!(TABLE.iter().any(|row| row.0 == command && row.1 == mode));
            }
        }
    }
}
