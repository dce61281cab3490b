//! Control module - cycle stepping, command dispatch and the controller.
//!
//! # Tick pipeline
//!
//! ```text
//! rx queue ─► FrameReceiver ─► dispatch(command, mode) ─► experiment bus
//!                                      │                        │
//!                                      ▼                        ▼
//!                              CycleController ───────► compose(response)
//!                                                               │
//! tx queue ◄─ FrameTransmitter ◄────────────────────────────────┘
//! ```
//!
//! Each [`Controller::tick`] accepts at most one command, and only while the
//! transmitter is idle. Responses leave in the order their commands arrived.
//!
//! # Example
//!
//! ```
//! use stepwire::config::ControllerBuilder;
//! use stepwire::experiment::RamExperiment;
//! use stepwire::protocol::{encode_frame, Command};
//!
//! let mut ctl = ControllerBuilder::new()
//!     .addr_width(32)
//!     .data_width(8)
//!     .build(RamExperiment::new(256, 8).unwrap())
//!     .unwrap();
//!
//! let spec = *ctl.spec();
//! let msg = spec.encode_value_type(Command::Step.code(), 0).unwrap();
//! ctl.feed(&encode_frame(&spec, ctl.markers(), &msg));
//!
//! let report = ctl.tick();
//! assert_eq!(report.command, Some(Command::Step));
//! assert_eq!(ctl.cycle_count(), 1);
//! assert!(!ctl.drain().is_empty());
//! ```

mod compose;
mod controller;
mod cycle;
mod dispatch;

pub use compose::compose;
pub use controller::{Controller, TickReport};
pub use cycle::{CycleController, CycleInput, CycleMode};
pub use dispatch::{dispatch, Decision};
