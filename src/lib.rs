//! # stepwire
//!
//! Framed request/response controller for clock-steppable experiments.
//!
//! A host sends fixed-width command messages over a byte link. The controller
//! drives an experiment bus (address, data, write-enable, reset,
//! clock-enable), steps or free-runs the experiment clock, and answers every
//! command with exactly one response.
//!
//! ## Architecture
//!
//! - **Protocol**: message codec, opcode tables, escaped START/STOP framing
//! - **Control**: cycle controller, command dispatcher, response composer and
//!   the tick-driven [`Controller`]
//! - **Transport**: byte channels and an async stream service
//! - **Client**: host-side request/response over any tokio stream
//!
//! ## Example
//!
//! ```ignore
//! use stepwire::experiment::RamExperiment;
//! use stepwire::transport::serve;
//! use stepwire::ControllerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> stepwire::Result<()> {
//!     let mut controller = ControllerBuilder::new()
//!         .addr_width(32)
//!         .data_width(8)
//!         .build(RamExperiment::new(256, 8)?)?;
//!
//!     serve(&mut controller, tokio::io::stdin(), tokio::io::stdout()).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod control;
pub mod error;
pub mod experiment;
pub mod protocol;
pub mod queue;
pub mod transport;

pub use client::HostClient;
pub use config::{ControllerBuilder, ControllerConfig};
pub use control::{Controller, CycleMode, TickReport};
pub use error::{Result, StepwireError};
pub use experiment::{BusSignals, ExperimentBus, RamExperiment, ResetPolarity};
