//! Experiment bus.
//!
//! The controller never talks to the experiment directly; it drives a set of
//! [`BusSignals`] once per tick and samples the read-data the experiment
//! returns. Anything that implements [`ExperimentBus`] can sit behind the
//! controller: a hardware adapter, a simulator, or the in-memory
//! [`RamExperiment`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, StepwireError};
use crate::protocol::mask;

/// Electrical polarity of the experiment reset line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

/// Signals driven onto the experiment bus for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusSignals {
    pub address: u64,
    pub write_data: u64,
    /// One-shot write pulse.
    pub write_enable: bool,
    /// One-shot reset pulse (logical, see [`BusSignals::reset_line`]).
    pub reset: bool,
    /// High while the experiment clock is stepping or running.
    pub clock_enable: bool,
}

impl BusSignals {
    /// Physical level of the reset line under `polarity`.
    #[inline]
    pub fn reset_line(&self, polarity: ResetPolarity) -> bool {
        match polarity {
            ResetPolarity::ActiveHigh => self.reset,
            ResetPolarity::ActiveLow => !self.reset,
        }
    }
}

/// The external resource operated by the controller.
pub trait ExperimentBus: Send {
    /// Apply one tick of bus signals and return the read-data at
    /// `signals.address` after reset, write and clock have taken effect.
    fn apply(&mut self, signals: &BusSignals) -> u64;
}

impl<T: ExperimentBus + ?Sized> ExperimentBus for Box<T> {
    fn apply(&mut self, signals: &BusSignals) -> u64 {
        (**self).apply(signals)
    }
}

/// Word-addressed memory that counts the clock cycles it receives.
///
/// Addresses wrap modulo `depth`; stored words are masked to `data_width`.
#[derive(Debug, Clone)]
pub struct RamExperiment {
    mem: Vec<u64>,
    data_mask: u64,
    cycles: u64,
}

impl RamExperiment {
    /// Create a memory of `depth` words. A depth of 0 is rejected.
    pub fn new(depth: usize, data_width: u32) -> Result<Self> {
        if depth == 0 {
            return Err(StepwireError::ZeroDepth);
        }
        Ok(Self {
            mem: vec![0; depth],
            data_mask: mask(data_width) as u64,
            cycles: 0,
        })
    }

    /// Clock-enabled ticks seen since the last reset.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn peek(&self, address: u64) -> u64 {
        self.mem[self.index(address)]
    }

    pub fn poke(&mut self, address: u64, data: u64) {
        let i = self.index(address);
        self.mem[i] = data & self.data_mask;
    }

    fn index(&self, address: u64) -> usize {
        (address % self.mem.len() as u64) as usize
    }
}

impl ExperimentBus for RamExperiment {
    fn apply(&mut self, signals: &BusSignals) -> u64 {
        if signals.reset {
            self.mem.fill(0);
            self.cycles = 0;
        }
        if signals.write_enable {
            self.poke(signals.address, signals.write_data);
        }
        if signals.clock_enable {
            self.cycles = self.cycles.wrapping_add(1);
        }
        self.peek(signals.address)
    }
}
