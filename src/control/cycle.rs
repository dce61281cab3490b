//! Cycle controller - manual stepping and free-running clock.

use crate::protocol::MessageSpec;

/// Clock stepping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleMode {
    #[default]
    Manual,
    Autonomous,
}

/// One-shot request to the cycle controller. At most one per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleInput {
    Step,
    Start,
    Pause,
}

/// Tracks the experiment clock: mode, cycle count and clock-enable.
///
/// The cycle count wraps modulo `2^value_width`.
#[derive(Debug, Clone)]
pub struct CycleController {
    mode: CycleMode,
    cycle_count: u128,
    clock_enable: bool,
    count_mask: u128,
}

impl CycleController {
    pub fn new(spec: &MessageSpec) -> Self {
        Self {
            mode: CycleMode::Manual,
            cycle_count: 0,
            clock_enable: false,
            count_mask: spec.value_mask(),
        }
    }

    #[inline]
    pub fn mode(&self) -> CycleMode {
        self.mode
    }

    #[inline]
    pub fn is_autonomous(&self) -> bool {
        self.mode == CycleMode::Autonomous
    }

    #[inline]
    pub fn cycle_count(&self) -> u128 {
        self.cycle_count
    }

    /// Clock-enable level for the current tick.
    #[inline]
    pub fn clock_enable(&self) -> bool {
        self.clock_enable
    }

    /// Advance one tick.
    ///
    /// `Start` and `Step` are ignored while autonomous, and `Pause` while
    /// manual; the dispatcher never issues them in those modes.
    pub fn tick(&mut self, input: Option<CycleInput>) {
        match (self.mode, input) {
            (CycleMode::Manual, Some(CycleInput::Step)) => {
                self.increment();
                self.clock_enable = true;
            }
            (CycleMode::Manual, Some(CycleInput::Start)) => {
                self.increment();
                self.clock_enable = true;
                self.mode = CycleMode::Autonomous;
            }
            (CycleMode::Manual, _) => {
                self.clock_enable = false;
            }
            (CycleMode::Autonomous, Some(CycleInput::Pause)) => {
                self.clock_enable = false;
                self.mode = CycleMode::Manual;
            }
            (CycleMode::Autonomous, _) => {
                self.increment();
                self.clock_enable = true;
            }
        }
    }

    /// Back to manual mode with a zero count.
    pub fn reset(&mut self) {
        self.mode = CycleMode::Manual;
        self.cycle_count = 0;
        self.clock_enable = false;
    }

    fn increment(&mut self) {
        self.cycle_count = self.cycle_count.wrapping_add(1) & self.count_mask;
    }

    #[cfg(test)]
    pub(crate) fn set_cycle_count(&mut self, count: u128) {
        self.cycle_count = count & self.count_mask;
    }
}
