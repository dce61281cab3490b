//! The tick-driven controller.

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::experiment::{BusSignals, ExperimentBus, ResetPolarity};
use crate::protocol::{
    Command, FrameMarkers, FrameReceiver, FrameTransmitter, Message, MessageSpec, Response,
};
use crate::queue::ByteQueue;
use crate::transport::ByteChannel;

use super::compose::compose;
use super::cycle::{CycleController, CycleMode};
use super::dispatch::{dispatch, Decision};

/// A command taken from the receiver this tick.
struct Accepted {
    command: Command,
    address: u64,
    data: u64,
    decision: Decision,
}

/// What happened during one [`Controller::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Command accepted this tick.
    pub command: Option<Command>,
    /// Response handed to the transmitter this tick.
    pub response: Option<Response>,
    /// Clock-enable level driven onto the experiment bus.
    pub clock_enable: bool,
}

/// Request/response controller for a clock-steppable experiment.
///
/// Owns the rx/tx byte queues, both framers, the cycle controller and the
/// experiment. Nothing happens between calls to [`tick`](Self::tick).
pub struct Controller<E> {
    spec: MessageSpec,
    markers: FrameMarkers,
    reset_polarity: ResetPolarity,
    rx: ByteQueue,
    tx: ByteQueue,
    receiver: FrameReceiver,
    transmitter: FrameTransmitter,
    cycle: CycleController,
    experiment: E,
    bus: BusSignals,
    dropped: u64,
}

impl<E: ExperimentBus> Controller<E> {
    /// Build a controller from a validated configuration.
    pub fn from_config(config: &ControllerConfig, experiment: E) -> Result<Self> {
        config.validate()?;
        let spec = config.message_spec()?;

        Ok(Self {
            spec,
            markers: config.markers,
            reset_polarity: config.reset_polarity,
            rx: ByteQueue::new(config.rx_depth)?,
            tx: ByteQueue::new(config.tx_depth)?,
            receiver: FrameReceiver::new(spec, config.markers),
            transmitter: FrameTransmitter::new(spec, config.markers),
            cycle: CycleController::new(&spec),
            experiment,
            bus: BusSignals::default(),
            dropped: 0,
        })
    }

    /// Advance the controller by one tick.
    ///
    /// At most one command is accepted, and only while the transmitter is
    /// idle so the response has somewhere to go.
    pub fn tick(&mut self) -> TickReport {
        self.receiver.pump(&mut self.rx);

        let mut report = TickReport::default();
        let mut signals = BusSignals::default();
        let mut accepted = None;

        if self.receiver.is_ready() && self.transmitter.is_ready() {
            if let Some(msg) = self.receiver.take_message() {
                accepted = self.accept(&msg);
            }
        }

        if let Some(acc) = &accepted {
            signals.address = acc.address;
            signals.write_data = acc.data;
            signals.write_enable = acc.decision.write_enable;
            signals.reset = acc.decision.experiment_reset;
            report.command = Some(acc.command);
        }

        let count_before = self.cycle.cycle_count();
        self.cycle
            .tick(accepted.as_ref().and_then(|acc| acc.decision.cycle_input));
        signals.clock_enable = self.cycle.clock_enable();
        report.clock_enable = signals.clock_enable;

        let read_data = self.experiment.apply(&signals);
        self.bus = signals;

        if let Some(acc) = accepted {
            let response = acc.decision.response;
            match compose(&self.spec, response, acc.address, read_data, count_before) {
                Ok(msg) => {
                    self.transmitter.transmit(&msg);
                    report.response = Some(response);
                }
                Err(e) => tracing::error!("Failed to compose {:?}: {}", response, e),
            }
        }

        self.transmitter.pump(&mut self.tx);
        report
    }

    /// Decode and dispatch one received message.
    fn accept(&mut self, msg: &Message) -> Option<Accepted> {
        let opcode = self.spec.parse_opcode(msg);
        let Some(command) = Command::from_code(opcode) else {
            self.dropped += 1;
            tracing::warn!(opcode, "Dropping message with unknown command opcode");
            return None;
        };

        let address = self.spec.parse_addr(msg);
        let data = self.spec.parse_data(msg);
        let decision = dispatch(command, self.cycle.mode());

        tracing::debug!(
            ?command,
            address,
            data,
            mode = ?self.cycle.mode(),
            response = ?decision.response,
            "dispatch"
        );

        Some(Accepted {
            command,
            address,
            data,
            decision,
        })
    }

    /// Push bytes into the rx queue. Returns how many were accepted.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if !self.rx.enqueue(byte) {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    /// Take every byte currently in the tx queue.
    pub fn drain(&mut self) -> Vec<u8> {
        self.tx.drain().collect()
    }

    /// Move bytes from `channel` into the rx queue, tick once, then move tx
    /// bytes out to `channel` until it refuses one.
    pub fn service<C: ByteChannel + ?Sized>(&mut self, channel: &mut C) -> TickReport {
        while !self.rx.is_full() {
            match channel.recv_byte() {
                Some(byte) => {
                    self.rx.enqueue(byte);
                }
                None => break,
            }
        }

        let report = self.tick();

        while let Some(&byte) = self.tx.peek() {
            if !channel.send_byte(byte) {
                break;
            }
            self.tx.dequeue();
        }
        report
    }

    /// Input is queued, a message is held, or a response is still going out.
    pub fn has_pending_work(&self) -> bool {
        !self.rx.is_empty()
            || self.receiver.is_ready()
            || !self.transmitter.is_ready()
            || !self.tx.is_empty()
    }

    /// Return every state machine to its initial state, clear both queues
    /// and zero the discarded and dropped counters.
    ///
    /// The experiment itself is left untouched.
    pub fn reset(&mut self) {
        self.rx.clear();
        self.tx.clear();
        self.receiver = FrameReceiver::new(self.spec, self.markers);
        self.transmitter.reset();
        self.cycle.reset();
        self.bus = BusSignals::default();
        self.dropped = 0;
    }

    #[inline]
    pub fn mode(&self) -> CycleMode {
        self.cycle.mode()
    }

    #[inline]
    pub fn cycle_count(&self) -> u128 {
        self.cycle.cycle_count()
    }

    /// Signals driven on the most recent tick.
    #[inline]
    pub fn bus(&self) -> &BusSignals {
        &self.bus
    }

    /// Physical level of the experiment reset line on the most recent tick.
    #[inline]
    pub fn reset_line(&self) -> bool {
        self.bus.reset_line(self.reset_polarity)
    }

    #[inline]
    pub fn spec(&self) -> &MessageSpec {
        &self.spec
    }

    #[inline]
    pub fn markers(&self) -> &FrameMarkers {
        &self.markers
    }

    pub fn experiment(&self) -> &E {
        &self.experiment
    }

    pub fn experiment_mut(&mut self) -> &mut E {
        &mut self.experiment
    }

    /// Free space in the rx queue.
    #[inline]
    pub fn rx_available(&self) -> usize {
        self.rx.available()
    }

    /// Frames dropped by the receiver while resynchronising.
    #[inline]
    pub fn discarded_frames(&self) -> u64 {
        self.receiver.discarded()
    }

    /// Well-framed messages dropped for carrying an unknown command opcode.
    #[inline]
    pub fn dropped_messages(&self) -> u64 {
        self.dropped
    }
}

impl<E> std::fmt::Debug for Controller<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("spec", &self.spec)
            .field("mode", &self.cycle.mode())
            .field("cycle_count", &self.cycle.cycle_count())
            .field("rx_len", &self.rx.len())
            .field("tx_len", &self.tx.len())
            .finish()
    }
}
