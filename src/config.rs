//! Controller configuration.
//!
//! A [`ControllerConfig`] can be loaded from JSON (every field is optional)
//! or assembled with the fluent [`ControllerBuilder`]:
//!
//! ```
//! use stepwire::config::ControllerConfig;
//!
//! let config = ControllerConfig::from_json_str(r#"{ "addr_width": 16, "tx_depth": 32 }"#).unwrap();
//! assert_eq!(config.addr_width, 16);
//! assert_eq!(config.data_width, 8);
//! assert_eq!(config.rx_depth, 16);
//! ```

use serde::{Deserialize, Serialize};

use crate::control::Controller;
use crate::error::{Result, StepwireError};
use crate::experiment::{ExperimentBus, ResetPolarity};
use crate::protocol::{FrameMarkers, MessageSpec};
use crate::queue::DEFAULT_DEPTH;

/// Default address field width in bits.
pub const DEFAULT_ADDR_WIDTH: u32 = 32;

/// Default data field width in bits.
pub const DEFAULT_DATA_WIDTH: u32 = 8;

/// Static controller parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Address field width in bits.
    pub addr_width: u32,
    /// Data field width in bits.
    pub data_width: u32,
    /// Depth of the incoming byte queue.
    pub rx_depth: usize,
    /// Depth of the outgoing byte queue.
    pub tx_depth: usize,
    /// Frame delimiter and escape bytes.
    pub markers: FrameMarkers,
    /// Polarity of the experiment reset line.
    pub reset_polarity: ResetPolarity,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            addr_width: DEFAULT_ADDR_WIDTH,
            data_width: DEFAULT_DATA_WIDTH,
            rx_depth: DEFAULT_DEPTH,
            tx_depth: DEFAULT_DEPTH,
            markers: FrameMarkers::default(),
            reset_polarity: ResetPolarity::default(),
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check widths, markers and queue depths.
    pub fn validate(&self) -> Result<()> {
        self.message_spec()?;
        self.markers.validate()?;
        if self.rx_depth == 0 || self.tx_depth == 0 {
            return Err(StepwireError::ZeroDepth);
        }
        Ok(())
    }

    /// Message layout for these widths.
    pub fn message_spec(&self) -> Result<MessageSpec> {
        MessageSpec::new(self.addr_width, self.data_width)
    }
}

/// Builder for configuring a [`Controller`].
#[derive(Debug, Clone, Default)]
pub struct ControllerBuilder {
    config: ControllerConfig,
}

impl ControllerBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn addr_width(mut self, width: u32) -> Self {
        self.config.addr_width = width;
        self
    }

    pub fn data_width(mut self, width: u32) -> Self {
        self.config.data_width = width;
        self
    }

    /// Set the incoming queue depth.
    ///
    /// Default: 16
    pub fn rx_depth(mut self, depth: usize) -> Self {
        self.config.rx_depth = depth;
        self
    }

    /// Set the outgoing queue depth.
    ///
    /// Default: 16
    pub fn tx_depth(mut self, depth: usize) -> Self {
        self.config.tx_depth = depth;
        self
    }

    pub fn markers(mut self, markers: FrameMarkers) -> Self {
        self.config.markers = markers;
        self
    }

    pub fn reset_polarity(mut self, polarity: ResetPolarity) -> Self {
        self.config.reset_polarity = polarity;
        self
    }

    /// Validate the configuration and build a controller around `experiment`.
    pub fn build<E: ExperimentBus>(self, experiment: E) -> Result<Controller<E>> {
        Controller::from_config(&self.config, experiment)
    }
}
