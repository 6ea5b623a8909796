use std::{fs, ops::Range, path::Path};

use serde::{Deserialize, Serialize};

use crate::{NetErr, Result};

/// Epochs run before the first cross-validation check.
pub const INITIAL_EPOCHS: usize = 2000;

/// Epoch ceiling for a single step-size trial.
pub const DEFAULT_MAX_EPOCHS: usize = 6400;

/// How much larger the hidden layer is than the output layer.
pub const HIDDEN_LAYER_SCALE: f64 = 2.0;

/// Share of every label's samples held out for cross-validation.
pub const CROSS_FRACTION: f64 = 0.3;

/// Training parameters. Every field has a default, so a JSON file only needs
/// to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Length of the first block of epochs.
    pub initial_epochs: usize,
    /// Epoch ceiling per trial.
    pub max_epochs: usize,
    pub hidden_layer_scale: f64,
    /// First step-size exponent, inclusive.
    pub min_step_power: i32,
    /// Last step-size exponent, exclusive.
    pub max_step_power: i32,
    pub cross_fraction: f64,
    /// Whether loaded samples are normalised to unit sum.
    pub normalize: bool,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            initial_epochs: INITIAL_EPOCHS,
            max_epochs: DEFAULT_MAX_EPOCHS,
            hidden_layer_scale: HIDDEN_LAYER_SCALE,
            min_step_power: -20,
            max_step_power: 10,
            cross_fraction: CROSS_FRACTION,
            normalize: true,
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Reads and validates a configuration from a JSON file.
    ///
    /// # Arguments
    /// * `path` - The file to read.
    ///
    /// # Returns
    /// The configuration or an error if the file is unreadable or invalid.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the trainer and search rely on.
    pub fn validate(&self) -> Result<()> {
        if self.initial_epochs == 0 {
            return Err(NetErr::InvalidConfig(
                "initial_epochs must be > 0".to_owned(),
            ));
        }
        if !(self.hidden_layer_scale.is_finite() && self.hidden_layer_scale > 0.0) {
            return Err(NetErr::InvalidConfig(
                "hidden_layer_scale must be finite and > 0".to_owned(),
            ));
        }
        if self.min_step_power >= self.max_step_power {
            return Err(NetErr::InvalidConfig(format!(
                "empty step power range {}..{}",
                self.min_step_power, self.max_step_power
            )));
        }
        if !(0.0..1.0).contains(&self.cross_fraction) {
            return Err(NetErr::InvalidConfig(
                "cross_fraction must be in [0, 1)".to_owned(),
            ));
        }

        Ok(())
    }

    /// The step-size exponents to try, in increasing order.
    pub fn step_powers(&self) -> Range<i32> {
        self.min_step_power..self.max_step_power
    }
}
