//! Parse configuration.
//!
//! Tolerances are an explicit value passed with each parse call. Concurrent
//! parses with different settings never observe each other.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the voltage cut-off consistency check.
pub const VOLTAGE_CHECK: &str = "Voltage [V]";

/// Default absolute tolerance on the voltage cut-offs, 1 mV.
pub const DEFAULT_VOLTAGE_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{check} tolerance should not be negative, got {value}")]
    NegativeTolerance { check: &'static str, value: f64 },
    #[error("{check} tolerance must be finite, got {value}")]
    NonFiniteTolerance { check: &'static str, value: f64 },
}

/// Absolute tolerances for the consistency checks, keyed by check name on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    #[serde(rename = "Voltage [V]")]
    voltage: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            voltage: DEFAULT_VOLTAGE_TOLERANCE,
        }
    }
}

impl Tolerances {
    pub fn new(voltage: f64) -> Result<Self, ConfigError> {
        let tolerances = Self { voltage };
        tolerances.validate()?;
        Ok(tolerances)
    }

    pub fn with_voltage(mut self, voltage: f64) -> Result<Self, ConfigError> {
        check_tolerance(VOLTAGE_CHECK, voltage)?;
        self.voltage = voltage;
        Ok(self)
    }

    /// Voltage tolerance in volts.
    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    /// Look up a tolerance by check name.
    pub fn get(&self, check: &str) -> Option<f64> {
        match check {
            VOLTAGE_CHECK => Some(self.voltage),
            _ => None,
        }
    }

    /// Re-check values that may have come from deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_tolerance(VOLTAGE_CHECK, self.voltage)
    }
}

fn check_tolerance(check: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFiniteTolerance { check, value });
    }
    if value < 0.0 {
        return Err(ConfigError::NegativeTolerance { check, value });
    }
    Ok(())
}

/// Options threaded through every facade call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub tolerances: Tolerances,
    /// Escalate consistency warnings to errors.
    pub strict: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voltage_tolerance(mut self, voltage: f64) -> Result<Self, ConfigError> {
        self.tolerances = self.tolerances.with_voltage(voltage)?;
        Ok(self)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tolerances.validate()
    }
}
