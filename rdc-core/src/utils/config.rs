//! Robot-wide configuration.
//!
//! Everything here is static for the lifetime of the process. Defaults match the
//! competition robot; a JSON document with any subset of fields can override them:
//!
//! ```rust
//! use rdc_core::utils::config::RobotConfig;
//! let cfg: RobotConfig = serde_json::from_str(r#"{"drive":{"mode":"tank"}}"#).unwrap();
//! assert!(cfg.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::{
    controllers::{drive::DriveMode, drivetrain::DrivetrainConfig},
    math::ramp::RampConfig,
};

/// Control cycle period in milliseconds.
pub const CYCLE_PERIOD_MS: u64 = 20;
/// Operator multiplier on the first stick axis (speed or left side).
pub const FIRST_AXIS_MULTIPLIER: f32 = 0.5;
/// Operator multiplier on the second stick axis (rotation or right side).
pub const SECOND_AXIS_MULTIPLIER: f32 = 0.5;

/// Errors raised while validating configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    NegativeStep(&'static str),
    StopThresholdOutOfRange(f64),
    DeadbandOutOfRange(f32),
    InvalidChannel(u8),
    SharedChannel(u8),
    ZeroPeriod,
}

/// How operator input is turned into a drive command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub mode: DriveMode,
    /// Ramp tuning; `None` passes input straight through.
    pub ramp: Option<RampConfig>,
    pub first_multiplier: f32,
    pub second_multiplier: f32,
    pub period_ms: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            mode: DriveMode::Arcade,
            ramp: Some(RampConfig::default()),
            first_multiplier: FIRST_AXIS_MULTIPLIER,
            second_multiplier: SECOND_AXIS_MULTIPLIER,
            period_ms: CYCLE_PERIOD_MS,
        }
    }
}

impl DriveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ramp) = &self.ramp {
            ramp.validate()?;
        }
        if self.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub drive: DriveConfig,
    pub drivetrain: DrivetrainConfig,
}

impl RobotConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.drive.validate()?;
        self.drivetrain.validate()
    }
}
