//! Kinematics utilities for two-sided differential drivetrains.
//!
//! `DifferentialKinematics` conditions raw operator input (deadband, optional
//! squaring, clamping) and mixes arcade `(speed, rotation)` input into
//! per-side wheel outputs, desaturating so neither side exceeds full scale.
//!
//! Positive rotation is counter-clockwise.
//!
//! # Example
//! ```rust
//! use rdc_core::utils::math::kinematics::{DifferentialKinematics, DriveTuning};
//! let kin = DifferentialKinematics::new(DriveTuning::default());
//! let wheels = kin.arcade(1.0, 0.0);
//! assert_eq!((wheels.left, wheels.right), (1.0, 1.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::config::ConfigError;

/// Default input deadband applied before mixing.
pub const DEFAULT_DEADBAND: f32 = 0.02;

/// Input conditioning applied by the drivetrain before mixing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveTuning {
    /// Inputs with a magnitude at or below this are treated as zero.
    pub deadband: f32,
    /// Square input magnitudes for finer control at low speed.
    pub square_inputs: bool,
}

impl Default for DriveTuning {
    fn default() -> Self {
        Self {
            deadband: DEFAULT_DEADBAND,
            square_inputs: true,
        }
    }
}

impl DriveTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.deadband >= 0.0 && self.deadband < 1.0) {
            return Err(ConfigError::DeadbandOutOfRange(self.deadband));
        }
        Ok(())
    }
}

/// Per-side outputs in `[-1.0, 1.0]`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WheelSpeeds {
    pub left: f32,
    pub right: f32,
}

/// Input conditioning and mixing for a differential drivetrain.
#[derive(Debug, Clone, Copy)]
pub struct DifferentialKinematics {
    tuning: DriveTuning,
}

impl DifferentialKinematics {
    pub fn new(tuning: DriveTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &DriveTuning {
        &self.tuning
    }

    /// Mix forward `speed` and `rotation` into wheel outputs.
    pub fn arcade(
        &self,
        speed: f32,
        rotation: f32,
    ) -> WheelSpeeds {
        let x = self.condition(speed);
        let z = self.condition(rotation);

        let greater = x.abs().max(z.abs());
        if greater == 0.0 {
            return WheelSpeeds::default();
        }
        let lesser = x.abs().min(z.abs());
        let saturated = (greater + lesser) / greater;

        WheelSpeeds {
            left: (x - z) / saturated,
            right: (x + z) / saturated,
        }
    }

    /// Condition independently supplied side outputs.
    pub fn tank(
        &self,
        left: f32,
        right: f32,
    ) -> WheelSpeeds {
        WheelSpeeds {
            left: self.condition(left),
            right: self.condition(right),
        }
    }

    fn condition(
        &self,
        value: f32,
    ) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        let v = apply_deadband(value, self.tuning.deadband).clamp(-1.0, 1.0);
        if self.tuning.square_inputs {
            libm::copysignf(v * v, v)
        } else {
            v
        }
    }
}

/// Zero out `value` inside `deadband` and rescale the remainder to keep full range.
pub fn apply_deadband(
    value: f32,
    deadband: f32,
) -> f32 {
    if deadband <= 0.0 {
        return value;
    }
    if value.abs() <= deadband {
        return 0.0;
    }
    if value > 0.0 {
        (value - deadband) / (1.0 - deadband)
    } else {
        (value + deadband) / (1.0 - deadband)
    }
}
