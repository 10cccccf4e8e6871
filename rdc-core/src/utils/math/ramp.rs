//! Per-cycle rate limiting ("ramping") of operator drive input.
//!
//! Two step policies bound how far a channel may move in one control cycle:
//!
//! - [`clamp_toward`] tracks a live, nonzero operator target.
//! - [`decay_toward`] brakes toward a resting target and snaps onto it once the
//!   value is within one step, so a released stick ends at exactly zero.
//!
//! # Example
//! ```rust
//! use rdc_core::utils::math::ramp::{Ramp, RampConfig};
//! let mut ramp = Ramp::new(RampConfig::default());
//! let [speed, rotation] = ramp.apply([1.0, 0.0]);
//! assert!((speed - 0.05).abs() < 1e-6);
//! assert_eq!(rotation, 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::config::ConfigError;

/// Largest per-cycle change while tracking a nonzero target (~20 ms cycle).
pub const MAX_ACCEL_STEP: f64 = 0.05;
/// Largest per-cycle change while decaying toward rest. Smaller than the
/// acceleration step so braking is gentler than speeding up.
pub const MAX_DECEL_STEP: f64 = 0.02;
/// Stick magnitude below which the operator is treated as having let go.
pub const STOP_THRESHOLD: f64 = 0.05;

/// Move `current` toward `target` by at most `max_step`.
///
/// Once `current == target` this is a no-op.
#[inline]
pub fn clamp_toward(
    current: f64,
    target: f64,
    max_step: f64,
) -> f64 {
    let delta = target - current;
    if delta > max_step {
        current + max_step
    } else if delta < -max_step {
        current - max_step
    } else {
        // within one step: land on the target without accumulating rounding error
        target
    }
}

/// Move `current` toward `target` by at most `max_step`, snapping to `target`
/// as soon as `|current| < max_step`.
///
/// Used with a resting target of `0.0`; the snap guarantees the channel
/// reaches exactly zero instead of creeping toward it.
#[inline]
pub fn decay_toward(
    current: f64,
    target: f64,
    max_step: f64,
) -> f64 {
    if current.abs() < max_step {
        return target;
    }
    clamp_toward(current, target, max_step)
}

/// Immutable tuning for a [`Ramp`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    /// Max per-cycle change while moving toward a nonzero target.
    pub max_accel_step: f64,
    /// Max per-cycle change while decaying toward zero.
    pub max_decel_step: f64,
    /// Input magnitude below which the target is treated as zero.
    pub stop_threshold: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self::new(MAX_ACCEL_STEP, MAX_DECEL_STEP, STOP_THRESHOLD)
    }
}

impl RampConfig {
    pub const fn new(
        max_accel_step: f64,
        max_decel_step: f64,
        stop_threshold: f64,
    ) -> Self {
        Self {
            max_accel_step,
            max_decel_step,
            stop_threshold,
        }
    }

    /// Check that every step is non-negative and the threshold is below full scale.
    ///
    /// NaN values are rejected as well.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_accel_step >= 0.0) {
            return Err(ConfigError::NegativeStep("max_accel_step"));
        }
        if !(self.max_decel_step >= 0.0) {
            return Err(ConfigError::NegativeStep("max_decel_step"));
        }
        if !(self.stop_threshold >= 0.0 && self.stop_threshold < 1.0) {
            return Err(ConfigError::StopThresholdOutOfRange(self.stop_threshold));
        }
        Ok(())
    }

    /// Advance one channel by a single control cycle.
    ///
    /// A `desired` magnitude under the stop threshold selects the decay policy
    /// toward zero; anything else is tracked with the acceleration step.
    /// Out-of-range inputs are not clamped here.
    #[inline]
    pub fn step(
        &self,
        current: f64,
        desired: f64,
    ) -> f64 {
        if desired.abs() < self.stop_threshold {
            decay_toward(current, 0.0, self.max_decel_step)
        } else {
            clamp_toward(current, desired, self.max_accel_step)
        }
    }
}

/// Last emitted value of one controlled axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    pub current: f64,
}

impl ChannelState {
    pub fn reset(&mut self) {
        self.current = 0.0;
    }
}

/// Rate limiter over a pair of independent channels.
///
/// Both channels share one [`RampConfig`] but never influence each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    config: RampConfig,
    channels: [ChannelState; 2],
}

impl Ramp {
    pub fn new(config: RampConfig) -> Self {
        Self {
            config,
            channels: [ChannelState::default(); 2],
        }
    }

    pub fn config(&self) -> &RampConfig {
        &self.config
    }

    pub fn channels(&self) -> &[ChannelState; 2] {
        &self.channels
    }

    /// Return both channels to rest.
    pub fn reset(&mut self) {
        self.channels.iter_mut().for_each(ChannelState::reset);
    }

    /// Run one control cycle for both channels and return the new values.
    pub fn apply(
        &mut self,
        desired: [f64; 2],
    ) -> [f64; 2] {
        for (channel, target) in self.channels.iter_mut().zip(desired) {
            channel.current = self.config.step(channel.current, target);
        }
        [self.channels[0].current, self.channels[1].current]
    }
}
