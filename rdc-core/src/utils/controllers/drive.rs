//! Teleoperated drive command.
//!
//! A single [`DriveCommand`] covers arcade and tank control. Ramping is not a
//! separate command: it is a [`Shaper`] layered over the raw pass-through,
//! so the unramped modes are a true bypass rather than a ramp with an
//! infinite step.
//!
//! The command follows the [`Tickable`] lifecycle. An external driver calls
//! `start` once, `tick` once per control cycle and `stop` exactly once on exit.
//! The actuator is lent for each call; whoever owns it decides which single
//! command may write to it.

use serde::{Deserialize, Serialize};

use crate::utils::math::ramp::{Ramp, RampConfig};

/// A polled operator input.
pub trait Axis {
    fn value(&self) -> f32;
}

impl<F: Fn() -> f32> Axis for F {
    fn value(&self) -> f32 {
        self()
    }
}

/// Actuation interface of a differential drivetrain.
///
/// Values are nominally in `[-1.0, 1.0]`; implementations bound them.
pub trait DriveActuator {
    type Error: core::fmt::Debug;

    fn tank_drive(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Self::Error>;

    fn arcade_drive(
        &mut self,
        speed: f32,
        rotation: f32,
    ) -> Result<(), Self::Error>;

    /// Command zero on both sides.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// Lifecycle driven once per control cycle, never re-entrantly.
pub trait Tickable<A: ?Sized> {
    fn start(
        &mut self,
        actuator: &mut A,
    );

    fn tick(
        &mut self,
        actuator: &mut A,
    );

    fn stop(
        &mut self,
        actuator: &mut A,
        interrupted: bool,
    );
}

/// Which pair of inputs the command reads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// `(speed, rotation)` forwarded to `arcade_drive`.
    #[default]
    Arcade,
    /// `(left, right)` forwarded to `tank_drive`.
    Tank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Idle,
    Active,
}

/// Per-cycle transform applied to the raw input pair.
///
/// Shaping runs in `f64`; values are narrowed to `f32` at the actuator.
pub trait Shaper {
    /// Forget all history. Called on every start.
    fn reset(&mut self);

    fn shape(
        &mut self,
        raw: [f64; 2],
    ) -> [f64; 2];
}

/// Forwards input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl Shaper for PassThrough {
    fn reset(&mut self) {}

    fn shape(
        &mut self,
        raw: [f64; 2],
    ) -> [f64; 2] {
        raw
    }
}

impl Shaper for Ramp {
    fn reset(&mut self) {
        Ramp::reset(self);
    }

    fn shape(
        &mut self,
        raw: [f64; 2],
    ) -> [f64; 2] {
        self.apply(raw)
    }
}

/// `None` behaves like [`PassThrough`].
impl<S: Shaper> Shaper for Option<S> {
    fn reset(&mut self) {
        if let Some(shaper) = self {
            shaper.reset();
        }
    }

    fn shape(
        &mut self,
        raw: [f64; 2],
    ) -> [f64; 2] {
        match self {
            Some(shaper) => shaper.shape(raw),
            None => raw,
        }
    }
}

/// Reads two operator axes each cycle, shapes them and drives the actuator.
pub struct DriveCommand<X, Y, S = PassThrough> {
    first: X,
    second: Y,
    mode: DriveMode,
    shaper: S,
    state: CommandState,
}

impl<X: Axis, Y: Axis> DriveCommand<X, Y> {
    /// Unramped arcade command over `(speed, rotation)`.
    pub fn arcade(
        speed: X,
        rotation: Y,
    ) -> Self {
        Self::with_mode(DriveMode::Arcade, speed, rotation)
    }

    /// Unramped tank command over `(left, right)`.
    pub fn tank(
        left: X,
        right: Y,
    ) -> Self {
        Self::with_mode(DriveMode::Tank, left, right)
    }

    pub fn with_mode(
        mode: DriveMode,
        first: X,
        second: Y,
    ) -> Self {
        Self {
            first,
            second,
            mode,
            shaper: PassThrough,
            state: CommandState::Idle,
        }
    }
}

impl<X, Y, S> DriveCommand<X, Y, S> {
    /// Replace the shaper, keeping inputs and mode.
    pub fn with_shaper<T: Shaper>(
        self,
        shaper: T,
    ) -> DriveCommand<X, Y, T> {
        DriveCommand {
            first: self.first,
            second: self.second,
            mode: self.mode,
            shaper,
            state: self.state,
        }
    }

    /// Rate limit both channels with `config`.
    pub fn ramped(
        self,
        config: RampConfig,
    ) -> DriveCommand<X, Y, Ramp> {
        self.with_shaper(Ramp::new(config))
    }

    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CommandState::Active
    }

    pub fn shaper(&self) -> &S {
        &self.shaper
    }

    /// Change the mode. Takes effect from the next tick; callers switch modes
    /// between a stop and a start.
    pub fn set_mode(
        &mut self,
        mode: DriveMode,
    ) {
        self.mode = mode;
    }

    pub fn set_shaper(
        &mut self,
        shaper: S,
    ) {
        self.shaper = shaper;
    }
}

impl<X, Y, S, A> Tickable<A> for DriveCommand<X, Y, S>
where
    X: Axis,
    Y: Axis,
    S: Shaper,
    A: DriveActuator + ?Sized,
{
    fn start(
        &mut self,
        _actuator: &mut A,
    ) {
        self.shaper.reset();
        self.state = CommandState::Active;
        tracing::info!(mode = ?self.mode, "drive command started");
    }

    fn tick(
        &mut self,
        actuator: &mut A,
    ) {
        if self.state != CommandState::Active {
            tracing::debug!("tick ignored while idle");
            return;
        }

        let raw = [f64::from(self.first.value()), f64::from(self.second.value())];
        let [a, b] = self.shaper.shape(raw).map(|v| v as f32);
        tracing::trace!(?raw, a, b, "drive cycle");

        let result = match self.mode {
            DriveMode::Arcade => actuator.arcade_drive(a, b),
            DriveMode::Tank => actuator.tank_drive(a, b),
        };
        if let Err(e) = result {
            tracing::error!("drive output failed: {:?}", e);
        }
    }

    fn stop(
        &mut self,
        actuator: &mut A,
        interrupted: bool,
    ) {
        if let Err(e) = actuator.stop() {
            tracing::error!("failed to stop drivetrain: {:?}", e);
        }
        self.state = CommandState::Idle;
        tracing::info!(interrupted, "drive command stopped");
    }
}
