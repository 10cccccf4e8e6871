//! Module Exports
//!
//! This file exports key modules used in the drive control system.
//!
//! - `drive`: the teleoperated drive command and its lifecycle traits
//! - `drivetrain`: PCA9685-backed differential drivetrain
//!
//! It also holds the operator-facing state shared with the connection layer
//! and the `SystemController` that schedules the drive command.

pub mod drive;
pub mod drivetrain;

use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::{Duration, Ticker};
use serde::{Deserialize, Serialize};

pub use drive::{Axis, DriveActuator, DriveCommand, DriveMode, Tickable};
pub use drivetrain::{DeviceError, Drivetrain};

use crate::utils::{
    config::DriveConfig,
    math::ramp::{Ramp, RampConfig},
};

/// Channel used to receive lifecycle commands (`LifecycleCommand` messages).
pub static CONTROL_CHANNEL: embassy_sync::channel::Channel<
    CriticalSectionRawMutex,
    LifecycleCommand,
    16,
> = embassy_sync::channel::Channel::new();

/// Latest operator stick positions. Written by the connection layer, polled
/// once per cycle by [`StickAxis`].
pub static OPERATOR_INPUT: Mutex<CriticalSectionRawMutex, Cell<Sticks>> =
    Mutex::new(Cell::new(Sticks::NEUTRAL));

/// Raw operator stick pair: `(speed, rotation)` in arcade, `(left, right)` in tank.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sticks {
    pub a: f32,
    pub b: f32,
}

impl Sticks {
    pub const NEUTRAL: Sticks = Sticks { a: 0.0, b: 0.0 };
}

pub fn publish_sticks(sticks: Sticks) {
    OPERATOR_INPUT.lock(|cell| cell.set(sticks));
}

pub fn read_sticks() -> Sticks {
    OPERATOR_INPUT.lock(|cell| cell.get())
}

/// Return the sticks to neutral, e.g. when the operator disconnects.
pub fn release_sticks() {
    publish_sticks(Sticks::NEUTRAL);
}

/// One axis of [`OPERATOR_INPUT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickAxis {
    First,
    Second,
}

impl Axis for StickAxis {
    fn value(&self) -> f32 {
        let sticks = read_sticks();
        match self {
            StickAxis::First => sticks.a,
            StickAxis::Second => sticks.b,
        }
    }
}

/// Multiplies an axis by a fixed operator sensitivity.
#[derive(Debug, Clone, Copy)]
pub struct Scaled<A> {
    axis: A,
    factor: f32,
}

impl<A> Scaled<A> {
    pub fn new(
        axis: A,
        factor: f32,
    ) -> Self {
        Self { axis, factor }
    }
}

impl<A: Axis> Axis for Scaled<A> {
    fn value(&self) -> f32 {
        self.axis.value() * self.factor
    }
}

/// Operator messages, serialized as JSON with tag `"oc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "oc", rename_all = "snake_case")] // oc = operator command
pub enum SystemCommand {
    /// Update the latest stick positions.
    Sticks { a: f32, b: f32 },
    Enable,
    Disable,
    /// Switch drive mode and ramping.
    Mode { mode: DriveMode, ramped: bool },
}

/// Scheduling requests for the drive command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifecycleCommand {
    Enable,
    Disable,
    Mode { mode: DriveMode, ramped: bool },
}

/// Drive command as scheduled by the [`SystemController`]: ramping is chosen
/// at runtime.
pub type TeleopCommand<X, Y> = DriveCommand<X, Y, Option<Ramp>>;

/// Owns the drivetrain and schedules the single drive command that may
/// write to it.
pub struct SystemController<D, X, Y> {
    drivetrain: D,
    command: TeleopCommand<X, Y>,
    ramp: RampConfig,
    period: Duration,
}

impl<D, X, Y> SystemController<D, X, Y>
where
    D: DriveActuator,
    X: Axis,
    Y: Axis,
{
    pub fn new(
        drivetrain: D,
        first: X,
        second: Y,
        config: &DriveConfig,
    ) -> Self {
        let command = DriveCommand::with_mode(config.mode, first, second)
            .with_shaper(config.ramp.map(Ramp::new));
        SystemController {
            drivetrain,
            command,
            ramp: config.ramp.unwrap_or_default(),
            period: Duration::from_millis(config.period_ms),
        }
    }

    pub fn drivetrain(&self) -> &D {
        &self.drivetrain
    }

    pub fn command(&self) -> &TeleopCommand<X, Y> {
        &self.command
    }

    /// Apply a scheduling request.
    ///
    /// A mode change while running interrupts the current command, so the
    /// drivetrain always sees a stop between the two configurations.
    pub fn handle(
        &mut self,
        request: LifecycleCommand,
    ) {
        tracing::info!(?request, "lifecycle request");
        match request {
            LifecycleCommand::Enable => {
                if !self.command.is_active() {
                    self.command.start(&mut self.drivetrain);
                }
            }
            LifecycleCommand::Disable => {
                if self.command.is_active() {
                    self.command.stop(&mut self.drivetrain, false);
                }
            }
            LifecycleCommand::Mode { mode, ramped } => {
                let was_active = self.command.is_active();
                if was_active {
                    self.command.stop(&mut self.drivetrain, true);
                }
                self.command.set_mode(mode);
                self.command.set_shaper(ramped.then(|| Ramp::new(self.ramp)));
                if was_active {
                    self.command.start(&mut self.drivetrain);
                }
            }
        }
    }

    /// Run one control cycle.
    pub fn step(&mut self) {
        if self.command.is_active() {
            self.command.tick(&mut self.drivetrain);
        }
    }

    /// Drain pending requests and tick once per period, forever.
    pub async fn run(&mut self) -> ! {
        let mut ticker = Ticker::every(self.period);
        loop {
            while let Ok(request) = CONTROL_CHANNEL.try_receive() {
                self.handle(request);
            }
            self.step();
            ticker.next().await;
        }
    }
}
