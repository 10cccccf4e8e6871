//! Differential drivetrain on a PCA9685 PWM expander.
//!
//! Each side of the robot is an H-bridge driven by a phase (direction) channel
//! and an enable (duty) channel on a shared I2C bus. The drivetrain implements
//! [`DriveActuator`] and owns the input conditioning and mixing
//! (`math::kinematics`).

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};
use serde::{Deserialize, Serialize};

use crate::utils::{
    config::ConfigError,
    controllers::drive::DriveActuator,
    math::kinematics::{DifferentialKinematics, DriveTuning, WheelSpeeds},
};

/// Default I2C address of the PWM expander.
pub const PWM_ADDRESS: u8 = 0x55;
/// Default prescale (~60 Hz PWM).
pub const PWM_PRESCALE: u8 = 100;
const MAX_DUTY: u16 = 4095;

/// Errors that can occur when driving the motors.
#[derive(Debug)]
pub enum DeviceError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
    PwmNotInitialized,
    Config(ConfigError),
}

/// Channel assignment of one drivetrain side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideConfig {
    pub phase: u8,
    pub enable: u8,
    pub inverted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub address: u8,
    pub prescale: u8,
    pub left: SideConfig,
    /// Mounted mirrored, so inverted by default.
    pub right: SideConfig,
    pub tuning: DriveTuning,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            address: PWM_ADDRESS,
            prescale: PWM_PRESCALE,
            left: SideConfig {
                phase: 2,
                enable: 3,
                inverted: false,
            },
            right: SideConfig {
                phase: 4,
                enable: 5,
                inverted: true,
            },
            tuning: DriveTuning::default(),
        }
    }
}

impl DrivetrainConfig {
    /// Reject out-of-range or doubly assigned channels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tuning.validate()?;
        let channels = [
            self.left.phase,
            self.left.enable,
            self.right.phase,
            self.right.enable,
        ];
        for (i, &ch) in channels.iter().enumerate() {
            channel(ch)?;
            if channels[..i].contains(&ch) {
                return Err(ConfigError::SharedChannel(ch));
            }
        }
        Ok(())
    }
}

/// Map a configured channel index onto the driver's channel.
fn channel(index: u8) -> Result<Channel, ConfigError> {
    Ok(match index {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        other => return Err(ConfigError::InvalidChannel(other)),
    })
}

#[derive(Debug, Clone, Copy)]
struct MotorSide {
    phase: Channel,
    enable: Channel,
    inverted: bool,
}

impl MotorSide {
    fn from_config(config: &SideConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            phase: channel(config.phase)?,
            enable: channel(config.enable)?,
            inverted: config.inverted,
        })
    }
}

/// Two-sided drivetrain over a shared I2C bus.
pub struct Drivetrain<'a, I2C: 'static> {
    i2c: &'a RefCell<I2C>,
    pub pwm: Option<Pca9685<RefCellDevice<'a, I2C>>>,
    sides: [MotorSide; 2],
    kinematics: DifferentialKinematics,
    address: u8,
    prescale: u8,
}

impl<'a, I2C, E> Drivetrain<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Create a drivetrain from validated channel assignments.
    ///
    /// No bus traffic happens until [`init_devices`](Self::init_devices).
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        config: &DrivetrainConfig,
    ) -> Result<Self, DeviceError<E>> {
        config.validate().map_err(DeviceError::Config)?;
        Ok(Drivetrain {
            i2c: i2c_bus,
            pwm: None,
            sides: [
                MotorSide::from_config(&config.left).map_err(DeviceError::Config)?,
                MotorSide::from_config(&config.right).map_err(DeviceError::Config)?,
            ],
            kinematics: DifferentialKinematics::new(config.tuning),
            address: config.address,
            prescale: config.prescale,
        })
    }

    /// Attach the PWM expander at the configured address.
    pub fn init_devices(&mut self) -> Result<(), DeviceError<E>> {
        let pwm = Pca9685::new(RefCellDevice::new(self.i2c), PwmAddress::from(self.address))
            .map_err(DeviceError::PwmError)?;
        self.pwm = Some(pwm);
        Ok(())
    }

    /// Enable the PWM expander and set its prescale.
    ///
    /// Any failure here is fatal for the caller: the motors must never run
    /// unconfigured.
    pub fn configure(&mut self) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.enable().map_err(DeviceError::PwmError)?;
        tracing::info!("PWM enabled");
        pca.set_prescale(self.prescale)
            .map_err(DeviceError::PwmError)?;
        tracing::info!(prescale = self.prescale, "PWM prescale set");
        Ok(())
    }

    /// Scan the I2C bus for devices and log any found addresses.
    pub fn scan_bus(&self) {
        let mut bus = self.i2c.borrow_mut();
        for addr in 0x03..0x78 {
            if bus.write(addr, &[]).is_ok() {
                tracing::warn!("I2C device found at 0x{:02X}", addr);
            }
        }
    }

    /// Write wheel outputs to the H-bridges, left side first.
    pub fn apply_wheel_speeds(
        &mut self,
        speeds: WheelSpeeds,
    ) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;

        for (side, speed) in self.sides.iter().zip([speeds.left, speeds.right]) {
            let speed = if side.inverted { -speed } else { speed };
            let duty = speed.abs().min(1.0);
            let forward = speed >= 0.0;

            pca.set_channel_on_off(side.phase, 0, if forward { 0 } else { MAX_DUTY })
                .map_err(DeviceError::PwmError)?;
            pca.set_channel_on_off(side.enable, 0, (duty * MAX_DUTY as f32) as u16)
                .map_err(DeviceError::PwmError)?;
        }
        Ok(())
    }
}

impl<I2C, E> DriveActuator for Drivetrain<'_, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    type Error = DeviceError<E>;

    fn tank_drive(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Self::Error> {
        let speeds = self.kinematics.tank(left, right);
        self.apply_wheel_speeds(speeds)
    }

    fn arcade_drive(
        &mut self,
        speed: f32,
        rotation: f32,
    ) -> Result<(), Self::Error> {
        let speeds = self.kinematics.arcade(speed, rotation);
        self.apply_wheel_speeds(speeds)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.apply_wheel_speeds(WheelSpeeds::default())
    }
}
