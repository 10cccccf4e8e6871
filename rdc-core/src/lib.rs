//! Ramped teleoperated drive controller for differential-drive robots on no-std platforms.
//!
//! Operator stick input is rate limited per control cycle before it reaches the
//! drivetrain. See `utils::math::ramp` for the limiter and
//! `utils::controllers::drive` for the command that applies it.
#![no_std]

pub mod utils;
