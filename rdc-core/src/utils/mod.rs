//! Utility re-exports and helper macros for the drive controller.
//!
//! - `config`: robot-wide configuration and its validation
//! - `connection`: WebSocket endpoint for operator input
//! - `controllers`: drive command, drivetrain and the system controller
//! - `math`: ramp limiting and differential-drive kinematics
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod config;
pub mod connection;
pub mod controllers;
pub mod math;

pub use config::{ConfigError, RobotConfig};
pub use connection::server::run as wss;
pub use controllers::SystemController;
pub use embassy_time::{Duration, Ticker};

#[doc(hidden)]
pub use static_cell;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::utils::static_cell::StaticCell<$t> =
            $crate::utils::static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
