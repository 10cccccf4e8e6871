//! Math utilities for the drive controller.
//!
//! `ramp` bounds per-cycle changes of operator input; `kinematics` turns
//! arcade or tank input into per-side wheel outputs.

pub mod kinematics;
pub mod ramp;
