//! Shared test doubles for the drive command and system controller tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use rdc_core::utils::controllers::drive::DriveActuator;

/// Every call the command makes on the drivetrain, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Tank(f32, f32),
    Arcade(f32, f32),
    Stop,
}

#[derive(Default)]
pub struct RecordingActuator {
    pub calls: Vec<Call>,
    pub fail: bool,
}

impl DriveActuator for RecordingActuator {
    type Error = &'static str;

    fn tank_drive(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Self::Error> {
        self.calls.push(Call::Tank(left, right));
        if self.fail { Err("bus fault") } else { Ok(()) }
    }

    fn arcade_drive(
        &mut self,
        speed: f32,
        rotation: f32,
    ) -> Result<(), Self::Error> {
        self.calls.push(Call::Arcade(speed, rotation));
        if self.fail { Err("bus fault") } else { Ok(()) }
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.calls.push(Call::Stop);
        if self.fail { Err("bus fault") } else { Ok(()) }
    }
}

/// A settable operator axis.
pub fn axis(initial: f32) -> (Rc<Cell<f32>>, impl Fn() -> f32) {
    let value = Rc::new(Cell::new(initial));
    let reader = value.clone();
    (value, move || reader.get())
}

pub fn close(
    a: impl Into<f64>,
    b: f64,
) -> bool {
    (a.into() - b).abs() < 1e-5
}
