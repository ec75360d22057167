// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::hardware::{
    MotorDriver,
    gpio::{Gpio, OutputPin},
};

/// Two H-bridge motor channels on four GPIO outputs, ordered 1A, 1B, 2A, 2B.
pub(crate) struct GpioMotors {
    pins: Vec<OutputPin>,
}

impl GpioMotors {
    pub(crate) fn new(gpio: &Gpio, numbers: [u8; 4]) -> Result<Self> {
        let pins = numbers
            .iter()
            .map(|&number| gpio.output(number))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to acquire motor pins")?;

        Ok(Self { pins })
    }
}

impl MotorDriver for GpioMotors {
    fn apply(&mut self, pattern: [bool; 4]) -> Result<()> {
        for (pin, high) in self.pins.iter_mut().zip(pattern) {
            pin.write(high)?;
        }
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        for pin in self.pins.iter_mut() {
            pin.release()?;
        }
        Ok(())
    }
}

/// Stands in for the motors when GPIO is not available, so the rest of the
/// robot can still be exercised from a desktop.
pub(crate) struct NullMotors;

impl MotorDriver for NullMotors {
    fn apply(&mut self, pattern: [bool; 4]) -> Result<()> {
        debug!(?pattern, "motor pattern (no gpio)");
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        info!("released null motors");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::hardware::gpio::tests::fake_sysfs;

    #[test]
    fn pattern_is_written_in_pin_order() {
        let root = fake_sysfs(&[17, 18, 22, 23]);
        let gpio = Gpio::open(root.path()).unwrap();
        let mut motors = GpioMotors::new(&gpio, [17, 18, 22, 23]).unwrap();

        motors.apply([true, false, false, true]).unwrap();

        let value = |pin: u8| fs::read_to_string(root.path().join(format!("gpio{}/value", pin))).unwrap();
        assert_eq!(
            [value(17), value(18), value(22), value(23)],
            ["1", "0", "0", "1"].map(String::from)
        );
    }
}
