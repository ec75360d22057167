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

//! Ultrasonic range finder (HC-SR04 style) on two GPIO pins.

use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};

use crate::hardware::{
    RangeFinder,
    gpio::{Gpio, InputPin, OutputPin},
};

const TRIGGER_PULSE: Duration = Duration::from_micros(10);

// Half the speed of sound, in cm/s, as the pulse travels there and back
const HALF_SPEED_OF_SOUND: f64 = 17_000.0;

pub(crate) struct GpioRangeFinder {
    trigger: OutputPin,
    echo: InputPin,
}

impl GpioRangeFinder {
    pub(crate) fn new(gpio: &Gpio, trigger_pin: u8, echo_pin: u8) -> Result<Self> {
        let mut trigger = gpio.output(trigger_pin).context("Failed to acquire trigger pin")?;
        trigger.write(false)?;
        let echo = gpio.input(echo_pin).context("Failed to acquire echo pin")?;

        Ok(Self { trigger, echo })
    }
}

impl RangeFinder for GpioRangeFinder {
    fn measure(&mut self, timeout: Duration) -> Result<Option<f64>> {
        let deadline = Instant::now() + timeout;

        self.trigger.write(true)?;
        thread::sleep(TRIGGER_PULSE);
        self.trigger.write(false)?;

        let mut start = Instant::now();
        while !self.echo.read()? {
            start = Instant::now();
            if start > deadline {
                return Ok(None);
            }
        }

        let mut stop = start;
        while self.echo.read()? {
            stop = Instant::now();
            if stop > deadline {
                return Ok(None);
            }
        }

        Ok(Some(distance_cm(stop.duration_since(start))))
    }

    fn release(&mut self) -> Result<()> {
        self.trigger.release()?;
        self.echo.release()?;
        Ok(())
    }
}

fn distance_cm(echo: Duration) -> f64 {
    echo.as_secs_f64() * HALF_SPEED_OF_SOUND
}
