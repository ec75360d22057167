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

//! Access to the robot's physical devices.
//!
//! # Architecture
//!
//! Components never open hardware themselves. During startup the orchestrator
//! asks a [`Devices`] factory for each device and hands the resulting handle to
//! the component that uses it. This keeps hardware ownership explicit (each
//! handle is released by its component's cleanup) and lets tests substitute
//! recording fakes for every device.
//!
//! Optional devices are returned as a `Result`. An error means the device is
//! not fitted or could not be initialised, and the orchestrator carries on
//! without it.
//!
//! # Sub-modules
//!
//! * [`gpio`]: Linux sysfs GPIO pins.
//! * `motors`: Motor drivers.
//! * `ranging`: Ultrasonic range finder.
//! * `system`: The [`Devices`] implementation for a real robot.

pub(crate) mod gpio;
mod motors;
mod ranging;
mod system;

use std::{rc::Rc, time::Duration};

use anyhow::Result;

use crate::{
    components::{
        audio::Playback, camera::Shutter, controller::Gamepad, keyboard::KeySource,
        speech::Speaker,
    },
    display::SharedDisplay,
};

pub(crate) use system::SystemDevices;

/// Four motor control lines, ordered 1A, 1B, 2A, 2B.
pub(crate) trait MotorDriver {
    fn apply(&mut self, pattern: [bool; 4]) -> Result<()>;

    fn release(&mut self) -> Result<()>;
}

pub(crate) trait DigitalInput {
    fn is_high(&mut self) -> Result<bool>;

    fn release(&mut self) -> Result<()>;
}

pub(crate) trait RangeFinder {
    /// Measures the distance to the nearest obstacle in centimetres.
    ///
    /// Returns `None` if no echo arrived within `timeout`. Implementations
    /// must never wait longer than that.
    fn measure(&mut self, timeout: Duration) -> Result<Option<f64>>;

    fn release(&mut self) -> Result<()>;
}

pub(crate) trait Devices {
    fn display(&self) -> Result<SharedDisplay>;

    fn motors(&self) -> Result<Box<dyn MotorDriver>>;

    /// The MENU and SELECT buttons.
    fn buttons(&self) -> Result<(Box<dyn DigitalInput>, Box<dyn DigitalInput>)>;

    fn range_finder(&self) -> Result<Box<dyn RangeFinder>>;

    fn camera(&self) -> Result<Box<dyn Shutter>>;

    fn gamepad(&self) -> Result<Box<dyn Gamepad>>;

    fn speaker(&self) -> Result<Rc<dyn Speaker>>;

    fn audio(&self) -> Result<Box<dyn Playback>>;

    fn keys(&self) -> Box<dyn KeySource>;
}
