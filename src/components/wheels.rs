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

//! Drive motors.
//!
//! Every movement applies a fixed pin pattern to the motor driver and then
//! fires [`Wheels::state_changed`] with a short narration, which speech
//! subscribes to.
//!
//! Motor wiring varies between builds, so whether "left" drives the left or the
//! right turn pattern is configured with [`Steering`].

use std::{cell::RefCell, rc::Rc};

use anyhow::Result;
use tracing::info;

use crate::{
    components::Component, config::Steering, events::EventHandler, hardware::MotorDriver,
    menu::Action,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Motion {
    Stop,
    Forwards,
    Backwards,
    Left,
    SlowLeft,
    Right,
    SlowRight,
}

impl Motion {
    pub(crate) fn pattern(self) -> [bool; 4] {
        match self {
            Motion::Stop => [false, false, false, false],
            Motion::Forwards => [true, false, true, false],
            Motion::Backwards => [false, true, false, true],
            Motion::Left => [true, false, false, true],
            Motion::SlowLeft => [true, false, false, false],
            Motion::Right => [false, true, true, false],
            Motion::SlowRight => [false, false, true, false],
        }
    }

    pub(crate) fn narration(self) -> &'static str {
        match self {
            Motion::Stop => "Stopping",
            Motion::Forwards => "Going Forwards",
            Motion::Backwards => "Going Backwards",
            Motion::Left => "Turning Left",
            Motion::SlowLeft => "Turning Left Slowly",
            Motion::Right => "Turning Right",
            Motion::SlowRight => "Turning Right Slowly",
        }
    }

    // The motion whose pattern actually drives this motion on a robot with
    // the given steering
    fn steered(self, steering: Steering) -> Motion {
        match (steering, self) {
            (Steering::Standard, motion) => motion,
            (Steering::Swapped, Motion::Left) => Motion::Right,
            (Steering::Swapped, Motion::Right) => Motion::Left,
            (Steering::Swapped, Motion::SlowLeft) => Motion::SlowRight,
            (Steering::Swapped, Motion::SlowRight) => Motion::SlowLeft,
            (Steering::Swapped, motion) => motion,
        }
    }
}

struct WheelsInner {
    driver: RefCell<Box<dyn MotorDriver>>,
    steering: Steering,
    state_changed: EventHandler<str>,
}

#[derive(Clone)]
pub(crate) struct Wheels {
    inner: Rc<WheelsInner>,
}

impl Wheels {
    pub(crate) fn new(driver: Box<dyn MotorDriver>, steering: Steering) -> Self {
        Self {
            inner: Rc::new(WheelsInner {
                driver: RefCell::new(driver),
                steering,
                state_changed: EventHandler::new("wheels"),
            }),
        }
    }

    /// Fired with a narration of each movement, e.g. "Turning Left".
    pub(crate) fn state_changed(&self) -> &EventHandler<str> {
        &self.inner.state_changed
    }

    pub(crate) fn drive(&self, motion: Motion) -> Result<()> {
        let pattern = motion.steered(self.inner.steering).pattern();
        self.inner.driver.borrow_mut().apply(pattern)?;

        info!(?motion, "wheels");
        self.inner.state_changed.fire(motion.narration());

        Ok(())
    }

    pub(crate) fn stop(&self) -> Result<()> {
        self.drive(Motion::Stop)
    }

    /// An action that performs `motion` when invoked.
    pub(crate) fn action(&self, motion: Motion) -> Action {
        let wheels = self.clone();
        Rc::new(move || wheels.drive(motion))
    }
}

impl Component for Wheels {
    fn cleanup(&mut self) -> Result<()> {
        self.stop()?;
        self.inner.driver.borrow_mut().release()
    }
}
