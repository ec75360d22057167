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

//! Pluggable robot subsystems.
//!
//! Every subsystem implements [`Component`] and is owned by the orchestrator
//! for the life of the process.
//!
//! # Sub-modules
//!
//! * [`audio`]: Sound file playback via an MPV worker thread.
//! * [`buttons`]: The two physical menu buttons.
//! * [`camera`]: Still photos from a webcam.
//! * [`controller`]: Wireless game controller.
//! * [`echo`]: Ultrasonic distance sensor.
//! * [`keyboard`]: Terminal key presses.
//! * [`remote`]: HTTP command surface.
//! * [`speech`]: Text to speech.
//! * [`wheels`]: The drive motors.

pub(crate) mod audio;
pub(crate) mod buttons;
pub(crate) mod camera;
pub(crate) mod controller;
pub(crate) mod echo;
pub(crate) mod keyboard;
pub(crate) mod remote;
pub(crate) mod speech;
pub(crate) mod wheels;

use anyhow::Result;

use crate::menu::Menu;

pub(crate) trait Component {
    /// Called once per loop tick. Must return promptly.
    fn poll(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once during shutdown.
    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once during startup to add entries to the menu.
    fn contribute_menu(&mut self, _menu: &Menu) {}
}

/// A component together with the name used in status messages and logs.
pub(crate) struct Registered {
    pub(crate) name: &'static str,
    pub(crate) component: Box<dyn Component>,
}
