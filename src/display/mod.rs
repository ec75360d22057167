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

//! Character display capability.
//!
//! The menu, the program view and the status messages written during startup
//! all go through the [`Display`] trait. Two interchangeable implementations
//! are provided, selected by configuration:
//!
//! * [`ConsoleDisplay`]: writes directly to the terminal.
//! * [`PanelDisplay`]: renders a bordered two-row character panel, mimicking
//!   the 16x2 LCD fitted to the robot.

mod console;
mod panel;

use std::{cell::RefCell, rc::Rc};

use anyhow::Result;

use crate::components::Component;

pub(crate) use console::ConsoleDisplay;
pub(crate) use panel::PanelDisplay;

/// A shared, non-owning handle on the display.
pub(crate) type SharedDisplay = Rc<RefCell<dyn Display>>;

pub(crate) trait Display {
    /// Clears the display and writes `text`, one row per line.
    fn show(&mut self, text: &str) -> Result<()>;

    /// Writes `text` at the given position without clearing.
    fn show_at(&mut self, row: u16, col: u16, text: &str) -> Result<()>;

    /// Fully re-initialises the output device.
    fn reset(&mut self) -> Result<()>;

    /// Releases the output device.
    fn close(&mut self) -> Result<()>;

    /// Number of character columns.
    fn width(&self) -> usize;
}

/// Registers the display with the orchestrator so that it is closed during
/// shutdown.
pub(crate) struct DisplayComponent(pub(crate) SharedDisplay);

impl Component for DisplayComponent {
    fn cleanup(&mut self) -> Result<()> {
        self.0.borrow_mut().close()
    }
}
