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

//! Plain terminal display.

use std::io::{self, Stdout, Write};

use anyhow::{Context, Result};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use crate::{display::Display, util::term};

pub(crate) struct ConsoleDisplay {
    stdout: Stdout,
    width: usize,
    open: bool,
}

impl ConsoleDisplay {
    /// Takes over the terminal.
    pub(crate) fn open(width: usize) -> Result<Self> {
        term::enter()?;

        Ok(Self {
            stdout: io::stdout(),
            width,
            open: true,
        })
    }
}

impl Display for ConsoleDisplay {
    fn show(&mut self, text: &str) -> Result<()> {
        queue!(self.stdout, Clear(ClearType::All))?;
        for (row, line) in text.lines().enumerate() {
            queue!(self.stdout, MoveTo(0, row as u16), Print(line))?;
        }
        self.stdout.flush().context("Failed to write to terminal")
    }

    fn show_at(&mut self, row: u16, col: u16, text: &str) -> Result<()> {
        queue!(self.stdout, MoveTo(col, row), Print(text))?;
        self.stdout.flush().context("Failed to write to terminal")
    }

    fn reset(&mut self) -> Result<()> {
        term::leave();
        term::enter()?;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            term::leave();
            self.open = false;
        }
        Ok(())
    }

    fn width(&self) -> usize {
        self.width
    }
}

impl Drop for ConsoleDisplay {
    fn drop(&mut self) {
        self.close().ok();
    }
}
