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

//! Terminal lifecycle and styling utilities.
//!
//! The displays take over the whole terminal: raw mode so that the keyboard
//! component sees individual key presses, and the alternate screen so that
//! the user's scrollback is left alone.
//!
//! # Compatibility
//!
//! The background colour functions rely on the terminal emulator supporting
//! OSC 11/111. Most modern terminals (XTerm, iTerm2, Alacritty, Kitty) do.

use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};

/// Enables raw mode, switches to the alternate screen and hides the cursor.
///
/// # Errors
///
/// Returns an error if raw mode cannot be enabled or if the alternate screen
/// cannot be entered.
pub(crate) fn enter() -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    execute!(io::stdout(), EnterAlternateScreen, Hide).context("Failed to enter alternate screen")?;
    Ok(())
}

/// Restores the terminal to its original state.
///
/// This reverses [`enter`]. It is best-effort and does not return a result,
/// as it is called during cleanup.
pub(crate) fn leave() {
    execute!(io::stdout(), Show, LeaveAlternateScreen).ok();
    disable_raw_mode().ok();
}

/// Sets the terminal background colour using an OSC 11 escape sequence.
pub(crate) fn set_terminal_bg(hex_colour: &str) {
    print!("\x1b]11;{}\x07", hex_colour);
    io::stdout().flush().ok();
}

/// Resets the terminal background to its default colour (OSC 111).
pub(crate) fn reset_terminal_bg() {
    print!("\x1b]111\x07");
    io::stdout().flush().ok();
}
