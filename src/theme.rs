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

//! Visual styling for the character panel display.
//!
//! This module defines the panel's colour palette and converts colours
//! between Ratatui's internal representation and the hexadecimal strings used
//! for terminal emulator styling.

use ratatui::style::Color;

#[derive(Clone, Copy)]
pub(crate) struct Theme {
    pub(crate) background_colour: Color,
    pub(crate) panel_colour: Color,
    pub(crate) text_colour: Color,
    pub(crate) border_colour: Color,
}

impl Default for Theme {
    // Returns the standard panel theme.
    fn default() -> Self {
        Self::default_theme()
    }
}

impl Theme {
    // Constructs the default theme, a backlit green LCD.
    pub(crate) const fn default_theme() -> Self {
        Self {
            background_colour: Color::Rgb(20, 24, 20),
            panel_colour: Color::Rgb(92, 140, 40),
            text_colour: Color::Rgb(16, 32, 8),
            border_colour: Color::Rgb(102, 102, 102),
        }
    }

    /// Converts a [`ratatui::style::Color`] into a CSS-style hexadecimal
    /// string.
    ///
    /// Returns `None` for anything other than a [`Color::Rgb`] colour.
    pub(crate) fn to_hex(colour: Color) -> Option<String> {
        match colour {
            Color::Rgb(r, g, b) => Some(format!("#{:02x}{:02x}{:02x}", r, g, b)),
            _ => None,
        }
    }
}
