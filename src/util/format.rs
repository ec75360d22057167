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

//! Text shaping for fixed-width character displays.
//!
//! All widths are counted in `char`s, not bytes.

/// Truncates or right-pads `text` to exactly `width` characters.
///
/// This is used for status lines so that a shorter message fully overwrites a
/// longer one previously shown at the same position.
///
/// # Examples
///
/// ```
/// assert_eq!(fit("Back", 6), "Back  ");
/// assert_eq!(fit("Slow Right Turn", 4), "Slow");
/// ```
pub(crate) fn fit(text: &str, width: usize) -> String {
    format!("{:<width$}", truncate(text, width), width = width)
}

/// Right-aligns `text` in a field of `width` characters.
pub(crate) fn right_align(text: &str, width: usize) -> String {
    format!("{:>width$}", text, width = width)
}

/// Returns at most the first `max` characters of `text`.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Writes `text` into `line` starting at column `col`, padding with spaces as
/// needed and clipping at `width`.
pub(crate) fn overlay(line: &str, col: usize, text: &str, width: usize) -> String {
    let mut cells: Vec<char> = line.chars().collect();
    if cells.len() < width {
        cells.resize(width, ' ');
    }

    for (offset, ch) in text.chars().enumerate() {
        let pos = col + offset;
        if pos >= width {
            break;
        }
        cells[pos] = ch;
    }

    cells.truncate(width);
    cells.into_iter().collect()
}
