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

//! Character panel display.
//!
//! Renders a fixed-size grid of character cells inside a bordered block in
//! the middle of the terminal, so what you see in a terminal matches what the
//! robot's LCD would show. Text wraps nowhere: anything beyond the panel
//! width or height is clipped, as it would be on the real device.

use std::io::{self, Stdout};

use anyhow::{Context, Result};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    display::Display,
    theme::Theme,
    util::{format::overlay, term},
};

const PANEL_ROWS: usize = 2;

/// The character cells shown on the panel.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PanelBuffer {
    rows: Vec<String>,
    width: usize,
}

impl PanelBuffer {
    pub(crate) fn new(width: usize) -> Self {
        Self {
            rows: vec![" ".repeat(width); PANEL_ROWS],
            width,
        }
    }

    pub(crate) fn clear(&mut self) {
        for row in self.rows.iter_mut() {
            *row = " ".repeat(self.width);
        }
    }

    /// Clears the panel then writes one line of `text` per row.
    pub(crate) fn write(&mut self, text: &str) {
        self.clear();
        for (row, line) in text.lines().take(PANEL_ROWS).enumerate() {
            self.write_at(row, 0, line);
        }
    }

    pub(crate) fn write_at(&mut self, row: usize, col: usize, text: &str) {
        if let Some(line) = self.rows.get_mut(row) {
            *line = overlay(line, col, text, self.width);
        }
    }

    pub(crate) fn rows(&self) -> &[String] {
        &self.rows
    }
}

pub(crate) struct PanelDisplay {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    buffer: PanelBuffer,
    theme: Theme,
}

impl PanelDisplay {
    pub(crate) fn open(width: usize, theme: Theme) -> Result<Self> {
        let terminal = Self::open_terminal(&theme)?;

        let mut display = Self {
            terminal: Some(terminal),
            buffer: PanelBuffer::new(width),
            theme,
        };
        display.render()?;

        Ok(display)
    }

    fn open_terminal(theme: &Theme) -> Result<Terminal<CrosstermBackend<Stdout>>> {
        // Set the background of the entire terminal window, without this we'd
        // get a thin black outline
        if let Some(hex) = Theme::to_hex(theme.background_colour) {
            term::set_terminal_bg(&hex);
        }

        term::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        Terminal::new(backend).context("Failed to create terminal")
    }

    fn render(&mut self) -> Result<()> {
        let Self { terminal, buffer, theme } = self;

        if let Some(terminal) = terminal.as_mut() {
            terminal
                .draw(|f| draw_panel(f, buffer, theme))
                .context("Failed to draw panel")?;
        }

        Ok(())
    }
}

impl Display for PanelDisplay {
    fn show(&mut self, text: &str) -> Result<()> {
        self.buffer.write(text);
        self.render()
    }

    fn show_at(&mut self, row: u16, col: u16, text: &str) -> Result<()> {
        self.buffer.write_at(row as usize, col as usize, text);
        self.render()
    }

    fn reset(&mut self) -> Result<()> {
        self.close()?;
        self.buffer.clear();
        self.terminal = Some(Self::open_terminal(&self.theme)?);
        self.render()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut terminal) = self.terminal.take() {
            terminal.show_cursor().ok();
            term::leave();
            term::reset_terminal_bg();
        }
        Ok(())
    }

    fn width(&self) -> usize {
        self.buffer.width
    }
}

impl Drop for PanelDisplay {
    fn drop(&mut self) {
        self.close().ok();
    }
}

fn draw_panel(f: &mut Frame, buffer: &PanelBuffer, theme: &Theme) {
    let area = f.area();

    f.render_widget(
        Block::default().style(Style::default().bg(theme.background_colour)),
        area,
    );

    // Cells plus a one character border all round
    let panel_area = centred(area, buffer.width as u16 + 2, PANEL_ROWS as u16 + 2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_colour))
        .title(" pibot ")
        .style(Style::default().bg(theme.panel_colour).fg(theme.text_colour));

    let lines: Vec<Line> = buffer.rows().iter().map(|row| Line::raw(row.as_str())).collect();

    f.render_widget(Paragraph::new(lines).block(block), panel_area);
}

fn centred(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
