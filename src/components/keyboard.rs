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

//! Terminal key presses.
//!
//! Each recognised key has its own channel. The orchestrator subscribes
//! movement, menu navigation and exit actions to them.

use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::{
    components::Component,
    events::{HandlerMap, Subscriber},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Key {
    Up,
    Down,
    Left,
    Right,
    /// `.`
    Stop,
    /// `{`
    SlowLeft,
    /// `}`
    SlowRight,
    /// `#`
    Photo,
    /// Ctrl+X
    Shutdown,
    /// Ctrl+C
    Interrupt,
    PageDown,
    PageUp,
    Return,
    Esc,
}

impl Key {
    pub(crate) const ALL: [Key; 14] = [
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::Stop,
        Key::SlowLeft,
        Key::SlowRight,
        Key::Photo,
        Key::Shutdown,
        Key::Interrupt,
        Key::PageDown,
        Key::PageUp,
        Key::Return,
        Key::Esc,
    ];
}

pub(crate) trait KeySource {
    /// Returns the next pending key without blocking.
    fn next_key(&mut self) -> Result<Option<Key>>;
}

/// Reads keys from the terminal the display has put into raw mode.
pub(crate) struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> Result<Option<Key>> {
        while event::poll(Duration::ZERO).context("Failed to poll terminal events")? {
            if let Event::Key(key_event) = event::read().context("Failed to read terminal event")?
                && let Some(key) = map_key(&key_event)
            {
                return Ok(Some(key));
            }
        }

        Ok(None)
    }
}

/// Maps a terminal key event to a [`Key`]. Releases and repeats are ignored.
pub(crate) fn map_key(key_event: &KeyEvent) -> Option<Key> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

    match key_event.code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char('x') | KeyCode::Char('X') if ctrl => Some(Key::Shutdown),
        KeyCode::Char('c') | KeyCode::Char('C') if ctrl => Some(Key::Interrupt),
        KeyCode::Char('.') => Some(Key::Stop),
        KeyCode::Char('{') => Some(Key::SlowLeft),
        KeyCode::Char('}') => Some(Key::SlowRight),
        KeyCode::Char('#') => Some(Key::Photo),
        KeyCode::PageDown => Some(Key::PageDown),
        KeyCode::PageUp => Some(Key::PageUp),
        KeyCode::Enter => Some(Key::Return),
        KeyCode::Esc => Some(Key::Esc),
        _ => None,
    }
}

pub(crate) struct Keyboard {
    source: Box<dyn KeySource>,
    handlers: HandlerMap<Key, ()>,
}

impl Keyboard {
    pub(crate) fn new(source: Box<dyn KeySource>) -> Self {
        Self {
            source,
            handlers: HandlerMap::new(Key::ALL),
        }
    }

    pub(crate) fn on(&self, key: Key, subscriber: Subscriber<()>) -> Result<()> {
        Ok(self.handlers.add(key, subscriber)?)
    }
}

impl Component for Keyboard {
    fn poll(&mut self) -> Result<()> {
        while let Some(key) = self.source.next_key()? {
            debug!(?key, "key pressed");
            self.handlers.fire(key, &());
        }
        Ok(())
    }
}
