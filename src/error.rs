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

//! Domain errors.
//!
//! Application plumbing uses [`anyhow`]; the conditions callers are expected
//! to match on are collected here.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum BotError {
    /// `remove` was asked for a subscriber that is not on the channel.
    #[error("subscriber is not registered on channel '{0}'")]
    NotSubscribed(String),

    /// Unknown remote command, event key and so on.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("no program step at index {0}")]
    NoSuchStep(usize),

    /// Optional hardware that is not installed or could not be initialised.
    #[error("{device} unavailable: {reason}")]
    Unavailable { device: &'static str, reason: String },

    #[error("GPIO pin {pin}: {source}")]
    Gpio {
        pin: u8,
        #[source]
        source: io::Error,
    },

    /// A handler ran but failed.
    #[error("action failed: {0}")]
    Action(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BotError {
    pub(crate) fn unavailable(device: &'static str, reason: impl ToString) -> Self {
        Self::Unavailable {
            device,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn gpio(pin: u8) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Gpio { pin, source }
    }
}
