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

//! Linux sysfs GPIO.
//!
//! Pins are exported on acquisition and unexported on release. Each pin handle
//! owns its export, so dropping a handle always releases the pin even when an
//! explicit release was missed.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{error::BotError, hardware::DigitalInput};

#[derive(Clone, Debug)]
pub(crate) struct Gpio {
    base: PathBuf,
}

impl Gpio {
    /// # Errors
    ///
    /// Returns [`BotError::Unavailable`] if `base` is not a GPIO sysfs
    /// directory.
    pub(crate) fn open(base: &Path) -> Result<Self, BotError> {
        if !base.join("export").exists() {
            return Err(BotError::unavailable(
                "gpio",
                format!("{} has no export file", base.display()),
            ));
        }

        Ok(Self {
            base: base.to_path_buf(),
        })
    }

    pub(crate) fn output(&self, number: u8) -> Result<OutputPin, BotError> {
        let pin = self.export(number, "out")?;
        Ok(OutputPin(pin))
    }

    pub(crate) fn input(&self, number: u8) -> Result<InputPin, BotError> {
        let pin = self.export(number, "in")?;
        Ok(InputPin(pin))
    }

    fn export(&self, number: u8, direction: &str) -> Result<Pin, BotError> {
        let dir = self.base.join(format!("gpio{}", number));

        if !dir.exists() {
            fs::write(self.base.join("export"), number.to_string()).map_err(BotError::gpio(number))?;
        }
        fs::write(dir.join("direction"), direction).map_err(BotError::gpio(number))?;

        debug!(pin = number, direction, "exported gpio");

        Ok(Pin {
            number,
            dir,
            base: self.base.clone(),
            exported: true,
        })
    }
}

struct Pin {
    number: u8,
    dir: PathBuf,
    base: PathBuf,
    exported: bool,
}

impl Pin {
    fn value_path(&self) -> PathBuf {
        self.dir.join("value")
    }

    fn release(&mut self) -> Result<(), BotError> {
        if self.exported {
            self.exported = false;
            fs::write(self.base.join("unexport"), self.number.to_string())
                .map_err(BotError::gpio(self.number))?;
            debug!(pin = self.number, "unexported gpio");
        }
        Ok(())
    }
}

impl Drop for Pin {
    fn drop(&mut self) {
        self.release().ok();
    }
}

pub(crate) struct OutputPin(Pin);

impl OutputPin {
    pub(crate) fn write(&mut self, high: bool) -> Result<(), BotError> {
        fs::write(self.0.value_path(), if high { "1" } else { "0" }).map_err(BotError::gpio(self.0.number))
    }

    pub(crate) fn release(&mut self) -> Result<(), BotError> {
        self.0.release()
    }
}

pub(crate) struct InputPin(Pin);

impl InputPin {
    pub(crate) fn read(&self) -> Result<bool, BotError> {
        let value = fs::read_to_string(self.0.value_path()).map_err(BotError::gpio(self.0.number))?;
        Ok(value.trim() == "1")
    }

    pub(crate) fn release(&mut self) -> Result<(), BotError> {
        self.0.release()
    }
}

impl DigitalInput for InputPin {
    fn is_high(&mut self) -> anyhow::Result<bool> {
        Ok(self.read()?)
    }

    fn release(&mut self) -> anyhow::Result<()> {
        Ok(InputPin::release(self)?)
    }
}
