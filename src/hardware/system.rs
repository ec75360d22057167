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

//! Devices of a real robot, as described by the configuration.

use std::{cell::RefCell, rc::Rc};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    components::{
        audio::{AudioPlayer, Playback},
        camera::{Fswebcam, Shutter},
        controller::{Gamepad, JoystickDevice},
        keyboard::{KeySource, TerminalKeys},
        speech::{EspeakSpeaker, Speaker},
    },
    config::{AppConfig, DisplayKind},
    display::{ConsoleDisplay, PanelDisplay, SharedDisplay},
    error::BotError,
    hardware::{
        DigitalInput, Devices, MotorDriver, RangeFinder,
        gpio::Gpio,
        motors::{GpioMotors, NullMotors},
        ranging::GpioRangeFinder,
    },
    theme::Theme,
};

pub(crate) struct SystemDevices {
    config: AppConfig,
    gpio: Option<Gpio>,
}

impl SystemDevices {
    pub(crate) fn new(config: &AppConfig) -> Self {
        let gpio = if config.gpio.enabled {
            match Gpio::open(&config.gpio.base_path) {
                Ok(gpio) => Some(gpio),
                Err(e) => {
                    warn!(error = %e, "continuing without gpio");
                    None
                }
            }
        } else {
            None
        };

        Self {
            config: config.clone(),
            gpio,
        }
    }

    fn gpio(&self, device: &'static str) -> Result<&Gpio, BotError> {
        self.gpio
            .as_ref()
            .ok_or_else(|| BotError::unavailable(device, "gpio is not available"))
    }

    fn require(enabled: bool, device: &'static str) -> Result<(), BotError> {
        if enabled {
            Ok(())
        } else {
            Err(BotError::unavailable(device, "disabled in configuration"))
        }
    }
}

impl Devices for SystemDevices {
    fn display(&self) -> Result<SharedDisplay> {
        let width = self.config.display_width;
        let display: SharedDisplay = match self.config.display {
            DisplayKind::Console => Rc::new(RefCell::new(ConsoleDisplay::open(width)?)),
            DisplayKind::Panel => Rc::new(RefCell::new(PanelDisplay::open(width, Theme::default())?)),
        };
        Ok(display)
    }

    fn motors(&self) -> Result<Box<dyn MotorDriver>> {
        let Some(gpio) = self.gpio.as_ref() else {
            info!("no gpio, motor patterns will only be logged");
            return Ok(Box::new(NullMotors));
        };

        Ok(Box::new(GpioMotors::new(gpio, self.config.motors.as_array())?))
    }

    fn buttons(&self) -> Result<(Box<dyn DigitalInput>, Box<dyn DigitalInput>)> {
        let buttons = &self.config.buttons;
        Self::require(buttons.enabled, "buttons")?;
        let gpio = self.gpio("buttons")?;

        let menu = gpio.input(buttons.menu_pin).context("Failed to acquire MENU button")?;
        let select = gpio
            .input(buttons.select_pin)
            .context("Failed to acquire SELECT button")?;

        Ok((Box::new(menu), Box::new(select)))
    }

    fn range_finder(&self) -> Result<Box<dyn RangeFinder>> {
        let echo = &self.config.echo;
        Self::require(echo.enabled, "echo")?;
        let gpio = self.gpio("echo")?;

        Ok(Box::new(GpioRangeFinder::new(gpio, echo.trigger_pin, echo.echo_pin)?))
    }

    fn camera(&self) -> Result<Box<dyn Shutter>> {
        Self::require(self.config.camera.enabled, "camera")?;
        Ok(Box::new(Fswebcam::probe(&self.config.camera)?))
    }

    fn gamepad(&self) -> Result<Box<dyn Gamepad>> {
        let controller = &self.config.controller;
        Self::require(controller.enabled, "controller")?;
        Ok(Box::new(JoystickDevice::new(controller.device.clone())))
    }

    fn speaker(&self) -> Result<Rc<dyn Speaker>> {
        Self::require(self.config.speech.enabled, "speech")?;
        Ok(Rc::new(EspeakSpeaker::probe(&self.config.speech.command)?))
    }

    fn audio(&self) -> Result<Box<dyn Playback>> {
        Self::require(self.config.audio.enabled, "audio")?;
        Ok(Box::new(AudioPlayer::new()?))
    }

    fn keys(&self) -> Box<dyn KeySource> {
        Box::new(TerminalKeys)
    }
}
