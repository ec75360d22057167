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

//! Still photos from a USB webcam.

use std::{
    cell::RefCell,
    path::PathBuf,
    process::{Command, Stdio},
    rc::Rc,
};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::{
    components::Component,
    config::CameraConfig,
    error::BotError,
    menu::{Action, Menu},
};

pub(crate) trait Shutter {
    fn capture(&mut self) -> Result<()>;
}

/// Captures frames with the `fswebcam` command line utility.
pub(crate) struct Fswebcam {
    device: String,
    resolution: String,
    output: PathBuf,
}

impl Fswebcam {
    /// # Errors
    ///
    /// Returns [`BotError::Unavailable`] if `fswebcam` is not installed.
    pub(crate) fn probe(config: &CameraConfig) -> Result<Self, BotError> {
        Command::new("fswebcam")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| BotError::unavailable("camera", e))?;

        Ok(Self {
            device: config.device.clone(),
            resolution: config.resolution.clone(),
            output: config.output.clone(),
        })
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-d".into(),
            self.device.clone(),
            "-r".into(),
            self.resolution.clone(),
            "--no-banner".into(),
            self.output.display().to_string(),
        ]
    }
}

impl Shutter for Fswebcam {
    fn capture(&mut self) -> Result<()> {
        let status = Command::new("fswebcam")
            .args(self.args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("Failed to run fswebcam")?;

        if !status.success() {
            bail!("fswebcam exited with {}", status);
        }

        info!(file = %self.output.display(), "took photo");
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct Camera {
    shutter: Rc<RefCell<Box<dyn Shutter>>>,
}

impl Camera {
    pub(crate) fn new(shutter: Box<dyn Shutter>) -> Self {
        Self {
            shutter: Rc::new(RefCell::new(shutter)),
        }
    }

    pub(crate) fn take_photo(&self) -> Result<()> {
        self.shutter.borrow_mut().capture()
    }

    pub(crate) fn photo_action(&self) -> Action {
        let camera = self.clone();
        Rc::new(move || camera.take_photo())
    }
}

impl Component for Camera {
    fn contribute_menu(&mut self, menu: &Menu) {
        menu.add_function("Take Photo", self.photo_action(), None);
    }
}
