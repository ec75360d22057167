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

//! Application configuration.
//!
//! This module manages the robot configuration file: which display to drive,
//! pin assignments, which optional components to bring up, and the timing of
//! the poll loop and program steps.

use std::{path::{Path, PathBuf}, time::Duration};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

const CONFIG_NAME: &str = "pibot";

/// Which display implementation to drive.
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum DisplayKind {
    /// Plain terminal output.
    Console,
    /// A bordered two-row character panel.
    Panel,
}

/// Left/right convention for the motor wiring.
///
/// Robots built from the same parts have been wired with the motor leads in
/// either orientation, so the sense of a turn is configuration rather than
/// code.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Steering {
    Standard,
    Swapped,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub version: u32,

    pub display: DisplayKind,
    pub display_width: usize,

    pub steering: Steering,

    pub poll_interval_ms: u64,
    pub dwell_ms: u64,

    pub gpio: GpioConfig,
    pub motors: MotorPins,
    pub buttons: ButtonsConfig,
    pub echo: EchoConfig,
    pub camera: CameraConfig,
    pub controller: ControllerConfig,
    pub speech: SpeechConfig,
    pub audio: AudioConfig,
    pub remote: RemoteConfig,

    pub halt_command: String,

    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            display: DisplayKind::Console,
            display_width: 16,
            steering: Steering::Standard,
            poll_interval_ms: 100,
            dwell_ms: 1000,
            gpio: GpioConfig::default(),
            motors: MotorPins::default(),
            buttons: ButtonsConfig::default(),
            echo: EchoConfig::default(),
            camera: CameraConfig::default(),
            controller: ControllerConfig::default(),
            speech: SpeechConfig::default(),
            audio: AudioConfig::default(),
            remote: RemoteConfig::default(),
            halt_command: "halt".into(),
            log_level: "info".into(),
            log_file: PathBuf::from("pibot.log"),
        }
    }
}

impl AppConfig {
    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub(crate) fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct GpioConfig {
    pub enabled: bool,
    pub base_path: PathBuf,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_path: PathBuf::from("/sys/class/gpio"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct MotorPins {
    pub pin_1a: u8,
    pub pin_1b: u8,
    pub pin_2a: u8,
    pub pin_2b: u8,
}

impl Default for MotorPins {
    fn default() -> Self {
        Self {
            pin_1a: 17,
            pin_1b: 18,
            pin_2a: 22,
            pin_2b: 23,
        }
    }
}

impl MotorPins {
    pub(crate) fn as_array(&self) -> [u8; 4] {
        [self.pin_1a, self.pin_1b, self.pin_2a, self.pin_2b]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct ButtonsConfig {
    pub enabled: bool,
    pub menu_pin: u8,
    pub select_pin: u8,
}

impl Default for ButtonsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            menu_pin: 7,
            select_pin: 8,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct EchoConfig {
    pub enabled: bool,
    pub trigger_pin: u8,
    pub echo_pin: u8,
    pub threshold_cm: f64,
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_pin: 0,
            echo_pin: 4,
            threshold_cm: 15.0,
            interval_ms: 200,
            timeout_ms: 60,
        }
    }
}

impl EchoConfig {
    pub(crate) fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct CameraConfig {
    pub enabled: bool,
    pub device: String,
    pub resolution: String,
    pub output: PathBuf,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device: "/dev/video0".into(),
            resolution: "640x480".into(),
            output: PathBuf::from("pibot_pic.jpg"),
        }
    }
}

/// Joystick button numbers reported by the controller's device node.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct ControllerButtons {
    pub one: u8,
    pub two: u8,
    pub a: u8,
    pub b: u8,
    pub up: u8,
    pub down: u8,
    pub left: u8,
    pub right: u8,
    pub minus: u8,
    pub plus: u8,
    pub home: u8,
}

impl Default for ControllerButtons {
    fn default() -> Self {
        Self {
            one: 0,
            two: 1,
            a: 2,
            b: 3,
            minus: 4,
            plus: 5,
            home: 6,
            up: 7,
            down: 8,
            left: 9,
            right: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct ControllerConfig {
    pub enabled: bool,
    pub device: PathBuf,
    pub buttons: ControllerButtons,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device: PathBuf::from("/dev/input/js0"),
            buttons: ControllerButtons::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct SpeechConfig {
    pub enabled: bool,
    pub command: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "espeak".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct AudioConfig {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("."),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct RemoteConfig {
    pub enabled: bool,
    pub bind: String,
    pub web_root: PathBuf,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "0.0.0.0:8080".into(),
            web_root: PathBuf::from("web"),
        }
    }
}

/// Loads the configuration from the platform config directory, falling back
/// to defaults if the file is missing or unreadable.
pub(crate) fn load_config() -> AppConfig {
    confy::load(CONFIG_NAME, None).unwrap_or_default()
}

/// Loads the configuration from an explicit file.
pub(crate) fn load_config_from(path: &Path) -> Result<AppConfig> {
    confy::load_path(path).with_context(|| format!("Failed to load config from {}", path.display()))
}
