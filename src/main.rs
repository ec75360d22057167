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

//! # PiBot.
//!
//! Controller for a small wheeled robot built from commodity parts: two
//! motors, an ultrasonic distance sensor, a two-row character display, a pair
//! of menu buttons and optionally a webcam, a game controller, speech, audio
//! and a remote control web page.
//!
//! ## Architecture
//!
//! Everything that touches robot state runs on the main thread in a single
//! cooperative poll loop owned by the [`robot::Robot`]. Background threads
//! exist only for blocking I/O (audio playback, the controller device and the
//! remote HTTP listener) and talk to the poll loop over `std::sync::mpsc`
//! channels.
//!
//! Run with no arguments to drive the robot interactively, or with a script
//! such as `^^<<v` to execute it once and exit.

mod components;
mod config;
mod display;
mod error;
mod events;
mod hardware;
mod menu;
mod program;
mod robot;
mod theme;
mod util;

#[cfg(test)]
mod testing;

use std::{fs::File, path::PathBuf, sync::Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{AppConfig, DisplayKind},
    hardware::SystemDevices,
    robot::Robot,
};

#[derive(Parser, Debug)]
#[command(version, about = "Drive a PiBot interactively or run a movement script")]
struct Args {
    /// Movement script to run once, e.g. "^^<<v".
    script: Option<String>,

    /// Load configuration from this file instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured display.
    #[arg(long, value_enum)]
    display: Option<DisplayKind>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config(),
    };
    if let Some(display) = args.display {
        config.display = display;
    }

    init_logging(&config)?;

    println!("PiBot starting...");
    info!(display = ?config.display, script = ?args.script, "starting");

    let devices = SystemDevices::new(&config);
    let mut robot = Robot::startup(config, &devices).context("Failed to start robot")?;

    let res = robot.run(args.script.as_deref());
    robot.shutdown();

    res.context("Robot error occurred")
}

/// Sends log output to the configured file, since the display owns the
/// terminal. `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &AppConfig) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("Failed to create log file {}", config.log_file.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("Invalid log level '{}'", config.log_level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
