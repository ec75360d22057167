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

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError, Sender},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::{debug, error, info};

#[derive(Debug)]
pub(crate) enum AudioCommand {
    PlayFile(String),
    Stop,
}

/// How long the worker waits for a command before servicing MPV's event
/// queue.
const COMMAND_WAIT: Duration = Duration::from_millis(50);

/// Spawns the MPV worker. The outcome of initialising MPV is reported on
/// `ready_tx` before any command is processed.
pub(crate) fn spawn_audio_worker(command_rx: Receiver<AudioCommand>, ready_tx: Sender<Result<(), String>>) {
    thread::spawn(move || {
        let mut handler = match create_handler() {
            Ok(handler) => {
                let _ = ready_tx.send(Ok(()));
                handler
            }
            Err(e) => {
                let _ = ready_tx.send(Err(format!("{:#}", e)));
                return;
            }
        };

        if let Err(e) = audio_worker(&mut handler, command_rx) {
            error!(error = %format!("{:#}", e), "MPV worker failure");
        }
    });
}

fn create_handler() -> Result<mpv::MpvHandler> {
    let mut builder = mpv::MpvHandlerBuilder::new().context("Failed to create MPV builder")?;
    builder
        .set_option("vo", "null")
        .context("Failed to set no video output")?;
    builder.build().context("Failed to build MPV handler")
}

fn audio_worker(handler: &mut mpv::MpvHandler, command_rx: Receiver<AudioCommand>) -> Result<()> {
    loop {
        match command_rx.recv_timeout(COMMAND_WAIT) {
            Ok(command) => process_command(handler, command)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("audio worker exiting");
                return Ok(());
            }
        }

        // Keep MPV's event queue drained
        while handler.wait_event(0.0).is_some() {}
    }
}

fn process_command(handler: &mut mpv::MpvHandler, command: AudioCommand) -> Result<()> {
    match command {
        AudioCommand::PlayFile(filename) => {
            debug!(%filename, "playing");
            handler
                .command(&["loadfile", &filename, "replace"])
                .with_context(|| format!("Failed to load file: {}", filename))?;
            handler.set_property("pause", false)?;
        }
        AudioCommand::Stop => {
            handler.command(&["stop"])?;
        }
    }

    Ok(())
}
