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

//! Sound file playback.
//!
//! # Architecture
//!
//! Playback runs on a dedicated MPV worker thread. The [`AudioPlayer`] handle
//! sends it commands over a channel, so starting a track never blocks the poll
//! loop.
//!
//! The menu gets an `Audio` folder listing every `.wav` and `.mp3` file in the
//! configured directory.

mod commands;

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
    sync::mpsc,
};

use anyhow::{Context, Result, anyhow};
use tracing::info;
use walkdir::WalkDir;

use crate::{
    components::{
        Component,
        audio::commands::{AudioCommand, spawn_audio_worker},
    },
    error::BotError,
    menu::Menu,
    util::format::truncate,
};

const AUDIO_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

/// Longest track name shown after "Play " in the menu.
const LABEL_CHARS: usize = 11;

pub(crate) trait Playback {
    fn play(&mut self, path: &Path) -> Result<()>;

    fn stop(&mut self) -> Result<()>;
}

pub(crate) struct AudioPlayer {
    /// Channel for sending commands to the background worker thread.
    command_tx: mpsc::Sender<AudioCommand>,
}

impl AudioPlayer {
    /// Spawns the audio worker thread and waits for it to initialise MPV.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Unavailable`] if MPV could not be initialised.
    pub(crate) fn new() -> Result<Self, BotError> {
        let (command_tx, command_rx) = mpsc::channel::<AudioCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();

        spawn_audio_worker(command_rx, ready_tx);

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { command_tx }),
            Ok(Err(reason)) => Err(BotError::unavailable("audio", reason)),
            Err(_) => Err(BotError::unavailable("audio", "worker exited during startup")),
        }
    }

    fn send(&self, command: AudioCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| anyhow!("Audio worker has stopped"))
    }
}

impl Playback for AudioPlayer {
    fn play(&mut self, path: &Path) -> Result<()> {
        let filename = path
            .to_str()
            .with_context(|| format!("Unsupported file name: {}", path.display()))?;
        self.send(AudioCommand::PlayFile(filename.to_string()))
    }

    fn stop(&mut self) -> Result<()> {
        self.send(AudioCommand::Stop)
    }
}

/// A playable file and its menu label.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Track {
    pub(crate) label: String,
    pub(crate) path: PathBuf,
}

/// Lists the audio files directly inside `dir`, sorted by file name.
pub(crate) fn find_tracks(dir: &Path) -> Vec<Track> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .filter_map(|entry| {
            let stem = entry.path().file_stem()?.to_string_lossy().into_owned();
            Some(Track {
                label: format!("Play {}", truncate(&stem, LABEL_CHARS)),
                path: entry.into_path(),
            })
        })
        .collect()
}

#[derive(Clone)]
pub(crate) struct Audio {
    player: Rc<RefCell<Box<dyn Playback>>>,
    directory: PathBuf,
}

impl Audio {
    pub(crate) fn new(player: Box<dyn Playback>, directory: PathBuf) -> Self {
        Self {
            player: Rc::new(RefCell::new(player)),
            directory,
        }
    }

    pub(crate) fn play(&self, path: &Path) -> Result<()> {
        info!(file = %path.display(), "playing audio");
        self.player.borrow_mut().play(path)
    }
}

impl Component for Audio {
    fn cleanup(&mut self) -> Result<()> {
        self.player.borrow_mut().stop()
    }

    fn contribute_menu(&mut self, menu: &Menu) {
        let folder = Some(menu.add_folder("Audio", None));

        for track in find_tracks(&self.directory) {
            let audio = self.clone();
            let path = track.path;
            menu.add_function(&track.label, Rc::new(move || audio.play(&path)), folder);
        }
    }
}
