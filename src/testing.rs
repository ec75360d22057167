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

//! Recording fakes for the device traits, shared by the unit tests.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    path::{Path, PathBuf},
    rc::Rc,
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use anyhow::{Result, bail};

use crate::{
    components::{
        audio::Playback,
        camera::Shutter,
        controller::{Gamepad, PadEvent},
        keyboard::{Key, KeySource},
        speech::Speaker,
    },
    display::{Display, SharedDisplay},
    error::BotError,
    hardware::{DigitalInput, Devices, MotorDriver, RangeFinder},
};

/// Everything written to a [`RecordingDisplay`].
#[derive(Default, Debug)]
pub(crate) struct DisplayRecord {
    pub(crate) writes: Vec<(u16, u16, String)>,
    pub(crate) shown: Vec<String>,
    pub(crate) resets: u32,
    pub(crate) closed: bool,
}

pub(crate) struct RecordingDisplay {
    record: Rc<RefCell<DisplayRecord>>,
    width: usize,
}

impl RecordingDisplay {
    pub(crate) fn shared(width: usize) -> (SharedDisplay, Rc<RefCell<DisplayRecord>>) {
        let record = Rc::new(RefCell::new(DisplayRecord::default()));
        let display = Self {
            record: Rc::clone(&record),
            width,
        };
        (Rc::new(RefCell::new(display)), record)
    }
}

impl Display for RecordingDisplay {
    fn show(&mut self, text: &str) -> Result<()> {
        self.record.borrow_mut().shown.push(text.to_string());
        Ok(())
    }

    fn show_at(&mut self, row: u16, col: u16, text: &str) -> Result<()> {
        self.record.borrow_mut().writes.push((row, col, text.to_string()));
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.record.borrow_mut().resets += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.record.borrow_mut().closed = true;
        Ok(())
    }

    fn width(&self) -> usize {
        self.width
    }
}

#[derive(Default)]
pub(crate) struct RecordingSpeaker {
    spoken: RefCell<Vec<String>>,
}

impl RecordingSpeaker {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn spoken(&self) -> Vec<String> {
        self.spoken.borrow().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        self.spoken.borrow_mut().push(text.to_string());
        Ok(())
    }
}

#[derive(Default, Debug)]
pub(crate) struct MotorLog {
    pub(crate) patterns: Vec<[bool; 4]>,
    pub(crate) released: bool,
}

pub(crate) struct RecordingMotors(Rc<RefCell<MotorLog>>);

impl RecordingMotors {
    pub(crate) fn new() -> (Self, Rc<RefCell<MotorLog>>) {
        let log = Rc::new(RefCell::new(MotorLog::default()));
        (Self(Rc::clone(&log)), log)
    }
}

impl MotorDriver for RecordingMotors {
    fn apply(&mut self, pattern: [bool; 4]) -> Result<()> {
        self.0.borrow_mut().patterns.push(pattern);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.0.borrow_mut().released = true;
        Ok(())
    }
}

/// A digital input whose level is set by the test.
pub(crate) struct FakeInput {
    level: Rc<Cell<bool>>,
    released: Rc<Cell<bool>>,
}

impl FakeInput {
    pub(crate) fn new() -> (Self, Rc<Cell<bool>>) {
        let level = Rc::new(Cell::new(false));
        (Self::following(Rc::clone(&level)), level)
    }

    pub(crate) fn following(level: Rc<Cell<bool>>) -> Self {
        Self {
            level,
            released: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn released_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.released)
    }
}

impl DigitalInput for FakeInput {
    fn is_high(&mut self) -> Result<bool> {
        Ok(self.level.get())
    }

    fn release(&mut self) -> Result<()> {
        self.released.set(true);
        Ok(())
    }
}

/// Returns the given readings in order, then times out forever.
pub(crate) struct FakeRangeFinder {
    readings: VecDeque<Option<f64>>,
}

impl FakeRangeFinder {
    pub(crate) fn new(readings: &[Option<f64>]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
        }
    }
}

impl RangeFinder for FakeRangeFinder {
    fn measure(&mut self, _timeout: Duration) -> Result<Option<f64>> {
        Ok(self.readings.pop_front().flatten())
    }

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

pub(crate) struct ScriptedKeys {
    keys: VecDeque<Key>,
}

impl ScriptedKeys {
    pub(crate) fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> Result<Option<Key>> {
        Ok(self.keys.pop_front())
    }
}

pub(crate) struct CountingShutter(pub(crate) Rc<Cell<u32>>);

impl Shutter for CountingShutter {
    fn capture(&mut self) -> Result<()> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

/// A controller whose events come from the test. Connects once.
pub(crate) struct ChannelPad(pub(crate) Option<Receiver<PadEvent>>);

impl Gamepad for ChannelPad {
    fn connect(&mut self) -> Result<Receiver<PadEvent>> {
        match self.0.take() {
            Some(events) => Ok(events),
            None => bail!("no controller"),
        }
    }
}

#[derive(Default, Debug)]
pub(crate) struct PlaybackLog {
    pub(crate) played: Vec<PathBuf>,
    pub(crate) stopped: bool,
}

pub(crate) struct RecordingPlayback(pub(crate) Rc<RefCell<PlaybackLog>>);

impl Playback for RecordingPlayback {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.0.borrow_mut().played.push(path.to_path_buf());
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.0.borrow_mut().stopped = true;
        Ok(())
    }
}

/// A robot with recording devices. Only the display, motors and keyboard are
/// fitted unless a `with_` method adds more.
pub(crate) struct FakeDevices {
    pub(crate) display: Rc<RefCell<DisplayRecord>>,
    pub(crate) motors: Rc<RefCell<MotorLog>>,
    pub(crate) photos: Option<Rc<Cell<u32>>>,
    pub(crate) speaker: Option<Rc<RecordingSpeaker>>,
    /// Levels of the MENU and SELECT inputs.
    pub(crate) buttons: Option<(Rc<Cell<bool>>, Rc<Cell<bool>>)>,
    pub(crate) pad_events: Option<Sender<PadEvent>>,
    pub(crate) playback: Option<Rc<RefCell<PlaybackLog>>>,
    pad: RefCell<Option<Receiver<PadEvent>>>,
    readings: Option<Vec<Option<f64>>>,
    keys: RefCell<Vec<Key>>,
}

impl FakeDevices {
    pub(crate) fn new() -> Self {
        Self {
            display: Rc::new(RefCell::new(DisplayRecord::default())),
            motors: Rc::new(RefCell::new(MotorLog::default())),
            photos: None,
            speaker: None,
            buttons: None,
            pad_events: None,
            playback: None,
            pad: RefCell::new(None),
            readings: None,
            keys: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_camera(mut self) -> Self {
        self.photos = Some(Rc::new(Cell::new(0)));
        self
    }

    pub(crate) fn with_speaker(mut self) -> Self {
        self.speaker = Some(RecordingSpeaker::new());
        self
    }

    pub(crate) fn with_buttons(mut self) -> Self {
        self.buttons = Some((Rc::new(Cell::new(false)), Rc::new(Cell::new(false))));
        self
    }

    pub(crate) fn with_controller(mut self) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        self.pad_events = Some(event_tx);
        self.pad = RefCell::new(Some(event_rx));
        self
    }

    pub(crate) fn with_audio(mut self) -> Self {
        self.playback = Some(Rc::new(RefCell::new(PlaybackLog::default())));
        self
    }

    pub(crate) fn with_range_finder(mut self, readings: &[Option<f64>]) -> Self {
        self.readings = Some(readings.to_vec());
        self
    }

    pub(crate) fn with_keys(self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.keys.borrow_mut().extend(keys);
        self
    }

    fn absent(device: &'static str) -> anyhow::Error {
        BotError::unavailable(device, "not fitted").into()
    }
}

impl Devices for FakeDevices {
    fn display(&self) -> Result<SharedDisplay> {
        Ok(Rc::new(RefCell::new(RecordingDisplay {
            record: Rc::clone(&self.display),
            width: 16,
        })))
    }

    fn motors(&self) -> Result<Box<dyn MotorDriver>> {
        Ok(Box::new(RecordingMotors(Rc::clone(&self.motors))))
    }

    fn buttons(&self) -> Result<(Box<dyn DigitalInput>, Box<dyn DigitalInput>)> {
        match &self.buttons {
            Some((menu, select)) => Ok((
                Box::new(FakeInput::following(Rc::clone(menu))),
                Box::new(FakeInput::following(Rc::clone(select))),
            )),
            None => Err(Self::absent("buttons")),
        }
    }

    fn range_finder(&self) -> Result<Box<dyn RangeFinder>> {
        match &self.readings {
            Some(readings) => Ok(Box::new(FakeRangeFinder::new(readings))),
            None => Err(Self::absent("echo")),
        }
    }

    fn camera(&self) -> Result<Box<dyn Shutter>> {
        match &self.photos {
            Some(photos) => Ok(Box::new(CountingShutter(Rc::clone(photos)))),
            None => Err(Self::absent("camera")),
        }
    }

    fn gamepad(&self) -> Result<Box<dyn Gamepad>> {
        match self.pad.borrow_mut().take() {
            Some(events) => Ok(Box::new(ChannelPad(Some(events)))),
            None => Err(Self::absent("controller")),
        }
    }

    fn speaker(&self) -> Result<Rc<dyn Speaker>> {
        match &self.speaker {
            Some(speaker) => Ok(Rc::clone(speaker) as Rc<dyn Speaker>),
            None => Err(Self::absent("speech")),
        }
    }

    fn audio(&self) -> Result<Box<dyn Playback>> {
        match &self.playback {
            Some(log) => Ok(Box::new(RecordingPlayback(Rc::clone(log)))),
            None => Err(Self::absent("audio")),
        }
    }

    fn keys(&self) -> Box<dyn KeySource> {
        Box::new(ScriptedKeys::new(self.keys.borrow_mut().drain(..)))
    }
}
