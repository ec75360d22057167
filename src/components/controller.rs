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

//! Wireless game controller.
//!
//! # Architecture
//!
//! The controller is connected on demand from the menu. Once connected, a
//! background thread reads raw events from the Linux joystick device and
//! sends them over a channel. Each poll drains that channel to update the set
//! of held buttons.
//!
//! Movement only lasts while a button is held: every poll first invokes the
//! stop action and then fires the channel of each held button.

use std::{
    cell::RefCell,
    fs::File,
    io::Read,
    path::PathBuf,
    rc::Rc,
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    components::Component,
    config::ControllerButtons,
    display::SharedDisplay,
    events::{HandlerMap, Subscriber},
    menu::{Action, Menu},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum PadButton {
    One,
    Two,
    A,
    B,
    Up,
    Down,
    Left,
    Right,
    Minus,
    Plus,
    Home,
}

impl PadButton {
    pub(crate) const ALL: [PadButton; 11] = [
        PadButton::One,
        PadButton::Two,
        PadButton::A,
        PadButton::B,
        PadButton::Up,
        PadButton::Down,
        PadButton::Left,
        PadButton::Right,
        PadButton::Minus,
        PadButton::Plus,
        PadButton::Home,
    ];

    fn number(self, mapping: &ControllerButtons) -> u8 {
        match self {
            PadButton::One => mapping.one,
            PadButton::Two => mapping.two,
            PadButton::A => mapping.a,
            PadButton::B => mapping.b,
            PadButton::Up => mapping.up,
            PadButton::Down => mapping.down,
            PadButton::Left => mapping.left,
            PadButton::Right => mapping.right,
            PadButton::Minus => mapping.minus,
            PadButton::Plus => mapping.plus,
            PadButton::Home => mapping.home,
        }
    }

    fn from_number(number: u8, mapping: &ControllerButtons) -> Option<PadButton> {
        PadButton::ALL.into_iter().find(|b| b.number(mapping) == number)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PadEvent {
    Button { number: u8, pressed: bool },
    Disconnected,
}

pub(crate) trait Gamepad {
    /// Opens the controller and starts delivering its events.
    fn connect(&mut self) -> Result<Receiver<PadEvent>>;
}

const JS_EVENT_SIZE: usize = 8;
const JS_EVENT_BUTTON: u8 = 0x01;

/// A controller exposed through the Linux joystick API, e.g.
/// `/dev/input/js0`.
pub(crate) struct JoystickDevice {
    path: PathBuf,
}

impl JoystickDevice {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Gamepad for JoystickDevice {
    fn connect(&mut self) -> Result<Receiver<PadEvent>> {
        let mut device = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut buffer = [0u8; JS_EVENT_SIZE];
            loop {
                if let Err(e) = device.read_exact(&mut buffer) {
                    warn!(error = %e, "controller read failed");
                    let _ = event_tx.send(PadEvent::Disconnected);
                    return;
                }

                if let Some(event) = decode_js_event(&buffer)
                    && event_tx.send(event).is_err()
                {
                    // Nobody is listening any more
                    return;
                }
            }
        });

        Ok(event_rx)
    }
}

/// Decodes a `struct js_event`: u32 timestamp, i16 value, u8 type and u8
/// number, little endian. Only button events are of interest.
pub(crate) fn decode_js_event(raw: &[u8; JS_EVENT_SIZE]) -> Option<PadEvent> {
    let value = i16::from_le_bytes([raw[4], raw[5]]);
    let kind = raw[6];
    let number = raw[7];

    (kind & JS_EVENT_BUTTON != 0).then_some(PadEvent::Button {
        number,
        pressed: value != 0,
    })
}

struct ControllerInner {
    pad: RefCell<Box<dyn Gamepad>>,
    display: SharedDisplay,
    mapping: ControllerButtons,
    events: RefCell<Option<Receiver<PadEvent>>>,
    held: RefCell<Vec<PadButton>>,
    handlers: HandlerMap<PadButton, ()>,
    stop: RefCell<Option<Action>>,
}

#[derive(Clone)]
pub(crate) struct Controller {
    inner: Rc<ControllerInner>,
}

impl Controller {
    pub(crate) fn new(pad: Box<dyn Gamepad>, display: SharedDisplay, mapping: ControllerButtons) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                pad: RefCell::new(pad),
                display,
                mapping,
                events: RefCell::new(None),
                held: RefCell::new(Vec::new()),
                handlers: HandlerMap::new(PadButton::ALL),
                stop: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn on(&self, button: PadButton, subscriber: Subscriber<()>) -> Result<()> {
        Ok(self.inner.handlers.add(button, subscriber)?)
    }

    /// Sets the action invoked at the start of every poll while connected.
    pub(crate) fn set_stop(&self, action: Action) {
        *self.inner.stop.borrow_mut() = Some(action);
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.inner.events.borrow().is_some()
    }

    pub(crate) fn sync(&self) -> Result<()> {
        self.show("Press a button\non controller")?;

        let connected = self.inner.pad.borrow_mut().connect();
        match connected {
            Ok(events) => {
                info!("controller connected");
                self.inner.held.borrow_mut().clear();
                *self.inner.events.borrow_mut() = Some(events);
                self.show("Controller sync\nsucceeded")
            }
            Err(e) => {
                warn!(error = %e, "controller sync failed");
                self.show("Controller sync\nfailed")
            }
        }
    }

    fn show(&self, text: &str) -> Result<()> {
        self.inner.display.borrow_mut().show(text)
    }

    fn disconnect(&self) {
        *self.inner.events.borrow_mut() = None;
        self.inner.held.borrow_mut().clear();
    }

    // Applies every pending event, returning false if the controller has gone
    fn drain_events(&self) -> bool {
        let events = self.inner.events.borrow();
        let Some(events) = events.as_ref() else {
            return false;
        };

        let mut held = self.inner.held.borrow_mut();
        loop {
            match events.try_recv() {
                Ok(PadEvent::Button { number, pressed }) => {
                    let Some(button) = PadButton::from_number(number, &self.inner.mapping) else {
                        continue;
                    };
                    debug!(?button, pressed, "controller button");
                    held.retain(|b| *b != button);
                    if pressed {
                        held.push(button);
                    }
                }
                Ok(PadEvent::Disconnected) | Err(TryRecvError::Disconnected) => return false,
                Err(TryRecvError::Empty) => return true,
            }
        }
    }
}

impl Component for Controller {
    fn poll(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        if !self.drain_events() {
            warn!("controller disconnected");
            self.disconnect();
            return Ok(());
        }

        let stop = self.inner.stop.borrow().clone();
        if let Some(stop) = stop {
            stop()?;
        }

        let held: Vec<PadButton> = PadButton::ALL
            .into_iter()
            .filter(|b| self.inner.held.borrow().contains(b))
            .collect();

        for button in held {
            self.inner.handlers.fire(button, &());
        }

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.disconnect();
        Ok(())
    }

    fn contribute_menu(&mut self, menu: &Menu) {
        let controller = self.clone();
        menu.add_function("Sync Controller", Rc::new(move || controller.sync()), None);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, sync::mpsc::Sender};

    use super::*;
    use crate::testing::{ChannelPad, RecordingDisplay};

    fn counter(count: &Rc<Cell<u32>>) -> Subscriber<()> {
        let count = Rc::clone(count);
        Rc::new(move |_: &()| {
            count.set(count.get() + 1);
            Ok(())
        })
    }

    fn connected() -> (Controller, Sender<PadEvent>) {
        let (event_tx, event_rx) = mpsc::channel();
        let (display, _) = RecordingDisplay::shared(16);
        let controller = Controller::new(Box::new(ChannelPad(Some(event_rx))), display, ControllerButtons::default());
        controller.sync().unwrap();
        (controller, event_tx)
    }

    fn press(number: u8, pressed: bool) -> PadEvent {
        PadEvent::Button { number, pressed }
    }

    #[test]
    fn decodes_button_events_only() {
        // time, value = 1, type = button, number = 7
        let button = [0x10, 0x27, 0, 0, 1, 0, 0x01, 7];
        assert_eq!(decode_js_event(&button), Some(press(7, true)));

        // Initial state events carry the init flag as well
        let init = [0, 0, 0, 0, 0, 0, 0x81, 3];
        assert_eq!(decode_js_event(&init), Some(press(3, false)));

        let axis = [0, 0, 0, 0, 0xff, 0x7f, 0x02, 0];
        assert_eq!(decode_js_event(&axis), None);
    }

    #[test]
    fn sync_reports_outcome() {
        let (display, record) = RecordingDisplay::shared(16);
        let controller = Controller::new(Box::new(ChannelPad(None)), display, ControllerButtons::default());

        controller.sync().unwrap();

        assert!(!controller.is_connected());
        assert_eq!(
            record.borrow().shown,
            vec!["Press a button\non controller", "Controller sync\nfailed"]
        );

        let (controller, _events) = connected();
        assert!(controller.is_connected());
    }

    #[test]
    fn held_buttons_fire_every_poll_after_stop() {
        let (mut controller, events) = connected();
        let log = Rc::new(RefCell::new(Vec::new()));
        let stop_log = Rc::clone(&log);
        controller.set_stop(Rc::new(move || {
            stop_log.borrow_mut().push("stop");
            Ok(())
        }));
        let up_log = Rc::clone(&log);
        controller
            .on(
                PadButton::Up,
                Rc::new(move |_: &()| {
                    up_log.borrow_mut().push("up");
                    Ok(())
                }),
            )
            .unwrap();

        events.send(press(ControllerButtons::default().up, true)).unwrap();
        controller.poll().unwrap();
        controller.poll().unwrap();
        events.send(press(ControllerButtons::default().up, false)).unwrap();
        controller.poll().unwrap();

        assert_eq!(*log.borrow(), vec!["stop", "up", "stop", "up", "stop"]);
    }

    #[test]
    fn unmapped_buttons_are_ignored() {
        let (mut controller, events) = connected();
        let fired = Rc::new(Cell::new(0));
        for button in PadButton::ALL {
            controller.on(button, counter(&fired)).unwrap();
        }

        events.send(press(42, true)).unwrap();
        controller.poll().unwrap();

        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn disconnect_stops_polling() {
        let (mut controller, events) = connected();
        let fired = Rc::new(Cell::new(0));
        controller.on(PadButton::A, counter(&fired)).unwrap();

        events.send(press(ControllerButtons::default().a, true)).unwrap();
        events.send(PadEvent::Disconnected).unwrap();
        controller.poll().unwrap();

        assert!(!controller.is_connected());
        assert_eq!(fired.get(), 0);
    }
}
