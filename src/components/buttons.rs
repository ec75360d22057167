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

//! The MENU and SELECT push buttons.

use anyhow::Result;
use tracing::debug;

use crate::{
    components::Component,
    events::{HandlerMap, Subscriber},
    hardware::DigitalInput,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Button {
    Menu,
    Select,
}

struct ButtonInput {
    button: Button,
    input: Box<dyn DigitalInput>,
    pressed: bool,
}

pub(crate) struct Buttons {
    inputs: Vec<ButtonInput>,
    handlers: HandlerMap<Button, ()>,
}

impl Buttons {
    pub(crate) fn new(menu: Box<dyn DigitalInput>, select: Box<dyn DigitalInput>) -> Self {
        let input = |button, input| ButtonInput {
            button,
            input,
            pressed: false,
        };

        Self {
            inputs: vec![input(Button::Menu, menu), input(Button::Select, select)],
            handlers: HandlerMap::new([Button::Menu, Button::Select]),
        }
    }

    pub(crate) fn on(&self, button: Button, subscriber: Subscriber<()>) -> Result<()> {
        Ok(self.handlers.add(button, subscriber)?)
    }
}

impl Component for Buttons {
    /// Fires a button's channel once per press, on the transition from
    /// released to pressed.
    fn poll(&mut self) -> Result<()> {
        for input in self.inputs.iter_mut() {
            let pressed = input.input.is_high()?;
            let edge = pressed && !input.pressed;
            input.pressed = pressed;

            if edge {
                debug!(button = ?input.button, "button pressed");
                self.handlers.fire(input.button, &());
            }
        }

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        for input in self.inputs.iter_mut() {
            input.input.release()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::testing::FakeInput;

    fn counter(count: &Rc<Cell<u32>>) -> Subscriber<()> {
        let count = Rc::clone(count);
        Rc::new(move |_: &()| {
            count.set(count.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn fires_once_per_press() {
        let (menu_input, menu_level) = FakeInput::new();
        let (select_input, _) = FakeInput::new();
        let mut buttons = Buttons::new(Box::new(menu_input), Box::new(select_input));
        let presses = Rc::new(Cell::new(0));
        buttons.on(Button::Menu, counter(&presses)).unwrap();

        menu_level.set(true);
        buttons.poll().unwrap();
        buttons.poll().unwrap();
        assert_eq!(presses.get(), 1);

        menu_level.set(false);
        buttons.poll().unwrap();
        menu_level.set(true);
        buttons.poll().unwrap();
        assert_eq!(presses.get(), 2);
    }

    #[test]
    fn buttons_are_independent() {
        let (menu_input, _) = FakeInput::new();
        let (select_input, select_level) = FakeInput::new();
        let mut buttons = Buttons::new(Box::new(menu_input), Box::new(select_input));
        let menu_presses = Rc::new(Cell::new(0));
        let select_presses = Rc::new(Cell::new(0));
        buttons.on(Button::Menu, counter(&menu_presses)).unwrap();
        buttons.on(Button::Select, counter(&select_presses)).unwrap();

        select_level.set(true);
        buttons.poll().unwrap();

        assert_eq!((menu_presses.get(), select_presses.get()), (0, 1));
    }

    #[test]
    fn cleanup_releases_inputs() {
        let (menu_input, _) = FakeInput::new();
        let (select_input, _) = FakeInput::new();
        let menu_released = menu_input.released_flag();
        let mut buttons = Buttons::new(Box::new(menu_input), Box::new(select_input));

        buttons.cleanup().unwrap();
        assert!(menu_released.get());
    }
}
