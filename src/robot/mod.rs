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

//! The orchestrator.
//!
//! # Architecture
//!
//! [`Robot`] owns every component, the menu and the program. The robot follows
//! a strict startup-run-shutdown pattern:
//!
//! * **Startup** creates the components in a fixed order, asking the
//!   [`Devices`] factory for each piece of hardware. Later components are wired
//!   to earlier ones by subscribing actions to their event handlers, which is
//!   why the keyboard comes last. An optional device that is not available is
//!   logged and skipped, along with its wiring.
//! * **Run** either executes a script once, or polls every component each tick
//!   until the exit flag is cleared.
//! * **Shutdown** cleans up every component exactly once, in registration
//!   order. A component that fails to clean up does not prevent the others
//!   from doing so.

use std::{
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    components::{
        Component, Registered,
        audio::Audio,
        buttons::{Button, Buttons},
        camera::Camera,
        controller::{Controller, PadButton},
        echo::Echo,
        keyboard::{Key, Keyboard},
        remote::Remote,
        speech::{Speaker, Speech},
        wheels::{Motion, Wheels},
    },
    config::AppConfig,
    display::{DisplayComponent, SharedDisplay},
    events::Subscriber,
    hardware::Devices,
    menu::{Action, Menu},
    program::Program,
    util::{format::fit, host},
};

const BANNER: &str = "PiBot...";

/// Cloneable handle on the poll loop's active flag.
#[derive(Clone, Debug)]
pub(crate) struct ExitHandle(Arc<AtomicBool>);

impl Default for ExitHandle {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl ExitHandle {
    /// Asks the poll loop to finish after the current tick.
    pub(crate) fn exit(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The functions behind the `System` menu folder.
#[derive(Clone)]
struct SystemActions {
    display: SharedDisplay,
    active: ExitHandle,
    speaker: Option<Rc<dyn Speaker>>,
    halt_command: String,
}

impl SystemActions {
    fn exit(&self) -> Result<()> {
        let shown = self.display.borrow_mut().show(&format!("{}\nExiting...", BANNER));
        self.active.exit();
        shown
    }

    fn shutdown_host(&self) -> Result<()> {
        warn!("shutting down host");
        self.display.borrow_mut().show("Host Shutdown")?;
        if let Some(speaker) = &self.speaker {
            speaker.speak("Shutting down")?;
        }
        host::halt(&self.halt_command)
    }

    fn show_ip(&self) -> Result<()> {
        show_ip(&self.display)
    }
}

fn show_ip(display: &SharedDisplay) -> Result<()> {
    let address = host::primary_ip().unwrap_or_else(|| "No network".to_string());
    let mut display = display.borrow_mut();
    let width = display.width();
    display.show_at(1, 0, &fit(&address, width))
}

/// Adapts an action to an event handler subscriber.
fn on_event(action: Action) -> Subscriber<()> {
    Rc::new(move |_: &()| action())
}

pub(crate) struct Robot {
    config: AppConfig,
    display: SharedDisplay,
    menu: Menu,
    wheels: Wheels,
    program: Program,
    camera: Option<Camera>,
    speaker: Option<Rc<dyn Speaker>>,
    components: Vec<Registered>,
    active: ExitHandle,
}

impl Robot {
    /// Creates and wires every available component.
    ///
    /// # Errors
    ///
    /// Fails only if the display or the motors cannot be opened. Every other
    /// device is optional.
    pub(crate) fn startup(config: AppConfig, devices: &dyn Devices) -> Result<Self> {
        let display = devices.display().context("Failed to open display")?;
        display.borrow_mut().show(BANNER)?;
        show_ip(&display)?;

        let menu = Menu::new(Rc::clone(&display));
        let wheels = Wheels::new(devices.motors().context("Failed to acquire motors")?, config.steering);
        let program = Program::new(Rc::clone(&display), config.dwell());

        let mut robot = Self {
            config,
            display: Rc::clone(&display),
            menu,
            wheels,
            program,
            camera: None,
            speaker: None,
            components: Vec::new(),
            active: ExitHandle::default(),
        };

        robot.register("Display", Box::new(DisplayComponent(display)))?;
        robot.register("Wheels", Box::new(robot.wheels.clone()))?;
        robot.create_program()?;
        robot.create_buttons(devices)?;
        robot.create_camera(devices)?;
        robot.create_controller(devices)?;
        robot.create_echo(devices)?;
        robot.create_speech(devices)?;
        robot.create_audio(devices)?;
        robot.create_remote()?;
        robot.create_keyboard(devices)?;
        robot.update_menu();

        robot.show_at_status("Init complete")?;
        info!(components = robot.components.len(), "init complete");

        Ok(robot)
    }

    /// Adds a component to the poll loop.
    pub(crate) fn register(&mut self, name: &'static str, component: Box<dyn Component>) -> Result<()> {
        self.components.push(Registered { name, component });
        debug!(component = name, "created");
        self.show_at_status(&format!("Created {}", name))
    }

    pub(crate) fn exit_handle(&self) -> ExitHandle {
        self.active.clone()
    }

    /// Clears the active flag, ending the poll loop after the current tick.
    pub(crate) fn exit(&self) -> Result<()> {
        self.system().exit()
    }

    /// Runs `script` once, or polls the components until exit if there is no
    /// script.
    pub(crate) fn run(&mut self, script: Option<&str>) -> Result<()> {
        match script {
            Some(script) => {
                self.show(&format!("{}\nRunning...", BANNER))?;
                self.program.set_script(script);
                self.program.show()?;
                let steps = self.program.run();
                info!(steps, "script finished");
            }
            None => {
                self.show(&format!("{}\nListening...", BANNER))?;
                info!("listening");
                while self.tick() {
                    thread::sleep(self.config.poll_interval());
                }
            }
        }

        Ok(())
    }

    /// Polls every component once and reports whether the loop should
    /// continue.
    pub(crate) fn tick(&mut self) -> bool {
        for Registered { name, component } in self.components.iter_mut() {
            if let Err(e) = component.poll() {
                warn!(component = *name, error = %format!("{:#}", e), "poll failed");
            }
        }

        self.active.is_active()
    }

    /// Cleans up every component in registration order, returning how many
    /// failed to clean up.
    pub(crate) fn shutdown(&mut self) -> usize {
        let mut failed = 0;

        for Registered { name, mut component } in self.components.drain(..) {
            match component.cleanup() {
                Ok(()) => debug!(component = name, "cleaned up"),
                Err(e) => {
                    warn!(component = name, error = %format!("{:#}", e), "cleanup failed");
                    failed += 1;
                }
            }
        }

        info!(failed, "shutdown complete");
        failed
    }

    fn create_program(&mut self) -> Result<()> {
        let stop = Some(self.wheels.action(Motion::Stop));
        for (shortcut, name, motion) in [
            ('^', "Forward", Motion::Forwards),
            ('v', "Backward", Motion::Backwards),
            ('<', "Left", Motion::Left),
            ('>', "Right", Motion::Right),
            ('{', "Slow Left", Motion::SlowLeft),
            ('}', "Slow Right", Motion::SlowRight),
        ] {
            self.program
                .add_command(shortcut, name, self.wheels.action(motion), stop.clone());
        }

        self.register("Program", Box::new(self.program.clone()))
    }

    fn create_buttons(&mut self, devices: &dyn Devices) -> Result<()> {
        let Some((menu_input, select_input)) = available("buttons", devices.buttons()) else {
            return Ok(());
        };

        let buttons = Buttons::new(menu_input, select_input);
        buttons.on(Button::Menu, on_event(self.menu_action(Menu::next)))?;
        buttons.on(Button::Select, on_event(self.menu_action(Menu::select)))?;

        self.register("Buttons", Box::new(buttons))
    }

    fn create_camera(&mut self, devices: &dyn Devices) -> Result<()> {
        let Some(shutter) = available("camera", devices.camera()) else {
            return Ok(());
        };

        let camera = Camera::new(shutter);
        self.program.add_command('#', "Photo", camera.photo_action(), None);
        self.camera = Some(camera.clone());

        self.register("Camera", Box::new(camera))
    }

    fn create_controller(&mut self, devices: &dyn Devices) -> Result<()> {
        let Some(pad) = available("controller", devices.gamepad()) else {
            return Ok(());
        };

        let controller = Controller::new(pad, Rc::clone(&self.display), self.config.controller.buttons.clone());
        for (button, motion) in [
            (PadButton::Up, Motion::Forwards),
            (PadButton::Down, Motion::Backwards),
            (PadButton::Left, Motion::Left),
            (PadButton::Right, Motion::Right),
            (PadButton::A, Motion::Stop),
        ] {
            controller.on(button, on_event(self.wheels.action(motion)))?;
        }
        if let Some(camera) = &self.camera {
            controller.on(PadButton::B, on_event(camera.photo_action()))?;
        }
        controller.on(PadButton::Home, on_event(self.menu_action(Menu::select)))?;
        controller.on(PadButton::Minus, on_event(self.menu_action(Menu::prev)))?;
        controller.on(PadButton::Plus, on_event(self.menu_action(Menu::next)))?;
        controller.set_stop(self.wheels.action(Motion::Stop));

        self.register("Controller", Box::new(controller))
    }

    fn create_echo(&mut self, devices: &dyn Devices) -> Result<()> {
        let Some(finder) = available("echo", devices.range_finder()) else {
            return Ok(());
        };

        let echo = Echo::new(finder, Rc::clone(&self.display), &self.config.echo);
        echo.too_close().add(on_event(self.wheels.action(Motion::Stop)));

        self.register("Echo", Box::new(echo))
    }

    fn create_speech(&mut self, devices: &dyn Devices) -> Result<()> {
        let Some(speaker) = available("speech", devices.speaker()) else {
            return Ok(());
        };

        let speech = Speech::new(Rc::clone(&speaker));
        if let Err(e) = speech.greet() {
            warn!(error = %format!("{:#}", e), "greeting failed");
        }

        let narrator = Rc::clone(&speaker);
        self.wheels
            .state_changed()
            .subscribe(move |text: &str| narrator.speak(text));
        self.speaker = Some(speaker);

        self.register("Speech", Box::new(speech))
    }

    fn create_audio(&mut self, devices: &dyn Devices) -> Result<()> {
        let Some(player) = available("audio", devices.audio()) else {
            return Ok(());
        };

        let audio = Audio::new(player, self.config.audio.directory.clone());
        self.register("Audio", Box::new(audio))
    }

    fn create_remote(&mut self) -> Result<()> {
        if !self.config.remote.enabled {
            return Ok(());
        }

        let started = Remote::start(&self.config.remote, self.program.stop_handle());
        let Some(mut remote) = available("remote", started.map_err(anyhow::Error::from)) else {
            return Ok(());
        };

        self.add_remote_commands(&mut remote);
        info!(commands = ?remote.commands(), "remote commands registered");

        self.register("Remote", Box::new(remote))
    }

    fn add_remote_commands(&self, remote: &mut Remote) {
        for (name, motion) in [
            ("forwards", Motion::Forwards),
            ("backwards", Motion::Backwards),
            ("left", Motion::Left),
            ("right", Motion::Right),
            ("slow_left", Motion::SlowLeft),
            ("slow_right", Motion::SlowRight),
            ("stop", Motion::Stop),
        ] {
            remote.register_action(name, self.wheels.action(motion), motion.narration());
        }

        let navigation: [(&str, fn(&Menu) -> Result<()>); 3] = [
            ("menu/next", Menu::next),
            ("menu/prev", Menu::prev),
            ("menu/select", Menu::select),
        ];
        for (name, navigate) in navigation {
            let menu = self.menu.clone();
            remote.register(
                name,
                Rc::new(move || {
                    navigate(&menu)?;
                    Ok(menu.current_text())
                }),
            );
        }

        let menu = self.menu.clone();
        remote.register("menu/text", Rc::new(move || Ok(menu.current_text())));

        let program = self.program.clone();
        remote.register("program/view", Rc::new(move || Ok(program.view())));

        let program = self.program.clone();
        remote.register(
            "program/run",
            Rc::new(move || Ok(format!("Ran {} steps", program.run()))),
        );

        let program = self.program.clone();
        remote.register(
            "program/clear",
            Rc::new(move || {
                program.clear();
                Ok("Cleared".to_string())
            }),
        );

        if let Some(camera) = &self.camera {
            remote.register_action("photo", camera.photo_action(), "Photo taken");
        }
    }

    fn create_keyboard(&mut self, devices: &dyn Devices) -> Result<()> {
        let keyboard = Keyboard::new(devices.keys());

        for (key, motion) in [
            (Key::Up, Motion::Forwards),
            (Key::Down, Motion::Backwards),
            (Key::Left, Motion::Left),
            (Key::Right, Motion::Right),
            (Key::Stop, Motion::Stop),
            (Key::SlowLeft, Motion::SlowLeft),
            (Key::SlowRight, Motion::SlowRight),
        ] {
            keyboard.on(key, on_event(self.wheels.action(motion)))?;
        }

        keyboard.on(Key::Shutdown, on_event(self.system_action(SystemActions::shutdown_host)))?;
        keyboard.on(Key::PageDown, on_event(self.menu_action(Menu::next)))?;
        keyboard.on(Key::PageUp, on_event(self.menu_action(Menu::prev)))?;
        keyboard.on(Key::Return, on_event(self.menu_action(Menu::select)))?;
        keyboard.on(Key::Esc, on_event(self.system_action(SystemActions::exit)))?;
        keyboard.on(Key::Interrupt, on_event(self.system_action(SystemActions::exit)))?;
        if let Some(camera) = &self.camera {
            keyboard.on(Key::Photo, on_event(camera.photo_action()))?;
        }

        self.register("Keyboard", Box::new(keyboard))
    }

    /// Lets every component contribute its entries, then adds the `System`
    /// folder and attaches the speaker for narration.
    fn update_menu(&mut self) {
        for Registered { component, .. } in self.components.iter_mut() {
            component.contribute_menu(&self.menu);
        }

        let folder = Some(self.menu.add_folder("System", None));
        self.menu
            .add_function("Exit", self.system_action(SystemActions::exit), folder);
        self.menu.add_function(
            "Shutdown Host",
            self.system_action(SystemActions::shutdown_host),
            folder,
        );
        self.menu
            .add_function("IP Address", self.system_action(SystemActions::show_ip), folder);

        if let Some(speaker) = &self.speaker {
            self.menu.set_speaker(Rc::clone(speaker));
        }
    }

    fn system(&self) -> SystemActions {
        SystemActions {
            display: Rc::clone(&self.display),
            active: self.active.clone(),
            speaker: self.speaker.clone(),
            halt_command: self.config.halt_command.clone(),
        }
    }

    fn system_action(&self, f: fn(&SystemActions) -> Result<()>) -> Action {
        let system = self.system();
        Rc::new(move || f(&system))
    }

    fn menu_action(&self, f: fn(&Menu) -> Result<()>) -> Action {
        let menu = self.menu.clone();
        Rc::new(move || f(&menu))
    }

    fn show(&self, text: &str) -> Result<()> {
        self.display.borrow_mut().show(text)
    }

    fn show_at_status(&self, text: &str) -> Result<()> {
        let mut display = self.display.borrow_mut();
        let width = display.width();
        display.show_at(1, 0, &fit(text, width))
    }

    #[cfg(test)]
    fn component_names(&self) -> Vec<&'static str> {
        self.components.iter().map(|r| r.name).collect()
    }
}

/// Unwraps an optional device, logging why it is being skipped.
fn available<T>(device: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            info!(device, reason = %format!("{:#}", e), "not available, skipping");
            None
        }
    }
}
