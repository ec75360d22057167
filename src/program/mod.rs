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

//! Scripted moves.
//!
//! A program is a sequence of single character instructions, each of which
//! names a registered [`Command`]. Running the program executes each command's
//! start action, waits for the dwell interval, then executes the command's
//! finish action (typically "stop").
//!
//! # Cancellation
//!
//! [`Program::stop`] clears an atomic flag that is checked before each step
//! starts. A step that has already started always completes, so the robot is
//! never left moving. The flag is exposed through a [`StopHandle`] so it can be
//! cleared from another thread, for example by the remote command listener.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    components::Component,
    display::SharedDisplay,
    error::BotError,
    menu::{Action, Menu},
    util::format::fit,
};

pub(crate) struct Command {
    shortcut: char,
    name: String,
    start: Action,
    finish: Option<Action>,
}

/// Cloneable, thread-safe handle on a program's active flag.
#[derive(Clone, Default, Debug)]
pub(crate) struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub(crate) fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn activate(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ProgramState {
    commands: Vec<Command>,
    instructions: Vec<char>,
}

impl ProgramState {
    fn command(&self, shortcut: char) -> Option<&Command> {
        self.commands.iter().find(|c| c.shortcut == shortcut)
    }
}

#[derive(Clone)]
pub(crate) struct Program {
    state: Rc<RefCell<ProgramState>>,
    active: StopHandle,
    display: SharedDisplay,
    dwell: Duration,
}

impl Program {
    pub(crate) fn new(display: SharedDisplay, dwell: Duration) -> Self {
        Self {
            state: Rc::new(RefCell::new(ProgramState::default())),
            active: StopHandle::default(),
            display,
            dwell,
        }
    }

    /// Registers a command, replacing any existing command with the same
    /// shortcut.
    pub(crate) fn add_command(&self, shortcut: char, name: &str, start: Action, finish: Option<Action>) {
        let command = Command {
            shortcut,
            name: name.to_string(),
            start,
            finish,
        };

        let mut state = self.state.borrow_mut();
        match state.commands.iter_mut().find(|c| c.shortcut == shortcut) {
            Some(existing) => *existing = command,
            None => state.commands.push(command),
        }
    }

    /// Adds each character of `script` as an instruction.
    pub(crate) fn set_script(&self, script: &str) {
        for instruction in script.chars() {
            self.add_instruction(instruction);
        }
    }

    /// Appends `instruction` if a command is registered for it. Unknown
    /// instructions are silently dropped.
    pub(crate) fn add_instruction(&self, instruction: char) {
        let mut state = self.state.borrow_mut();
        if state.command(instruction).is_some() {
            state.instructions.push(instruction);
        }
    }

    /// Removes the instruction at `index`, or the last instruction when
    /// `None`, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::NoSuchStep`] if there is no instruction at the
    /// requested position.
    pub(crate) fn delete_instruction(&self, index: Option<usize>) -> Result<char, BotError> {
        let mut state = self.state.borrow_mut();
        let len = state.instructions.len();
        let index = match index {
            Some(index) if index < len => index,
            Some(index) => return Err(BotError::NoSuchStep(index)),
            None => len.checked_sub(1).ok_or(BotError::NoSuchStep(0))?,
        };

        Ok(state.instructions.remove(index))
    }

    pub(crate) fn clear(&self) {
        self.state.borrow_mut().instructions.clear();
    }

    pub(crate) fn stop(&self) {
        self.active.stop();
    }

    pub(crate) fn stop_handle(&self) -> StopHandle {
        self.active.clone()
    }

    /// Executes the instructions in order, returning the number of steps that
    /// were started.
    ///
    /// Blocks for the duration of the program. A failing action is logged and
    /// the remainder of its step still runs.
    pub(crate) fn run(&self) -> usize {
        self.active.activate();

        // Take a snapshot so actions are free to edit the program
        let steps: Vec<(char, Action, Option<Action>)> = {
            let state = self.state.borrow();
            state
                .instructions
                .iter()
                .filter_map(|&i| {
                    state
                        .command(i)
                        .map(|c| (i, Rc::clone(&c.start), c.finish.clone()))
                })
                .collect()
        };

        info!(steps = steps.len(), "running program");

        let mut started = 0;
        for (instruction, start, finish) in steps {
            if !self.active.is_active() {
                info!(started, "program stopped");
                break;
            }

            started += 1;

            if let Err(e) = start() {
                warn!(%instruction, error = %e, "program step failed to start");
            }

            thread::sleep(self.dwell);

            if let Some(finish) = finish
                && let Err(e) = finish()
            {
                warn!(%instruction, error = %e, "program step failed to finish");
            }
        }

        started
    }

    /// The instructions in compact form, see [`compact`].
    pub(crate) fn view(&self) -> String {
        compact(&self.state.borrow().instructions)
    }

    /// Writes the compact view to the second display row.
    pub(crate) fn show(&self) -> Result<()> {
        let text = self.view();
        let mut display = self.display.borrow_mut();
        let width = display.width();
        display.show_at(1, 0, &fit(&text, width))
    }

    #[cfg(test)]
    pub(crate) fn instructions(&self) -> String {
        self.state.borrow().instructions.iter().collect()
    }

    fn action(&self, f: impl Fn(&Program) -> Result<()> + 'static) -> Action {
        let program = self.clone();
        Rc::new(move || f(&program))
    }
}

impl Component for Program {
    fn cleanup(&mut self) -> Result<()> {
        self.stop();
        Ok(())
    }

    fn contribute_menu(&mut self, menu: &Menu) {
        let folder = Some(menu.add_folder("Program", None));

        menu.add_function("View Program", self.action(|p| p.show()), folder);

        let commands: Vec<(char, String)> = self
            .state
            .borrow()
            .commands
            .iter()
            .map(|c| (c.shortcut, c.name.clone()))
            .collect();

        for (shortcut, name) in commands {
            menu.add_function(
                &format!("Add {}", name),
                self.action(move |p| {
                    p.add_instruction(shortcut);
                    Ok(())
                }),
                folder,
            );
        }

        menu.add_function(
            "Delete Step",
            self.action(|p| {
                p.delete_instruction(None)?;
                Ok(())
            }),
            folder,
        );
        menu.add_function(
            "Run Program",
            self.action(|p| {
                p.run();
                Ok(())
            }),
            folder,
        );
        menu.add_function(
            "Stop Program",
            self.action(|p| {
                p.stop();
                Ok(())
            }),
            folder,
        );
        menu.add_function(
            "Clear Program",
            self.action(|p| {
                p.clear();
                Ok(())
            }),
            folder,
        );
    }
}

/// Run-length view of a sequence of instructions.
///
/// A run of more than one identical instruction is written as the instruction
/// followed by the run length, so `^^^<<v` becomes `^3<2v`. This is for
/// display only: instructions that are themselves digits make the result
/// ambiguous, and nothing parses it back.
pub(crate) fn compact(instructions: &[char]) -> String {
    let mut out = String::new();

    for run in instructions.chunk_by(|a, b| a == b) {
        out.push(run[0]);
        if run.len() > 1 {
            out.push_str(&run.len().to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::testing::RecordingDisplay;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logger(log: &Log, entry: &str) -> Action {
        let log = Rc::clone(log);
        let entry = entry.to_string();
        Rc::new(move || {
            log.borrow_mut().push(entry.clone());
            Ok(())
        })
    }

    fn program() -> (Program, Log) {
        let (display, _) = RecordingDisplay::shared(16);
        let program = Program::new(display, Duration::ZERO);
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        (program, log)
    }

    #[test]
    fn unknown_instructions_are_dropped() {
        let (program, log) = program();
        program.add_command('^', "Forward", logger(&log, "fwd"), None);
        program.add_command('<', "Left", logger(&log, "left"), None);

        program.set_script("^<#");
        assert_eq!(program.instructions(), "^<");
        assert_eq!(program.view(), "^<");

        program.add_instruction('x');
        assert_eq!(program.instructions().len(), 2);
    }

    #[test]
    fn compact_collapses_runs() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(compact(&chars("^^^<<vv")), "^3<2v2");
        assert_eq!(compact(&chars("^<^")), "^<^");
        assert_eq!(compact(&chars("")), "");
        assert_eq!(compact(&chars(">>>>>>>>>>>>")), ">12");
    }

    #[test]
    fn run_executes_start_then_finish_per_step() {
        let (program, log) = program();
        program.add_command('^', "Forward", logger(&log, "fwd"), Some(logger(&log, "stop")));
        program.add_command('#', "Photo", logger(&log, "photo"), None);
        program.set_script("^#^");

        assert_eq!(program.run(), 3);
        assert_eq!(*log.borrow(), vec!["fwd", "stop", "photo", "fwd", "stop"]);
    }

    #[test]
    fn stop_is_observed_between_steps() {
        let (program, log) = program();
        let handle = program.stop_handle();
        let inner = Rc::clone(&log);
        program.add_command(
            '^',
            "Forward",
            Rc::new(move || {
                inner.borrow_mut().push("fwd".to_string());
                handle.stop();
                Ok(())
            }),
            Some(logger(&log, "stop")),
        );
        program.set_script("^^^");

        assert_eq!(program.run(), 1);
        assert_eq!(*log.borrow(), vec!["fwd", "stop"]);
        assert!(!program.stop_handle().is_active());
    }

    #[test]
    fn failing_step_still_finishes_and_continues() {
        let (program, log) = program();
        program.add_command('!', "Broken", Rc::new(|| anyhow::bail!("motor fault")), Some(logger(&log, "stop")));
        program.add_command('^', "Forward", logger(&log, "fwd"), None);
        program.set_script("!^");

        assert_eq!(program.run(), 2);
        assert_eq!(*log.borrow(), vec!["stop", "fwd"]);
    }

    #[test]
    fn re_registering_a_shortcut_overwrites() {
        let (program, log) = program();
        program.add_command('^', "Forward", logger(&log, "old"), None);
        program.add_command('^', "Forward", logger(&log, "new"), None);
        program.set_script("^");

        program.run();
        assert_eq!(*log.borrow(), vec!["new"]);
    }

    #[test]
    fn delete_instruction_defaults_to_last() {
        let (program, log) = program();
        program.add_command('^', "Forward", logger(&log, "fwd"), None);
        program.add_command('v', "Backward", logger(&log, "back"), None);
        program.set_script("^v^");

        assert_eq!(program.delete_instruction(None).unwrap(), '^');
        assert_eq!(program.delete_instruction(Some(0)).unwrap(), '^');
        assert_eq!(program.instructions(), "v");

        assert!(matches!(program.delete_instruction(Some(3)), Err(BotError::NoSuchStep(3))));
        program.clear();
        assert!(matches!(program.delete_instruction(None), Err(BotError::NoSuchStep(0))));
    }

    #[test]
    fn show_writes_view_to_second_row() {
        let (display, record) = RecordingDisplay::shared(8);
        let program = Program::new(display, Duration::ZERO);
        program.add_command('>', "Right", Rc::new(|| Ok(())), None);
        program.set_script(">>>");

        program.show().unwrap();
        assert_eq!(record.borrow().writes, vec![(1, 0, ">3      ".to_string())]);
    }

    #[test]
    fn menu_folder_lists_commands_in_registration_order() {
        let (display, _) = RecordingDisplay::shared(16);
        let (mut program, log) = program();
        program.add_command('^', "Forward", logger(&log, "fwd"), None);
        program.add_command('<', "Left", logger(&log, "left"), None);
        let menu = Menu::new(display);

        program.contribute_menu(&menu);
        menu.invoke(&["Program/", "Add Left"]).unwrap();
        menu.invoke(&["Program/", "Add Left"]).unwrap();
        menu.invoke(&["Program/", "Add Forward"]).unwrap();

        assert_eq!(program.view(), "<2^");

        menu.invoke(&["Program/", "Run Program"]).unwrap();
        assert_eq!(*log.borrow(), vec!["left", "left", "fwd"]);

        menu.invoke(&["Program/", "Delete Step"]).unwrap();
        menu.invoke(&["Program/", "Clear Program"]).unwrap();
        assert_eq!(program.view(), "");
        assert!(menu.invoke(&["Program/", "Delete Step"]).is_err());
    }

    #[test]
    fn cleanup_stops_the_program() {
        let (mut program, _) = program();
        program.stop_handle().activate();
        program.cleanup().unwrap();
        assert!(!program.stop_handle().is_active());
    }
}
