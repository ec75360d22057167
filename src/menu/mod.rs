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

//! Hierarchical on-device menu.
//!
//! # Architecture
//!
//! All menu lists are stored in a single arena owned by the menu and are
//! addressed with a [`ListId`]. Folders are items that refer to another list;
//! every folder is seeded with a "Back" item that refers to its parent, so
//! moving up the tree is an ordinary selection rather than a separate
//! operation.
//!
//! The menu itself is a cheap, cloneable handle. Components capture clones in
//! their actions (buttons call [`Menu::next`], the remote surface reads
//! [`Menu::current_text`] and so on) while the orchestrator keeps the original.
//!
//! Navigation state is the pair (current list, index). The index is kept in
//! range at all times and is reset to zero whenever the current list changes.

use std::{cell::RefCell, rc::Rc};

use anyhow::Result;
use tracing::debug;

use crate::{components::speech::Speaker, display::SharedDisplay, util::format::fit};

/// A zero-argument callable bound to a menu leaf.
pub(crate) type Action = Rc<dyn Fn() -> Result<()>>;

/// Handle on one list in the menu arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ListId(usize);

impl ListId {
    pub(crate) const ROOT: ListId = ListId(0);
}

struct MenuItem {
    name: String,
    action: Option<Action>,
    child: Option<ListId>,
}

struct MenuState {
    lists: Vec<Vec<MenuItem>>,
    current: ListId,
    index: usize,
}

impl MenuState {
    fn current_list(&self) -> &[MenuItem] {
        &self.lists[self.current.0]
    }

    fn current_item(&self) -> Option<&MenuItem> {
        self.current_list().get(self.index)
    }
}

/// What a selection resolved to, decided while the state is borrowed and
/// acted upon after the borrow is released.
enum Selection {
    Descended,
    Invoke(Action),
    Nothing,
}

#[derive(Clone)]
pub(crate) struct Menu {
    state: Rc<RefCell<MenuState>>,
    display: SharedDisplay,
    speaker: Rc<RefCell<Option<Rc<dyn Speaker>>>>,
}

impl Menu {
    pub(crate) fn new(display: SharedDisplay) -> Self {
        Self {
            state: Rc::new(RefCell::new(MenuState {
                lists: vec![Vec::new()],
                current: ListId::ROOT,
                index: 0,
            })),
            display,
            speaker: Rc::new(RefCell::new(None)),
        }
    }

    /// Attaches a speech collaborator, after which every announcement is
    /// also spoken.
    pub(crate) fn set_speaker(&self, speaker: Rc<dyn Speaker>) {
        *self.speaker.borrow_mut() = Some(speaker);
    }

    /// Creates a folder named `name` in `parent` (the root list when `None`)
    /// and returns the new list so it can be populated.
    pub(crate) fn add_folder(&self, name: &str, parent: Option<ListId>) -> ListId {
        let parent = parent.unwrap_or(ListId::ROOT);
        let mut state = self.state.borrow_mut();

        let id = ListId(state.lists.len());
        state.lists.push(vec![MenuItem {
            name: "Back".to_string(),
            action: None,
            child: Some(parent),
        }]);

        state.lists[parent.0].push(MenuItem {
            name: format!("{}/", name),
            action: None,
            child: Some(id),
        });

        id
    }

    /// Appends a leaf to `parent` (the root list when `None`).
    pub(crate) fn add_function(&self, name: &str, action: Action, parent: Option<ListId>) {
        let parent = parent.unwrap_or(ListId::ROOT);
        self.state.borrow_mut().lists[parent.0].push(MenuItem {
            name: name.to_string(),
            action: Some(action),
            child: None,
        });
    }

    /// Moves to the next item, wrapping to the first. The display is fully
    /// reset on wrap before the item is announced.
    pub(crate) fn next(&self) -> Result<()> {
        let wrapped = {
            let mut state = self.state.borrow_mut();
            let len = state.current_list().len();
            if len == 0 {
                return Ok(());
            }
            state.index = (state.index + 1) % len;
            state.index == 0
        };

        self.moved(wrapped)
    }

    /// Moves to the previous item, wrapping to the last.
    pub(crate) fn prev(&self) -> Result<()> {
        let wrapped = {
            let mut state = self.state.borrow_mut();
            let len = state.current_list().len();
            if len == 0 {
                return Ok(());
            }
            let wrapped = state.index == 0;
            state.index = if wrapped { len - 1 } else { state.index - 1 };
            wrapped
        };

        self.moved(wrapped)
    }

    /// Descends into the current item's folder, or otherwise invokes its
    /// action. Never does both.
    ///
    /// # Errors
    ///
    /// Returns the error of the invoked action, or a display/speech failure
    /// while announcing.
    pub(crate) fn select(&self) -> Result<()> {
        let selection = {
            let mut state = self.state.borrow_mut();
            let (child, action) = match state.current_item() {
                Some(item) => (item.child, item.action.clone()),
                None => return Ok(()),
            };

            match (child, action) {
                (Some(child), _) => {
                    state.current = child;
                    state.index = 0;
                    Selection::Descended
                }
                (None, Some(action)) => Selection::Invoke(action),
                (None, None) => Selection::Nothing,
            }
        };

        match selection {
            Selection::Descended => self.announce(),
            Selection::Invoke(action) => action(),
            Selection::Nothing => Ok(()),
        }
    }

    /// The current item's name, or an empty string when the current list has
    /// no items.
    pub(crate) fn current_text(&self) -> String {
        self.state
            .borrow()
            .current_item()
            .map(|item| item.name.clone())
            .unwrap_or_default()
    }

    fn moved(&self, wrapped: bool) -> Result<()> {
        if wrapped {
            self.display.borrow_mut().reset()?;
        }
        self.announce()
    }

    fn announce(&self) -> Result<()> {
        let text = self.current_text();
        debug!(item = %text, "menu");

        {
            let mut display = self.display.borrow_mut();
            let width = display.width();
            display.show_at(0, 0, &fit(&text, width))?;
        }

        let speaker = self.speaker.borrow().clone();
        if let Some(speaker) = speaker {
            speaker.speak(&text)?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> (ListId, usize) {
        let state = self.state.borrow();
        (state.current, state.index)
    }

    #[cfg(test)]
    pub(crate) fn item_names(&self, list: ListId) -> Vec<String> {
        self.state.borrow().lists[list.0]
            .iter()
            .map(|item| item.name.clone())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn child_of(&self, list: ListId, index: usize) -> Option<ListId> {
        self.state.borrow().lists[list.0].get(index).and_then(|item| item.child)
    }

    /// Finds a leaf by its full path of names from the root, e.g.
    /// `["Program/", "Run Program"]`, and invokes its action.
    #[cfg(test)]
    pub(crate) fn invoke(&self, path: &[&str]) -> Result<()> {
        let action = {
            let state = self.state.borrow();
            let mut list = ListId::ROOT;
            let mut found = None;
            for (depth, name) in path.iter().enumerate() {
                let item = state.lists[list.0]
                    .iter()
                    .find(|item| item.name == *name)
                    .ok_or_else(|| anyhow::anyhow!("no menu item '{}'", name))?;
                if depth + 1 == path.len() {
                    found = item.action.clone();
                } else if let Some(child) = item.child {
                    list = child;
                }
            }
            found.ok_or_else(|| anyhow::anyhow!("'{}' has no action", path.join("")))?
        };

        action()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::testing::{RecordingDisplay, RecordingSpeaker};

    fn counter(count: &Rc<Cell<u32>>) -> Action {
        let count = Rc::clone(count);
        Rc::new(move || {
            count.set(count.get() + 1);
            Ok(())
        })
    }

    fn noop() -> Action {
        Rc::new(|| Ok(()))
    }

    #[test]
    fn add_folder_seeds_back_item_and_links_parent() {
        let (display, _) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);

        let folder = menu.add_folder("X", None);

        assert_eq!(menu.item_names(folder), vec!["Back"]);
        assert_eq!(menu.child_of(folder, 0), Some(ListId::ROOT));
        assert_eq!(menu.item_names(ListId::ROOT), vec!["X/"]);
        assert_eq!(menu.child_of(ListId::ROOT, 0), Some(folder));

        let nested = menu.add_folder("Y", Some(folder));
        assert_eq!(menu.item_names(folder), vec!["Back", "Y/"]);
        assert_eq!(menu.child_of(nested, 0), Some(folder));
    }

    #[test]
    fn next_cycles_and_resets_once_on_wrap() {
        let (display, record) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        for name in ["A", "B", "C", "D"] {
            menu.add_function(name, noop(), None);
        }

        for _ in 0..4 {
            menu.next().unwrap();
        }

        assert_eq!(menu.position(), (ListId::ROOT, 0));
        assert_eq!(record.borrow().resets, 1);
    }

    #[test]
    fn prev_wraps_to_last_item() {
        let (display, record) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        for name in ["A", "B", "C"] {
            menu.add_function(name, noop(), None);
        }

        menu.prev().unwrap();
        assert_eq!(menu.position(), (ListId::ROOT, 2));
        assert_eq!(menu.current_text(), "C");
        assert_eq!(record.borrow().resets, 1);

        menu.prev().unwrap();
        assert_eq!(menu.current_text(), "B");
        assert_eq!(record.borrow().resets, 1);
    }

    #[test]
    fn announce_pads_name_to_width_at_origin() {
        let (display, record) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        menu.add_function("A", noop(), None);
        menu.add_function("Toggle Echo", noop(), None);

        menu.next().unwrap();

        let last = record.borrow().writes.last().cloned().unwrap();
        assert_eq!(last, (0, 0, "Toggle Echo     ".to_string()));
    }

    #[test]
    fn select_on_folder_descends_without_invoking() {
        let (display, _) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        let fired = Rc::new(Cell::new(0));
        let folder = menu.add_folder("Program", None);
        menu.add_function("Run", counter(&fired), Some(folder));

        menu.select().unwrap();

        assert_eq!(menu.position(), (folder, 0));
        assert_eq!(menu.current_text(), "Back");
        assert_eq!(fired.get(), 0);

        // "Back" goes up again
        menu.select().unwrap();
        assert_eq!(menu.position(), (ListId::ROOT, 0));
    }

    #[test]
    fn select_on_leaf_invokes_without_moving() {
        let (display, _) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        let fired = Rc::new(Cell::new(0));
        menu.add_function("Exit", noop(), None);
        menu.add_function("Go", counter(&fired), None);
        menu.next().unwrap();

        menu.select().unwrap();

        assert_eq!(fired.get(), 1);
        assert_eq!(menu.position(), (ListId::ROOT, 1));
    }

    #[test]
    fn select_propagates_action_errors() {
        let (display, _) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        menu.add_function("Broken", Rc::new(|| anyhow::bail!("nope")), None);

        assert!(menu.select().is_err());
    }

    #[test]
    fn action_may_use_the_menu() {
        let (display, _) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        let handle = menu.clone();
        menu.add_function("Skip", Rc::new(move || handle.next()), None);
        menu.add_function("Other", noop(), None);

        menu.select().unwrap();
        assert_eq!(menu.current_text(), "Other");
    }

    #[test]
    fn empty_menu_navigation_is_a_noop() {
        let (display, record) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);

        menu.next().unwrap();
        menu.prev().unwrap();
        menu.select().unwrap();

        assert_eq!(menu.current_text(), "");
        assert!(record.borrow().writes.is_empty());
        assert_eq!(record.borrow().resets, 0);
    }

    #[test]
    fn attached_speaker_narrates_announcements() {
        let (display, _) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        let speaker = RecordingSpeaker::new();
        menu.add_function("A", noop(), None);
        menu.add_function("B", noop(), None);

        menu.next().unwrap();
        menu.set_speaker(speaker.clone());
        menu.next().unwrap();

        assert_eq!(speaker.spoken(), vec!["A"]);
    }
}
