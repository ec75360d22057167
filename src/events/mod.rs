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

//! Publish/subscribe channels used to wire components together.
//!
//! An [`EventHandler`] is a named channel holding an ordered list of
//! subscribers. Firing a channel invokes every subscriber synchronously, in
//! subscription order, on the caller's thread.
//!
//! # Failure isolation
//!
//! A subscriber that returns an error is logged and skipped over, the
//! remaining subscribers still run. [`EventHandler::fire`] reports how many
//! subscribers failed.
//!
//! # Keyed channels
//!
//! Input components (keyboard, buttons, game controller) own one channel per
//! input key. [`HandlerMap`] stores those channels against an opaque key type.

use std::{cell::RefCell, collections::HashMap, fmt::Debug, hash::Hash, rc::Rc};

use anyhow::Result;
use tracing::warn;

use crate::error::BotError;

/// A subscriber callable. Identity is the identity of the `Rc`.
pub(crate) type Subscriber<A> = Rc<dyn Fn(&A) -> Result<()>>;

pub(crate) struct EventHandler<A: ?Sized> {
    name: String,
    subscribers: RefCell<Vec<Subscriber<A>>>,
}

impl<A: ?Sized> EventHandler<A> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Appends a subscriber. The same subscriber may be added more than once.
    pub(crate) fn add(&self, subscriber: Subscriber<A>) {
        self.subscribers.borrow_mut().push(subscriber);
    }

    /// Wraps a closure as a [`Subscriber`], adds it, and returns the handle
    /// needed to remove it again.
    pub(crate) fn subscribe(&self, f: impl Fn(&A) -> Result<()> + 'static) -> Subscriber<A> {
        let subscriber: Subscriber<A> = Rc::new(f);
        self.add(Rc::clone(&subscriber));
        subscriber
    }

    /// Removes the first occurrence of `subscriber`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::NotSubscribed`] if the subscriber is not present.
    pub(crate) fn remove(&self, subscriber: &Subscriber<A>) -> Result<(), BotError> {
        let mut subscribers = self.subscribers.borrow_mut();
        let position = subscribers
            .iter()
            .position(|s| Rc::ptr_eq(s, subscriber))
            .ok_or_else(|| BotError::NotSubscribed(self.name.clone()))?;
        subscribers.remove(position);
        Ok(())
    }

    /// Invokes every current subscriber with `args`, returning the number of
    /// subscribers that failed.
    ///
    /// The subscriber list is snapshotted first, so a subscriber may add or
    /// remove subscribers on this channel without affecting the current fire.
    pub(crate) fn fire(&self, args: &A) -> usize {
        let subscribers = self.subscribers.borrow().clone();

        let mut failures = 0;
        for subscriber in subscribers {
            if let Err(e) = subscriber(args) {
                failures += 1;
                warn!(channel = %self.name, error = %e, "subscriber failed");
            }
        }

        failures
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

/// A fixed set of channels, one per input key.
pub(crate) struct HandlerMap<K, A: ?Sized> {
    channels: HashMap<K, EventHandler<A>>,
}

impl<K, A> HandlerMap<K, A>
where
    K: Copy + Debug + Eq + Hash,
    A: ?Sized,
{
    pub(crate) fn new(keys: impl IntoIterator<Item = K>) -> Self {
        let channels = keys
            .into_iter()
            .map(|key| (key, EventHandler::new(format!("{:?}", key))))
            .collect();

        Self { channels }
    }

    pub(crate) fn get(&self, key: K) -> Option<&EventHandler<A>> {
        self.channels.get(&key)
    }

    /// Subscribes to the channel for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::NotFound`] if the map has no channel for `key`.
    pub(crate) fn add(&self, key: K, subscriber: Subscriber<A>) -> Result<(), BotError> {
        let channel = self
            .get(key)
            .ok_or_else(|| BotError::NotFound(format!("{:?}", key)))?;
        channel.add(subscriber);
        Ok(())
    }

    /// Fires the channel for `key`, if there is one.
    pub(crate) fn fire(&self, key: K, args: &A) -> usize {
        self.get(key).map_or(0, |channel| channel.fire(args))
    }
}
