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

//! Remote control over HTTP.
//!
//! # Architecture
//!
//! The HTTP listener ([`server`]) runs on its own thread and never touches the
//! robot directly. It posts each command as a [`RemoteRequest`] onto a queue
//! which this component drains once per poll, looking the command up by name
//! and sending the handler's result back to the waiting HTTP request. All
//! robot state is therefore only ever touched from the poll loop.
//!
//! The listener only queues commands once the component has been polled. Until
//! then, and again after cleanup, callers are told the robot is not listening.

mod server;

use std::{
    collections::HashMap,
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, TryRecvError},
    },
};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::{components::Component, config::RemoteConfig, error::BotError, menu::Action, program::StopHandle};

pub(crate) use server::{RemoteRequest, RemoteServer};

/// Runs a remote command, returning the text sent back to the caller.
pub(crate) type Handler = Rc<dyn Fn() -> Result<String>>;

pub(crate) struct Remote {
    handlers: HashMap<String, Handler>,
    requests: Option<Receiver<RemoteRequest>>,
    polling: Arc<AtomicBool>,
    server: Option<RemoteServer>,
}

impl Remote {
    pub(crate) fn new(requests: Receiver<RemoteRequest>) -> Self {
        Self {
            handlers: HashMap::new(),
            requests: Some(requests),
            polling: Arc::default(),
            server: None,
        }
    }

    /// Starts the HTTP listener and returns the component that serves it.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Unavailable`] if the listener cannot be started.
    pub(crate) fn start(config: &RemoteConfig, program_stop: StopHandle) -> Result<Self, BotError> {
        let (request_tx, request_rx) = mpsc::channel();
        let mut remote = Self::new(request_rx);
        let polling = Arc::clone(&remote.polling);
        remote.server = Some(RemoteServer::start(config, request_tx, polling, program_stop)?);
        Ok(remote)
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub(crate) fn register(&mut self, name: &str, handler: Handler) {
        self.handlers.insert(name.to_string(), handler);
    }

    /// Registers an action that replies with `reply` when it succeeds.
    pub(crate) fn register_action(&mut self, name: &str, action: Action, reply: &'static str) {
        self.register(
            name,
            Rc::new(move || {
                action()?;
                Ok(reply.to_string())
            }),
        );
    }

    /// Runs the handler registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::NotFound`] for an unknown command, or
    /// [`BotError::Action`] if the handler fails.
    pub(crate) fn dispatch(&self, name: &str) -> Result<String, BotError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| BotError::NotFound(name.to_string()))?;

        handler().map_err(|e| BotError::Action(format!("{:#}", e)))
    }

    pub(crate) fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Component for Remote {
    fn poll(&mut self) -> Result<()> {
        let Some(requests) = self.requests.as_ref() else {
            return Ok(());
        };
        self.polling.store(true, Ordering::SeqCst);

        loop {
            let request = match requests.try_recv() {
                Ok(request) => request,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("remote listener has gone");
                    self.polling.store(false, Ordering::SeqCst);
                    self.requests = None;
                    break;
                }
            };

            let result = self.dispatch(&request.command);
            debug!(command = %request.command, ok = result.is_ok(), "remote command handled");

            // The caller may have given up waiting
            let _ = request.reply.send(result);
        }

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        // Dropping the queue answers any waiting callers before the listener
        // is shut down
        self.polling.store(false, Ordering::SeqCst);
        self.requests = None;
        if let Some(mut server) = self.server.take() {
            server.stop();
            info!("remote stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tokio::sync::oneshot;

    use super::*;

    fn remote() -> (Remote, mpsc::Sender<RemoteRequest>) {
        let (request_tx, request_rx) = mpsc::channel();
        (Remote::new(request_rx), request_tx)
    }

    #[test]
    fn dispatch_runs_named_handler() {
        let (mut remote, _) = remote();
        remote.register("menu/text", Rc::new(|| Ok("System/".to_string())));

        assert_eq!(remote.dispatch("menu/text").unwrap(), "System/");
        assert!(matches!(remote.dispatch("jump"), Err(BotError::NotFound(name)) if name == "jump"));
    }

    #[test]
    fn failing_handler_is_an_action_error() {
        let (mut remote, _) = remote();
        remote.register("photo", Rc::new(|| anyhow::bail!("no camera")));

        assert!(matches!(remote.dispatch("photo"), Err(BotError::Action(msg)) if msg == "no camera"));
    }

    #[test]
    fn register_action_replies_after_running() {
        let (mut remote, _) = remote();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        remote.register_action(
            "stop",
            Rc::new(move || {
                flag.set(true);
                Ok(())
            }),
            "Stopping",
        );

        assert_eq!(remote.dispatch("stop").unwrap(), "Stopping");
        assert!(ran.get());
        assert_eq!(remote.commands(), vec!["stop"]);
    }

    #[test]
    fn poll_answers_queued_requests() {
        let (mut remote, request_tx) = remote();
        remote.register("program/view", Rc::new(|| Ok("^3<".to_string())));

        let (known_tx, mut known_rx) = oneshot::channel();
        let (unknown_tx, mut unknown_rx) = oneshot::channel();
        request_tx
            .send(RemoteRequest {
                command: "program/view".to_string(),
                reply: known_tx,
            })
            .unwrap();
        request_tx
            .send(RemoteRequest {
                command: "dance".to_string(),
                reply: unknown_tx,
            })
            .unwrap();

        remote.poll().unwrap();

        assert_eq!(known_rx.try_recv().unwrap().unwrap(), "^3<");
        assert!(matches!(unknown_rx.try_recv().unwrap(), Err(BotError::NotFound(_))));
    }

    #[test]
    fn cleanup_releases_waiting_callers() {
        let (mut remote, request_tx) = remote();
        let (reply_tx, mut reply_rx) = oneshot::channel();
        request_tx
            .send(RemoteRequest {
                command: "forwards".to_string(),
                reply: reply_tx,
            })
            .unwrap();

        remote.cleanup().unwrap();

        assert!(reply_rx.try_recv().is_err());
        assert!(remote.poll().is_ok());
    }

    #[test]
    fn listening_only_between_first_poll_and_cleanup() {
        let (mut remote, _request_tx) = remote();
        assert!(!remote.polling.load(Ordering::SeqCst));

        remote.poll().unwrap();
        assert!(remote.polling.load(Ordering::SeqCst));

        remote.cleanup().unwrap();
        assert!(!remote.polling.load(Ordering::SeqCst));
    }
}
