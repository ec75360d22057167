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

//! HTTP listener for remote commands.
//!
//! Runs on its own thread with a single-threaded Tokio runtime. Requests are
//! not executed here: each one is posted to the poll loop and the response is
//! sent once the poll loop has run the command. While the poll loop is not
//! running, for example during a one-off script, queued commands are refused
//! with 503 straight away. The exception is [`STOP_PROGRAM`], which is applied
//! immediately so that a running program can be interrupted while the poll
//! loop is busy executing it.

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::{self, JoinHandle},
};

use axum::{
    Router,
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tokio::sync::oneshot;
use tower_http::services::ServeDir;
use tracing::{debug, error, info};

use crate::{config::RemoteConfig, error::BotError, program::StopHandle};

pub(crate) const STOP_PROGRAM: &str = "program/stop";

/// A command received by the listener, waiting to be run by the poll loop.
pub(crate) struct RemoteRequest {
    pub(crate) command: String,
    pub(crate) reply: oneshot::Sender<Result<String, BotError>>,
}

struct ServerState {
    requests: mpsc::Sender<RemoteRequest>,
    /// Set while the poll loop is draining `requests`.
    polling: Arc<AtomicBool>,
    program_stop: StopHandle,
}

pub(crate) struct RemoteServer {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RemoteServer {
    /// Binds the listening socket and starts serving on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Unavailable`] if the address cannot be bound.
    pub(crate) fn start(
        config: &RemoteConfig,
        requests: mpsc::Sender<RemoteRequest>,
        polling: Arc<AtomicBool>,
        program_stop: StopHandle,
    ) -> Result<Self, BotError> {
        let listener = std::net::TcpListener::bind(&config.bind)
            .map_err(|e| BotError::unavailable("remote", format!("{}: {}", config.bind, e)))?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let router = build_router(
            Arc::new(ServerState {
                requests,
                polling,
                program_stop,
            }),
            &config.web_root,
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!(error = %e, "failed to create remote runtime");
                    return;
                }
            };

            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!(error = %e, "failed to register remote listener");
                        return;
                    }
                };

                let shutdown = async {
                    let _ = shutdown_rx.await;
                };

                if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(shutdown).await {
                    error!(error = %e, "remote server failed");
                }
            });

            info!("remote server stopped");
        });

        info!(%addr, "remote listening");

        Ok(Self {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Stops accepting connections and waits for the listener thread.
    pub(crate) fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("remote server thread panicked");
        }
    }
}

impl Drop for RemoteServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_router(state: Arc<ServerState>, web_root: &Path) -> Router {
    let static_files = ServeDir::new(web_root);

    Router::new()
        .route(
            "/*command",
            post(run_command).fallback_service(static_files.clone()),
        )
        .fallback_service(static_files)
        .with_state(state)
}

async fn run_command(State(state): State<Arc<ServerState>>, UrlPath(command): UrlPath<String>) -> Response {
    debug!(%command, "remote command");

    if command == STOP_PROGRAM {
        state.program_stop.stop();
        return (StatusCode::OK, "Stopping").into_response();
    }

    if !state.polling.load(Ordering::SeqCst) {
        return unavailable();
    }

    let (reply_tx, reply_rx) = oneshot::channel();
    let request = RemoteRequest {
        command,
        reply: reply_tx,
    };

    if state.requests.send(request).is_err() {
        return unavailable();
    }

    match reply_rx.await {
        Ok(Ok(text)) => (StatusCode::OK, text).into_response(),
        Ok(Err(BotError::NotFound(name))) => {
            (StatusCode::NOT_FOUND, format!("unknown command: {}", name)).into_response()
        }
        Ok(Err(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        Err(_) => unavailable(),
    }
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "robot is not listening").into_response()
}
