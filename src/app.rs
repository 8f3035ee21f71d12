// Copyright 2026 Serial Tag Reader Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application event loop.
//!
//! One event at a time: a user action, an inbound line, the read deadline,
//! the status expiry or a shutdown signal is handled to completion before the
//! next is taken. Timers are polled first so an expired read is never
//! completed by a line that arrived after its deadline.

use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info};

use crate::actions::{UserAction, HELP};
use crate::session::{Inbound, SessionController};
use crate::state::AppState;

/// Default time a status message stays in the prompt.
pub const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(5);

/// Top-level application: owns the session controller for its lifetime.
pub struct App {
    controller: SessionController,
    state: Arc<AppState>,
    action_rx: mpsc::UnboundedReceiver<UserAction>,
    status_clear_after: Duration,
    interactive: bool,
}

impl App {
    pub fn new(
        controller: SessionController,
        state: Arc<AppState>,
        action_rx: mpsc::UnboundedReceiver<UserAction>,
    ) -> Self {
        Self {
            controller,
            state,
            action_rx,
            status_clear_after: STATUS_CLEAR_AFTER,
            interactive: false,
        }
    }

    /// Print a prompt after each action.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// How long a status message stays in the prompt.
    pub fn status_clear_after(mut self, clear_after: Duration) -> Self {
        self.status_clear_after = clear_after;
        self
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Run until the user quits, input ends or Ctrl-C arrives.
    pub async fn run(&mut self) {
        // Failures are already reported to the user.
        let _ = self.controller.discover().await;
        self.prompt();

        loop {
            let deadline = self.controller.read_deadline();
            let status_expiry = self
                .state
                .status_set_at()
                .map(|set_at| set_at + self.status_clear_after);

            tokio::select! {
                biased;

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.controller.on_deadline(Instant::now());
                }
                _ = sleep_until(status_expiry.unwrap_or_else(Instant::now)), if status_expiry.is_some() => {
                    if self.state.expire_status(Instant::now(), self.status_clear_after) {
                        debug!("Status cleared");
                        self.redraw_prompt();
                    }
                }
                action = self.action_rx.recv() => {
                    match action {
                        Some(action) => {
                            if !self.handle_action(action).await {
                                break;
                            }
                            self.prompt();
                        }
                        None => break,
                    }
                }
                inbound = self.controller.next_inbound() => {
                    match inbound {
                        Inbound::Line(line) => {
                            self.controller.on_receive(&line);
                        }
                        Inbound::Closed => self.controller.on_link_lost(),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.controller.shutdown().await;
    }

    /// Handle one user action. Returns false when the app should stop.
    async fn handle_action(&mut self, action: UserAction) -> bool {
        debug!("Handling {:?}", action);

        // Errors are surfaced through the display by the controller.
        let _ = match action {
            UserAction::Refresh => self.controller.discover().await.map(|_| ()),
            UserAction::Connect(target) => self.controller.connect(&target).await,
            UserAction::Read => self.controller.start_read().await,
            UserAction::Send(text) => self.controller.send(&text).await,
            UserAction::Disconnect => self.controller.disconnect().await,
            UserAction::Help => {
                println!("{}", HELP);
                Ok(())
            }
            UserAction::Quit => {
                info!("Quit requested");
                return false;
            }
        };
        true
    }

    fn prompt(&self) {
        if self.interactive {
            print!("{}", self.state.prompt());
            let _ = std::io::stdout().flush();
        }
    }

    /// Rewrite the prompt in place.
    fn redraw_prompt(&self) {
        if self.interactive {
            print!("\r\x1b[2K{}", self.state.prompt());
            let _ = std::io::stdout().flush();
        }
    }
}
