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

//! User actions typed at the terminal.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Usage text for the interactive prompt.
pub const HELP: &str = "\
Commands:
  list | refresh          list paired devices
  connect <n|address>     connect to device n from the list, or by address
  read                    read an ear tag
  send <text>             send a line to the reader
  disconnect              close the session
  help                    show this help
  quit                    exit";

/// Actions the user can trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Refresh,
    Connect(String),
    Read,
    Send(String),
    Disconnect,
    Help,
    Quit,
}

impl UserAction {
    /// Parse a line of user input. Blank input yields `None`.
    pub fn parse(input: &str) -> Option<Result<Self, String>> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let (word, rest) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (input, ""),
        };

        let action = match (word.to_lowercase().as_str(), rest) {
            ("list" | "refresh" | "ls", _) => Ok(Self::Refresh),
            ("connect" | "c", "") => Err("connect needs a device number or address".to_string()),
            ("connect" | "c", target) => Ok(Self::Connect(target.to_string())),
            ("read" | "r", _) => Ok(Self::Read),
            // Sending an empty line is allowed; it writes just the terminator.
            ("send" | "s", text) => Ok(Self::Send(text.to_string())),
            ("disconnect" | "d", _) => Ok(Self::Disconnect),
            ("help" | "?", _) => Ok(Self::Help),
            ("quit" | "exit" | "q", _) => Ok(Self::Quit),
            (other, _) => Err(format!("unknown command: {}", other)),
        };
        Some(action)
    }
}

/// Read actions from `input` line by line until EOF.
///
/// Parse errors are logged and skipped. EOF is reported as [`UserAction::Quit`].
pub async fn read_actions<R>(input: R, action_tx: mpsc::UnboundedSender<UserAction>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match UserAction::parse(&line) {
                Some(Ok(action)) => {
                    debug!("User action: {:?}", action);
                    if action_tx.send(action).is_err() {
                        return;
                    }
                }
                Some(Err(e)) => {
                    warn!("{}", e);
                    let _ = action_tx.send(UserAction::Help);
                }
                None => {}
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                break;
            }
        }
    }
    let _ = action_tx.send(UserAction::Quit);
}
