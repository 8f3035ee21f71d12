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

//! Display surface: log area, status line, views and notifications.

mod recording;
mod terminal;

use std::fmt;

pub use recording::{DisplayEvent, RecordingDisplay};
pub use terminal::TerminalDisplay;

use crate::bluetooth::Peripheral;
use crate::state::View;

/// Placeholder shown when discovery finds nothing.
pub const NO_DEVICES_PLACEHOLDER: &str = "No Bluetooth Devices";

/// An entry in the session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A command we wrote.
    Sent(String),
    /// A raw line from the peripheral.
    Received(String),
    /// A tag read in response to a read request.
    Tag(String),
    /// A read command went out.
    ReadingTag,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Sent(text) => write!(f, "Sent: {}", text),
            LogEntry::Received(line) => write!(f, "Received: {}", line),
            LogEntry::Tag(tag) => write!(f, "Read Ear Tag: {}", tag),
            LogEntry::ReadingTag => write!(f, "Reading tag..."),
        }
    }
}

/// A failure the user must be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Trait for display backends.
///
/// Notifications must not block: the caller carries on as soon as
/// `notify` returns.
pub trait Display: Send + Sync {
    /// Append a line to the session log.
    fn append_log(&self, entry: &LogEntry);

    /// Empty the session log.
    fn clear_log(&self);

    /// Switch between the discovery and detail views.
    fn show_view(&self, view: View);

    /// Set the status line. An empty message clears it.
    fn set_status(&self, message: &str);

    /// Replace the list of selectable peripherals.
    fn show_peripherals(&self, peripherals: &[Peripheral]);

    /// Tell the user something went wrong.
    fn notify(&self, notification: &Notification);
}
