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

//! Display that records every call, for tests.

use parking_lot::Mutex;

use super::{Display, LogEntry, Notification};
use crate::bluetooth::Peripheral;
use crate::state::View;

/// A call made on a [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Log(LogEntry),
    ClearLog,
    View(View),
    Status(String),
    Peripherals(Vec<Peripheral>),
    Notify(Notification),
}

/// Records display calls instead of rendering them.
#[derive(Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, oldest first.
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    /// Log entries appended since the last `clear_log`.
    pub fn log(&self) -> Vec<LogEntry> {
        let events = self.events.lock();
        let start = events
            .iter()
            .rposition(|e| *e == DisplayEvent::ClearLog)
            .map(|i| i + 1)
            .unwrap_or(0);
        events[start..]
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Log(entry) => Some(entry.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Notify(n) => Some(n.message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent status message, if any was set.
    pub fn last_status(&self) -> Option<String> {
        self.events.lock().iter().rev().find_map(|e| match e {
            DisplayEvent::Status(s) => Some(s.clone()),
            _ => None,
        })
    }

    /// Most recently shown view.
    pub fn last_view(&self) -> Option<View> {
        self.events.lock().iter().rev().find_map(|e| match e {
            DisplayEvent::View(v) => Some(*v),
            _ => None,
        })
    }

    /// Most recently shown peripheral list.
    pub fn last_peripherals(&self) -> Option<Vec<Peripheral>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            DisplayEvent::Peripherals(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: DisplayEvent) {
        self.events.lock().push(event);
    }
}

impl Display for RecordingDisplay {
    fn append_log(&self, entry: &LogEntry) {
        self.record(DisplayEvent::Log(entry.clone()));
    }

    fn clear_log(&self) {
        self.record(DisplayEvent::ClearLog);
    }

    fn show_view(&self, view: View) {
        self.record(DisplayEvent::View(view));
    }

    fn set_status(&self, message: &str) {
        self.record(DisplayEvent::Status(message.to_string()));
    }

    fn show_peripherals(&self, peripherals: &[Peripheral]) {
        self.record(DisplayEvent::Peripherals(peripherals.to_vec()));
    }

    fn notify(&self, notification: &Notification) {
        self.record(DisplayEvent::Notify(notification.clone()));
    }
}
