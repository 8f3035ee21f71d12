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

//! Plain terminal rendering of the display surface.

use parking_lot::Mutex;
use std::io::Write;

use super::{Display, LogEntry, Notification, NO_DEVICES_PLACEHOLDER};
use crate::bluetooth::Peripheral;
use crate::config::DisplayConfig;
use crate::state::View;

type Sink = Mutex<Box<dyn Write + Send>>;

/// Renders to a pair of writers (normally stdout and stderr).
pub struct TerminalDisplay {
    out: Sink,
    err: Sink,
    timestamps: bool,
}

impl TerminalDisplay {
    /// Render to stdout, with notifications on stderr.
    pub fn stdio(config: &DisplayConfig) -> Self {
        Self::with_writers(config, Box::new(std::io::stdout()), Box::new(std::io::stderr()))
    }

    pub fn with_writers(
        config: &DisplayConfig,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
            timestamps: config.timestamps,
        }
    }

    fn write_out(&self, line: &str) {
        let mut out = self.out.lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }

    fn stamp(&self, text: &str) -> String {
        if self.timestamps {
            format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), text)
        } else {
            text.to_string()
        }
    }
}

impl Display for TerminalDisplay {
    fn append_log(&self, entry: &LogEntry) {
        let line = self.stamp(&entry.to_string());
        self.write_out(&line);
    }

    fn clear_log(&self) {
        self.write_out("----------------------------------------");
    }

    fn show_view(&self, view: View) {
        match view {
            View::Discovery => {
                self.write_out("== Devices ==  (list | connect <n> | quit)")
            }
            View::Detail => self.write_out(
                "== Session ==  (read | send <text> | disconnect | quit)",
            ),
        }
    }

    /// Prints the new status. The live status (and its expiry) is shown in
    /// the prompt.
    fn set_status(&self, message: &str) {
        if !message.is_empty() {
            self.write_out(&format!("Status: {}", message));
        }
    }

    fn show_peripherals(&self, peripherals: &[Peripheral]) {
        if peripherals.is_empty() {
            self.write_out(&format!("  {}", NO_DEVICES_PLACEHOLDER));
            return;
        }
        for (i, device) in peripherals.iter().enumerate() {
            self.write_out(&format!("  {}. {} ({})", i + 1, device.name, device.id));
        }
    }

    fn notify(&self, notification: &Notification) {
        let mut err = self.err.lock();
        let _ = writeln!(err, "{}", notification);
        let _ = err.flush();
    }
}
