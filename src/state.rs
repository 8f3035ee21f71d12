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

//! Application state management.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::bluetooth::Peripheral;

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
        }
    }
}

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Peripheral list.
    Discovery,
    /// Connected session with log and commands.
    Detail,
}

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Current connection status.
    pub connection_status: RwLock<ConnectionStatus>,

    /// Connected peripheral.
    pub connected_device: RwLock<Option<Peripheral>>,

    /// Current view.
    pub view: RwLock<View>,

    /// Last tag read from the peripheral.
    pub last_tag: RwLock<Option<String>>,

    /// Status line text and when it was set.
    pub status_line: RwLock<Option<(String, Instant)>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            connection_status: RwLock::new(ConnectionStatus::Disconnected),
            connected_device: RwLock::new(None),
            view: RwLock::new(View::Discovery),
            last_tag: RwLock::new(None),
            status_line: RwLock::new(None),
        }
    }
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_connecting(&self) {
        *self.connection_status.write() = ConnectionStatus::Connecting;
    }

    pub fn set_connected(&self, device: Peripheral) {
        *self.connection_status.write() = ConnectionStatus::Connected;
        *self.connected_device.write() = Some(device);
    }

    pub fn set_disconnected(&self) {
        *self.connection_status.write() = ConnectionStatus::Disconnected;
        *self.connected_device.write() = None;
    }

    pub fn get_status(&self) -> ConnectionStatus {
        *self.connection_status.read()
    }

    pub fn get_device(&self) -> Option<Peripheral> {
        self.connected_device.read().clone()
    }

    pub fn set_view(&self, view: View) {
        *self.view.write() = view;
    }

    pub fn get_view(&self) -> View {
        *self.view.read()
    }

    pub fn set_last_tag(&self, tag: String) {
        *self.last_tag.write() = Some(tag);
    }

    pub fn get_last_tag(&self) -> Option<String> {
        self.last_tag.read().clone()
    }

    /// Replace the status line. An empty message clears it.
    pub fn set_status_line(&self, message: &str) {
        *self.status_line.write() = if message.is_empty() {
            None
        } else {
            Some((message.to_string(), Instant::now()))
        };
    }

    pub fn get_status_line(&self) -> Option<String> {
        self.status_line.read().as_ref().map(|(text, _)| text.clone())
    }

    /// When the current status line was set.
    pub fn status_set_at(&self) -> Option<Instant> {
        self.status_line.read().as_ref().map(|(_, at)| *at)
    }

    /// Clear the status line once it has been showing for `clear_after`.
    /// A status set later than that is left alone.
    pub fn expire_status(&self, now: Instant, clear_after: Duration) -> bool {
        let mut status = self.status_line.write();
        let expired = matches!(status.as_ref(), Some((_, at)) if now >= *at + clear_after);
        if expired {
            *status = None;
        }
        expired
    }

    /// Short prompt describing where the user is, with the live status.
    pub fn prompt(&self) -> String {
        let place = match (self.get_view(), self.get_device()) {
            (View::Detail, Some(device)) => device.name,
            (View::Detail, None) => "detail".to_string(),
            (View::Discovery, _) => "devices".to_string(),
        };
        match self.get_status_line() {
            Some(status) => format!("[{} | {}]> ", place, status),
            None => format!("[{}]> ", place),
        }
    }
}
