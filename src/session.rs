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

//! Serial session controller.
//!
//! Owns discovery, the single active session, command sends and inbound line
//! dispatch. Drives the [`TagReader`] state machine and the [`Display`].
//! Every operation reports its outcome as a `Result`; failures are also
//! surfaced to the user through [`Display::notify`] and never retried.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::bluetooth::{
    encode_command, LineFilter, LineKind, Peripheral, SerialTransport, TransportKind,
};
use crate::config::ReaderConfig;
use crate::display::{Display, LogEntry, Notification};
use crate::error::SessionError;
use crate::reader::{FinishReason, ReaderState, TagReader};
use crate::state::{AppState, View};

/// Status shown when a paired-device transport has nothing paired.
pub const STATUS_PAIR_DEVICE: &str = "Please Pair a Bluetooth Device.";

/// Status shown when a scanning transport found nothing.
pub const STATUS_NO_PERIPHERALS: &str = "No Bluetooth Peripherals Discovered.";

/// Notification when the read command cannot be written.
pub const READ_COMMAND_FAILED: &str = "Unable to send read command.";

/// Notification when a user command cannot be written.
pub const WRITE_FAILED: &str = "Failed writing data to Bluetooth peripheral";

/// Something arriving from the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Line(String),
    /// The subscription ended: the link is gone.
    Closed,
}

/// An active connection to one peripheral.
struct Session {
    peripheral: Peripheral,
    lines: mpsc::Receiver<String>,
}

/// Status text after a discovery that returned `count` devices.
pub fn discovery_status(count: usize, kind: TransportKind) -> String {
    match count {
        0 => match kind {
            TransportKind::Scan => STATUS_NO_PERIPHERALS.to_string(),
            TransportKind::Paired => STATUS_PAIR_DEVICE.to_string(),
        },
        1 => "Found 1 device.".to_string(),
        n => format!("Found {} devices.", n),
    }
}

/// Controller for one serial session at a time.
pub struct SessionController {
    transport: Arc<dyn SerialTransport>,
    display: Arc<dyn Display>,
    state: Arc<AppState>,
    reader: TagReader,
    filter: LineFilter,
    read_command: String,
    terminator: String,
    delimiter: u8,
    peripherals: Vec<Peripheral>,
    session: Option<Session>,
}

impl SessionController {
    /// Create a controller. The display starts on the discovery view.
    pub fn new(
        transport: Arc<dyn SerialTransport>,
        display: Arc<dyn Display>,
        state: Arc<AppState>,
        config: &ReaderConfig,
    ) -> Self {
        display.show_view(View::Discovery);
        state.set_view(View::Discovery);

        Self {
            transport,
            display,
            state,
            reader: TagReader::new(config.read_timeout()),
            filter: LineFilter::new(&config.read_command, &config.ack_token),
            read_command: config.read_command.clone(),
            terminator: config.command_terminator.clone(),
            delimiter: config.delimiter_byte(),
            peripherals: Vec::new(),
            session: None,
        }
    }

    /// Current state machine state.
    pub fn reader_state(&self) -> &ReaderState {
        self.reader.state()
    }

    /// How the most recent read ended.
    pub fn last_read_finish(&self) -> Option<FinishReason> {
        self.reader.last_finish()
    }

    /// Deadline of the outstanding read, if one is pending.
    pub fn read_deadline(&self) -> Option<Instant> {
        self.reader.deadline()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Peripherals from the last successful discovery.
    pub fn peripherals(&self) -> &[Peripheral] {
        &self.peripherals
    }

    /// List peripherals and replace the displayed candidates.
    pub async fn discover(&mut self) -> Result<usize, SessionError> {
        info!("Refreshing device list");

        let devices = match self.transport.list().await {
            Ok(devices) => devices,
            Err(e) => {
                let err = SessionError::Discovery(e.to_string());
                self.report(&err);
                return Err(err);
            }
        };

        self.state.set_status_line("");
        self.display.set_status("");
        self.display.show_peripherals(&devices);
        let status = discovery_status(devices.len(), self.transport.kind());
        self.set_status(&status);

        let count = devices.len();
        self.peripherals = devices;
        Ok(count)
    }

    /// Connect to a peripheral by list index (1-based) or by id.
    pub async fn connect(&mut self, target: &str) -> Result<(), SessionError> {
        let peripheral = self.resolve(target);

        if self.session.is_some() {
            info!("Tearing down previous session before reconnecting");
            self.teardown().await;
            self.show_view(View::Discovery);
        }

        info!("Connecting to {} ({})", peripheral.name, peripheral.id);
        self.state.set_connecting();

        if let Err(e) = self.transport.connect(&peripheral.id).await {
            let err = SessionError::Connect(e.to_string());
            self.state.set_disconnected();
            self.report(&err);
            return Err(err);
        }

        let lines = match self.transport.subscribe(self.delimiter).await {
            Ok(lines) => lines,
            Err(e) => {
                let err = SessionError::Connect(e.to_string());
                if let Err(e) = self.transport.disconnect().await {
                    debug!("Cleanup after failed subscribe: {}", e);
                }
                self.state.set_disconnected();
                self.report(&err);
                return Err(err);
            }
        };

        self.session = Some(Session {
            peripheral: peripheral.clone(),
            lines,
        });
        self.state.set_connected(peripheral);

        self.display.clear_log();
        self.set_status("Connected");
        self.show_view(View::Detail);
        Ok(())
    }

    /// Close the session. Always ends on the discovery view.
    pub async fn disconnect(&mut self) -> Result<(), SessionError> {
        if self.session.is_none() {
            debug!("Disconnect requested without a session");
            self.show_view(View::Discovery);
            return Ok(());
        }

        let result = self
            .transport
            .disconnect()
            .await
            .map_err(|e| SessionError::Disconnect(e.to_string()));
        if let Err(err) = &result {
            self.report(err);
        }

        self.drop_session();
        self.show_view(View::Discovery);
        result
    }

    /// Send a line of text to the peripheral.
    pub async fn send(&mut self, text: &str) -> Result<(), SessionError> {
        match self.write_line(text).await {
            Ok(()) => {
                debug!("Sent: {}", text);
                self.display.append_log(&LogEntry::Sent(text.to_string()));
                Ok(())
            }
            Err(err) => {
                warn!("Send failed: {}", err);
                self.display.notify(&Notification::new(WRITE_FAILED));
                Err(err)
            }
        }
    }

    /// Issue a read command and wait for a tag (`idle -> reading`).
    ///
    /// Ignored with [`crate::reader::ReaderError::AlreadyReading`] while a
    /// read is outstanding. If the command cannot be written the machine
    /// stays idle.
    pub async fn start_read(&mut self) -> Result<(), SessionError> {
        if let Err(e) = self.reader.ensure_idle() {
            debug!("Read ignored: {}", e);
            return Err(e.into());
        }

        info!("Reading...");
        if let Err(err) = self.write_line(&self.read_command).await {
            warn!("Read command failed: {}", err);
            self.display.notify(&Notification::new(READ_COMMAND_FAILED));
            return Err(err);
        }

        let request = self.reader.start_read(Instant::now())?;
        info!("Read request #{} pending", request.id);
        self.display.append_log(&LogEntry::ReadingTag);
        Ok(())
    }

    /// Handle one inbound line. Returns the tag if the line completed a read.
    ///
    /// An outstanding read whose deadline has already passed is expired first,
    /// so a late line is only logged.
    pub fn on_receive(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        debug!("{}", line);
        self.display.append_log(&LogEntry::Received(line.to_string()));

        // A line handled after the deadline belongs to no read.
        self.on_deadline(Instant::now());
        if !self.reader.is_reading() {
            return None;
        }

        match self.filter.classify(line) {
            LineKind::Payload(tag) => {
                self.reader.finish_read(FinishReason::TagReceived);
                info!("Read ear tag: {}", tag);
                self.display.append_log(&LogEntry::Tag(tag.clone()));
                self.state.set_last_tag(tag.clone());
                Some(tag)
            }
            kind => {
                debug!("Ignoring {:?} while reading", kind);
                None
            }
        }
    }

    /// Stand by again if the read deadline has passed. Returns true if it did.
    pub fn on_deadline(&mut self, now: Instant) -> bool {
        match self.reader.expire(now) {
            Some(request) => {
                info!("Read request #{} timed out, standing by", request.id);
                true
            }
            None => false,
        }
    }

    /// The subscription ended underneath us.
    pub fn on_link_lost(&mut self) {
        if self.session.is_none() {
            return;
        }
        warn!("Connection to peripheral lost");
        self.report(&SessionError::LinkLost);
        self.drop_session();
        self.show_view(View::Discovery);
    }

    /// Wait for the next inbound line. Pends forever without a session.
    pub async fn next_inbound(&mut self) -> Inbound {
        match self.session.as_mut() {
            Some(session) => match session.lines.recv().await {
                Some(line) => Inbound::Line(line),
                None => Inbound::Closed,
            },
            None => std::future::pending().await,
        }
    }

    /// Close any open session before exit.
    pub async fn shutdown(&mut self) {
        if self.session.is_some() {
            info!("Closing session before exit");
            self.teardown().await;
        }
    }

    fn resolve(&self, target: &str) -> Peripheral {
        let target = target.trim();
        if let Ok(index) = target.parse::<usize>() {
            if let Some(device) = index.checked_sub(1).and_then(|i| self.peripherals.get(i)) {
                return device.clone();
            }
        }
        self.peripherals
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(target))
            .cloned()
            .unwrap_or_else(|| Peripheral::new(target, target))
    }

    async fn write_line(&self, text: &str) -> Result<(), SessionError> {
        let bytes = encode_command(text, &self.terminator);
        self.transport
            .write(&bytes)
            .await
            .map_err(|e| SessionError::Write(e.to_string()))
    }

    /// Disconnect without user-visible errors.
    async fn teardown(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!("Disconnect during teardown failed: {}", e);
        }
        self.drop_session();
    }

    fn drop_session(&mut self) {
        if let Some(session) = self.session.take() {
            info!("Session with {} closed", session.peripheral.name);
        }
        if let Some(request) = self.reader.finish_read(FinishReason::Abandoned) {
            debug!("Abandoned read request #{}", request.id);
        }
        self.state.set_disconnected();
    }

    fn set_status(&self, message: &str) {
        info!("{}", message);
        self.state.set_status_line(message);
        self.display.set_status(message);
    }

    fn show_view(&self, view: View) {
        self.state.set_view(view);
        self.display.show_view(view);
    }

    fn report(&self, err: &SessionError) {
        warn!("{}", err);
        self.display
            .notify(&Notification::new(format!("ERROR: {}", err.reason())));
    }
}
