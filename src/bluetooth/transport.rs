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

//! Serial transport abstraction.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// A discoverable serial peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peripheral {
    /// Opaque identifier (the Bluetooth address for RFCOMM).
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

impl Peripheral {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// How a transport finds peripherals.
///
/// Determines what the user is told when discovery comes back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Lists devices already paired with the host.
    Paired,
    /// Scans for advertising peripherals.
    Scan,
}

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,
    #[error("already connected to {0}")]
    AlreadyConnected(String),
    #[error("invalid device address: {0}")]
    InvalidAddress(String),
    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] bluer::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Trait for serial transports.
///
/// The production implementation speaks RFCOMM through BlueZ; tests use
/// [`super::mock::MockTransport`].
#[async_trait]
pub trait SerialTransport: Send + Sync {
    /// How peripherals are discovered.
    fn kind(&self) -> TransportKind;

    /// List candidate peripherals.
    async fn list(&self) -> Result<Vec<Peripheral>, TransportError>;

    /// Open a session to the peripheral with the given id.
    async fn connect(&self, id: &str) -> Result<(), TransportError>;

    /// Close the active session.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Write raw bytes to the active session.
    async fn write(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Subscribe to inbound lines split on `delimiter`.
    ///
    /// The channel closes when the link goes down. Only one subscription is
    /// live at a time; subscribing again replaces the previous one.
    async fn subscribe(&self, delimiter: u8) -> Result<mpsc::Receiver<String>, TransportError>;
}
