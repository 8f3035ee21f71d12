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

//! In-memory transport for tests and dry runs.
//!
//! Lets callers script discovery results and failures, inspect what was
//! written, and inject inbound lines as if the peripheral had sent them.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::info;

use super::transport::{Peripheral, SerialTransport, TransportError, TransportKind};

#[derive(Default)]
struct MockInner {
    peripherals: Vec<Peripheral>,
    connected: Option<String>,
    line_tx: Option<mpsc::Sender<String>>,
    writes: Vec<Vec<u8>>,
    fail_list: Option<String>,
    fail_connect: Option<String>,
    fail_disconnect: Option<String>,
    fail_write: Option<String>,
    fail_subscribe: Option<String>,
}

/// A scriptable [`SerialTransport`].
pub struct MockTransport {
    kind: TransportKind,
    inner: Mutex<MockInner>,
}

impl MockTransport {
    /// Create a mock that behaves like a paired-device transport.
    pub fn new() -> Self {
        Self::with_kind(TransportKind::Paired)
    }

    pub fn with_kind(kind: TransportKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(MockInner::default()),
        }
    }

    /// Set the peripherals returned by `list()`.
    pub fn set_peripherals(&self, peripherals: Vec<Peripheral>) {
        self.inner.lock().peripherals = peripherals;
    }

    /// Make `list()` fail with the given reason, or succeed again with `None`.
    pub fn fail_list(&self, reason: Option<&str>) {
        self.inner.lock().fail_list = reason.map(str::to_string);
    }

    pub fn fail_connect(&self, reason: Option<&str>) {
        self.inner.lock().fail_connect = reason.map(str::to_string);
    }

    pub fn fail_disconnect(&self, reason: Option<&str>) {
        self.inner.lock().fail_disconnect = reason.map(str::to_string);
    }

    pub fn fail_write(&self, reason: Option<&str>) {
        self.inner.lock().fail_write = reason.map(str::to_string);
    }

    pub fn fail_subscribe(&self, reason: Option<&str>) {
        self.inner.lock().fail_subscribe = reason.map(str::to_string);
    }

    /// Everything written so far, as text.
    pub fn written(&self) -> Vec<String> {
        self.inner
            .lock()
            .writes
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Id of the connected peripheral, if any.
    pub fn connected_to(&self) -> Option<String> {
        self.inner.lock().connected.clone()
    }

    /// Deliver an inbound line to the active subscription.
    ///
    /// Returns false when nobody is subscribed.
    pub fn push_line(&self, line: &str) -> bool {
        let tx = self.inner.lock().line_tx.clone();
        match tx {
            Some(tx) => tx.try_send(line.to_string()).is_ok(),
            None => false,
        }
    }

    /// Simulate the remote end dropping the link.
    pub fn drop_link(&self) {
        let mut inner = self.inner.lock();
        inner.line_tx = None;
        inner.connected = None;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SerialTransport for MockTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn list(&self) -> Result<Vec<Peripheral>, TransportError> {
        let inner = self.inner.lock();
        if let Some(reason) = &inner.fail_list {
            return Err(TransportError::Other(reason.clone()));
        }
        Ok(inner.peripherals.clone())
    }

    async fn connect(&self, id: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.fail_connect {
            return Err(TransportError::Other(reason.clone()));
        }
        if let Some(existing) = &inner.connected {
            return Err(TransportError::AlreadyConnected(existing.clone()));
        }
        info!("[MOCK] Connected to {}", id);
        inner.connected = Some(id.to_string());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        // The link is gone locally either way.
        inner.line_tx = None;
        let was_connected = inner.connected.take();
        if let Some(reason) = &inner.fail_disconnect {
            return Err(TransportError::Other(reason.clone()));
        }
        was_connected.map(|_| ()).ok_or(TransportError::NotConnected)
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        if inner.connected.is_none() {
            return Err(TransportError::NotConnected);
        }
        if let Some(reason) = &inner.fail_write {
            return Err(TransportError::Other(reason.clone()));
        }
        inner.writes.push(data.to_vec());
        Ok(())
    }

    async fn subscribe(&self, _delimiter: u8) -> Result<mpsc::Receiver<String>, TransportError> {
        let mut inner = self.inner.lock();
        if inner.connected.is_none() {
            return Err(TransportError::NotConnected);
        }
        if let Some(reason) = &inner.fail_subscribe {
            return Err(TransportError::Other(reason.clone()));
        }
        let (tx, rx) = mpsc::channel(64);
        inner.line_tx = Some(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_requires_connection() {
        let mock = MockTransport::new();
        assert!(matches!(
            mock.write(b"read\r\n").await,
            Err(TransportError::NotConnected)
        ));

        mock.connect("AA:BB:CC:DD:EE:FF").await.unwrap();
        mock.write(b"read\r\n").await.unwrap();
        assert_eq!(mock.written(), vec!["read\r\n".to_string()]);
    }

    #[tokio::test]
    async fn test_push_line_reaches_subscriber() {
        let mock = MockTransport::new();
        assert!(!mock.push_line("orphan"));

        mock.connect("dev").await.unwrap();
        let mut rx = mock.subscribe(b'\n').await.unwrap();
        assert!(mock.push_line("1234"));
        assert_eq!(rx.recv().await, Some("1234".to_string()));

        mock.drop_link();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_failed_disconnect_still_drops_link() {
        let mock = MockTransport::new();
        mock.connect("dev").await.unwrap();
        mock.fail_disconnect(Some("busy"));

        assert!(mock.disconnect().await.is_err());
        assert_eq!(mock.connected_to(), None);
    }
}
