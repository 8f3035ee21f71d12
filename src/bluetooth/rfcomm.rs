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

//! Bluetooth RFCOMM (SPP) client transport.

use async_trait::async_trait;
use bluer::rfcomm::stream::{OwnedReadHalf, OwnedWriteHalf};
use bluer::rfcomm::{SocketAddr, Stream};
use bluer::{Adapter, Address};
use std::fmt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::protocol::decode_line;
use super::transport::{Peripheral, SerialTransport, TransportError, TransportKind};
use crate::config::BluetoothConfig;

/// Standard SPP UUID.
pub const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Capacity of the inbound line channel.
const LINE_CHANNEL_CAPACITY: usize = 64;

/// Longest inbound line kept, delimiter excluded. Longer lines are dropped.
pub const MAX_LINE_LEN: usize = 1024;

/// An open RFCOMM link.
struct Link {
    address: Address,
    writer: OwnedWriteHalf,
    /// Read half, parked here until someone subscribes.
    reader: Option<OwnedReadHalf>,
    reader_task: Option<JoinHandle<()>>,
}

impl Link {
    fn stop_reader(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}

/// RFCOMM client talking to paired SPP peripherals through BlueZ.
pub struct RfcommTransport {
    adapter: Adapter,
    channel: u8,
    spp_only: bool,
    link: Mutex<Option<Link>>,
}

impl RfcommTransport {
    /// Open a BlueZ session and pick the configured adapter.
    pub async fn new(config: &BluetoothConfig) -> Result<Self, TransportError> {
        info!("Initializing Bluetooth transport...");

        let session = bluer::Session::new().await?;
        info!("BlueZ session created");

        let adapter = match &config.adapter {
            Some(name) => session.adapter(name)?,
            None => session.default_adapter().await?,
        };
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        Ok(Self {
            adapter,
            channel: config.rfcomm_channel,
            spp_only: config.spp_only,
            link: Mutex::new(None),
        })
    }

    /// Whether the device advertises the serial port profile.
    async fn offers_spp(&self, device: &bluer::Device) -> Result<bool, TransportError> {
        Ok(device
            .uuids()
            .await?
            .map(|uuids| uuids.contains(&SPP_UUID))
            .unwrap_or(false))
    }

    /// Describe one known device, or `None` if it should not be listed.
    async fn describe(&self, addr: Address) -> Result<Option<Peripheral>, TransportError> {
        let device = self.adapter.device(addr)?;
        if !device.is_paired().await? {
            return Ok(None);
        }
        if self.spp_only && !self.offers_spp(&device).await? {
            debug!("Skipping {}: no SPP service", addr);
            return Ok(None);
        }
        let name = device.alias().await.unwrap_or_else(|_| addr.to_string());
        Ok(Some(Peripheral::new(addr.to_string(), name)))
    }
}

/// Keep a listed device, skipping one whose properties could not be read.
fn keep_listed(
    addr: impl fmt::Display,
    described: Result<Option<Peripheral>, TransportError>,
) -> Option<Peripheral> {
    match described {
        Ok(device) => device,
        Err(e) => {
            warn!("Skipping {}: {}", addr, e);
            None
        }
    }
}

/// Forward framed lines until EOF or error.
///
/// Lines longer than `max_len` are discarded up to the next delimiter.
async fn read_loop<R>(reader: R, delimiter: u8, max_len: usize, line_tx: mpsc::Sender<String>)
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = reader;
    let mut buf = Vec::new();
    let mut oversized = false;

    loop {
        buf.clear();
        let limit = max_len as u64 + 1;
        match (&mut reader).take(limit).read_until(delimiter, &mut buf).await {
            Ok(0) => {
                info!("Connection closed by remote");
                break;
            }
            Ok(_) => {
                let complete = buf.last() == Some(&delimiter);
                if oversized {
                    oversized = !complete;
                    continue;
                }
                if !complete && buf.len() > max_len {
                    warn!("Dropping inbound line longer than {} bytes", max_len);
                    oversized = true;
                    continue;
                }
                if complete {
                    buf.pop();
                }

                let line = decode_line(&buf);
                debug!("Received: {}", line);
                if line_tx.send(line).await.is_err() {
                    debug!("Line subscriber dropped, stopping reader");
                    break;
                }
            }
            Err(e) => {
                error!("Read error: {}", e);
                break;
            }
        }
    }
}

#[async_trait]
impl SerialTransport for RfcommTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Paired
    }

    async fn list(&self) -> Result<Vec<Peripheral>, TransportError> {
        let mut devices = Vec::new();

        for addr in self.adapter.device_addresses().await? {
            if let Some(device) = keep_listed(addr, self.describe(addr).await) {
                devices.push(device);
            }
        }

        info!("Found {} paired device(s)", devices.len());
        Ok(devices)
    }

    async fn connect(&self, id: &str) -> Result<(), TransportError> {
        let address: Address = id
            .trim()
            .parse()
            .map_err(|_| TransportError::InvalidAddress(id.to_string()))?;

        let mut link = self.link.lock().await;
        if let Some(existing) = link.as_ref() {
            return Err(TransportError::AlreadyConnected(existing.address.to_string()));
        }

        info!("Connecting to {} on RFCOMM channel {}", address, self.channel);
        let stream = Stream::connect(SocketAddr::new(address, self.channel)).await?;
        let (reader, writer) = stream.into_split();

        *link = Some(Link {
            address,
            writer,
            reader: Some(reader),
            reader_task: None,
        });
        info!("Connected to {}", address);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut link = self.link.lock().await.take().ok_or(TransportError::NotConnected)?;
        link.stop_reader();

        let result = link.writer.shutdown().await;
        info!("Disconnected from {}", link.address);
        result.map_err(TransportError::from)
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut link = self.link.lock().await;
        let link = link.as_mut().ok_or(TransportError::NotConnected)?;

        link.writer.write_all(data).await?;
        link.writer.flush().await?;
        debug!("Wrote {} bytes to {}", data.len(), link.address);
        Ok(())
    }

    async fn subscribe(&self, delimiter: u8) -> Result<mpsc::Receiver<String>, TransportError> {
        let mut link = self.link.lock().await;
        let link = link.as_mut().ok_or(TransportError::NotConnected)?;

        // The read half can only be consumed once per connection.
        let Some(reader) = link.reader.take() else {
            warn!("Subscription already active on {}", link.address);
            return Err(TransportError::Other("already subscribed".to_string()));
        };
        link.stop_reader();

        let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        link.reader_task = Some(tokio::spawn(read_loop(
            BufReader::new(reader),
            delimiter,
            MAX_LINE_LEN,
            line_tx,
        )));

        Ok(line_rx)
    }
}
