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

//! Serial Tag Reader terminal application

use anyhow::Result;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use serial_tag_reader::actions::{self, HELP};
use serial_tag_reader::bluetooth::RfcommTransport;
use serial_tag_reader::config::Config;
use serial_tag_reader::display::TerminalDisplay;
use serial_tag_reader::state::AppState;
use serial_tag_reader::{App, SessionController};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("serial_tag_reader=info".parse()?),
        )
        .init();

    info!(
        "Starting Serial Tag Reader v{}...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Initialize Bluetooth transport
    let transport = Arc::new(RfcommTransport::new(&config.bluetooth).await?);

    let display = Arc::new(TerminalDisplay::stdio(&config.display));
    let state = AppState::new();
    let controller = SessionController::new(transport, display, state.clone(), &config.reader);

    // Feed terminal input into the event loop
    let (action_tx, action_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(actions::read_actions(
        BufReader::new(tokio::io::stdin()),
        action_tx,
    ));

    println!("{}", HELP);
    let mut app = App::new(controller, state, action_rx)
        .status_clear_after(config.display.status_clear_after())
        .interactive(true);
    app.run().await;

    info!("Serial Tag Reader stopped");
    Ok(())
}
