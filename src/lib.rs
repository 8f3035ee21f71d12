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

//! Bluetooth serial tag reader.
//!
//! Discovers paired SPP peripherals, connects over RFCOMM, sends text
//! commands and runs a read/standby workflow for ear-tag reads.

pub mod actions;
pub mod app;
pub mod bluetooth;
pub mod config;
pub mod display;
pub mod error;
pub mod reader;
pub mod session;
pub mod state;

pub use app::App;
pub use error::SessionError;
pub use session::SessionController;
