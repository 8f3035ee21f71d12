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

//! Bluetooth serial communication module.
//!
//! Handles the RFCOMM client link to the tag reader and the line protocol
//! spoken over it.

pub mod mock;
pub mod protocol;
mod rfcomm;
mod transport;

pub use mock::MockTransport;
pub use protocol::{
    decode_line, encode_command, LineFilter, LineKind, ACK_TOKEN, COMMAND_TERMINATOR,
    LINE_DELIMITER, READ_COMMAND,
};
pub use rfcomm::{RfcommTransport, SPP_UUID};
pub use transport::{Peripheral, SerialTransport, TransportError, TransportKind};
