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

//! Line protocol spoken by the tag reader.
//!
//! Everything on the wire is newline-terminated ASCII text. Outbound commands
//! carry a CR+LF terminator, inbound lines are split on LF.

/// Command that asks the reader to scan for a tag.
pub const READ_COMMAND: &str = "read";

/// Bare acknowledgement the reader sends after accepting a command.
pub const ACK_TOKEN: &str = "OK";

/// Terminator appended to every outbound command.
pub const COMMAND_TERMINATOR: &str = "\r\n";

/// Delimiter separating inbound lines.
pub const LINE_DELIMITER: u8 = b'\n';

/// Encode a command for the wire.
pub fn encode_command(text: &str, terminator: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + terminator.len());
    bytes.extend_from_slice(text.as_bytes());
    bytes.extend_from_slice(terminator.as_bytes());
    bytes
}

/// Decode a raw inbound line.
///
/// Invalid UTF-8 is replaced rather than rejected, and the delimiter plus any
/// surrounding whitespace (including a stray CR) is trimmed.
pub fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

/// How an inbound line relates to an outstanding read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// The reader echoed the command we sent.
    Echo,
    /// The reader acknowledged the command.
    Ack,
    /// Nothing but whitespace.
    Blank,
    /// Anything else: the tag payload.
    Payload(String),
}

/// Tokens that must not be mistaken for a tag payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFilter {
    echo: String,
    ack: String,
}

impl LineFilter {
    pub fn new(echo: impl Into<String>, ack: impl Into<String>) -> Self {
        Self {
            echo: echo.into(),
            ack: ack.into(),
        }
    }

    /// Classify a decoded line.
    pub fn classify(&self, line: &str) -> LineKind {
        let line = line.trim();
        // Deliberately stricter than a plain "anything but echo or ack" rule:
        // a bare CR from the reader must not end a read with an empty tag.
        if line.is_empty() {
            LineKind::Blank
        } else if line == self.echo {
            LineKind::Echo
        } else if line == self.ack {
            LineKind::Ack
        } else {
            LineKind::Payload(line.to_string())
        }
    }
}

impl Default for LineFilter {
    fn default() -> Self {
        Self::new(READ_COMMAND, ACK_TOKEN)
    }
}
