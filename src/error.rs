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

//! Session-level failures.

use thiserror::Error;

use crate::reader::ReaderError;

/// Failure of one session operation. Each carries the transport's reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("discovery failed: {0}")]
    Discovery(String),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("disconnect failed: {0}")]
    Disconnect(String),
    #[error("write failed: {0}")]
    Write(String),
    #[error("connection lost")]
    LinkLost,
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

impl SessionError {
    /// The human-readable reason, without the operation prefix.
    pub fn reason(&self) -> String {
        match self {
            SessionError::Discovery(reason)
            | SessionError::Connect(reason)
            | SessionError::Disconnect(reason)
            | SessionError::Write(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}
