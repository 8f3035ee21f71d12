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

//! Tag-read state machine.
//!
//! Tracks whether a "read" command is outstanding. At most one read request
//! exists at a time; it ends either when the reader reports a tag or when its
//! deadline passes, whichever is observed first.

use thiserror::Error;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Default time to wait for a tag after issuing a read.
pub const READ_TIMEOUT: Duration = Duration::from_secs(11);

/// Errors from state machine transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error("a tag read is already in progress (request #{0})")]
    AlreadyReading(u64),
}

/// An outstanding read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub id: u64,
    pub issued_at: Instant,
    pub deadline: Instant,
}

/// Why a read request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    TagReceived,
    TimedOut,
    /// The session ended while the read was pending.
    Abandoned,
}

/// Reader state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    Reading(ReadRequest),
}

/// The two-state read/standby machine.
#[derive(Debug)]
pub struct TagReader {
    state: ReaderState,
    timeout: Duration,
    next_id: u64,
    last_finish: Option<FinishReason>,
}

impl Default for TagReader {
    fn default() -> Self {
        Self::new(READ_TIMEOUT)
    }
}

impl TagReader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: ReaderState::Idle,
            timeout,
            next_id: 1,
            last_finish: None,
        }
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    /// How the most recent request ended.
    pub fn last_finish(&self) -> Option<FinishReason> {
        self.last_finish
    }

    pub fn is_reading(&self) -> bool {
        matches!(self.state, ReaderState::Reading(_))
    }

    /// Deadline of the outstanding request, if any.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            ReaderState::Reading(request) => Some(request.deadline),
            ReaderState::Idle => None,
        }
    }

    /// Check that a read may start, without changing state.
    pub fn ensure_idle(&self) -> Result<(), ReaderError> {
        match &self.state {
            ReaderState::Idle => Ok(()),
            ReaderState::Reading(request) => Err(ReaderError::AlreadyReading(request.id)),
        }
    }

    /// `idle -> reading`. Arms the deadline relative to `now`.
    pub fn start_read(&mut self, now: Instant) -> Result<ReadRequest, ReaderError> {
        self.ensure_idle()?;

        let request = ReadRequest {
            id: self.next_id,
            issued_at: now,
            deadline: now + self.timeout,
        };
        self.next_id += 1;
        debug!("Read request #{} started", request.id);

        self.state = ReaderState::Reading(request.clone());
        Ok(request)
    }

    /// `reading -> idle`. Returns the finished request, or `None` if idle.
    pub fn finish_read(&mut self, reason: FinishReason) -> Option<ReadRequest> {
        match std::mem::replace(&mut self.state, ReaderState::Idle) {
            ReaderState::Reading(request) => {
                debug!("Read request #{} finished: {:?}", request.id, reason);
                self.last_finish = Some(reason);
                Some(request)
            }
            ReaderState::Idle => None,
        }
    }

    /// Finish the outstanding request if its deadline has passed.
    pub fn expire(&mut self, now: Instant) -> Option<ReadRequest> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.finish_read(FinishReason::TimedOut),
            _ => None,
        }
    }
}
