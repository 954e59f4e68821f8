// Copyright 2025 eraflo
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


//! The sequential load queue.
//!
//! Some sources must initialize strictly one after another. The queue holds them in
//! FIFO order and the [`FileLoader`](crate::FileLoader) pump starts the next entry only
//! once the previous one has completed. The queue can be paused by external code; a
//! stall valve force-resumes it if it stays paused for too many pump ticks.

use crate::file_loader::LoadCallback;
use loom_core::FilePath;
use std::collections::VecDeque;

/// Default number of consecutive paused pump ticks tolerated before force-resuming.
pub const DEFAULT_MAX_PAUSED_TICKS: u32 = 100;

/// One entry waiting in the sequential queue.
pub(crate) struct QueuedLoad {
    pub(crate) path: FilePath,
    pub(crate) callback: Option<LoadCallback>,
}

/// What the pump is allowed to do on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PumpPermit {
    /// The queue is paused; do nothing.
    Paused,
    /// The queue may make progress.
    Run,
}

/// FIFO of loads that must complete in submission order.
pub struct SequentialQueue {
    entries: VecDeque<QueuedLoad>,
    /// Cache key of the entry currently being loaded.
    current: Option<String>,
    paused: bool,
    paused_ticks: u32,
    max_paused_ticks: u32,
}

impl SequentialQueue {
    /// Creates an empty, running queue.
    pub fn new(max_paused_ticks: u32) -> Self {
        Self {
            entries: VecDeque::new(),
            current: None,
            paused: false,
            paused_ticks: 0,
            max_paused_ticks: max_paused_ticks.max(1),
        }
    }

    pub(crate) fn push(&mut self, path: FilePath, callback: Option<LoadCallback>) {
        self.entries.push_back(QueuedLoad { path, callback });
    }

    pub(crate) fn pop(&mut self) -> Option<QueuedLoad> {
        self.entries.pop_front()
    }

    pub(crate) fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub(crate) fn set_current(&mut self, key: Option<String>) {
        self.current = key;
    }

    /// Stops the pump from starting new entries.
    pub fn pause(&mut self) {
        if !self.paused {
            log::debug!("Sequential load queue paused.");
        }
        self.paused = true;
    }

    /// Lets the pump start new entries again.
    pub fn resume(&mut self) {
        if self.paused {
            log::debug!("Sequential load queue resumed.");
        }
        self.paused = false;
        self.paused_ticks = 0;
    }

    /// Returns `true` while the queue is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of entries not yet started.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is queued or loading.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.current.is_none()
    }

    /// Called once per pump tick before any work is done.
    ///
    /// An idle queue never counts toward the stall valve.
    pub(crate) fn permit(&mut self) -> PumpPermit {
        if !self.paused {
            return PumpPermit::Run;
        }
        if self.is_empty() {
            return PumpPermit::Paused;
        }

        self.paused_ticks += 1;
        if self.paused_ticks >= self.max_paused_ticks {
            log::warn!(
                "Sequential load queue stayed paused for {} pump ticks; forcing resume.",
                self.paused_ticks
            );
            self.resume();
            PumpPermit::Run
        } else {
            PumpPermit::Paused
        }
    }
}

impl Default for SequentialQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAUSED_TICKS)
    }
}
