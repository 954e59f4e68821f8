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


//! Fetch-and-inject bookkeeping with a per-path status cache.

use crate::fetch::{FetchCompletion, FetchedSource, SourceFetcher};
use crate::queue::{PumpPermit, SequentialQueue};
use crossbeam_channel::{Receiver, Sender};
use loom_core::{FilePath, LoadStatus};
use std::collections::HashMap;

/// Invoked once with the final status of a load.
pub type LoadCallback = Box<dyn FnOnce(&FilePath, LoadStatus) + Send>;

/// How a [`FileLoader::load`] request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    /// The path had already completed; the callback ran immediately.
    Cached(LoadStatus),
    /// A fetch for the path was already in flight; the callback was queued on it.
    Joined,
    /// A new fetch was started.
    Started,
}

enum Entry {
    InFlight(Vec<LoadCallback>),
    Done(LoadStatus),
}

/// Starts fetches, remembers their outcome, and fans completions out to callbacks.
///
/// Entries are keyed by [`FilePath::key`], so every spelling of a path shares one
/// fetch. A completed status is final: a path that was `NotFound` is never retried.
pub struct FileLoader {
    fetcher: Box<dyn SourceFetcher>,
    entries: HashMap<String, Entry>,
    completion_tx: Sender<FetchedSource>,
    completion_rx: Receiver<FetchedSource>,
    queue: SequentialQueue,
}

impl FileLoader {
    /// Creates a loader fetching through `fetcher`.
    pub fn new(fetcher: impl SourceFetcher + 'static) -> Self {
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();
        Self {
            fetcher: Box::new(fetcher),
            entries: HashMap::new(),
            completion_tx,
            completion_rx,
            queue: SequentialQueue::default(),
        }
    }

    /// Replaces the sequential queue's stall valve threshold.
    pub fn with_max_paused_ticks(mut self, max_paused_ticks: u32) -> Self {
        self.queue = SequentialQueue::new(max_paused_ticks);
        self
    }

    /// Requests `path`, running `callback` once its status is known.
    pub fn load(&mut self, path: &FilePath, callback: Option<LoadCallback>) -> LoadRequest {
        let key = path.key();
        match self.entries.get_mut(&key) {
            Some(Entry::Done(status)) => {
                let status = *status;
                if let Some(callback) = callback {
                    callback(path, status);
                }
                LoadRequest::Cached(status)
            }
            Some(Entry::InFlight(waiters)) => {
                waiters.extend(callback);
                LoadRequest::Joined
            }
            None => {
                log::debug!("Fetching '{}'", path);
                self.entries
                    .insert(key, Entry::InFlight(callback.into_iter().collect()));
                let completion = FetchCompletion::new(path.clone(), self.completion_tx.clone());
                self.fetcher.fetch(path, completion);
                LoadRequest::Started
            }
        }
    }

    /// The final status of `path`, if it has completed.
    pub fn status(&self, path: &FilePath) -> Option<LoadStatus> {
        match self.entries.get(&path.key()) {
            Some(Entry::Done(status)) => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if `path` completed with [`LoadStatus::Loaded`].
    pub fn is_loaded(&self, path: &FilePath) -> bool {
        self.status(path).is_some_and(LoadStatus::is_loaded)
    }

    /// Returns `true` while a fetch for `path` is outstanding.
    pub fn is_in_flight(&self, path: &FilePath) -> bool {
        matches!(self.entries.get(&path.key()), Some(Entry::InFlight(_)))
    }

    /// Returns `true` if `path` was ever requested.
    pub fn is_known(&self, path: &FilePath) -> bool {
        self.entries.contains_key(&path.key())
    }

    /// Number of fetches still outstanding.
    pub fn in_flight_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| matches!(entry, Entry::InFlight(_)))
            .count()
    }

    /// Sorted cache keys of every path that completed with the given status.
    pub fn paths_with_status(&self, wanted: LoadStatus) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Done(status) if *status == wanted))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Returns `true` when nothing is in flight and the sequential queue is drained.
    pub fn is_idle(&self) -> bool {
        self.in_flight_count() == 0 && self.queue.is_empty()
    }

    /// Takes every fetch result delivered since the last call.
    ///
    /// Results are not applied: the caller injects the bytes and then reports the final
    /// status through [`complete`](FileLoader::complete).
    pub fn poll_arrivals(&mut self) -> Vec<FetchedSource> {
        self.completion_rx.try_iter().collect()
    }

    /// Records the final status of `path` and fires every callback waiting on it.
    ///
    /// The first completion wins; later ones for the same path are ignored.
    pub fn complete(&mut self, path: &FilePath, status: LoadStatus) {
        let key = path.key();
        if let Some(Entry::Done(previous)) = self.entries.get(&key) {
            log::debug!(
                "Ignoring {} for '{}': already completed as {}",
                status,
                path,
                previous
            );
            return;
        }

        match status {
            LoadStatus::Loaded => log::debug!("Loaded '{}'", path),
            LoadStatus::NotFound => log::warn!("Failed to load '{}' ({})", path, status),
        }

        if let Some(Entry::InFlight(waiters)) = self.entries.insert(key, Entry::Done(status)) {
            for waiter in waiters {
                waiter(path, status);
            }
        }
    }

    /// Applies pending arrivals without any injection step, then pumps the queue.
    ///
    /// Returns the completions applied, in arrival order.
    pub fn update(&mut self) -> Vec<(FilePath, LoadStatus)> {
        let mut applied = Vec::new();
        for fetched in self.poll_arrivals() {
            let status = match &fetched.result {
                Ok(_) => LoadStatus::Loaded,
                Err(e) => {
                    log::debug!("{e}");
                    LoadStatus::NotFound
                }
            };
            self.complete(&fetched.path, status);
            applied.push((fetched.path, status));
        }
        self.pump_queue();
        applied
    }

    /// Appends `path` to the sequential queue.
    pub fn enqueue(&mut self, path: impl Into<FilePath>) {
        self.queue.push(path.into(), None);
    }

    /// Appends `path` to the sequential queue with a completion callback.
    pub fn enqueue_with(&mut self, path: impl Into<FilePath>, callback: LoadCallback) {
        self.queue.push(path.into(), Some(callback));
    }

    /// Pauses the sequential queue.
    pub fn pause(&mut self) {
        self.queue.pause();
    }

    /// Resumes the sequential queue.
    pub fn resume(&mut self) {
        self.queue.resume();
    }

    /// Returns `true` while the sequential queue is paused.
    pub fn is_paused(&self) -> bool {
        self.queue.is_paused()
    }

    /// Read access to the sequential queue.
    pub fn queue(&self) -> &SequentialQueue {
        &self.queue
    }

    /// Advances the sequential queue by one pump tick.
    ///
    /// The next entry starts only after the current one has completed. Entries whose
    /// path is already cached complete on the spot, so the pump moves past them within
    /// the same tick.
    pub fn pump_queue(&mut self) {
        if self.queue.permit() == PumpPermit::Paused {
            return;
        }

        let current_done = self
            .queue
            .current()
            .map(|key| matches!(self.entries.get(key), Some(Entry::Done(_))));
        match current_done {
            Some(false) => return,
            Some(true) => self.queue.set_current(None),
            None => {}
        }

        while let Some(next) = self.queue.pop() {
            log::debug!("Starting sequential load of '{}'", next.path);
            self.queue.set_current(Some(next.path.key()));
            match self.load(&next.path, next.callback) {
                LoadRequest::Cached(_) => self.queue.set_current(None),
                LoadRequest::Joined | LoadRequest::Started => break,
            }
        }
    }
}
