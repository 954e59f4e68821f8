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


//! The fetch half of fetch-and-inject.
//!
//! A [`SourceFetcher`] receives a path and a [`FetchCompletion`]. It may finish the
//! completion immediately, later from another thread, or never. Completions travel
//! over a channel and are only applied when the owning loader drains them, so the
//! loader's state is always mutated on its own thread.

use crossbeam_channel::Sender;
use loom_core::FilePath;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use thiserror::Error;

/// Why a fetch did not produce any bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Nothing exists at the requested path.
    #[error("source '{0}' was not found")]
    NotFound(FilePath),
    /// The source exists but reading it failed.
    #[error("failed to read source '{path}': {source}")]
    Io {
        /// The requested path.
        path: FilePath,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The result of one fetch, as delivered back to the loader.
#[derive(Debug)]
pub struct FetchedSource {
    /// The path exactly as it was requested.
    pub path: FilePath,
    /// The fetched bytes, or why there are none.
    pub result: Result<Vec<u8>, FetchError>,
}

/// A one-shot handle used by a fetcher to report the outcome of a fetch.
#[derive(Debug)]
pub struct FetchCompletion {
    path: FilePath,
    sender: Sender<FetchedSource>,
}

impl FetchCompletion {
    pub(crate) fn new(path: FilePath, sender: Sender<FetchedSource>) -> Self {
        Self { path, sender }
    }

    /// The path this completion belongs to.
    pub fn path(&self) -> &FilePath {
        &self.path
    }

    /// Reports the outcome. A dropped loader simply discards the result.
    pub fn complete(self, result: Result<Vec<u8>, FetchError>) {
        let fetched = FetchedSource {
            path: self.path,
            result,
        };
        if self.sender.send(fetched).is_err() {
            log::debug!("Fetch completed after its loader was dropped.");
        }
    }
}

/// Retrieves the raw bytes of a source artifact.
pub trait SourceFetcher: Send {
    /// Starts fetching `path`. The fetcher must eventually call
    /// [`FetchCompletion::complete`] unless the fetch stalls forever.
    fn fetch(&mut self, path: &FilePath, completion: FetchCompletion);
}

#[derive(Debug, Default)]
struct MemoryState {
    sources: HashMap<String, Vec<u8>>,
    held: HashSet<String>,
    parked: Vec<FetchCompletion>,
    requests: Vec<FilePath>,
}

/// An in-memory fetcher backed by a path-to-bytes table.
///
/// Clones share the same table, so a host or test can keep a handle after giving one
/// to the loader. Completions are sent right away and become visible on the loader's
/// next update. Paths marked with [`hold`](MemoryFetcher::hold) are parked until
/// [`release`](MemoryFetcher::release) is called, which simulates a slow network.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFetcher {
    /// Creates an empty fetcher. Every fetch reports [`FetchError::NotFound`].
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds or replaces the source stored at `path`.
    pub fn insert(&self, path: impl Into<FilePath>, bytes: impl Into<Vec<u8>>) {
        self.state().sources.insert(path.into().key(), bytes.into());
    }

    /// Builder-style variant of [`insert`](MemoryFetcher::insert).
    pub fn with_source(self, path: impl Into<FilePath>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Parks every future fetch of `path` until it is released.
    pub fn hold(&self, path: impl Into<FilePath>) {
        self.state().held.insert(path.into().key());
    }

    /// Stops holding `path` and completes any fetch parked on it.
    pub fn release(&self, path: impl Into<FilePath>) {
        let key = path.into().key();
        let ready: Vec<(FetchCompletion, Result<Vec<u8>, FetchError>)> = {
            let mut state = self.state();
            state.held.remove(&key);
            let (ready, parked): (Vec<_>, Vec<_>) = std::mem::take(&mut state.parked)
                .into_iter()
                .partition(|completion| completion.path().key() == key);
            state.parked = parked;
            ready
                .into_iter()
                .map(|completion| {
                    let result = lookup(&state.sources, completion.path());
                    (completion, result)
                })
                .collect()
        };
        for (completion, result) in ready {
            completion.complete(result);
        }
    }

    /// Every path requested so far, in request order.
    pub fn requests(&self) -> Vec<FilePath> {
        self.state().requests.clone()
    }

    /// How many times `path` was requested.
    pub fn request_count(&self, path: impl Into<FilePath>) -> usize {
        let key = path.into().key();
        self.state()
            .requests
            .iter()
            .filter(|requested| requested.key() == key)
            .count()
    }
}

fn lookup(sources: &HashMap<String, Vec<u8>>, path: &FilePath) -> Result<Vec<u8>, FetchError> {
    sources
        .get(&path.key())
        .cloned()
        .ok_or_else(|| FetchError::NotFound(path.clone()))
}

impl SourceFetcher for MemoryFetcher {
    fn fetch(&mut self, path: &FilePath, completion: FetchCompletion) {
        let result = {
            let mut state = self.state();
            state.requests.push(path.clone());
            if state.held.contains(&path.key()) {
                log::trace!("Holding fetch of '{}'.", path);
                state.parked.push(completion);
                return;
            }
            lookup(&state.sources, path)
        };
        completion.complete(result);
    }
}

/// A fetcher that reads sources from a directory on disk.
///
/// Each fetch runs on its own short-lived worker thread; the result comes back over
/// the completion channel. Paths are resolved against the root after sanitizing, so
/// `/objects/foo.js` reads `<root>/objects/foo.js`.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    /// Creates a fetcher rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The directory sources are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceFetcher for DirectoryFetcher {
    fn fetch(&mut self, path: &FilePath, completion: FetchCompletion) {
        let full_path = self.root.join(path.relative());
        let requested = path.clone();
        log::trace!("Reading '{}' from {:?}", requested, full_path);

        thread::spawn(move || {
            let result = std::fs::read(&full_path).map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    FetchError::NotFound(requested)
                } else {
                    FetchError::Io {
                        path: requested,
                        source,
                    }
                }
            });
            completion.complete(result);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn memory_fetcher_completes_immediately() {
        let (tx, rx) = unbounded();
        let mut fetcher = MemoryFetcher::new().with_source("/a.js", b"alpha".to_vec());

        fetcher.fetch(&FilePath::from("./a.js"), FetchCompletion::new("./a.js".into(), tx));

        let fetched = rx.try_recv().expect("completion should be queued");
        assert_eq!(fetched.path, FilePath::from("./a.js"));
        assert_eq!(fetched.result.unwrap(), b"alpha".to_vec());
    }

    #[test]
    fn memory_fetcher_reports_missing_sources() {
        let (tx, rx) = unbounded();
        let mut fetcher = MemoryFetcher::new();

        fetcher.fetch(&FilePath::from("/gone.js"), FetchCompletion::new("/gone.js".into(), tx));

        let fetched = rx.try_recv().unwrap();
        assert!(matches!(fetched.result, Err(FetchError::NotFound(_))));
    }

    #[test]
    fn memory_fetcher_holds_until_released() {
        let (tx, rx) = unbounded();
        let handle = MemoryFetcher::new().with_source("/slow.js", b"slow".to_vec());
        handle.hold("/slow.js");
        let mut fetcher = handle.clone();

        fetcher.fetch(&FilePath::from("/slow.js"), FetchCompletion::new("/slow.js".into(), tx));
        assert!(rx.try_recv().is_err());
        assert_eq!(handle.request_count("/slow.js"), 1);

        handle.release("/slow.js");
        assert_eq!(rx.try_recv().unwrap().result.unwrap(), b"slow".to_vec());
    }
}
