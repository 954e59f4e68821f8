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


//! # Loom IO
//!
//! Fetches source artifacts and tracks their completion status.
//!
//! - [`SourceFetcher`] is the contract for retrieving bytes; [`MemoryFetcher`] and
//!   [`DirectoryFetcher`] are the bundled implementations.
//! - [`FileLoader`] deduplicates requests per sanitized path, caches the final
//!   [`LoadStatus`](loom_core::LoadStatus), and fans completions out to callbacks.
//! - [`SequentialQueue`] orders loads that must complete strictly one after another.

#![warn(missing_docs)]

mod fetch;
mod file_loader;
mod queue;

pub use fetch::{
    DirectoryFetcher, FetchCompletion, FetchError, FetchedSource, MemoryFetcher, SourceFetcher,
};
pub use file_loader::{FileLoader, LoadCallback, LoadRequest};
pub use queue::{SequentialQueue, DEFAULT_MAX_PAUSED_TICKS};
