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


//! Event-driven notifications emitted by the loader.
//!
//! The [`EventBus`] is a generic, thread-safe channel. The loader publishes
//! [`LoaderEvent`]s on it so that hosts can observe progress without polling the
//! resolved/pending sets.

mod bus;

pub use self::bus::EventBus;

use crate::path::{DottedPath, FilePath};

/// A notable state change inside the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEvent {
    /// A source artifact was fetched and injected.
    FileLoaded {
        /// The path as it was requested.
        path: FilePath,
    },
    /// A source artifact could not be fetched or injected.
    FileFailed {
        /// The path as it was requested.
        path: FilePath,
    },
    /// A class was installed into the namespace.
    Materialized {
        /// The installed class.
        class: DottedPath,
    },
    /// The watchdog found definitions that made no progress for a full window.
    Stalled {
        /// The names still pending when the report was taken.
        pending: Vec<DottedPath>,
    },
}
