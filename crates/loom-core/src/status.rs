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

//! Completion status reported by the file loader.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of a fetch-and-inject operation.
///
/// There is deliberately no partial or retry state: a path either loaded or it did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadStatus {
    /// The artifact was fetched and injected.
    Loaded,
    /// The artifact could not be fetched, or injecting it failed.
    NotFound,
}

impl LoadStatus {
    /// Returns `true` for [`LoadStatus::Loaded`].
    pub fn is_loaded(self) -> bool {
        matches!(self, LoadStatus::Loaded)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loaded => f.write_str("LOADED"),
            LoadStatus::NotFound => f.write_str("NOT_FOUND"),
        }
    }
}
