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


//! # Loom Core
//!
//! Foundational crate containing the identifiers, manifests, and interface contracts
//! shared by the file loader and the dependency resolver.

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod event;
pub mod graph;
pub mod manifest;
pub mod path;
pub mod status;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::DefinitionError;
pub use event::{EventBus, LoaderEvent};
pub use manifest::Manifest;
pub use path::{DottedPath, FilePath, PathRules};
pub use status::LoadStatus;
