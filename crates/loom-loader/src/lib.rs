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


//! # Loom Loader
//!
//! A dependency-driven class loader. Hosts submit class definitions that name the
//! classes and files they need; the loader fetches what is missing, resolves the
//! dependency graph on a periodic tick, and installs every class into a hierarchical
//! [`Namespace`] exactly once, dependencies first.
//!
//! ```no_run
//! use loom_loader::{Installable, Loader, Manifest};
//! use loom_io::MemoryFetcher;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut loader = Loader::new(MemoryFetcher::new())?;
//! loader.define(Manifest::new("App.Leaf"), Installable::value("leaf"))?;
//! loader.define(
//!     Manifest::new("App.Branch").requires(["App.Leaf"]),
//!     Installable::value("branch"),
//! )?;
//!
//! while !loader.is_idle() {
//!     loader.update();
//! }
//! assert!(loader.is_resolved("App.Branch"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod definition;
mod error;
mod injector;
mod loader;
mod metrics;
mod namespace;
mod registry;
mod resolver;
mod watchdog;

pub use config::{ConfigError, LoaderConfig};
pub use definition::{
    ClassDefinition, DefinitionRecord, Export, Factory, Hook, Installable, SubmitOutcome, Value,
};
pub use error::LoaderError;
pub use injector::{
    FactoryCatalog, InjectError, Injector, ManifestInjector, NoopInjector, Script,
    ScriptInjector, SharedFactory,
};
pub use loader::{Loader, LoaderBuilder, UpdateSummary};
pub use namespace::Namespace;
pub use registry::DefinitionRegistry;
pub use resolver::{unresolved_requirements, Blockers, Resolver};
pub use watchdog::{StallReport, Watchdog};

pub use loom_core::{
    Clock, DefinitionError, DottedPath, FilePath, LoadStatus, LoaderEvent, Manifest,
    ManualClock, SystemClock,
};
