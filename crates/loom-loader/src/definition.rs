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


//! Class definitions and the values they install.

use crate::Loader;
use loom_core::{DottedPath, FilePath, Manifest};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value stored in the namespace.
pub type Value = Arc<dyn Any + Send + Sync>;

/// A one-time hook run right after a value is installed.
pub type Hook = Box<dyn FnOnce(&mut Loader) + Send>;

/// Produces the value of a class at materialization time.
///
/// Factories receive the loader so they can look up their dependencies or submit
/// further definitions.
pub type Factory = Box<dyn FnOnce(&mut Loader) -> Export + Send>;

/// A value ready for installation, with its optional `on_resolved` hook.
pub struct Export {
    value: Value,
    on_resolved: Option<Hook>,
}

impl Export {
    /// Wraps a concrete value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value.
    pub fn from_arc(value: Value) -> Self {
        Self {
            value,
            on_resolved: None,
        }
    }

    /// A placeholder (`()`) that only reserves the namespace location.
    pub fn empty() -> Self {
        Self::new(())
    }

    /// Attaches the hook invoked once, immediately after installation.
    pub fn on_resolved(mut self, hook: impl FnOnce(&mut Loader) + Send + 'static) -> Self {
        self.on_resolved = Some(Box::new(hook));
        self
    }

    pub(crate) fn into_parts(self) -> (Value, Option<Hook>) {
        (self.value, self.on_resolved)
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("has_hook", &self.on_resolved.is_some())
            .finish_non_exhaustive()
    }
}

/// What a definition installs: either a factory invoked at materialization time, or
/// a ready-made value used as-is.
pub enum Installable {
    /// Called exactly once, when the definition resolves.
    Factory(Factory),
    /// Installed without any call.
    Value(Export),
}

impl Installable {
    /// Wraps a factory closure.
    pub fn factory(factory: impl FnOnce(&mut Loader) -> Export + Send + 'static) -> Self {
        Installable::Factory(Box::new(factory))
    }

    /// Wraps a plain value with no hook.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Installable::Value(Export::new(value))
    }

    pub(crate) fn produce(self, loader: &mut Loader) -> Export {
        match self {
            Installable::Factory(factory) => factory(loader),
            Installable::Value(export) => export,
        }
    }
}

impl From<Export> for Installable {
    fn from(export: Export) -> Self {
        Installable::Value(export)
    }
}

impl fmt::Debug for Installable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Installable::Factory(_) => f.write_str("Installable::Factory(..)"),
            Installable::Value(export) => write!(f, "Installable::Value({export:?})"),
        }
    }
}

/// A submitted class: its manifest plus what to install once it resolves.
#[derive(Debug)]
pub struct ClassDefinition {
    /// The declared name and requirements.
    pub manifest: Manifest,
    /// The payload installed at materialization.
    pub installable: Installable,
}

impl ClassDefinition {
    /// Pairs a manifest with its payload.
    pub fn new(manifest: Manifest, installable: impl Into<Installable>) -> Self {
        Self {
            manifest,
            installable: installable.into(),
        }
    }
}

/// The immutable bookkeeping kept for every accepted definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionRecord {
    /// The class name.
    pub name: DottedPath,
    /// Classes that must resolve first.
    pub requires: Vec<DottedPath>,
    /// Files that must load first.
    pub includes: Vec<FilePath>,
    /// Opaque bookkeeping identifiers.
    pub depends: Vec<String>,
}

impl DefinitionRecord {
    /// Returns `true` when nothing has to happen before materialization.
    pub fn is_unconstrained(&self) -> bool {
        self.requires.is_empty() && self.includes.is_empty()
    }

    /// Returns `true` if this definition directly requires `name`.
    pub fn requires_class(&self, name: &DottedPath) -> bool {
        self.requires.contains(name)
    }
}

/// How a successful submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The definition had no requirements and was materialized during the call.
    Resolved,
    /// The definition is waiting for classes or files.
    Pending,
}
