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


//! The inject half of fetch-and-inject.
//!
//! Once a fetch delivers bytes, the loader hands them to its [`Injector`] before the
//! file's status is recorded. Whatever the injector submits is therefore already known
//! by the time anything waiting on the file is re-evaluated. A failed injection turns
//! the file into [`LoadStatus::NotFound`](loom_core::LoadStatus::NotFound).

use crate::definition::{ClassDefinition, Export, Installable};
use crate::Loader;
use anyhow::Context;
use loom_core::{DottedPath, FilePath, Manifest};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Evaluates a fetched source against the loader.
pub trait Injector: Send {
    /// Applies the side effects of `source`, typically by submitting definitions.
    fn inject(&mut self, path: &FilePath, source: &[u8], loader: &mut Loader)
        -> anyhow::Result<()>;
}

/// An injector that ignores every source. A fetched file counts as loaded as soon as
/// its bytes arrive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInjector;

impl Injector for NoopInjector {
    fn inject(&mut self, path: &FilePath, source: &[u8], _loader: &mut Loader) -> anyhow::Result<()> {
        log::trace!("Ignoring {} byte(s) from '{}'", source.len(), path);
        Ok(())
    }
}

/// A script run when its file is injected.
pub type Script = Box<dyn FnMut(&mut Loader) -> anyhow::Result<()> + Send>;

/// An injector mapping file paths to closures that stand in for the file's code.
///
/// Paths without a script inject nothing and still count as loaded.
#[derive(Default)]
pub struct ScriptInjector {
    scripts: HashMap<String, Script>,
}

impl ScriptInjector {
    /// Creates an injector with no scripts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the script run when `path` is injected.
    pub fn with_script(
        mut self,
        path: impl Into<FilePath>,
        script: impl FnMut(&mut Loader) -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        self.scripts.insert(path.into().key(), Box::new(script));
        self
    }

    /// Registers a script that submits a single definition.
    pub fn defining(
        self,
        path: impl Into<FilePath>,
        manifest: Manifest,
        value: impl Fn() -> Export + Send + 'static,
    ) -> Self {
        self.with_script(path, move |loader| {
            loader.submit(ClassDefinition::new(manifest.clone(), value()))?;
            Ok(())
        })
    }
}

impl fmt::Debug for ScriptInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&String> = self.scripts.keys().collect();
        paths.sort();
        f.debug_struct("ScriptInjector").field("paths", &paths).finish()
    }
}

impl Injector for ScriptInjector {
    fn inject(&mut self, path: &FilePath, _source: &[u8], loader: &mut Loader) -> anyhow::Result<()> {
        match self.scripts.get_mut(&path.key()) {
            Some(script) => script(loader).with_context(|| format!("script for '{path}' failed")),
            None => Ok(()),
        }
    }
}

/// A shared factory that can be invoked for every loader it is bound to.
pub type SharedFactory = Arc<dyn Fn(&mut Loader) -> Export + Send + Sync>;

/// Named factories that turn manifest entries into installable values.
#[derive(Clone, Default)]
pub struct FactoryCatalog {
    factories: HashMap<DottedPath, SharedFactory>,
}

impl FactoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory used for `class`.
    pub fn register(
        &mut self,
        class: impl Into<DottedPath>,
        factory: impl Fn(&mut Loader) -> Export + Send + Sync + 'static,
    ) {
        self.factories.insert(class.into(), Arc::new(factory));
    }

    /// Builder-style variant of [`register`](FactoryCatalog::register).
    pub fn with(
        mut self,
        class: impl Into<DottedPath>,
        factory: impl Fn(&mut Loader) -> Export + Send + Sync + 'static,
    ) -> Self {
        self.register(class, factory);
        self
    }

    /// Returns `true` if a factory is registered for `class`.
    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// The payload for `class`: its factory if registered, an empty value otherwise.
    pub fn installable_for(&self, class: Option<&DottedPath>) -> Installable {
        match class.and_then(|class| self.factories.get(class)) {
            Some(factory) => {
                let factory = Arc::clone(factory);
                Installable::factory(move |loader| factory(loader))
            }
            None => Installable::Value(Export::empty()),
        }
    }
}

impl fmt::Debug for FactoryCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&DottedPath> = self.factories.keys().collect();
        classes.sort();
        f.debug_struct("FactoryCatalog").field("classes", &classes).finish()
    }
}

/// Why a manifest file could not be read.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The source is not valid UTF-8.
    #[error("source is not UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    /// The JSON manifest list is malformed.
    #[error("invalid JSON manifest: {0}")]
    Json(#[from] serde_json::Error),
    /// The RON manifest list is malformed.
    #[error("invalid RON manifest: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// An injector that reads manifest lists and submits one definition per entry.
///
/// Files ending in `.ron` are parsed as RON lists, anything else as JSON (a single
/// object or a list). Each entry is bound to the factory registered for its class in
/// the [`FactoryCatalog`], or installs an empty value when there is none.
#[derive(Debug, Clone, Default)]
pub struct ManifestInjector {
    catalog: FactoryCatalog,
}

impl ManifestInjector {
    /// Creates an injector using `catalog` for payloads.
    pub fn new(catalog: FactoryCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog consulted for payloads.
    pub fn catalog(&self) -> &FactoryCatalog {
        &self.catalog
    }

    /// Parses the manifests contained in `source`.
    pub fn parse(path: &FilePath, source: &[u8]) -> Result<Vec<Manifest>, InjectError> {
        let text = std::str::from_utf8(source)?;
        if path.as_str().ends_with(".ron") {
            let options = ron::Options::default()
                .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME);
            Ok(options.from_str(text)?)
        } else {
            Ok(Manifest::list_from_json(text)?)
        }
    }
}

impl Injector for ManifestInjector {
    fn inject(&mut self, path: &FilePath, source: &[u8], loader: &mut Loader) -> anyhow::Result<()> {
        let manifests =
            Self::parse(path, source).with_context(|| format!("failed to parse '{path}'"))?;
        log::debug!("'{}' declares {} definition(s)", path, manifests.len());

        let mut first_error = None;
        for manifest in manifests {
            let installable = self.catalog.installable_for(manifest.class.as_ref());
            if let Err(e) = loader.submit(ClassDefinition::new(manifest, installable)) {
                log::warn!("Rejected definition from '{}': {}", path, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e).with_context(|| format!("'{path}' contains an invalid definition")),
            None => Ok(()),
        }
    }
}
