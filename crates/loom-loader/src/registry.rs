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


//! The definition registry: every accepted definition, the pending queue, and the
//! resolved set.

use crate::definition::{ClassDefinition, DefinitionRecord, Installable, SubmitOutcome};
use crate::Loader;
use loom_core::{DefinitionError, DottedPath};
use std::collections::{HashMap, HashSet};

/// Bookkeeping for submitted definitions.
///
/// Records are kept forever, including after resolution, so diagnostics can list
/// every known definition. Payloads are only held while a definition is pending.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    records: HashMap<DottedPath, DefinitionRecord>,
    submission_order: Vec<DottedPath>,
    pending: Vec<DottedPath>,
    payloads: HashMap<DottedPath, Installable>,
    resolved: HashSet<DottedPath>,
    resolution_order: Vec<DottedPath>,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and records a definition, handing its payload back to the caller.
    pub fn admit(
        &mut self,
        definition: ClassDefinition,
    ) -> Result<(DefinitionRecord, Installable), DefinitionError> {
        let ClassDefinition {
            manifest,
            installable,
        } = definition;

        let name = manifest
            .class
            .filter(|name| !name.is_blank())
            .ok_or(DefinitionError::MissingClass)?;
        if self.records.contains_key(&name) {
            return Err(DefinitionError::Duplicate(name));
        }

        let record = DefinitionRecord {
            name: name.clone(),
            requires: manifest.requires,
            includes: manifest.includes,
            depends: manifest.depends,
        };
        self.records.insert(name.clone(), record.clone());
        self.submission_order.push(name);
        Ok((record, installable))
    }

    /// Appends an admitted definition to the pending queue.
    pub fn enqueue(&mut self, name: DottedPath, installable: Installable) {
        self.payloads.insert(name.clone(), installable);
        self.pending.push(name);
    }

    /// Removes `name` from the pending queue and returns its payload.
    pub fn take_pending(&mut self, name: &DottedPath) -> Option<Installable> {
        let position = self.pending.iter().position(|pending| pending == name)?;
        self.pending.remove(position);
        self.payloads.remove(name)
    }

    /// Adds `name` to the resolved set. Returns `false` if it was already there.
    pub fn mark_resolved(&mut self, name: DottedPath) -> bool {
        if self.resolved.insert(name.clone()) {
            self.resolution_order.push(name);
            true
        } else {
            false
        }
    }

    /// Returns `true` once `name` has been materialized.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.resolved.contains(name)
    }

    /// Returns `true` if a definition named `name` was accepted.
    pub fn is_known(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Returns `true` while `name` waits in the pending queue.
    pub fn is_pending(&self, name: &str) -> bool {
        self.payloads.contains_key(name)
    }

    /// The record of `name`, if known.
    pub fn record(&self, name: &str) -> Option<&DefinitionRecord> {
        self.records.get(name)
    }

    /// Pending names in submission order.
    pub fn pending(&self) -> &[DottedPath] {
        &self.pending
    }

    /// Resolved names in the order they were materialized.
    pub fn resolution_order(&self) -> &[DottedPath] {
        &self.resolution_order
    }

    /// Every accepted record, in submission order.
    pub fn records(&self) -> impl Iterator<Item = &DefinitionRecord> {
        self.submission_order
            .iter()
            .filter_map(|name| self.records.get(name))
    }
}

impl Loader {
    /// Submits a class definition.
    ///
    /// A definition without `requires` and `includes` is materialized before this call
    /// returns. Anything else joins the pending queue: missing include files are
    /// fetched, unknown required classes have their backing file fetched, and a
    /// resolver tick is scheduled.
    ///
    /// # Errors
    /// [`DefinitionError::MissingClass`] if the manifest has no name and
    /// [`DefinitionError::Duplicate`] if the name was already submitted. Neither
    /// changes the loader's state.
    pub fn submit(&mut self, definition: ClassDefinition) -> Result<SubmitOutcome, DefinitionError> {
        let (record, installable) = self.registry.admit(definition)?;

        if record.is_unconstrained() {
            log::debug!("'{}' has no requirements; materializing now.", record.name);
            self.materialize(record.name, installable);
            return Ok(SubmitOutcome::Resolved);
        }

        for file in &record.includes {
            if !self.files.is_known(file) {
                self.files.load(file, None);
            }
        }
        for class in &record.requires {
            if self.registry.is_resolved(class.as_str()) || self.registry.is_known(class.as_str()) {
                continue;
            }
            let file = self.rules.file_for(class);
            if !self.files.is_known(&file) {
                log::debug!("'{}' requires unknown '{}'; fetching '{}'", record.name, class, file);
                self.files.load(&file, None);
            }
        }

        let now = self.clock.now();
        let was_idle = self.registry.pending().is_empty();
        self.registry.enqueue(record.name, installable);
        self.resolver.schedule(now);
        if was_idle {
            self.watchdog.arm(now);
        }
        Ok(SubmitOutcome::Pending)
    }
}
