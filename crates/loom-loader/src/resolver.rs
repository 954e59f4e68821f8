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


//! The dependency resolver tick.
//!
//! Each tick walks a snapshot of the pending queue taken at tick start. A definition
//! whose requirements are all satisfied is materialized and leaves the queue.
//! Definitions submitted while the tick runs (from a factory or a hook) are not in
//! the snapshot and wait for the next tick.
//!
//! A direct two-node cycle (A requires B, B requires A) is tolerated: when computing
//! what A still waits for, an unresolved B that itself requires A is ignored, so one
//! side resolves and unblocks the other. Longer cycles are left alone and stay
//! pending until the watchdog reports them.

use crate::definition::DefinitionRecord;
use crate::registry::DefinitionRegistry;
use crate::Loader;
use loom_core::{DottedPath, FilePath};
use loom_io::FileLoader;
use serde::Serialize;
use std::time::{Duration, Instant};

/// What a pending definition is still waiting for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Blockers {
    /// Required classes not yet resolved (after the cycle tie-break).
    pub classes: Vec<DottedPath>,
    /// Included files not yet loaded.
    pub files: Vec<FilePath>,
}

impl Blockers {
    /// Returns `true` when nothing blocks materialization.
    pub fn is_clear(&self) -> bool {
        self.classes.is_empty() && self.files.is_empty()
    }
}

/// Computes what `record` is still waiting for.
pub fn unresolved_requirements(
    record: &DefinitionRecord,
    registry: &DefinitionRegistry,
    files: &FileLoader,
) -> Blockers {
    let classes = record
        .requires
        .iter()
        .filter(|class| !registry.is_resolved(class.as_str()))
        .filter(|class| {
            let mutual = registry
                .record(class.as_str())
                .is_some_and(|other| other.requires_class(&record.name));
            !mutual
        })
        .cloned()
        .collect();

    let files = record
        .includes
        .iter()
        .filter(|file| !files.is_loaded(file))
        .cloned()
        .collect();

    Blockers { classes, files }
}

/// The tick schedule.
#[derive(Debug, Clone)]
pub struct Resolver {
    interval: Duration,
    next_tick: Option<Instant>,
    ticks_run: u64,
}

impl Resolver {
    /// Creates an idle resolver ticking every `interval` while work is pending.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_tick: None,
            ticks_run: 0,
        }
    }

    /// Schedules a tick one interval from `now`, unless one is already scheduled.
    pub fn schedule(&mut self, now: Instant) {
        if self.next_tick.is_none() {
            self.next_tick = Some(now + self.interval);
        }
    }

    /// Returns `true` if a tick is scheduled.
    pub fn is_scheduled(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Returns `true` if a scheduled tick is due at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.next_tick.is_some_and(|at| now >= at)
    }

    /// Reschedules after a tick, or clears the timer when nothing is pending.
    pub fn finish_tick(&mut self, now: Instant, has_pending: bool) {
        self.ticks_run += 1;
        self.next_tick = has_pending.then(|| now + self.interval);
    }

    /// Number of ticks run so far.
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }
}

impl Loader {
    /// Runs one resolver tick and returns how many definitions were materialized.
    pub(crate) fn run_tick(&mut self, now: Instant) -> usize {
        let snapshot: Vec<DottedPath> = self.registry.pending().to_vec();
        let mut progressed = 0;

        for name in snapshot {
            let Some(record) = self.registry.record(name.as_str()) else {
                continue;
            };
            if !unresolved_requirements(record, &self.registry, &self.files).is_clear() {
                continue;
            }
            if let Some(installable) = self.registry.take_pending(&name) {
                self.materialize(name, installable);
                progressed += 1;
            }
        }

        if progressed > 0 {
            log::debug!("Resolver tick materialized {} definition(s).", progressed);
            self.watchdog.record_progress(now);
        }
        let has_pending = !self.registry.pending().is_empty();
        self.resolver.finish_tick(now, has_pending);
        progressed
    }
}
