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


//! Stall detection.
//!
//! The watchdog holds a single deadline. It is armed when the pending queue stops
//! being empty and pushed back a full window whenever a resolver tick makes progress.
//! Every check interval the deadline is compared against the clock; if it has passed
//! while definitions are still pending, one [`StallReport`] is emitted and the
//! deadline is rearmed. The watchdog never fails or cancels anything.

use crate::definition::DefinitionRecord;
use crate::resolver::{unresolved_requirements, Blockers};
use crate::Loader;
use loom_core::graph::topological_sort;
use loom_core::{DottedPath, LoadStatus, LoaderEvent};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// The deadline timer.
#[derive(Debug, Clone)]
pub struct Watchdog {
    window: Duration,
    check_interval: Duration,
    deadline: Option<Instant>,
    next_check: Option<Instant>,
    reports_emitted: u64,
}

impl Watchdog {
    /// Creates a disarmed watchdog.
    pub fn new(window: Duration, check_interval: Duration) -> Self {
        Self {
            window,
            check_interval,
            deadline: None,
            next_check: None,
            reports_emitted: 0,
        }
    }

    /// Sets the deadline one window from `now` and starts the check cadence.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
        if self.next_check.is_none() {
            self.next_check = Some(now + self.check_interval);
        }
    }

    /// Pushes the deadline back after a tick that materialized something.
    pub fn record_progress(&mut self, now: Instant) {
        if self.deadline.is_some() {
            self.deadline = Some(now + self.window);
        }
    }

    /// Returns `true` once a deadline has been set.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The current deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Runs a check if one is due. Returns `true` when a stall should be reported,
    /// in which case the deadline has already been rearmed.
    pub fn check(&mut self, now: Instant, has_pending: bool) -> bool {
        match self.next_check {
            Some(at) if now >= at => self.next_check = Some(now + self.check_interval),
            _ => return false,
        }

        let expired = self.deadline.is_some_and(|deadline| now >= deadline);
        if expired && has_pending {
            self.deadline = Some(now + self.window);
            self.reports_emitted += 1;
            true
        } else {
            false
        }
    }

    /// Number of stalls reported so far.
    pub fn reports_emitted(&self) -> u64 {
        self.reports_emitted
    }
}

/// A diagnostic snapshot of a resolution stall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StallReport {
    /// Resolved names, in materialization order.
    pub resolved: Vec<DottedPath>,
    /// Pending names, in submission order.
    pub pending: Vec<DottedPath>,
    /// Every definition ever accepted.
    pub known: Vec<DefinitionRecord>,
    /// What each pending definition is still waiting for.
    pub waiting_on: BTreeMap<DottedPath, Blockers>,
    /// Pending names caught in, or downstream of, a dependency cycle.
    pub cycles: Vec<DottedPath>,
    /// Cache keys of files that failed to load.
    pub missing_files: Vec<String>,
}

impl StallReport {
    /// Pretty-printed JSON form of the report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Returns `true` if `name` was pending when the report was taken.
    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.iter().any(|pending| pending.as_str() == name)
    }
}

impl Loader {
    /// Builds a report of the current resolution state.
    pub fn stall_report(&self) -> StallReport {
        let pending = self.registry.pending().to_vec();

        let waiting_on = pending
            .iter()
            .filter_map(|name| self.registry.record(name.as_str()))
            .map(|record| {
                (
                    record.name.clone(),
                    unresolved_requirements(record, &self.registry, &self.files),
                )
            })
            .collect();

        let edges: Vec<(DottedPath, DottedPath)> = pending
            .iter()
            .filter_map(|name| self.registry.record(name.as_str()))
            .flat_map(|record| {
                record
                    .requires
                    .iter()
                    .map(move |required| (required.clone(), record.name.clone()))
            })
            .collect();
        let cycles = match topological_sort(pending.iter().cloned(), edges) {
            Ok(_) => Vec::new(),
            Err(cycle) => cycle.remaining,
        };

        StallReport {
            resolved: self.registry.resolution_order().to_vec(),
            pending,
            known: self.registry.records().cloned().collect(),
            waiting_on,
            cycles,
            missing_files: self.files.paths_with_status(LoadStatus::NotFound),
        }
    }

    /// Runs the watchdog check and emits a report if resolution has stalled.
    ///
    /// Returns `true` if a report was emitted.
    pub(crate) fn check_watchdog(&mut self, now: Instant) -> bool {
        let has_pending = !self.registry.pending().is_empty();
        if !self.watchdog.check(now, has_pending) {
            return false;
        }

        let report = self.stall_report();
        log::warn!(
            "Resolution stalled: {} definition(s) pending with no progress for {:?}: {:?}",
            report.pending.len(),
            self.config.watchdog_window(),
            report.pending
        );
        match report.to_json() {
            Ok(json) => log::warn!("Stall report:\n{}", json),
            Err(e) => log::error!("Failed to serialize stall report: {}", e),
        }

        self.metrics.stall_reported();
        self.events.publish(LoaderEvent::Stalled {
            pending: report.pending.clone(),
        });
        self.last_stall_report = Some(report);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);
    const CHECK: Duration = Duration::from_secs(1);

    #[test]
    fn test_disarmed_watchdog_never_fires() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(WINDOW, CHECK);
        assert!(!watchdog.check(start + WINDOW * 2, true));
        assert!(!watchdog.is_armed());
    }

    #[test]
    fn test_fires_once_per_window() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(WINDOW, CHECK);
        watchdog.arm(start);

        assert!(!watchdog.check(start + Duration::from_secs(9), true));
        assert!(watchdog.check(start + Duration::from_secs(10), true));
        assert!(!watchdog.check(start + Duration::from_secs(11), true));
        assert!(watchdog.check(start + Duration::from_secs(20), true));
        assert_eq!(watchdog.reports_emitted(), 2);
    }

    #[test]
    fn test_progress_pushes_deadline_back() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(WINDOW, CHECK);
        watchdog.arm(start);
        watchdog.record_progress(start + Duration::from_secs(8));

        assert!(!watchdog.check(start + Duration::from_secs(12), true));
        assert!(watchdog.check(start + Duration::from_secs(18), true));
    }

    #[test]
    fn test_nothing_pending_is_not_a_stall() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(WINDOW, CHECK);
        watchdog.arm(start);
        assert!(!watchdog.check(start + WINDOW, false));
        assert_eq!(watchdog.reports_emitted(), 0);
    }

    #[test]
    fn test_checks_respect_interval() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(Duration::from_millis(100), CHECK);
        watchdog.arm(start);

        // The deadline passes at 100ms but the first check is only due at 1s.
        assert!(!watchdog.check(start + Duration::from_millis(500), true));
        assert!(watchdog.check(start + CHECK, true));
    }
}
