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


//! The loader's metric handles.

use loom_telemetry::{CounterHandle, GaugeHandle, MetricsRegistry, MetricsResult};

const NAMESPACE: &str = "loader";

/// A collection of metric handles updated by the loader.
#[derive(Debug, Clone)]
pub(crate) struct LoaderMetrics {
    files_loaded: CounterHandle,
    files_missing: CounterHandle,
    classes_resolved: CounterHandle,
    stalls_reported: CounterHandle,
    pending: GaugeHandle,
}

impl LoaderMetrics {
    pub(crate) fn new(registry: &MetricsRegistry) -> MetricsResult<Self> {
        Ok(Self {
            files_loaded: registry.register_counter(
                NAMESPACE,
                "files_loaded",
                "Source files fetched and injected",
            )?,
            files_missing: registry.register_counter(
                NAMESPACE,
                "files_missing",
                "Source files that could not be fetched or injected",
            )?,
            classes_resolved: registry.register_counter(
                NAMESPACE,
                "classes_resolved",
                "Class definitions materialized into the namespace",
            )?,
            stalls_reported: registry.register_counter(
                NAMESPACE,
                "stalls_reported",
                "Watchdog stall reports emitted",
            )?,
            pending: registry.register_gauge(
                NAMESPACE,
                "pending",
                "Definitions waiting in the pending queue",
                "count",
            )?,
        })
    }

    pub(crate) fn file_loaded(&self) {
        record(self.files_loaded.increment());
    }

    pub(crate) fn file_missing(&self) {
        record(self.files_missing.increment());
    }

    pub(crate) fn class_resolved(&self) {
        record(self.classes_resolved.increment());
    }

    pub(crate) fn stall_reported(&self) {
        record(self.stalls_reported.increment());
    }

    pub(crate) fn set_pending(&self, count: usize) {
        record(self.pending.set(count as f64));
    }
}

fn record<T>(result: MetricsResult<T>) {
    if let Err(e) = result {
        log::warn!("Failed to record loader metric: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_telemetry::{MetricId, MetricValue};

    #[test]
    fn test_handles_share_registry() {
        let registry = MetricsRegistry::new();
        let metrics = LoaderMetrics::new(&registry).unwrap();
        metrics.class_resolved();
        metrics.class_resolved();
        metrics.set_pending(3);

        let resolved = registry
            .get_metric(&MetricId::new("loader", "classes_resolved"))
            .unwrap();
        assert_eq!(resolved.value, MetricValue::Counter(2));
        let pending = registry.get_metric(&MetricId::new("loader", "pending")).unwrap();
        assert_eq!(pending.value, MetricValue::Gauge(3.0));
    }

    #[test]
    fn test_registering_twice_reuses_counters() {
        let registry = MetricsRegistry::new();
        let first = LoaderMetrics::new(&registry).unwrap();
        let second = LoaderMetrics::new(&registry).unwrap();
        first.file_loaded();
        second.file_loaded();

        let loaded = registry
            .get_metric(&MetricId::new("loader", "files_loaded"))
            .unwrap();
        assert_eq!(loaded.value, MetricValue::Counter(2));
    }
}
