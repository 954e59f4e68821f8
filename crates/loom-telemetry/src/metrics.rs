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


//! Counters and gauges describing loader activity.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A unique identifier for a metric, namespaced to avoid collisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MetricId {
    /// The subsystem the metric belongs to (e.g. `"loader"`).
    pub namespace: String,
    /// The metric name within its namespace (e.g. `"classes_resolved"`).
    pub name: String,
}

impl MetricId {
    /// Creates a new metric id.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// The kind of a metric, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricType {
    /// A monotonically increasing count.
    Counter,
    /// A value that can go up and down.
    Gauge,
}

/// The current value of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MetricValue {
    /// A counter value.
    Counter(u64),
    /// A gauge value.
    Gauge(f64),
}

impl MetricValue {
    fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
        }
    }
}

/// A registered metric and its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    /// The metric's identifier.
    pub id: MetricId,
    /// A human-readable description.
    pub description: String,
    /// The unit of a gauge (empty for counters).
    pub unit: String,
    /// The current value.
    pub value: MetricValue,
}

/// A convenience type alias for metric results.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// The requested metric was not found in the registry.
    MetricNotFound(MetricId),
    /// An operation was attempted on a metric of the wrong type.
    TypeMismatch {
        /// The expected metric type for the operation.
        expected: MetricType,
        /// The actual metric type that was found.
        found: MetricType,
    },
    /// The registry lock was poisoned by a panicking writer.
    StorageError(String),
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::MetricNotFound(id) => write!(f, "Metric not found: {id}"),
            MetricsError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected:?}, found {found:?}")
            }
            MetricsError::StorageError(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for MetricsError {}

type Store = Arc<RwLock<HashMap<MetricId, Metric>>>;

fn read(store: &Store) -> MetricsResult<RwLockReadGuard<'_, HashMap<MetricId, Metric>>> {
    store
        .read()
        .map_err(|e| MetricsError::StorageError(e.to_string()))
}

fn write(store: &Store) -> MetricsResult<RwLockWriteGuard<'_, HashMap<MetricId, Metric>>> {
    store
        .write()
        .map_err(|e| MetricsError::StorageError(e.to_string()))
}

/// The central registry holding every metric.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    store: Store,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a counter starting at zero. Registering an existing id returns a
    /// handle to the existing counter.
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        let id = MetricId::new(namespace, name);
        self.register(id.clone(), description.into(), String::new(), MetricValue::Counter(0))?;
        Ok(CounterHandle {
            id,
            store: self.store.clone(),
        })
    }

    /// Registers a gauge starting at zero.
    pub fn register_gauge(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> MetricsResult<GaugeHandle> {
        let id = MetricId::new(namespace, name);
        self.register(id.clone(), description.into(), unit.into(), MetricValue::Gauge(0.0))?;
        Ok(GaugeHandle {
            id,
            store: self.store.clone(),
        })
    }

    fn register(
        &self,
        id: MetricId,
        description: String,
        unit: String,
        initial: MetricValue,
    ) -> MetricsResult<()> {
        let mut metrics = write(&self.store)?;
        if let Some(existing) = metrics.get(&id) {
            let found = existing.value.metric_type();
            let expected = initial.metric_type();
            if found != expected {
                return Err(MetricsError::TypeMismatch { expected, found });
            }
            return Ok(());
        }
        metrics.insert(
            id.clone(),
            Metric {
                id,
                description,
                unit,
                value: initial,
            },
        );
        Ok(())
    }

    /// Get a metric by ID.
    pub fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        read(&self.store)?
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    /// Every metric, sorted by id.
    pub fn snapshot(&self) -> MetricsResult<Vec<Metric>> {
        let mut metrics: Vec<Metric> = read(&self.store)?.values().cloned().collect();
        metrics.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(metrics)
    }

    /// Every metric as pretty-printed JSON.
    pub fn to_json(&self) -> MetricsResult<String> {
        serde_json::to_string_pretty(&self.snapshot()?)
            .map_err(|e| MetricsError::StorageError(e.to_string()))
    }
}

/// A handle for incrementing a registered counter.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    store: Store,
}

impl CounterHandle {
    /// Increments the counter by one and returns the new value.
    pub fn increment(&self) -> MetricsResult<u64> {
        self.increment_by(1)
    }

    /// Increments the counter by `delta` and returns the new value.
    pub fn increment_by(&self, delta: u64) -> MetricsResult<u64> {
        let mut metrics = write(&self.store)?;
        let metric = metrics
            .get_mut(&self.id)
            .ok_or_else(|| MetricsError::MetricNotFound(self.id.clone()))?;
        match &mut metric.value {
            MetricValue::Counter(value) => {
                *value += delta;
                Ok(*value)
            }
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: other.metric_type(),
            }),
        }
    }

    /// Returns the current value.
    pub fn get(&self) -> MetricsResult<u64> {
        match read(&self.store)?.get(&self.id).map(|m| m.value) {
            Some(MetricValue::Counter(value)) => Ok(value),
            Some(other) => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: other.metric_type(),
            }),
            None => Err(MetricsError::MetricNotFound(self.id.clone())),
        }
    }
}

/// A handle for setting a registered gauge.
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    store: Store,
}

impl GaugeHandle {
    /// Sets the gauge to `value`.
    pub fn set(&self, value: f64) -> MetricsResult<()> {
        let mut metrics = write(&self.store)?;
        let metric = metrics
            .get_mut(&self.id)
            .ok_or_else(|| MetricsError::MetricNotFound(self.id.clone()))?;
        match &mut metric.value {
            MetricValue::Gauge(current) => {
                *current = value;
                Ok(())
            }
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: other.metric_type(),
            }),
        }
    }

    /// Returns the current value.
    pub fn get(&self) -> MetricsResult<f64> {
        match read(&self.store)?.get(&self.id).map(|m| m.value) {
            Some(MetricValue::Gauge(value)) => Ok(value),
            Some(other) => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: other.metric_type(),
            }),
            None => Err(MetricsError::MetricNotFound(self.id.clone())),
        }
    }
}
