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


//! The loader instance and the update loop that drives it.

use crate::config::LoaderConfig;
use crate::definition::{ClassDefinition, Installable, SubmitOutcome};
use crate::error::LoaderError;
use crate::injector::{Injector, NoopInjector};
use crate::metrics::LoaderMetrics;
use crate::namespace::Namespace;
use crate::registry::DefinitionRegistry;
use crate::resolver::Resolver;
use crate::watchdog::{StallReport, Watchdog};
use loom_core::{
    Clock, DefinitionError, DottedPath, EventBus, FilePath, LoadStatus, LoaderEvent, Manifest,
    PathRules, SystemClock,
};
use loom_io::{FileLoader, LoadCallback, LoadRequest, SourceFetcher};
use loom_telemetry::MetricsRegistry;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// What one call to [`Loader::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Fetch results applied during this update.
    pub completed_files: usize,
    /// Definitions materialized by the resolver tick.
    pub materialized: usize,
    /// Whether a resolver tick ran.
    pub ticked: bool,
    /// Whether the watchdog emitted a stall report.
    pub stalled: bool,
}

/// Configures and builds a [`Loader`].
pub struct LoaderBuilder {
    files: FileLoader,
    config: LoaderConfig,
    clock: Arc<dyn Clock>,
    injector: Box<dyn Injector>,
    metrics: Option<MetricsRegistry>,
}

impl LoaderBuilder {
    fn new(fetcher: impl SourceFetcher + 'static) -> Self {
        Self {
            files: FileLoader::new(fetcher),
            config: LoaderConfig::default(),
            clock: Arc::new(SystemClock),
            injector: Box::new(NoopInjector),
            metrics: None,
        }
    }

    /// Replaces the default configuration.
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the system clock.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets the injector run on every fetched source.
    pub fn injector(mut self, injector: impl Injector + 'static) -> Self {
        self.injector = Box::new(injector);
        self
    }

    /// Records metrics into a registry shared with the host.
    pub fn metrics(mut self, registry: MetricsRegistry) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Builds the loader.
    pub fn build(self) -> Result<Loader, LoaderError> {
        let config = self.config;
        let metrics_registry = self.metrics.unwrap_or_default();
        let metrics = LoaderMetrics::new(&metrics_registry)?;

        log::info!(
            "Loader ready (tick {:?}, watchdog window {:?}).",
            config.tick_interval(),
            config.watchdog_window()
        );

        Ok(Loader {
            rules: config.path_rules(),
            files: self.files.with_max_paused_ticks(config.max_paused_pump_ticks),
            resolver: Resolver::new(config.tick_interval()),
            watchdog: Watchdog::new(config.watchdog_window(), config.watchdog_check_interval()),
            registry: DefinitionRegistry::new(),
            namespace: Namespace::new(),
            clock: self.clock,
            injector: Some(self.injector),
            metrics,
            metrics_registry,
            events: EventBus::new(),
            last_stall_report: None,
            updating: false,
            config,
        })
    }
}

/// A dependency-driven class loader.
///
/// The loader is driven by its host: [`submit`](Loader::submit) declares classes and
/// [`update`](Loader::update), called regularly (for instance once per frame), applies
/// fetch results, runs the resolver when its tick is due, and checks the watchdog.
/// Nothing happens between two updates.
pub struct Loader {
    pub(crate) config: LoaderConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) rules: PathRules,
    pub(crate) registry: DefinitionRegistry,
    pub(crate) namespace: Namespace,
    pub(crate) files: FileLoader,
    pub(crate) resolver: Resolver,
    pub(crate) watchdog: Watchdog,
    pub(crate) metrics: LoaderMetrics,
    pub(crate) metrics_registry: MetricsRegistry,
    pub(crate) events: EventBus<LoaderEvent>,
    pub(crate) injector: Option<Box<dyn Injector>>,
    pub(crate) last_stall_report: Option<StallReport>,
    updating: bool,
}

impl Loader {
    /// Starts configuring a loader that fetches through `fetcher`.
    pub fn builder(fetcher: impl SourceFetcher + 'static) -> LoaderBuilder {
        LoaderBuilder::new(fetcher)
    }

    /// Creates a loader with the default configuration.
    pub fn new(fetcher: impl SourceFetcher + 'static) -> Result<Self, LoaderError> {
        Self::builder(fetcher).build()
    }

    /// Submits a manifest and its payload. Shorthand for [`submit`](Loader::submit).
    pub fn define(
        &mut self,
        manifest: Manifest,
        installable: impl Into<Installable>,
    ) -> Result<SubmitOutcome, DefinitionError> {
        self.submit(ClassDefinition::new(manifest, installable))
    }

    /// Advances the loader by one step.
    ///
    /// Calling `update` from inside a factory, hook, or injector does nothing.
    pub fn update(&mut self) -> UpdateSummary {
        if self.updating {
            log::debug!("Ignoring re-entrant update.");
            return UpdateSummary::default();
        }
        self.updating = true;

        let mut summary = UpdateSummary {
            completed_files: self.apply_arrivals(),
            ..UpdateSummary::default()
        };
        self.files.pump_queue();

        let now = self.clock.now();
        if self.resolver.is_due(now) {
            summary.materialized = self.run_tick(now);
            summary.ticked = true;
        }
        summary.stalled = self.check_watchdog(now);
        self.metrics.set_pending(self.registry.pending().len());

        self.updating = false;
        summary
    }

    fn apply_arrivals(&mut self) -> usize {
        let arrivals = self.files.poll_arrivals();
        let count = arrivals.len();

        for fetched in arrivals {
            let path = fetched.path;
            if self.files.status(&path).is_some() {
                log::debug!("Dropping late fetch result for '{}'", path);
                continue;
            }

            let status = match fetched.result {
                Ok(source) => self.inject(&path, &source),
                Err(e) => {
                    log::debug!("{}", e);
                    LoadStatus::NotFound
                }
            };
            self.files.complete(&path, status);

            match status {
                LoadStatus::Loaded => {
                    self.metrics.file_loaded();
                    self.events.publish(LoaderEvent::FileLoaded { path });
                }
                LoadStatus::NotFound => {
                    self.metrics.file_missing();
                    self.events.publish(LoaderEvent::FileFailed { path });
                }
            }
        }
        count
    }

    fn inject(&mut self, path: &FilePath, source: &[u8]) -> LoadStatus {
        let Some(mut injector) = self.injector.take() else {
            return LoadStatus::Loaded;
        };
        let result = injector.inject(path, source, self);
        self.injector = Some(injector);

        match result {
            Ok(()) => LoadStatus::Loaded,
            Err(e) => {
                log::warn!("Failed to inject '{}': {:#}", path, e);
                LoadStatus::NotFound
            }
        }
    }

    /// Returns `true` once `name` has been materialized.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.registry.is_resolved(name)
    }

    /// Returns `true` while `name` waits in the pending queue.
    pub fn is_pending(&self, name: &str) -> bool {
        self.registry.is_pending(name)
    }

    /// Returns `true` if a definition named `name` was submitted.
    pub fn is_defined(&self, name: &str) -> bool {
        self.registry.is_known(name)
    }

    /// Pending names in submission order.
    pub fn pending(&self) -> &[DottedPath] {
        self.registry.pending()
    }

    /// Resolved names in the order they were materialized.
    pub fn resolution_order(&self) -> &[DottedPath] {
        self.registry.resolution_order()
    }

    /// The definition registry.
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// The materialized namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The value installed at `path`, downcast to `T`.
    pub fn get<T: Any + Send + Sync>(&self, path: &str) -> Option<Arc<T>> {
        self.namespace.get_as(path)
    }

    /// The file that backs `class` under this loader's path rules.
    pub fn file_for(&self, class: &DottedPath) -> FilePath {
        self.rules.file_for(class)
    }

    /// Requests a file outside the sequential queue.
    pub fn load_file(
        &mut self,
        path: impl Into<FilePath>,
        callback: Option<LoadCallback>,
    ) -> LoadRequest {
        self.files.load(&path.into(), callback)
    }

    /// Appends a file to the sequential queue.
    pub fn enqueue_file(&mut self, path: impl Into<FilePath>) {
        self.files.enqueue(path);
    }

    /// Appends a file to the sequential queue with a completion callback.
    pub fn enqueue_file_with(&mut self, path: impl Into<FilePath>, callback: LoadCallback) {
        self.files.enqueue_with(path, callback);
    }

    /// Pauses the sequential queue. Immediate loads are unaffected.
    pub fn pause_queue(&mut self) {
        self.files.pause();
    }

    /// Resumes the sequential queue.
    pub fn resume_queue(&mut self) {
        self.files.resume();
    }

    /// The file loader.
    pub fn files(&self) -> &FileLoader {
        &self.files
    }

    /// The event bus the loader publishes to. Events accumulate until drained.
    pub fn events(&self) -> &EventBus<LoaderEvent> {
        &self.events
    }

    /// The registry holding the loader's metrics.
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics_registry
    }

    /// The most recent watchdog report, if any stall was detected.
    pub fn last_stall_report(&self) -> Option<&StallReport> {
        self.last_stall_report.as_ref()
    }

    /// Number of stall reports emitted.
    pub fn stall_reports_emitted(&self) -> u64 {
        self.watchdog.reports_emitted()
    }

    /// Number of resolver ticks run.
    pub fn tick_count(&self) -> u64 {
        self.resolver.ticks_run()
    }

    /// Returns `true` when nothing is pending, in flight, or queued.
    pub fn is_idle(&self) -> bool {
        self.registry.pending().is_empty() && self.files.is_idle()
    }

    /// The active configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The current time on the loader's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("pending", &self.registry.pending())
            .field("resolved", &self.registry.resolution_order().len())
            .field("files_in_flight", &self.files.in_flight_count())
            .field("ticks", &self.resolver.ticks_run())
            .finish_non_exhaustive()
    }
}
