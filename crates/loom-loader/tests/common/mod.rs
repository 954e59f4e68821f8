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


#![allow(dead_code)]

use loom_io::{MemoryFetcher, SourceFetcher};
use loom_loader::{DottedPath, Injector, Loader, LoaderEvent, ManualClock};
use std::time::Duration;

/// The default resolver tick interval.
pub const TICK: Duration = Duration::from_millis(50);

pub fn loader_with(fetcher: impl SourceFetcher + 'static, clock: &ManualClock) -> Loader {
    let _ = loom_telemetry::try_init_logging();
    Loader::builder(fetcher).clock(clock.clone()).build().unwrap()
}

pub fn scripted_loader(
    fetcher: MemoryFetcher,
    injector: impl Injector + 'static,
    clock: &ManualClock,
) -> Loader {
    let _ = loom_telemetry::try_init_logging();
    Loader::builder(fetcher)
        .clock(clock.clone())
        .injector(injector)
        .build()
        .unwrap()
}

/// Moves the clock one tick interval forward and updates.
pub fn tick(loader: &mut Loader, clock: &ManualClock) {
    clock.advance(TICK);
    loader.update();
}

/// Ticks until `done` holds, giving up after `max_ticks`. Returns the ticks spent.
pub fn tick_until(
    loader: &mut Loader,
    clock: &ManualClock,
    max_ticks: usize,
    mut done: impl FnMut(&Loader) -> bool,
) -> Option<usize> {
    for spent in 0..max_ticks {
        if done(loader) {
            return Some(spent);
        }
        tick(loader, clock);
    }
    done(loader).then_some(max_ticks)
}

/// The classes materialized since the last drain, in event order.
pub fn materialized(loader: &Loader) -> Vec<DottedPath> {
    loader
        .events()
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            LoaderEvent::Materialized { class } => Some(class),
            _ => None,
        })
        .collect()
}

pub fn names(names: &[&str]) -> Vec<DottedPath> {
    names.iter().copied().map(DottedPath::from).collect()
}
