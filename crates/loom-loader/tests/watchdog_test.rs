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


mod common;

use common::{loader_with, names, tick, tick_until};
use loom_io::MemoryFetcher;
use loom_loader::{
    DottedPath, FilePath, Installable, Loader, LoaderConfig, LoaderEvent, Manifest, ManualClock,
};
use loom_telemetry::{MetricId, MetricValue};

fn short_window_loader(fetcher: MemoryFetcher, clock: &ManualClock) -> Loader {
    let config = LoaderConfig {
        watchdog_window_ms: 500,
        watchdog_check_interval_ms: 100,
        ..LoaderConfig::default()
    };
    Loader::builder(fetcher)
        .config(config)
        .clock(clock.clone())
        .build()
        .unwrap()
}

#[test]
fn test_missing_include_is_reported_after_window() {
    let clock = ManualClock::new();
    let mut loader = loader_with(MemoryFetcher::new(), &clock);

    loader
        .define(
            Manifest::new("App.C").includes(["/missing.js"]),
            Installable::value(()),
        )
        .unwrap();

    let spent = tick_until(&mut loader, &clock, 400, |loader| {
        loader.last_stall_report().is_some()
    });
    // 10s window at 50ms per tick.
    assert_eq!(spent, Some(200));
    assert!(!loader.is_resolved("App.C"));

    let report = loader.last_stall_report().unwrap();
    assert!(report.is_pending("App.C"));
    assert!(report.resolved.is_empty());
    assert_eq!(report.known.len(), 1);
    assert_eq!(report.missing_files, vec!["/missing.js".to_string()]);
    assert_eq!(
        report.waiting_on[&DottedPath::from("App.C")].files,
        vec![FilePath::from("/missing.js")]
    );
    assert!(report.cycles.is_empty());
    assert!(report.to_json().unwrap().contains("App.C"));

    let stalled: Vec<LoaderEvent> = loader
        .events()
        .drain()
        .into_iter()
        .filter(|event| matches!(event, LoaderEvent::Stalled { .. }))
        .collect();
    assert_eq!(
        stalled,
        vec![LoaderEvent::Stalled {
            pending: names(&["App.C"])
        }]
    );
}

#[test]
fn test_report_repeats_once_per_window() {
    let clock = ManualClock::new();
    let mut loader = loader_with(MemoryFetcher::new(), &clock);
    loader
        .define(
            Manifest::new("App.C").includes(["/missing.js"]),
            Installable::value(()),
        )
        .unwrap();

    for _ in 0..200 {
        tick(&mut loader, &clock);
    }
    assert_eq!(loader.stall_reports_emitted(), 1);

    for _ in 0..199 {
        tick(&mut loader, &clock);
    }
    assert_eq!(loader.stall_reports_emitted(), 1);

    tick(&mut loader, &clock);
    assert_eq!(loader.stall_reports_emitted(), 2);

    let stalls = loader
        .metrics()
        .get_metric(&MetricId::new("loader", "stalls_reported"))
        .unwrap();
    assert_eq!(stalls.value, MetricValue::Counter(2));
}

#[test]
fn test_progress_pushes_the_deadline_back() {
    let clock = ManualClock::new();
    let fetcher = MemoryFetcher::new()
        .with_source("/fast.js", b"".to_vec())
        .with_source("/slow.js", b"".to_vec());
    fetcher.hold("/fast.js");
    fetcher.hold("/slow.js");
    let mut loader = loader_with(fetcher.clone(), &clock);

    loader
        .define(Manifest::new("App.Fast").includes(["/fast.js"]), Installable::value(()))
        .unwrap();
    loader
        .define(Manifest::new("App.Slow").includes(["/slow.js"]), Installable::value(()))
        .unwrap();

    // 9s in, one definition makes progress.
    for _ in 0..180 {
        tick(&mut loader, &clock);
    }
    fetcher.release("/fast.js");
    tick(&mut loader, &clock);
    assert!(loader.is_resolved("App.Fast"));

    // The original 10s deadline passes without a report.
    for _ in 0..119 {
        tick(&mut loader, &clock);
    }
    assert!(loader.last_stall_report().is_none());

    let spent = tick_until(&mut loader, &clock, 200, |loader| {
        loader.last_stall_report().is_some()
    });
    assert!(spent.is_some());
    let report = loader.last_stall_report().unwrap();
    assert_eq!(report.pending, names(&["App.Slow"]));
    assert_eq!(report.resolved, names(&["App.Fast"]));
}

#[test]
fn test_idle_loader_never_reports() {
    let clock = ManualClock::new();
    let fetcher = MemoryFetcher::new().with_source("/lib.js", b"".to_vec());
    let mut loader = short_window_loader(fetcher, &clock);

    loader
        .define(Manifest::new("App.Lib").includes(["/lib.js"]), Installable::value(()))
        .unwrap();
    for _ in 0..100 {
        tick(&mut loader, &clock);
    }

    assert!(loader.is_resolved("App.Lib"));
    assert!(loader.is_idle());
    assert_eq!(loader.stall_reports_emitted(), 0);
}

#[test]
fn test_longer_cycle_is_flagged() {
    let clock = ManualClock::new();
    let mut loader = short_window_loader(MemoryFetcher::new(), &clock);

    loader
        .define(Manifest::new("App.A").requires(["App.B"]), Installable::value(()))
        .unwrap();
    loader
        .define(Manifest::new("App.B").requires(["App.C"]), Installable::value(()))
        .unwrap();
    loader
        .define(Manifest::new("App.C").requires(["App.A"]), Installable::value(()))
        .unwrap();
    loader
        .define(Manifest::new("App.D").includes(["/gone.js"]), Installable::value(()))
        .unwrap();

    let spent = tick_until(&mut loader, &clock, 40, |loader| {
        loader.last_stall_report().is_some()
    });
    assert!(spent.is_some());

    let report = loader.last_stall_report().unwrap();
    assert_eq!(report.cycles, names(&["App.A", "App.B", "App.C"]));
    assert_eq!(report.pending, names(&["App.A", "App.B", "App.C", "App.D"]));
    assert_eq!(
        report.waiting_on[&DottedPath::from("App.A")].classes,
        names(&["App.B"])
    );
    assert!(!loader.is_resolved("App.A"));
}
