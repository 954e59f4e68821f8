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

use common::{loader_with, materialized, names, tick, tick_until};
use loom_io::MemoryFetcher;
use loom_loader::{
    DefinitionError, DottedPath, Export, FilePath, Installable, Manifest, ManualClock,
    SubmitOutcome,
};
use std::sync::{Arc, Mutex};

#[test]
fn test_unconstrained_class_resolves_during_submit() {
    let clock = ManualClock::new();
    let mut loader = loader_with(MemoryFetcher::new(), &clock);

    let outcome = loader
        .define(Manifest::new("App.Leaf"), Installable::value("leaf"))
        .unwrap();

    assert_eq!(outcome, SubmitOutcome::Resolved);
    assert!(loader.is_resolved("App.Leaf"));
    assert_eq!(materialized(&loader), names(&["App.Leaf"]));
    assert!(loader.is_idle());
}

#[test]
fn test_dependency_materializes_first() {
    let clock = ManualClock::new();
    let fetcher = MemoryFetcher::new();
    let mut loader = loader_with(fetcher.clone(), &clock);

    loader
        .define(Manifest::new("App.A").requires(["App.B"]), Installable::value(()))
        .unwrap();
    assert_eq!(fetcher.requests(), vec![FilePath::from("/b.js")]);

    for _ in 0..3 {
        tick(&mut loader, &clock);
        assert!(!loader.is_resolved("App.A"));
    }

    loader
        .define(Manifest::new("App.B"), Installable::value(()))
        .unwrap();
    tick(&mut loader, &clock);

    assert!(loader.is_resolved("App.A"));
    assert_eq!(loader.resolution_order(), names(&["App.B", "App.A"]));
    assert_eq!(materialized(&loader), names(&["App.B", "App.A"]));
}

#[test]
fn test_duplicate_submission_is_rejected() {
    let clock = ManualClock::new();
    let mut loader = loader_with(MemoryFetcher::new(), &clock);

    loader
        .define(Manifest::new("App.A"), Installable::value(1u32))
        .unwrap();
    let err = loader
        .define(Manifest::new("App.A"), Installable::value(2u32))
        .unwrap_err();

    assert_eq!(err, DefinitionError::Duplicate(DottedPath::from("App.A")));
    assert_eq!(loader.get::<u32>("App.A").as_deref(), Some(&1));
    assert_eq!(loader.resolution_order().len(), 1);
}

#[test]
fn test_missing_class_name_is_rejected() {
    let clock = ManualClock::new();
    let mut loader = loader_with(MemoryFetcher::new(), &clock);

    let err = loader
        .define(Manifest::default().requires(["App.B"]), Installable::value(()))
        .unwrap_err();

    assert_eq!(err, DefinitionError::MissingClass);
    assert!(loader.pending().is_empty());
    assert!(loader.files().is_idle());
}

#[test]
fn test_mutual_cycle_resolves_quickly() {
    let clock = ManualClock::new();
    let mut loader = loader_with(MemoryFetcher::new(), &clock);

    loader
        .define(Manifest::new("App.A").requires(["App.B"]), Installable::value(()))
        .unwrap();
    loader
        .define(Manifest::new("App.B").requires(["App.A"]), Installable::value(()))
        .unwrap();

    let spent = tick_until(&mut loader, &clock, 2, |loader| {
        loader.is_resolved("App.A") && loader.is_resolved("App.B")
    });

    assert!(spent.is_some());
    assert!(loader.tick_count() <= 2);
    assert!(loader.pending().is_empty());
}

#[test]
fn test_branch_waits_for_late_leaf() {
    let clock = ManualClock::new();
    let fetcher = MemoryFetcher::new();
    let mut loader = loader_with(fetcher.clone(), &clock);

    loader
        .define(
            Manifest::new("App.Branch").requires(["App.Leaf"]),
            Installable::value("branch"),
        )
        .unwrap();
    assert!(loader.is_pending("App.Branch"));
    assert!(!loader.is_defined("App.Leaf"));
    assert_eq!(fetcher.request_count("/leaf.js"), 1);

    tick(&mut loader, &clock);
    assert!(!loader.is_resolved("App.Branch"));

    let outcome = loader
        .define(Manifest::new("App.Leaf"), Installable::value("leaf"))
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Resolved);
    assert!(!loader.is_resolved("App.Branch"));

    tick(&mut loader, &clock);
    assert!(loader.is_resolved("App.Branch"));
    assert_eq!(loader.namespace().children("App"), vec!["Branch", "Leaf"]);
}

#[test]
fn test_included_file_gates_resolution() {
    let clock = ManualClock::new();
    let fetcher = MemoryFetcher::new().with_source("/lib/math.js", b"".to_vec());
    fetcher.hold("/lib/math.js");
    let mut loader = loader_with(fetcher.clone(), &clock);

    loader
        .define(
            Manifest::new("App.Vector").includes(["./lib//math.js"]),
            Installable::value(()),
        )
        .unwrap();

    for _ in 0..4 {
        tick(&mut loader, &clock);
    }
    assert!(loader.is_pending("App.Vector"));
    assert!(loader.files().is_in_flight(&"/lib/math.js".into()));

    fetcher.release("/lib/math.js");
    let spent = tick_until(&mut loader, &clock, 3, |loader| loader.is_resolved("App.Vector"));
    assert!(spent.is_some());
}

#[test]
fn test_factory_runs_once_and_hook_sees_resolution() {
    let clock = ManualClock::new();
    let mut loader = loader_with(MemoryFetcher::new(), &clock);
    let calls = Arc::new(Mutex::new(Vec::new()));

    let factory_calls = calls.clone();
    loader
        .define(Manifest::new("App.Base"), Installable::value(10u32))
        .unwrap();
    loader
        .define(
            Manifest::new("App.Derived").requires(["App.Base"]),
            Installable::factory(move |loader| {
                factory_calls.lock().unwrap().push("factory");
                let base = loader.get::<u32>("App.Base").map_or(0, |base| *base);
                let hook_calls = factory_calls.clone();
                Export::new(base * 2).on_resolved(move |loader| {
                    assert!(loader.is_resolved("App.Derived"));
                    hook_calls.lock().unwrap().push("hook");
                })
            }),
        )
        .unwrap();

    for _ in 0..3 {
        tick(&mut loader, &clock);
    }

    assert_eq!(loader.get::<u32>("App.Derived").as_deref(), Some(&20));
    assert_eq!(*calls.lock().unwrap(), vec!["factory", "hook"]);
}

#[test]
fn test_submit_from_hook_waits_for_next_tick() {
    let clock = ManualClock::new();
    let fetcher = MemoryFetcher::new().with_source("/boot.js", b"".to_vec());
    let mut loader = loader_with(fetcher, &clock);

    loader
        .define(
            Manifest::new("App.Boot").includes(["/boot.js"]),
            Export::empty().on_resolved(|loader| {
                loader
                    .define(
                        Manifest::new("App.Late").requires(["App.Boot"]),
                        Installable::value(()),
                    )
                    .unwrap();
            }),
        )
        .unwrap();

    loader.update();
    tick(&mut loader, &clock);
    assert!(loader.is_resolved("App.Boot"));
    assert!(loader.is_pending("App.Late"));

    tick(&mut loader, &clock);
    assert!(loader.is_resolved("App.Late"));
    assert_eq!(loader.resolution_order(), names(&["App.Boot", "App.Late"]));
}

#[test]
fn test_unconstrained_submit_from_factory_resolves_immediately() {
    let clock = ManualClock::new();
    let fetcher = MemoryFetcher::new().with_source("/plugin.js", b"".to_vec());
    let mut loader = loader_with(fetcher, &clock);

    loader
        .define(
            Manifest::new("App.Plugin").includes(["/plugin.js"]),
            Installable::factory(|loader| {
                loader
                    .define(Manifest::new("App.Plugin.Helper"), Installable::value("helper"))
                    .unwrap();
                Export::new("plugin")
            }),
        )
        .unwrap();

    loader.update();
    tick(&mut loader, &clock);

    assert!(loader.is_resolved("App.Plugin"));
    assert!(loader.is_resolved("App.Plugin.Helper"));
    assert_eq!(
        loader.resolution_order(),
        names(&["App.Plugin.Helper", "App.Plugin"])
    );
    assert_eq!(
        loader.namespace().paths(),
        vec!["App.Plugin".to_string(), "App.Plugin.Helper".to_string()]
    );
}
