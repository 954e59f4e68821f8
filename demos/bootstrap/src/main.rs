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


// Loom bootstrap demo
// Loads a tree of manifest files from disk, resolves a root class, and prints the namespace.
//
// Usage: bootstrap [MANIFEST_DIR] [ROOT_CLASS] [CONFIG_JSON]

use anyhow::{Context, Result};
use loom_core::{DottedPath, SystemClock};
use loom_io::DirectoryFetcher;
use loom_loader::{
    Export, FactoryCatalog, Installable, Loader, LoaderConfig, Manifest, ManifestInjector,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const DEFAULT_DIR: &str = "demos/bootstrap/manifests";
const DEFAULT_ROOT: &str = "Demo.Game";
const DEFAULT_CONFIG: &str = "demos/bootstrap/loader.json";
const FRAME: Duration = Duration::from_millis(16);
const TIMEOUT: Duration = Duration::from_secs(5);

fn catalog() -> FactoryCatalog {
    FactoryCatalog::new()
        .with("Demo.engine.Physics.World", |_| {
            Export::new("physics world").on_resolved(|_| log::info!("Physics world is live."))
        })
        .with("Demo.objects.Player", |loader| {
            let has_body = loader.is_resolved("Demo.engine.Physics.Body");
            Export::new(format!("player (rigid body: {has_body})"))
        })
}

fn main() -> Result<()> {
    loom_telemetry::init_logging();

    let mut args = std::env::args().skip(1);
    let dir = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_DIR.to_string()));
    let root = DottedPath::from(args.next().unwrap_or_else(|| DEFAULT_ROOT.to_string()));
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let config = LoaderConfig::from_file(&config_path)
        .with_context(|| format!("failed to load config from '{config_path}'"))?;
    log::info!("Loading '{}' from {:?}", root, dir);

    let mut loader = Loader::builder(DirectoryFetcher::new(&dir))
        .config(config)
        .clock(SystemClock)
        .injector(ManifestInjector::new(catalog()))
        .build()?;

    // The root's own file is fetched like any other missing class.
    loader.define(
        Manifest::new("Demo.Bootstrap").requires([root.clone()]),
        Installable::value(()),
    )?;

    let started = Instant::now();
    while !loader.is_idle() && started.elapsed() < TIMEOUT {
        loader.update();
        std::thread::sleep(FRAME);
    }

    if !loader.is_resolved(root.as_str()) {
        let report = loader.stall_report();
        anyhow::bail!(
            "'{}' did not resolve within {:?}:\n{}",
            root,
            TIMEOUT,
            report.to_json()?
        );
    }

    log::info!(
        "Resolved {} class(es) in {:?} over {} tick(s).",
        loader.resolution_order().len(),
        started.elapsed(),
        loader.tick_count()
    );
    for path in loader.namespace().paths() {
        println!("{path}");
    }
    println!("{}", loader.metrics().to_json()?);
    Ok(())
}
