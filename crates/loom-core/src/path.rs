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


//! Identifiers used across the loader.
//!
//! Two kinds of names flow through the system:
//! - [`DottedPath`]: a hierarchical class identifier (`App.objects.Foo`) that maps to a
//!   location in the materialized namespace.
//! - [`FilePath`]: a source artifact location (`/objects/foo.js`) handed to a fetcher.
//!
//! [`PathRules`] holds the deterministic mapping from the former to the latter. Other
//! tooling builds file layouts from this mapping, so its output must stay stable.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// The separator between the segments of a [`DottedPath`].
pub const SEGMENT_SEPARATOR: char = '.';

/// A hierarchical class identifier such as `App.objects.Foo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DottedPath(String);

impl DottedPath {
    /// Creates a dotted path from any string-like value. No validation is performed;
    /// the registry rejects empty names at submission time.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the path is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Iterates over the `.`-separated segments of the path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEGMENT_SEPARATOR)
    }

    /// Returns the leading namespace segment (`App` for `App.objects.Foo`).
    pub fn root(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    /// Returns the last segment (`Foo` for `App.objects.Foo`).
    pub fn leaf(&self) -> &str {
        self.segments().last().unwrap_or_default()
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DottedPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DottedPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for DottedPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DottedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The location of a source artifact, as understood by a fetcher.
///
/// The raw form is kept for fetching. Caches and the loaded-file set are keyed by
/// [`FilePath::key`], so spellings such as `./a/b.js`, `a//b.js` and `/a/b.js` all
/// refer to the same artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilePath(String);

impl FilePath {
    /// Creates a file path from any string-like value.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the raw path as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the sanitized cache key for this path.
    pub fn key(&self) -> String {
        sanitize(&self.0)
    }

    /// Returns the sanitized path without its leading `/`, suitable for joining onto a
    /// root directory.
    pub fn relative(&self) -> String {
        self.key().trim_start_matches('/').to_string()
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FilePath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Normalizes a raw path into its cache key form.
///
/// Trims whitespace, turns backslashes into `/`, drops leading `./` components,
/// collapses repeated slashes and ensures a single leading `/`.
pub fn sanitize(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }

    let mut key = String::with_capacity(rest.len() + 1);
    for part in rest.split('/').filter(|part| !part.is_empty()) {
        key.push('/');
        key.push_str(part);
    }
    if key.is_empty() {
        key.push('/');
    }
    key
}

/// The rules translating a [`DottedPath`] into the [`FilePath`] that backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRules {
    /// The reserved package marker dropped right after the namespace segment.
    pub engine_segment: String,
    /// The extension appended to every translated path, including its dot.
    pub extension: String,
}

impl PathRules {
    /// Creates a rule set with a custom engine marker and extension.
    pub fn new(engine_segment: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            engine_segment: engine_segment.into(),
            extension: extension.into(),
        }
    }

    /// Translates a class name into its backing source file.
    ///
    /// `Game.engine.Physics.World` becomes `/physics/world.js` and `App.objects.Foo`
    /// becomes `/objects/foo.js` under the default rules.
    pub fn file_for(&self, class: &DottedPath) -> FilePath {
        let mut segments = class.segments().skip(1).peekable();
        if segments.peek() == Some(&self.engine_segment.as_str()) {
            segments.next();
        }

        let joined = segments
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("/");

        FilePath::new(format!("/{joined}{}", self.extension))
    }
}

impl Default for PathRules {
    fn default() -> Self {
        Self::new("engine", ".js")
    }
}
