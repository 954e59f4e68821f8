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


//! The declarative definition manifest submitted by embedding programs.
//!
//! A manifest names a class and lists what it needs before it can be materialized:
//!
//! | Key        | Meaning                                                        |
//! |------------|----------------------------------------------------------------|
//! | `class`    | required dotted path, unique per loader                        |
//! | `requires` | dotted class names that must resolve first; triggers loading   |
//! | `includes` | file paths that must load                                      |
//! | `depends`  | opaque identifiers kept for bookkeeping, never fetched         |

use crate::path::{DottedPath, FilePath};
use serde::{Deserialize, Deserializer, Serialize};

/// A class declaration with its requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// The dotted name of the declared class. `None` is rejected at submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<DottedPath>,
    /// Classes that must be materialized first.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub requires: Vec<DottedPath>,
    /// Files that must finish loading first.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub includes: Vec<FilePath>,
    /// Bookkeeping identifiers outside the governed namespace.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub depends: Vec<String>,
}

impl Manifest {
    /// Starts a manifest for the given class name with no requirements.
    pub fn new(class: impl Into<DottedPath>) -> Self {
        Self {
            class: Some(class.into()),
            ..Default::default()
        }
    }

    /// Sets the classes this manifest requires.
    pub fn requires<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<DottedPath>,
    {
        self.requires = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the files this manifest includes.
    pub fn includes<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FilePath>,
    {
        self.includes = files.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the opaque bookkeeping identifiers.
    pub fn depends<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` when the manifest neither requires classes nor includes files.
    pub fn is_unconstrained(&self) -> bool {
        self.requires.is_empty() && self.includes.is_empty()
    }

    /// Parses one manifest or a list of manifests from JSON.
    pub fn list_from_json(json: &str) -> Result<Vec<Manifest>, serde_json::Error> {
        match serde_json::from_str::<ManifestDocument>(json)? {
            ManifestDocument::One(manifest) => Ok(vec![manifest]),
            ManifestDocument::Many(manifests) => Ok(manifests),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestDocument {
    Many(Vec<Manifest>),
    One(Manifest),
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_lists_default_to_empty() {
        let manifests = Manifest::list_from_json(r#"{ "class": "App.Leaf" }"#).unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0], Manifest::new("App.Leaf"));
        assert!(manifests[0].is_unconstrained());
    }

    #[test]
    fn test_null_lists_default_to_empty() {
        let json = r#"{ "class": "App.Leaf", "requires": null, "includes": null }"#;
        let manifests = Manifest::list_from_json(json).unwrap();
        assert!(manifests[0].requires.is_empty());
        assert!(manifests[0].includes.is_empty());
    }

    #[test]
    fn test_parse_list_with_all_keys() {
        let json = r#"[
            { "class": "App.Branch", "requires": ["App.Leaf"], "includes": ["/lib/util.js"], "depends": ["audio"] },
            { "requires": ["App.Leaf"] }
        ]"#;
        let manifests = Manifest::list_from_json(json).unwrap();
        assert_eq!(manifests.len(), 2);

        let branch = &manifests[0];
        assert_eq!(branch.class, Some(DottedPath::from("App.Branch")));
        assert_eq!(branch.requires, vec![DottedPath::from("App.Leaf")]);
        assert_eq!(branch.includes, vec![FilePath::from("/lib/util.js")]);
        assert_eq!(branch.depends, vec!["audio".to_string()]);
        assert!(!branch.is_unconstrained());

        assert!(manifests[1].class.is_none());
    }

    #[test]
    fn test_builder() {
        let manifest = Manifest::new("App.Branch")
            .requires(["App.Leaf"])
            .includes(["/a.js", "/b.js"])
            .depends(["x"]);
        assert_eq!(manifest.requires.len(), 1);
        assert_eq!(manifest.includes.len(), 2);
        assert_eq!(manifest.depends, vec!["x".to_string()]);
    }
}
