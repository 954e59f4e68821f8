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


//! The materialized namespace and the step that installs resolved definitions into it.
//!
//! The namespace is a tree keyed by dotted-path segments. Every node may hold a value
//! and children at the same time, so `App.objects` and `App.objects.Foo` can both be
//! installed, in either order.

use crate::definition::{Installable, Value};
use crate::Loader;
use loom_core::{DottedPath, LoaderEvent};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Default)]
struct Node {
    value: Option<Value>,
    children: BTreeMap<String, Node>,
}

/// The hierarchical store of installed values.
#[derive(Default)]
pub struct Namespace {
    root: Node,
}

impl Namespace {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `value` at `path`, creating intermediate nodes as needed.
    ///
    /// Returns the value previously stored at that exact location, if any.
    pub fn install(&mut self, path: &DottedPath, value: Value) -> Option<Value> {
        let node = path.segments().fold(&mut self.root, |node, segment| {
            node.children.entry(segment.to_string()).or_default()
        });
        node.value.replace(value)
    }

    fn node(&self, path: &str) -> Option<&Node> {
        path.split('.')
            .try_fold(&self.root, |node, segment| node.children.get(segment))
    }

    /// Returns the value installed at `path`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.node(path)?.value.as_ref()
    }

    /// Returns the value at `path` downcast to `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, path: &str) -> Option<Arc<T>> {
        self.get(path)?.clone().downcast::<T>().ok()
    }

    /// Returns `true` if a value is installed at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Names of the direct children of `path`. An empty `path` lists the roots.
    pub fn children(&self, path: &str) -> Vec<&str> {
        let node = if path.is_empty() {
            Some(&self.root)
        } else {
            self.node(path)
        };
        node.map(|node| node.children.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every path holding a value, sorted.
    pub fn paths(&self) -> Vec<String> {
        fn walk(node: &Node, prefix: &str, out: &mut Vec<String>) {
            for (segment, child) in &node.children {
                let path = if prefix.is_empty() {
                    segment.clone()
                } else {
                    format!("{prefix}.{segment}")
                };
                if child.value.is_some() {
                    out.push(path.clone());
                }
                walk(child, &path, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.root, "", &mut out);
        out
    }

    /// Number of installed values.
    pub fn len(&self) -> usize {
        self.paths().len()
    }

    /// Returns `true` if nothing is installed.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("paths", &self.paths())
            .finish()
    }
}

impl Loader {
    /// Installs a resolved definition and runs its hook.
    ///
    /// The class is marked resolved after installation and before the hook runs, so
    /// the hook already observes `is_resolved(name) == true`.
    pub(crate) fn materialize(&mut self, name: DottedPath, installable: Installable) {
        let (value, hook) = installable.produce(self).into_parts();

        if self.namespace.install(&name, value).is_some() {
            log::warn!("Class '{}' replaced an existing namespace value.", name);
        }
        self.registry.mark_resolved(name.clone());
        self.metrics.class_resolved();
        log::debug!("Materialized '{}'", name);
        self.events.publish(LoaderEvent::Materialized { class: name });

        if let Some(hook) = hook {
            hook(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<T: Any + Send + Sync>(v: T) -> Value {
        Arc::new(v)
    }

    #[test]
    fn test_install_creates_intermediate_nodes() {
        let mut namespace = Namespace::new();
        namespace.install(&DottedPath::from("App.objects.Foo"), value(1u32));

        assert!(namespace.contains("App.objects.Foo"));
        assert!(!namespace.contains("App.objects"));
        assert_eq!(namespace.children(""), vec!["App"]);
        assert_eq!(namespace.children("App"), vec!["objects"]);
        assert_eq!(namespace.get_as::<u32>("App.objects.Foo").as_deref(), Some(&1));
    }

    #[test]
    fn test_parent_and_child_values_coexist() {
        let mut namespace = Namespace::new();
        namespace.install(&DottedPath::from("App.objects.Foo"), value("foo"));
        namespace.install(&DottedPath::from("App.objects"), value("objects"));

        assert_eq!(
            namespace.paths(),
            vec!["App.objects".to_string(), "App.objects.Foo".to_string()]
        );
        assert_eq!(namespace.len(), 2);
    }

    #[test]
    fn test_wrong_type_downcast_is_none() {
        let mut namespace = Namespace::new();
        namespace.install(&DottedPath::from("App.Leaf"), value(7i64));
        assert!(namespace.get_as::<String>("App.Leaf").is_none());
        assert!(namespace.get_as::<i64>("App.Missing").is_none());
    }

    #[test]
    fn test_install_returns_replaced_value() {
        let mut namespace = Namespace::new();
        let path = DottedPath::from("App.Leaf");
        assert!(namespace.install(&path, value(1u8)).is_none());
        assert!(namespace.install(&path, value(2u8)).is_some());
    }
}
