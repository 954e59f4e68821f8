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

//! Errors raised synchronously at definition submission.

use crate::path::DottedPath;
use std::fmt;

/// A structural problem with a submitted definition.
///
/// Returned synchronously from submission. It is fatal to that call only; the
/// loader's state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The manifest has no `class` key, or its value is blank.
    MissingClass,
    /// A definition with the same name was already submitted.
    Duplicate(DottedPath),
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionError::MissingClass => {
                write!(f, "Definition is missing its 'class' name")
            }
            DefinitionError::Duplicate(name) => {
                write!(f, "Class '{name}' has already been defined")
            }
        }
    }
}

impl std::error::Error for DefinitionError {}
