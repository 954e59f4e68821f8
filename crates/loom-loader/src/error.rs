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


//! Errors raised while assembling a [`Loader`](crate::Loader).

use crate::config::ConfigError;
use loom_telemetry::MetricsError;
use thiserror::Error;

/// A failure while building a loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The loader's metrics could not be registered.
    #[error("failed to register loader metrics: {0}")]
    Metrics(#[from] MetricsError),
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
