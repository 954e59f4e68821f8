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


//! Logger installation for binaries and tests embedding the loader.
//!
//! Library code only talks to the `log` facade. Whoever owns `main` decides whether a
//! logger is installed; these helpers install `env_logger` with the engine defaults
//! (`info`, overridable through `RUST_LOG`).

use env_logger::{Builder, Env};

/// The filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

fn builder() -> Builder {
    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
}

/// Installs the global logger.
///
/// # Panics
/// Panics if a global logger was already installed.
pub fn init_logging() {
    builder().init();
}

/// Installs the global logger, returning an error if one is already installed.
///
/// Test harnesses call this from several tests; only the first call wins.
pub fn try_init_logging() -> Result<(), log::SetLoggerError> {
    builder().is_test(true).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_try_init_is_an_error_not_a_panic() {
        let _ = try_init_logging();
        assert!(try_init_logging().is_err());
    }
}
