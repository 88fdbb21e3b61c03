// Copyright 2024 The Kubernetes Authors.
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

//! Plugin configuration read from the admission configuration file.
//!
//! ```yaml
//! cacheSettleWait: 50   # milliseconds to wait before retrying a cache miss
//! readyTimeout: 10000   # milliseconds a request waits for caches to sync
//! ```

use crate::admission::{AdmissionError, AdmissionResult, DEFAULT_READY_TIMEOUT};
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

/// Default wait before a missed cache read is retried.
pub const DEFAULT_CACHE_SETTLE_WAIT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    /// Milliseconds.
    #[serde(rename = "cacheSettleWait")]
    pub cache_settle_wait_millis: u64,
    /// Milliseconds.
    #[serde(rename = "readyTimeout")]
    pub ready_timeout_millis: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            cache_settle_wait_millis: DEFAULT_CACHE_SETTLE_WAIT.as_millis() as u64,
            ready_timeout_millis: DEFAULT_READY_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Configuration {
    /// Reads the configuration of a plugin. A missing or empty file yields the defaults.
    pub fn from_reader(config: Option<&mut dyn Read>) -> AdmissionResult<Self> {
        let Some(reader) = config else {
            return Ok(Self::default());
        };

        let mut raw = String::new();
        reader.read_to_string(&mut raw).map_err(|e| {
            AdmissionError::internal_error(format!("failed to read plugin configuration: {}", e))
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&raw).map_err(|e| {
            AdmissionError::internal_error(format!("invalid plugin configuration: {}", e))
        })
    }

    /// Configuration without any waiting, for tests.
    pub fn immediate() -> Self {
        Self {
            cache_settle_wait_millis: 0,
            ready_timeout_millis: 0,
        }
    }

    pub fn cache_settle_wait(&self) -> Duration {
        Duration::from_millis(self.cache_settle_wait_millis)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_defaults_without_file() {
        let config = Configuration::from_reader(None).unwrap();
        assert_eq!(config.cache_settle_wait(), Duration::from_millis(50));
        assert_eq!(config.ready_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = Cursor::new("cacheSettleWait: 0\n");
        let config = Configuration::from_reader(Some(&mut file)).unwrap();
        assert_eq!(config.cache_settle_wait(), Duration::ZERO);
        assert_eq!(config.ready_timeout(), DEFAULT_READY_TIMEOUT);
    }

    #[test]
    fn test_empty_file() {
        let mut file = Cursor::new("  \n");
        let config = Configuration::from_reader(Some(&mut file)).unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_invalid_file() {
        let mut file = Cursor::new("cacheSettleWait: soon\n");
        let err = Configuration::from_reader(Some(&mut file)).unwrap_err();
        assert!(err.to_string().contains("invalid plugin configuration"));

        let mut file = Cursor::new("unknownField: 1\n");
        assert!(Configuration::from_reader(Some(&mut file)).is_err());
    }
}
