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

//! Base admission handler implementation.
//!
//! Besides the set of handled operations, the handler owns the readiness gate of
//! its plugin: one check per cache the plugin reads from. A plugin is ready once
//! every check reports true; until then every request is rejected.

use super::attributes::Attributes;
use super::errors::{AdmissionError, AdmissionResult};
use super::interfaces::{Interface, Operation};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::warn;

/// ReadyFunc reports whether one dependency of a plugin has synced.
pub type ReadyFunc = Arc<dyn Fn() -> bool + Send + Sync>;

/// Interval between two readiness evaluations while waiting.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default time a request waits for the plugin's caches.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handler is a base struct for admission plugins.
/// It provides default implementation of the Handles method and the readiness gate.
#[derive(Clone)]
pub struct Handler {
    operations: HashSet<Operation>,
    ready_funcs: Vec<ReadyFunc>,
    ready: Arc<AtomicBool>,
    ready_timeout: Duration,
}

impl Handler {
    /// Create a new Handler that handles the given operations.
    pub fn new(operations: &[Operation]) -> Self {
        Self {
            operations: operations.iter().cloned().collect(),
            ready_funcs: Vec::new(),
            ready: Arc::new(AtomicBool::new(false)),
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }

    /// Create a new Handler that handles Create and Update operations.
    /// This is the most common configuration for admission plugins.
    pub fn new_create_update() -> Self {
        Self::new(&[Operation::Create, Operation::Update])
    }

    /// Create a new Handler that handles Create, Update and Delete operations.
    pub fn new_create_update_delete() -> Self {
        Self::new(&[Operation::Create, Operation::Update, Operation::Delete])
    }

    /// Registers one more dependency that has to sync before requests are served.
    pub fn add_ready_func<F>(&mut self, ready: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.ready_funcs.push(Arc::new(ready));
    }

    /// Bounds how long a request waits for the dependencies to sync.
    pub fn set_ready_timeout(&mut self, timeout: Duration) {
        self.ready_timeout = timeout;
    }

    /// Evaluates the readiness checks. Once all of them passed the result is latched.
    pub fn is_ready(&self) -> bool {
        if self.ready.load(Ordering::Acquire) {
            return true;
        }
        if self.ready_funcs.iter().all(|f| f()) {
            self.ready.store(true, Ordering::Release);
            return true;
        }
        false
    }

    /// Waits up to the ready timeout for the dependencies to sync.
    pub async fn wait_for_ready(&self) -> bool {
        let deadline = Instant::now() + self.ready_timeout;
        loop {
            if self.is_ready() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(READY_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Fails closed with Forbidden while the plugin is not ready.
    pub async fn ensure_ready(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        if self.wait_for_ready().await {
            return Ok(());
        }
        warn!(
            kind = %attributes.get_kind().kind,
            namespace = %attributes.get_namespace(),
            name = %attributes.get_name(),
            "rejecting request, caches have not synced"
        );
        Err(AdmissionError::new_forbidden(
            attributes,
            "not yet ready to handle request",
        ))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("operations", &self.operations)
            .field("ready_funcs", &self.ready_funcs.len())
            .field("ready", &self.ready.load(Ordering::Relaxed))
            .field("ready_timeout", &self.ready_timeout)
            .finish()
    }
}

impl Interface for Handler {
    fn handles(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }
}
