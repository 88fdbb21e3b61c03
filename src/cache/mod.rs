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

//! Read access to cluster state.
//!
//! Plugins read through [`Lister`]s backed by informer caches, which lag behind the
//! API server, and fall back to a live [`Client`] where a freshly created object may
//! not have reached the cache yet (see [`lookup`]).

mod dynamic;
mod informers;
mod lookup;
mod store;

pub use dynamic::{DynamicClient, DynamicStore};
pub use informers::Informers;
pub use lookup::{get_with_fallback, lookup};
pub use store::Store;

use crate::admission::AdmissionError;
use crate::api::core::Resource;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error returned by listers and clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{kind} \"{name}\" not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn not_found(kind: &str, namespace: &str, name: &str) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<Error> for AdmissionError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { kind, name, .. } => AdmissionError::not_found(kind, name),
            Error::Other(msg) => AdmissionError::internal_error(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Lister reads objects from an informer cache.
pub trait Lister<T: Resource>: Send + Sync {
    /// Returns the object with the given key. Cluster-scoped objects use an empty namespace.
    fn get(&self, namespace: &str, name: &str) -> Result<T>;

    fn list(&self) -> Result<Vec<T>>;

    /// Reports whether the cache completed its initial sync.
    fn has_synced(&self) -> bool;

    fn list_namespaced(&self, namespace: &str) -> Result<Vec<T>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|o| o.meta().namespace == namespace)
            .collect())
    }
}

/// Client reads objects directly from the API server.
#[async_trait]
pub trait Client<T: Resource>: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<T>;
}

/// Source pairs the cache of a kind with its live client, for kinds whose objects
/// are commonly created right before they are referenced.
pub struct Source<T: Resource> {
    pub lister: Arc<dyn Lister<T>>,
    pub client: Arc<dyn Client<T>>,
}

impl<T: Resource> Source<T> {
    pub fn new(lister: Arc<dyn Lister<T>>, client: Arc<dyn Client<T>>) -> Self {
        Self { lister, client }
    }

    /// Resolves an object with the cache-then-live fallback.
    pub async fn lookup(&self, wait: Duration, namespace: &str, name: &str) -> Result<T> {
        lookup(self.lister.as_ref(), self.client.as_ref(), wait, namespace, name).await
    }

    pub fn has_synced(&self) -> bool {
        self.lister.has_synced()
    }
}

impl<T: Resource> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            lister: self.lister.clone(),
            client: self.client.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::core::Secret;

    #[test]
    fn test_error_conversion() {
        let err = Error::not_found("Secret", "garden-dev", "creds");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Secret \"creds\" not found");

        let admission: AdmissionError = err.into();
        assert_eq!(admission.status_code(), 404);

        let admission: AdmissionError = Error::Other("etcd timeout".to_string()).into();
        assert_eq!(admission.status_code(), 500);
    }

    #[test]
    fn test_list_namespaced() {
        let store = Store::new();
        store.add(Secret::new("garden-dev", "a"));
        store.add(Secret::new("garden-dev", "b"));
        store.add(Secret::new("garden-prod", "c"));

        let secrets = Lister::list_namespaced(&store, "garden-dev").unwrap();
        assert_eq!(secrets.len(), 2);
    }
}
