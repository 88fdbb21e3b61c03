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

use super::{Client, Error, Lister, Result};
use crate::api::core::Resource;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

/// In-memory object store keyed by namespace and name.
///
/// It serves as informer cache and as live client. Reads are counted and a store can
/// be told to fail every read, to exercise error paths.
pub struct Store<T: Resource> {
    objects: RwLock<BTreeMap<(String, String), T>>,
    synced: AtomicBool,
    failure: RwLock<Option<Error>>,
    gets: AtomicUsize,
    lists: AtomicUsize,
}

impl<T: Resource> Store<T> {
    /// Creates an empty, synced store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            synced: AtomicBool::new(true),
            failure: RwLock::new(None),
            gets: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
        }
    }

    pub fn from_objects(objects: impl IntoIterator<Item = T>) -> Self {
        let store = Self::new();
        for object in objects {
            store.add(object);
        }
        store
    }

    /// Adds or replaces an object.
    pub fn add(&self, object: T) {
        let key = (object.meta().namespace.clone(), object.meta().name.clone());
        self.objects
            .write()
            .expect("store lock poisoned")
            .insert(key, object);
    }

    pub fn delete(&self, namespace: &str, name: &str) {
        self.objects
            .write()
            .expect("store lock poisoned")
            .remove(&(namespace.to_string(), name.to_string()));
    }

    pub fn set_synced(&self, synced: bool) {
        self.synced.store(synced, Ordering::SeqCst);
    }

    /// Makes every subsequent read fail with the given error.
    pub fn fail_with(&self, error: Error) {
        *self.failure.write().expect("store lock poisoned") = Some(error);
    }

    /// Number of `get` calls served so far.
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `list` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.read().expect("store lock poisoned").as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn read(&self, namespace: &str, name: &str) -> Result<T> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.objects
            .read()
            .expect("store lock poisoned")
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found(T::KIND, namespace, name))
    }
}

impl<T: Resource> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> Lister<T> for Store<T> {
    fn get(&self, namespace: &str, name: &str) -> Result<T> {
        self.read(namespace, name)
    }

    fn list(&self) -> Result<Vec<T>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .objects
            .read()
            .expect("store lock poisoned")
            .values()
            .cloned()
            .collect())
    }

    fn has_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Resource> Client<T> for Store<T> {
    async fn get(&self, namespace: &str, name: &str) -> Result<T> {
        self.read(namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::garden::Seed;

    #[test]
    fn test_store_get_and_list() {
        let store = Store::from_objects(vec![Seed::new("aws-eu1"), Seed::new("gcp-us1")]);

        assert_eq!(Lister::get(&store, "", "aws-eu1").unwrap().metadata.name, "aws-eu1");
        assert!(Lister::get(&store, "", "azure").unwrap_err().is_not_found());
        assert_eq!(store.list().unwrap().len(), 2);
        assert_eq!(store.get_calls(), 2);
        assert_eq!(store.list_calls(), 1);

        store.delete("", "aws-eu1");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_store_failure_injection() {
        let store = Store::from_objects(vec![Seed::new("aws-eu1")]);
        store.fail_with(Error::Other("connection refused".to_string()));

        assert_eq!(
            Lister::get(&store, "", "aws-eu1").unwrap_err(),
            Error::Other("connection refused".to_string())
        );
        assert!(store.list().is_err());
    }

    #[test]
    fn test_store_synced_flag() {
        let store: Store<Seed> = Store::new();
        assert!(store.has_synced());
        store.set_synced(false);
        assert!(!store.has_synced());
    }

    #[tokio::test]
    async fn test_store_as_client() {
        let store = Store::from_objects(vec![Seed::new("aws-eu1")]);
        let seed = Client::get(&store, "", "aws-eu1").await.unwrap();
        assert_eq!(seed.metadata.name, "aws-eu1");
    }
}
