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

//! Untyped live reads for references to arbitrary resources.

use super::{Error, Result};
use crate::admission::GroupVersionResource;
use crate::api::core::ObjectMeta;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// DynamicClient reads the metadata of an object of any served resource.
#[async_trait]
pub trait DynamicClient: Send + Sync {
    async fn get(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> Result<ObjectMeta>;
}

type Key = (GroupVersionResource, String, String);

/// In-memory dynamic client.
#[derive(Default)]
pub struct DynamicStore {
    objects: RwLock<HashMap<Key, ObjectMeta>>,
    gets: AtomicUsize,
}

impl DynamicStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, resource: GroupVersionResource, metadata: ObjectMeta) {
        let key = (resource, metadata.namespace.clone(), metadata.name.clone());
        self.objects
            .write()
            .expect("dynamic store lock poisoned")
            .insert(key, metadata);
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DynamicClient for DynamicStore {
    async fn get(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> Result<ObjectMeta> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let key = (resource.clone(), namespace.to_string(), name.to_string());
        self.objects
            .read()
            .expect("dynamic store lock poisoned")
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::not_found(&resource.group_resource().to_string(), namespace, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dynamic_store() {
        let deployments = GroupVersionResource::new("apps", "v1", "deployments");
        let store = DynamicStore::new();
        store.add(deployments.clone(), ObjectMeta::new("garden-dev", "webhook"));

        let meta = store.get(&deployments, "garden-dev", "webhook").await.unwrap();
        assert_eq!(meta.name, "webhook");

        let err = store.get(&deployments, "garden-prod", "webhook").await.unwrap_err();
        assert_eq!(err.to_string(), "deployments.apps \"webhook\" not found");
        assert_eq!(store.get_calls(), 2);
    }
}
