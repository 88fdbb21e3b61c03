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

use super::ReferenceManager;
use crate::admission::{
    Authorizer, AuthorizerAttributes, AuthorizerDecision, StaticDiscovery,
};
use crate::cache::Informers;
use crate::config::Configuration;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Authorizer allowing everything except explicitly denied (resource, name) pairs.
#[derive(Default)]
pub(super) struct FakeAuthorizer {
    denied: Mutex<BTreeSet<(String, String)>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeAuthorizer {
    pub(super) fn deny(&self, resource: &str, name: &str) {
        self.denied
            .lock()
            .unwrap()
            .insert((resource.to_string(), name.to_string()));
    }

    pub(super) fn fail_with(&self, error: &str) {
        *self.failure.lock().unwrap() = Some(error.to_string());
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authorizer for FakeAuthorizer {
    async fn authorize(
        &self,
        attrs: &AuthorizerAttributes,
    ) -> (AuthorizerDecision, String, Option<String>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return (AuthorizerDecision::NoOpinion, String::new(), Some(error));
        }
        let key = (attrs.resource.clone(), attrs.name.clone());
        if self.denied.lock().unwrap().contains(&key) {
            return (AuthorizerDecision::NoOpinion, String::new(), None);
        }
        (AuthorizerDecision::Allow, String::new(), None)
    }
}

/// Shared caches plus a plugin wired to them without any waiting.
pub(super) struct Fixture {
    pub(super) informers: Informers,
    pub(super) authorizer: Arc<FakeAuthorizer>,
}

impl Fixture {
    pub(super) fn new() -> Self {
        let authorizer = Arc::new(FakeAuthorizer::default());
        let informers = Informers::new(
            authorizer.clone(),
            Arc::new(StaticDiscovery::with_common_resources()),
        );
        Self {
            informers,
            authorizer,
        }
    }

    pub(super) fn plugin(&self) -> ReferenceManager {
        ReferenceManager::from_informers(&self.informers)
            .with_configuration(&Configuration::immediate())
    }
}
