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

use super::{DynamicStore, Source, Store};
use crate::admission::{Authorizer, Discovery};
use crate::api::core::{ConfigMap, Resource, Secret};
use crate::api::garden::{
    BackupBucket, BackupEntry, CloudProfile, ControllerDeployment, CredentialsBinding,
    ExposureClass, NamespacedCloudProfile, Project, Quota, SecretBinding, Seed, Shoot,
    WorkloadIdentity,
};
use crate::api::seedmanagement::{Gardenlet, ManagedSeed};
use std::sync::Arc;

/// Informers bundles the shared caches and collaborators handed to plugin factories.
#[derive(Clone)]
pub struct Informers {
    pub shoots: Arc<Store<Shoot>>,
    pub seeds: Arc<Store<Seed>>,
    pub projects: Arc<Store<Project>>,
    pub quotas: Arc<Store<Quota>>,
    pub secret_bindings: Arc<Store<SecretBinding>>,
    pub credentials_bindings: Arc<Store<CredentialsBinding>>,
    pub cloud_profiles: Arc<Store<CloudProfile>>,
    pub namespaced_cloud_profiles: Arc<Store<NamespacedCloudProfile>>,
    pub exposure_classes: Arc<Store<ExposureClass>>,
    pub backup_buckets: Arc<Store<BackupBucket>>,
    pub backup_entries: Arc<Store<BackupEntry>>,
    pub controller_deployments: Arc<Store<ControllerDeployment>>,
    pub managed_seeds: Arc<Store<ManagedSeed>>,
    pub gardenlets: Arc<Store<Gardenlet>>,
    pub secrets: Arc<Store<Secret>>,
    pub config_maps: Arc<Store<ConfigMap>>,
    pub workload_identities: Arc<Store<WorkloadIdentity>>,
    pub dynamic: Arc<DynamicStore>,
    pub authorizer: Arc<dyn Authorizer>,
    pub discovery: Arc<dyn Discovery>,
}

impl Informers {
    pub fn new(authorizer: Arc<dyn Authorizer>, discovery: Arc<dyn Discovery>) -> Self {
        Self {
            shoots: Arc::default(),
            seeds: Arc::default(),
            projects: Arc::default(),
            quotas: Arc::default(),
            secret_bindings: Arc::default(),
            credentials_bindings: Arc::default(),
            cloud_profiles: Arc::default(),
            namespaced_cloud_profiles: Arc::default(),
            exposure_classes: Arc::default(),
            backup_buckets: Arc::default(),
            backup_entries: Arc::default(),
            controller_deployments: Arc::default(),
            managed_seeds: Arc::default(),
            gardenlets: Arc::default(),
            secrets: Arc::default(),
            config_maps: Arc::default(),
            workload_identities: Arc::default(),
            dynamic: Arc::default(),
            authorizer,
            discovery,
        }
    }

    /// Cache and live access for a kind served by a store; the in-memory store
    /// answers both.
    pub fn source<T: Resource>(store: &Arc<Store<T>>) -> Source<T> {
        Source::new(store.clone(), store.clone())
    }
}
