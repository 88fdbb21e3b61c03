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

//! Seed: a cluster hosting shoot control planes.

use crate::api::core::{ObjectMeta, SecretReference};
use crate::impl_resource;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Seed {
    pub metadata: ObjectMeta,
    pub spec: SeedSpec,
}

impl_resource!(Seed, "Seed", "seeds");

impl Seed {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            ..Default::default()
        }
    }
}

/// SeedSpec is shared by Seeds and the seed templates of ManagedSeeds/Gardenlets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedSpec {
    pub provider: SeedProvider,
    pub ingress: Option<Ingress>,
    pub dns: SeedDns,
    pub networks: SeedNetworks,
    pub backup: Option<SeedBackup>,
    pub settings: Option<SeedSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedProvider {
    pub provider_type: String,
    pub region: String,
    pub zones: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ingress {
    pub domain: String,
    pub controller_kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedDns {
    pub provider: Option<SeedDnsProvider>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedDnsProvider {
    pub provider_type: String,
    pub secret_ref: SecretReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedNetworks {
    pub nodes: Option<String>,
    pub pods: String,
    pub services: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedBackup {
    pub provider: String,
    pub region: Option<String>,
    pub secret_ref: SecretReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedSettings {
    pub vertical_pod_autoscaler: Option<SettingEnabled>,
    pub topology_aware_routing: Option<SettingEnabled>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingEnabled {
    pub enabled: bool,
}

/// ExposureClass selects how a shoot's control plane is exposed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExposureClass {
    pub metadata: ObjectMeta,
    pub handler: String,
}

impl_resource!(ExposureClass, "ExposureClass", "exposureclasses");

impl ExposureClass {
    pub fn new(name: &str, handler: &str) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            handler: handler.to_string(),
        }
    }
}
