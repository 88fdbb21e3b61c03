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

//! Types of the `seedmanagement.gardener.cloud` group.
//!
//! A ManagedSeed turns an existing shoot into a seed; a Gardenlet registers an
//! externally managed cluster as a seed. Both carry a seed template and share
//! a name space, so one name may be claimed by only one of them.

use crate::api::core::ObjectMeta;
use crate::api::garden::SeedSpec;
use crate::impl_resource;
use std::collections::BTreeMap;

pub const GROUP_NAME: &str = "seedmanagement.gardener.cloud";

/// SeedTemplate is the seed a gardenlet registers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedTemplate {
    pub labels: BTreeMap<String, String>,
    pub spec: SeedSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GardenletConfig {
    pub seed_config: Option<SeedTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManagedSeed {
    pub metadata: ObjectMeta,
    pub spec: ManagedSeedSpec,
}

impl_resource!(ManagedSeed, "ManagedSeed", "managedseeds");

impl ManagedSeed {
    pub fn new(namespace: &str, name: &str, shoot_name: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: ManagedSeedSpec {
                shoot: Some(ManagedSeedShoot {
                    name: shoot_name.to_string(),
                }),
                gardenlet: GardenletConfig::default(),
            },
        }
    }

    pub fn seed_template(&self) -> Option<&SeedTemplate> {
        self.spec.gardenlet.seed_config.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManagedSeedSpec {
    pub shoot: Option<ManagedSeedShoot>,
    pub gardenlet: GardenletConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManagedSeedShoot {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gardenlet {
    pub metadata: ObjectMeta,
    pub spec: GardenletSpec,
}

impl_resource!(Gardenlet, "Gardenlet", "gardenlets");

impl Gardenlet {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GardenletSpec {
    pub image_ref: Option<String>,
    pub config: GardenletConfig,
}
