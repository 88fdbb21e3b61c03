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

//! CloudProfile and NamespacedCloudProfile: the version catalogues shoots pick from.

use crate::api::core::ObjectMeta;
use crate::impl_resource;
use chrono::{DateTime, Utc};

pub const KIND_CLOUD_PROFILE: &str = "CloudProfile";
pub const KIND_NAMESPACED_CLOUD_PROFILE: &str = "NamespacedCloudProfile";

/// CloudProfileReference is a typed reference to either profile kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CloudProfileReference {
    pub kind: String,
    pub name: String,
}

impl CloudProfileReference {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

/// ExpirableVersion is a version that may stop being offered at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpirableVersion {
    pub version: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub classification: Option<String>,
}

impl ExpirableVersion {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..Default::default()
        }
    }

    pub fn expiring(version: &str, expiration_date: DateTime<Utc>) -> Self {
        Self {
            version: version.to_string(),
            expiration_date: Some(expiration_date),
            classification: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|date| date <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KubernetesSettings {
    pub versions: Vec<ExpirableVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MachineImage {
    pub name: String,
    pub versions: Vec<ExpirableVersion>,
}

impl MachineImage {
    pub fn new(name: &str, versions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            versions: versions.iter().map(|v| ExpirableVersion::new(v)).collect(),
        }
    }
}

/// Limits caps what shoots using the profile may request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Limits {
    pub max_nodes_total: Option<i32>,
}

/// CloudProfile is a cluster-scoped catalogue of versions and limits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloudProfile {
    pub metadata: ObjectMeta,
    pub spec: CloudProfileSpec,
}

impl_resource!(CloudProfile, "CloudProfile", "cloudprofiles");

impl CloudProfile {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloudProfileSpec {
    pub provider_type: String,
    pub kubernetes: KubernetesSettings,
    pub machine_images: Vec<MachineImage>,
    pub limits: Option<Limits>,
}

/// NamespacedCloudProfile extends a parent CloudProfile within one project namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespacedCloudProfile {
    pub metadata: ObjectMeta,
    pub spec: NamespacedCloudProfileSpec,
}

impl_resource!(
    NamespacedCloudProfile,
    "NamespacedCloudProfile",
    "namespacedcloudprofiles"
);

impl NamespacedCloudProfile {
    pub fn new(namespace: &str, name: &str, parent: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: NamespacedCloudProfileSpec {
                parent: CloudProfileReference::new(KIND_CLOUD_PROFILE, parent),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespacedCloudProfileSpec {
    pub parent: CloudProfileReference,
    /// Overrides (e.g. extended expiration dates) of parent Kubernetes versions.
    pub kubernetes: Option<KubernetesSettings>,
    /// Additional images or overrides of parent image versions.
    pub machine_images: Vec<MachineImage>,
    pub limits: Option<Limits>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expirable_version() {
        let now = Utc::now();
        assert!(!ExpirableVersion::new("1.30.0").is_expired(now));
        assert!(ExpirableVersion::expiring("1.29.0", now - Duration::days(1)).is_expired(now));
        assert!(!ExpirableVersion::expiring("1.29.0", now + Duration::days(1)).is_expired(now));
    }

    #[test]
    fn test_namespaced_cloud_profile_parent() {
        let profile = NamespacedCloudProfile::new("garden-dev", "custom", "aws");
        assert_eq!(profile.spec.parent.kind, KIND_CLOUD_PROFILE);
        assert_eq!(profile.spec.parent.name, "aws");
    }
}
