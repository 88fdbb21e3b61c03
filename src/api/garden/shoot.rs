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

//! Shoot: a user cluster whose control plane runs on a seed.

use super::cloudprofile::{CloudProfileReference, KIND_CLOUD_PROFILE};
use crate::api::core::ObjectMeta;
use crate::impl_resource;
use std::collections::BTreeSet;

/// Shoot represents a cluster requested by a project member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shoot {
    pub metadata: ObjectMeta,
    pub spec: ShootSpec,
    pub status: ShootStatus,
}

impl_resource!(Shoot, "Shoot", "shoots");

impl Shoot {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            ..Default::default()
        }
    }

    /// Whether the shoot's control plane is scheduled (or running) on the given seed.
    pub fn is_scheduled_on(&self, seed_name: &str) -> bool {
        self.spec.seed_name.as_deref() == Some(seed_name)
            || self.status.seed_name.as_deref() == Some(seed_name)
    }

    /// Union of all zones configured across worker pools.
    pub fn worker_zones(&self) -> BTreeSet<String> {
        self.spec
            .provider
            .workers
            .iter()
            .flat_map(|w| w.zones.iter().cloned())
            .collect()
    }
}

/// ShootSpec is the desired state of a shoot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShootSpec {
    /// Legacy cluster-scoped cloud profile reference.
    pub cloud_profile_name: Option<String>,
    /// Typed reference to a CloudProfile or NamespacedCloudProfile.
    pub cloud_profile: Option<CloudProfileReference>,
    pub seed_name: Option<String>,
    pub secret_binding_name: Option<String>,
    pub credentials_binding_name: Option<String>,
    pub exposure_class_name: Option<String>,
    pub region: String,
    pub provider: Provider,
    pub kubernetes: Kubernetes,
    pub networking: Option<Networking>,
    pub dns: Option<Dns>,
    pub resources: Vec<NamedResourceReference>,
}

impl ShootSpec {
    /// The effective cloud profile reference; the typed reference wins over the legacy name.
    pub fn cloud_profile_reference(&self) -> Option<CloudProfileReference> {
        if let Some(reference) = &self.cloud_profile {
            return Some(reference.clone());
        }
        self.cloud_profile_name
            .as_ref()
            .map(|name| CloudProfileReference::new(KIND_CLOUD_PROFILE, name))
    }
}

/// Provider holds the infrastructure type and worker pools.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provider {
    pub provider_type: String,
    pub workers: Vec<Worker>,
}

/// Worker is a pool of machines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Worker {
    pub name: String,
    pub machine: Machine,
    pub minimum: i32,
    pub maximum: i32,
    pub zones: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Machine {
    pub machine_type: String,
    pub image: Option<ShootMachineImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShootMachineImage {
    pub name: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Kubernetes {
    pub version: String,
    pub kube_api_server: Option<KubeAPIServerConfig>,
    pub vertical_pod_autoscaler: Option<VerticalPodAutoscaler>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerticalPodAutoscaler {
    pub enabled: bool,
}

/// KubeAPIServerConfig holds the API server settings that reference other objects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KubeAPIServerConfig {
    pub admission_plugins: Vec<AdmissionPlugin>,
    pub structured_authentication: Option<StructuredAuthentication>,
    pub structured_authorization: Option<StructuredAuthorization>,
    pub audit_config: Option<AuditConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdmissionPlugin {
    pub name: String,
    pub kubeconfig_secret_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredAuthentication {
    pub config_map_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredAuthorization {
    pub config_map_name: String,
    pub kubeconfigs: Vec<AuthorizerKubeconfigReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorizerKubeconfigReference {
    pub authorizer_name: String,
    pub secret_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditConfig {
    pub audit_policy_config_map_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Networking {
    pub networking_type: Option<String>,
    pub nodes: Option<String>,
    pub pods: Option<String>,
    pub services: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dns {
    pub domain: Option<String>,
    pub providers: Vec<DnsProvider>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DnsProvider {
    pub provider_type: Option<String>,
    pub secret_name: Option<String>,
    pub primary: Option<bool>,
}

/// NamedResourceReference lets a shoot reference an arbitrary namespaced object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamedResourceReference {
    pub name: String,
    pub resource_ref: CrossVersionObjectReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrossVersionObjectReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShootStatus {
    pub seed_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::garden::cloudprofile::KIND_NAMESPACED_CLOUD_PROFILE;

    #[test]
    fn test_cloud_profile_reference() {
        let mut spec = ShootSpec {
            cloud_profile_name: Some("aws".to_string()),
            ..Default::default()
        };
        assert_eq!(
            spec.cloud_profile_reference(),
            Some(CloudProfileReference::new(KIND_CLOUD_PROFILE, "aws"))
        );

        spec.cloud_profile = Some(CloudProfileReference::new(
            KIND_NAMESPACED_CLOUD_PROFILE,
            "aws-custom",
        ));
        assert_eq!(
            spec.cloud_profile_reference().map(|r| r.name),
            Some("aws-custom".to_string())
        );

        assert_eq!(ShootSpec::default().cloud_profile_reference(), None);
    }

    #[test]
    fn test_worker_zones_and_scheduling() {
        let mut shoot = Shoot::new("garden-dev", "crazy-botany");
        shoot.spec.provider.workers = vec![
            Worker {
                zones: vec!["a".to_string(), "b".to_string()],
                ..Default::default()
            },
            Worker {
                zones: vec!["b".to_string(), "c".to_string()],
                ..Default::default()
            },
        ];
        assert_eq!(shoot.worker_zones().len(), 3);

        assert!(!shoot.is_scheduled_on("seed-1"));
        shoot.status.seed_name = Some("seed-1".to_string());
        assert!(shoot.is_scheduled_on("seed-1"));
    }
}
