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

//! Types of the `core.gardener.cloud` and `security.gardener.cloud` groups.

pub mod backup;
pub mod bindings;
pub mod cloudprofile;
pub mod controller;
pub mod project;
pub mod seed;
pub mod shoot;

pub use backup::{BackupBucket, BackupBucketSpec, BackupEntry, BackupEntrySpec};
pub use bindings::{
    BindingProvider, CredentialsBinding, Quota, QuotaSpec, SecretBinding, WorkloadIdentity,
};
pub use cloudprofile::{
    CloudProfile, CloudProfileReference, CloudProfileSpec, ExpirableVersion, KubernetesSettings,
    Limits, MachineImage, NamespacedCloudProfile, NamespacedCloudProfileSpec, KIND_CLOUD_PROFILE,
    KIND_NAMESPACED_CLOUD_PROFILE,
};
pub use controller::{
    ControllerDeployment, ControllerRegistration, ControllerRegistrationDeployment,
    ControllerRegistrationSpec, DeploymentRef,
};
pub use project::{Project, ProjectMember, ProjectSpec, ROLE_ADMIN, ROLE_OWNER, ROLE_VIEWER};
pub use seed::{
    ExposureClass, Ingress, Seed, SeedBackup, SeedDns, SeedDnsProvider, SeedNetworks,
    SeedProvider, SeedSettings, SeedSpec, SettingEnabled,
};
pub use shoot::{
    AdmissionPlugin, AuditConfig, AuthorizerKubeconfigReference, CrossVersionObjectReference, Dns,
    DnsProvider, KubeAPIServerConfig, Kubernetes, Machine, NamedResourceReference, Networking,
    Provider, Shoot, ShootMachineImage, ShootSpec, ShootStatus, StructuredAuthentication,
    StructuredAuthorization, VerticalPodAutoscaler, Worker,
};

/// API group of the garden resources.
pub const GROUP_NAME: &str = "core.gardener.cloud";

/// API group of workload identities.
pub const SECURITY_GROUP_NAME: &str = "security.gardener.cloud";
