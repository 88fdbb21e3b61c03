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

//! ResourceReferenceManager admission controller.
//!
//! Every object admitted here points at other objects by name: shoots at cloud
//! profiles, seeds, bindings and secrets, bindings at secrets and quotas, backup
//! entries at buckets and so on. The plugin makes sure
//!
//! - every newly set reference resolves to an existing object,
//! - the requesting user may read what they reference,
//! - a cloud profile update does not take versions or capacity away from shoots
//!   still using them,
//!
//! and it defaults the creator and owner fields of shoots and projects.

mod bindings;
mod cloudprofile;
mod controllerregistration;
mod project;
mod seed;
mod shoot;
#[cfg(test)]
mod testutil;

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Authorizer, AuthorizerAttributes,
    AuthorizerDecision, Discovery, GroupVersionResource, Handler, Instance, Interface,
    MutationInterface, Operation, Plugins, UserInfo,
};
use crate::api::core::{ConfigMap, Resource, Secret};
use crate::api::garden::{
    BackupBucket, BackupEntry, CloudProfile, ControllerDeployment, ControllerRegistration,
    CredentialsBinding, ExposureClass, NamespacedCloudProfile, Project, Quota, SecretBinding, Seed,
    Shoot, WorkloadIdentity,
};
use crate::api::Object;
use crate::cache::{self, DynamicClient, Informers, Lister, Source};
use crate::config::Configuration;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Plugin name for the ResourceReferenceManager admission controller.
pub const PLUGIN_NAME: &str = "ResourceReferenceManager";

/// Kinds whose requests the plugin inspects.
const HANDLED_KINDS: &[&str] = &[
    Shoot::KIND,
    Seed::KIND,
    Project::KIND,
    SecretBinding::KIND,
    CredentialsBinding::KIND,
    CloudProfile::KIND,
    NamespacedCloudProfile::KIND,
    BackupBucket::KIND,
    BackupEntry::KIND,
    ControllerRegistration::KIND,
];

/// Register the ResourceReferenceManager plugin with the plugin registry.
pub fn register(plugins: &Plugins) {
    plugins.register(PLUGIN_NAME, new_factory);
}

fn new_factory(config: Option<&mut dyn Read>, informers: &Informers) -> AdmissionResult<Instance> {
    let configuration = Configuration::from_reader(config)?;
    let plugin = ReferenceManager::from_informers(informers).with_configuration(&configuration);
    Ok(Instance::Mutating(Arc::new(plugin)))
}

/// ReferenceManager validates and defaults cross-object references.
pub struct ReferenceManager {
    handler: Handler,
    settle_wait: Duration,
    authorizer: Option<Arc<dyn Authorizer>>,
    discovery: Option<Arc<dyn Discovery>>,
    dynamic_client: Option<Arc<dyn DynamicClient>>,
    seed_lister: Option<Arc<dyn Lister<Seed>>>,
    shoot_lister: Option<Arc<dyn Lister<Shoot>>>,
    project_lister: Option<Arc<dyn Lister<Project>>>,
    quota_lister: Option<Arc<dyn Lister<Quota>>>,
    secret_binding_lister: Option<Arc<dyn Lister<SecretBinding>>>,
    credentials_binding_lister: Option<Arc<dyn Lister<CredentialsBinding>>>,
    cloud_profile_lister: Option<Arc<dyn Lister<CloudProfile>>>,
    namespaced_cloud_profile_lister: Option<Arc<dyn Lister<NamespacedCloudProfile>>>,
    exposure_class_lister: Option<Arc<dyn Lister<ExposureClass>>>,
    backup_bucket_lister: Option<Arc<dyn Lister<BackupBucket>>>,
    backup_entry_lister: Option<Arc<dyn Lister<BackupEntry>>>,
    secrets: Option<Source<Secret>>,
    config_maps: Option<Source<ConfigMap>>,
    controller_deployments: Option<Source<ControllerDeployment>>,
    workload_identities: Option<Source<WorkloadIdentity>>,
}

impl ReferenceManager {
    /// Create a plugin without any collaborators. They are added with the `with_*`
    /// methods; each lister and source becomes a readiness dependency.
    pub fn new() -> Self {
        Self {
            handler: Handler::new_create_update_delete(),
            settle_wait: crate::config::DEFAULT_CACHE_SETTLE_WAIT,
            authorizer: None,
            discovery: None,
            dynamic_client: None,
            seed_lister: None,
            shoot_lister: None,
            project_lister: None,
            quota_lister: None,
            secret_binding_lister: None,
            credentials_binding_lister: None,
            cloud_profile_lister: None,
            namespaced_cloud_profile_lister: None,
            exposure_class_lister: None,
            backup_bucket_lister: None,
            backup_entry_lister: None,
            secrets: None,
            config_maps: None,
            controller_deployments: None,
            workload_identities: None,
        }
    }

    /// Wires every collaborator from the shared informers.
    pub fn from_informers(informers: &Informers) -> Self {
        Self::new()
            .with_authorizer(informers.authorizer.clone())
            .with_discovery(informers.discovery.clone())
            .with_dynamic_client(informers.dynamic.clone())
            .with_seed_lister(informers.seeds.clone())
            .with_shoot_lister(informers.shoots.clone())
            .with_project_lister(informers.projects.clone())
            .with_quota_lister(informers.quotas.clone())
            .with_secret_binding_lister(informers.secret_bindings.clone())
            .with_credentials_binding_lister(informers.credentials_bindings.clone())
            .with_cloud_profile_lister(informers.cloud_profiles.clone())
            .with_namespaced_cloud_profile_lister(informers.namespaced_cloud_profiles.clone())
            .with_exposure_class_lister(informers.exposure_classes.clone())
            .with_backup_bucket_lister(informers.backup_buckets.clone())
            .with_backup_entry_lister(informers.backup_entries.clone())
            .with_secrets(Informers::source(&informers.secrets))
            .with_config_maps(Informers::source(&informers.config_maps))
            .with_controller_deployments(Informers::source(&informers.controller_deployments))
            .with_workload_identities(Informers::source(&informers.workload_identities))
    }

    pub fn with_configuration(mut self, configuration: &Configuration) -> Self {
        self.settle_wait = configuration.cache_settle_wait();
        self.handler.set_ready_timeout(configuration.ready_timeout());
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn Discovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn with_dynamic_client(mut self, client: Arc<dyn DynamicClient>) -> Self {
        self.dynamic_client = Some(client);
        self
    }

    pub fn with_seed_lister(mut self, lister: Arc<dyn Lister<Seed>>) -> Self {
        self.seed_lister = Some(self.track(lister));
        self
    }

    pub fn with_shoot_lister(mut self, lister: Arc<dyn Lister<Shoot>>) -> Self {
        self.shoot_lister = Some(self.track(lister));
        self
    }

    pub fn with_project_lister(mut self, lister: Arc<dyn Lister<Project>>) -> Self {
        self.project_lister = Some(self.track(lister));
        self
    }

    pub fn with_quota_lister(mut self, lister: Arc<dyn Lister<Quota>>) -> Self {
        self.quota_lister = Some(self.track(lister));
        self
    }

    pub fn with_secret_binding_lister(mut self, lister: Arc<dyn Lister<SecretBinding>>) -> Self {
        self.secret_binding_lister = Some(self.track(lister));
        self
    }

    pub fn with_credentials_binding_lister(
        mut self,
        lister: Arc<dyn Lister<CredentialsBinding>>,
    ) -> Self {
        self.credentials_binding_lister = Some(self.track(lister));
        self
    }

    pub fn with_cloud_profile_lister(mut self, lister: Arc<dyn Lister<CloudProfile>>) -> Self {
        self.cloud_profile_lister = Some(self.track(lister));
        self
    }

    pub fn with_namespaced_cloud_profile_lister(
        mut self,
        lister: Arc<dyn Lister<NamespacedCloudProfile>>,
    ) -> Self {
        self.namespaced_cloud_profile_lister = Some(self.track(lister));
        self
    }

    pub fn with_exposure_class_lister(mut self, lister: Arc<dyn Lister<ExposureClass>>) -> Self {
        self.exposure_class_lister = Some(self.track(lister));
        self
    }

    pub fn with_backup_bucket_lister(mut self, lister: Arc<dyn Lister<BackupBucket>>) -> Self {
        self.backup_bucket_lister = Some(self.track(lister));
        self
    }

    pub fn with_backup_entry_lister(mut self, lister: Arc<dyn Lister<BackupEntry>>) -> Self {
        self.backup_entry_lister = Some(self.track(lister));
        self
    }

    pub fn with_secrets(mut self, source: Source<Secret>) -> Self {
        self.secrets = Some(self.track_source(source));
        self
    }

    pub fn with_config_maps(mut self, source: Source<ConfigMap>) -> Self {
        self.config_maps = Some(self.track_source(source));
        self
    }

    pub fn with_controller_deployments(mut self, source: Source<ControllerDeployment>) -> Self {
        self.controller_deployments = Some(self.track_source(source));
        self
    }

    pub fn with_workload_identities(mut self, source: Source<WorkloadIdentity>) -> Self {
        self.workload_identities = Some(self.track_source(source));
        self
    }

    fn track<T: Resource>(&mut self, lister: Arc<dyn Lister<T>>) -> Arc<dyn Lister<T>> {
        let synced = lister.clone();
        self.handler.add_ready_func(move || synced.has_synced());
        lister
    }

    fn track_source<T: Resource>(&mut self, source: Source<T>) -> Source<T> {
        let synced = source.clone();
        self.handler.add_ready_func(move || synced.has_synced());
        source
    }

    /// Resolves an object through the cache with live fallback.
    async fn lookup<T: Resource>(
        &self,
        request: &Request,
        source: &Option<Source<T>>,
        role: &str,
        namespace: &str,
        name: &str,
    ) -> AdmissionResult<T> {
        required(source, "source")?
            .lookup(self.settle_wait, namespace, name)
            .await
            .map_err(|err| request.unresolved(role, name, err))
    }

    /// Asks the authorizer whether the requesting user may read the referenced object.
    /// Requests the API server issues on its own behalf are not checked.
    async fn authorize_read(
        &self,
        request: &Request,
        referrer: &str,
        resource: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> AdmissionResult<()> {
        if request.user.is_anonymous() {
            return Ok(());
        }
        let authorizer = required(&self.authorizer, "authorizer")?;
        let attributes = AuthorizerAttributes::get_check(&request.user, resource, namespace, name);
        let (decision, reason, error) = authorizer.authorize(&attributes).await;

        // TODO: report authorizer failures as InternalError instead of Forbidden.
        if let Some(error) = error {
            warn!(
                user = %request.user.name,
                resource = %resource.resource,
                namespace,
                name,
                %error,
                "authorization check failed"
            );
            return Err(request.forbidden(format!(
                "{} cannot reference a resource you are not allowed to read: authorization check failed: {}",
                referrer, error
            )));
        }
        if decision != AuthorizerDecision::Allow {
            let mut message = format!(
                "{} cannot reference a resource you are not allowed to read",
                referrer
            );
            if !reason.is_empty() {
                message = format!("{}: {}", message, reason);
            }
            return Err(request.forbidden(message));
        }
        Ok(())
    }

    /// A BackupBucket may not go away while entries are stored in it.
    fn ensure_bucket_unused(&self, request: &Request) -> AdmissionResult<()> {
        let entries = required(&self.backup_entry_lister, "backup entry lister")?.list()?;
        let users: Vec<String> = entries
            .iter()
            .filter(|entry| entry.spec.bucket_name == request.name)
            .map(|entry| namespaced_name(&entry.metadata))
            .collect();
        if users.is_empty() {
            return Ok(());
        }
        Err(request.forbidden(format!(
            "cannot delete BackupBucket because BackupEntries are still referencing it: {}",
            users.join(", ")
        )))
    }
}

impl Default for ReferenceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface for ReferenceManager {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }

    fn validate_initialization(&self) -> AdmissionResult<()> {
        let missing: Vec<&str> = [
            ("authorizer", self.authorizer.is_none()),
            ("discovery client", self.discovery.is_none()),
            ("dynamic client", self.dynamic_client.is_none()),
            ("seed lister", self.seed_lister.is_none()),
            ("shoot lister", self.shoot_lister.is_none()),
            ("project lister", self.project_lister.is_none()),
            ("quota lister", self.quota_lister.is_none()),
            ("secret binding lister", self.secret_binding_lister.is_none()),
            ("credentials binding lister", self.credentials_binding_lister.is_none()),
            ("cloud profile lister", self.cloud_profile_lister.is_none()),
            ("namespaced cloud profile lister", self.namespaced_cloud_profile_lister.is_none()),
            ("exposure class lister", self.exposure_class_lister.is_none()),
            ("backup bucket lister", self.backup_bucket_lister.is_none()),
            ("backup entry lister", self.backup_entry_lister.is_none()),
            ("secret source", self.secrets.is_none()),
            ("config map source", self.config_maps.is_none()),
            ("controller deployment source", self.controller_deployments.is_none()),
            ("workload identity source", self.workload_identities.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AdmissionError::internal_error(format!(
                "{} is not initialized: missing {}",
                PLUGIN_NAME,
                missing.join(", ")
            )))
        }
    }
}

#[async_trait]
impl MutationInterface for ReferenceManager {
    async fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        if !attributes.get_subresource().is_empty()
            || !HANDLED_KINDS.contains(&attributes.get_kind().kind.as_str())
        {
            return Ok(());
        }

        self.handler.ensure_ready(attributes).await?;

        let request = Request::from_attributes(attributes);
        if request.operation == Operation::Delete {
            if request.kind == BackupBucket::KIND {
                return self.ensure_bucket_unused(&request);
            }
            return Ok(());
        }

        let old = attributes.get_old_object().cloned();
        let old = old.as_ref();
        let object = attributes.get_object_mut().ok_or_else(|| {
            AdmissionError::bad_request(format!(
                "{} request for {} {} carries no object",
                request.operation, request.kind, request.name
            ))
        })?;

        match object {
            Object::Shoot(shoot) => {
                self.admit_shoot(&request, shoot, old.and_then(Object::as_shoot))
                    .await
            }
            Object::Seed(seed) => {
                self.admit_seed(&request, seed, old.and_then(Object::as_seed))
                    .await
            }
            Object::Project(project) => {
                self.admit_project(&request, project, old.and_then(Object::as_project))
            }
            Object::SecretBinding(binding) => {
                self.admit_secret_binding(&request, binding, old.and_then(Object::as_secret_binding))
                    .await
            }
            Object::CredentialsBinding(binding) => {
                self.admit_credentials_binding(
                    &request,
                    binding,
                    old.and_then(Object::as_credentials_binding),
                )
                .await
            }
            Object::CloudProfile(profile) => {
                self.admit_cloud_profile(&request, profile, old.and_then(Object::as_cloud_profile))
                    .await
            }
            Object::NamespacedCloudProfile(profile) => {
                self.admit_namespaced_cloud_profile(
                    &request,
                    profile,
                    old.and_then(Object::as_namespaced_cloud_profile),
                )
                .await
            }
            Object::BackupBucket(bucket) => {
                self.admit_backup_bucket(&request, bucket, old.and_then(Object::as_backup_bucket))
                    .await
            }
            Object::BackupEntry(entry) => {
                self.admit_backup_entry(&request, entry, old.and_then(Object::as_backup_entry))
                    .await
            }
            Object::ControllerRegistration(registration) => {
                self.admit_controller_registration(
                    &request,
                    registration,
                    old.and_then(Object::as_controller_registration),
                )
                .await
            }
            Object::ManagedSeed(_) | Object::Gardenlet(_) => Ok(()),
        }
    }
}

// ============================================================================
// Request helpers
// ============================================================================

/// The parts of a request every check needs, detached from the attributes so the
/// admitted object can be borrowed mutably.
#[derive(Debug, Clone)]
struct Request {
    operation: Operation,
    kind: String,
    namespace: String,
    name: String,
    resource: String,
    user: UserInfo,
}

impl Request {
    fn from_attributes(attributes: &dyn Attributes) -> Self {
        Self {
            operation: attributes.get_operation(),
            kind: attributes.get_kind().kind.clone(),
            namespace: attributes.get_namespace().to_string(),
            name: attributes.get_name().to_string(),
            resource: attributes.get_resource().resource.clone(),
            user: attributes.get_user_info().clone(),
        }
    }

    fn forbidden(&self, message: impl fmt::Display) -> AdmissionError {
        AdmissionError::forbidden(&self.name, &self.namespace, &self.resource, message.to_string())
    }

    /// Reports every violation as its own Forbidden error.
    fn forbidden_all(&self, messages: Vec<String>) -> AdmissionResult<()> {
        if messages.is_empty() {
            return Ok(());
        }
        Err(AdmissionError::aggregate(
            messages.into_iter().map(|m| self.forbidden(m)).collect(),
        ))
    }

    /// Wraps a failed reference read: a missing object is Forbidden, a failing store
    /// is an internal error.
    fn unresolved(&self, role: &str, name: &str, err: cache::Error) -> AdmissionError {
        if err.is_not_found() {
            self.forbidden(format!("could not find referenced {} {:?}: {}", role, name, err))
        } else {
            AdmissionError::internal_error(format!(
                "could not read referenced {} {:?}: {}",
                role, name, err
            ))
        }
    }

    /// Reads a referenced object from a lister.
    fn resolve<T: Resource>(
        &self,
        lister: &Option<Arc<dyn Lister<T>>>,
        role: &str,
        namespace: &str,
        name: &str,
    ) -> AdmissionResult<T> {
        required(lister, "lister")?
            .get(namespace, name)
            .map_err(|err| self.unresolved(role, name, err))
    }
}

fn required<'a, T>(dependency: &'a Option<T>, what: &str) -> AdmissionResult<&'a T> {
    dependency
        .as_ref()
        .ok_or_else(|| AdmissionError::internal_error(format!("{} is missing a {}", PLUGIN_NAME, what)))
}

/// Values present in `new` but not in `old`, in order of appearance.
fn added<'a>(
    old: impl IntoIterator<Item = &'a str>,
    new: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    let old: BTreeSet<&str> = old.into_iter().collect();
    let mut seen = BTreeSet::new();
    new.into_iter()
        .filter(|value| !old.contains(value) && seen.insert(*value))
        .collect()
}

fn namespaced_name(meta: &crate::api::core::ObjectMeta) -> String {
    if meta.namespace.is_empty() {
        meta.name.clone()
    } else {
        format!("{}/{}", meta.namespace, meta.name)
    }
}

fn core_resource(resource: &str) -> GroupVersionResource {
    GroupVersionResource::new("", "v1", resource)
}

fn garden_resource(resource: &str) -> GroupVersionResource {
    GroupVersionResource::new(crate::api::garden::GROUP_NAME, "v1beta1", resource)
}

fn security_resource(resource: &str) -> GroupVersionResource {
    GroupVersionResource::new(crate::api::garden::SECURITY_GROUP_NAME, "v1alpha1", resource)
}
