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

//! Shoot references.
//!
//! Only references whose value differs from the stored shoot are re-checked. A user
//! editing the worker pools of a shoot must not fail because a secret referenced
//! by someone else earlier is no longer readable to them.

use super::{added, required, Request, ReferenceManager};
use crate::admission::discovery::resolve_resource;
use crate::admission::gate::{self, changed, Gate, MetadataPolicy};
use crate::admission::{AdmissionError, AdmissionResult, Operation};
use crate::api::core::ANNOTATION_CREATED_BY;
use crate::api::garden::{
    CrossVersionObjectReference, KubeAPIServerConfig, Shoot, ShootSpec, KIND_CLOUD_PROFILE,
    KIND_NAMESPACED_CLOUD_PROFILE,
};
use tracing::debug;

impl ReferenceManager {
    pub(super) async fn admit_shoot(
        &self,
        request: &Request,
        shoot: &mut Shoot,
        old: Option<&Shoot>,
    ) -> AdmissionResult<()> {
        if request.operation == Operation::Create && !request.user.is_anonymous() {
            shoot
                .metadata
                .annotations
                .insert(ANNOTATION_CREATED_BY.to_string(), request.user.name.clone());
        }

        let gate = gate::evaluate(
            request.operation,
            old.map(|o| (&o.metadata, &o.spec)),
            (&shoot.metadata, &shoot.spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            debug!(namespace = %request.namespace, name = %request.name, "shoot references unchanged, skipping");
            return Ok(());
        }

        let shoot: &Shoot = shoot;
        let old_spec = old.map(|o| &o.spec);
        let namespace = shoot.metadata.namespace.as_str();

        self.check_shoot_cloud_profile(request, &shoot.spec, old_spec, namespace)?;

        if let Some(seed) = shoot.spec.seed_name.as_deref() {
            if changed(old_spec.map(|s| &s.seed_name), &shoot.spec.seed_name) {
                request.resolve(&self.seed_lister, "seed", "", seed)?;
            }
        }

        if let Some(binding) = shoot.spec.secret_binding_name.as_deref() {
            if changed(old_spec.map(|s| &s.secret_binding_name), &shoot.spec.secret_binding_name) {
                request.resolve(&self.secret_binding_lister, "secret binding", namespace, binding)?;
            }
        }

        if let Some(binding) = shoot.spec.credentials_binding_name.as_deref() {
            if changed(
                old_spec.map(|s| &s.credentials_binding_name),
                &shoot.spec.credentials_binding_name,
            ) {
                request.resolve(
                    &self.credentials_binding_lister,
                    "credentials binding",
                    namespace,
                    binding,
                )?;
            }
        }

        if let Some(class) = shoot.spec.exposure_class_name.as_deref() {
            if changed(old_spec.map(|s| &s.exposure_class_name), &shoot.spec.exposure_class_name) {
                request.resolve(&self.exposure_class_lister, "exposure class", "", class)?;
            }
        }

        let old_resources = old_spec.map(|s| s.resources.as_slice()).unwrap_or_default();
        for reference in &shoot.spec.resources {
            if old_resources.contains(reference) {
                continue;
            }
            self.check_shoot_resource(request, namespace, &reference.resource_ref)
                .await?;
        }

        let dns_secrets = |spec: &ShootSpec| -> Vec<String> {
            spec.dns
                .iter()
                .flat_map(|dns| dns.providers.iter())
                .filter_map(|provider| provider.secret_name.clone())
                .collect()
        };
        let old_secrets = old_spec.map(dns_secrets).unwrap_or_default();
        let new_secrets = dns_secrets(&shoot.spec);
        for secret in added(
            old_secrets.iter().map(String::as_str),
            new_secrets.iter().map(String::as_str),
        ) {
            self.lookup(request, &self.secrets, "DNS provider secret", namespace, secret)
                .await?;
        }

        let kube_api_server = shoot.spec.kubernetes.kube_api_server.as_ref();
        let old_kube_api_server = old_spec.and_then(|s| s.kubernetes.kube_api_server.as_ref());
        self.check_kube_api_server(request, namespace, kube_api_server, old_kube_api_server)
            .await
    }

    fn check_shoot_cloud_profile(
        &self,
        request: &Request,
        spec: &ShootSpec,
        old_spec: Option<&ShootSpec>,
        namespace: &str,
    ) -> AdmissionResult<()> {
        let reference = spec.cloud_profile_reference();
        let old_reference = old_spec.map(ShootSpec::cloud_profile_reference);
        if !changed(old_reference.as_ref(), &reference) {
            return Ok(());
        }
        let Some(reference) = reference else {
            return Ok(());
        };

        match reference.kind.as_str() {
            KIND_CLOUD_PROFILE => {
                request.resolve(&self.cloud_profile_lister, "cloud profile", "", &reference.name)?;
            }
            KIND_NAMESPACED_CLOUD_PROFILE => {
                request.resolve(
                    &self.namespaced_cloud_profile_lister,
                    "namespaced cloud profile",
                    namespace,
                    &reference.name,
                )?;
            }
            other => {
                return Err(AdmissionError::bad_request(format!(
                    "unsupported cloud profile kind {:?}",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Checks a reference to an arbitrary namespaced resource: it must be served,
    /// readable to the user, and exist.
    async fn check_shoot_resource(
        &self,
        request: &Request,
        namespace: &str,
        reference: &CrossVersionObjectReference,
    ) -> AdmissionResult<()> {
        let discovery = required(&self.discovery, "discovery client")?;
        let (resource, api_resource) =
            resolve_resource(discovery.as_ref(), &reference.api_version, &reference.kind)
                .await
                .map_err(|err| {
                    request.forbidden(format!(
                        "failed to resolve shoot resource reference {:?}: {}",
                        reference.name, err
                    ))
                })?;
        if !api_resource.namespaced {
            return Err(request.forbidden(format!(
                "failed to resolve shoot resource reference {:?}: cannot reference a resource that is not namespaced",
                reference.name
            )));
        }

        self.authorize_read(request, "shoot", &resource, namespace, &reference.name)
            .await?;

        match (resource.group.as_str(), api_resource.kind.as_str()) {
            ("", "Secret") => {
                self.lookup(request, &self.secrets, "resource", namespace, &reference.name)
                    .await?;
            }
            ("", "ConfigMap") => {
                self.lookup(request, &self.config_maps, "resource", namespace, &reference.name)
                    .await?;
            }
            _ => {
                required(&self.dynamic_client, "dynamic client")?
                    .get(&resource, namespace, &reference.name)
                    .await
                    .map_err(|err| request.unresolved("resource", &reference.name, err))?;
            }
        }
        Ok(())
    }

    async fn check_kube_api_server(
        &self,
        request: &Request,
        namespace: &str,
        config: Option<&KubeAPIServerConfig>,
        old: Option<&KubeAPIServerConfig>,
    ) -> AdmissionResult<()> {
        let Some(config) = config else {
            return Ok(());
        };

        let kubeconfigs = |c: &KubeAPIServerConfig| -> Vec<String> {
            c.admission_plugins
                .iter()
                .filter_map(|plugin| plugin.kubeconfig_secret_name.clone())
                .collect()
        };
        let old_kubeconfigs = old.map(kubeconfigs).unwrap_or_default();
        let new_kubeconfigs = kubeconfigs(config);
        for secret in added(
            old_kubeconfigs.iter().map(String::as_str),
            new_kubeconfigs.iter().map(String::as_str),
        ) {
            self.lookup(
                request,
                &self.secrets,
                "admission plugin kubeconfig secret",
                namespace,
                secret,
            )
            .await?;
        }

        let authentication = config
            .structured_authentication
            .as_ref()
            .map(|a| a.config_map_name.as_str());
        let old_authentication = old
            .and_then(|c| c.structured_authentication.as_ref())
            .map(|a| a.config_map_name.as_str());
        if let Some(name) = authentication.filter(|_| authentication != old_authentication) {
            self.lookup(
                request,
                &self.config_maps,
                "structured authentication config map",
                namespace,
                name,
            )
            .await?;
        }

        let authorization = config.structured_authorization.as_ref();
        let old_authorization = old.and_then(|c| c.structured_authorization.as_ref());
        if let Some(authorization) = authorization {
            let old_name = old_authorization.map(|a| a.config_map_name.as_str());
            if old_name != Some(authorization.config_map_name.as_str()) {
                self.lookup(
                    request,
                    &self.config_maps,
                    "structured authorization config map",
                    namespace,
                    &authorization.config_map_name,
                )
                .await?;
            }

            let old_secrets = old_authorization
                .into_iter()
                .flat_map(|a| a.kubeconfigs.iter())
                .map(|k| k.secret_name.as_str());
            let new_secrets = authorization
                .kubeconfigs
                .iter()
                .map(|k| k.secret_name.as_str());
            for secret in added(old_secrets, new_secrets) {
                self.lookup(
                    request,
                    &self.secrets,
                    "structured authorization kubeconfig secret",
                    namespace,
                    secret,
                )
                .await?;
            }
        }

        let audit_policy = config
            .audit_config
            .as_ref()
            .and_then(|a| a.audit_policy_config_map_name.as_deref());
        let old_audit_policy = old
            .and_then(|c| c.audit_config.as_ref())
            .and_then(|a| a.audit_policy_config_map_name.as_deref());
        if let Some(name) = audit_policy.filter(|_| audit_policy != old_audit_policy) {
            self.lookup(request, &self.config_maps, "audit policy config map", namespace, name)
                .await?;
        }

        Ok(())
    }
}
