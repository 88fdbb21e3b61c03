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

use super::{core_resource, garden_resource, security_resource, Request, ReferenceManager};
use crate::admission::gate::{self, changed, Gate, MetadataPolicy};
use crate::admission::{AdmissionError, AdmissionResult};
use crate::api::core::ObjectReference;
use crate::api::garden::{CredentialsBinding, SecretBinding, GROUP_NAME, SECURITY_GROUP_NAME};
use std::collections::HashMap;
use tracing::debug;

const SCOPE_PROJECT: &str = "project";
const SCOPE_CREDENTIALS: &str = "credentials";

impl ReferenceManager {
    pub(super) async fn admit_secret_binding(
        &self,
        request: &Request,
        binding: &SecretBinding,
        old: Option<&SecretBinding>,
    ) -> AdmissionResult<()> {
        let spec = (&binding.secret_ref, &binding.quotas, &binding.provider);
        let old_spec = old.map(|o| (&o.secret_ref, &o.quotas, &o.provider));
        let gate = gate::evaluate(
            request.operation,
            old.zip(old_spec.as_ref()).map(|(o, s)| (&o.metadata, s)),
            (&binding.metadata, &spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            debug!(namespace = %request.namespace, name = %request.name, "secret binding unchanged, skipping");
            return Ok(());
        }

        let secret = &binding.secret_ref;
        if changed(old.map(|o| &o.secret_ref), secret) {
            self.authorize_read(
                request,
                "secret binding",
                &core_resource("secrets"),
                &secret.namespace,
                &secret.name,
            )
            .await?;
            self.lookup(request, &self.secrets, "secret", &secret.namespace, &secret.name)
                .await?;
        }

        if changed(old.map(|o| &o.quotas), &binding.quotas) {
            self.check_quotas(request, "secret binding", &binding.quotas)
                .await?;
        }
        Ok(())
    }

    pub(super) async fn admit_credentials_binding(
        &self,
        request: &Request,
        binding: &CredentialsBinding,
        old: Option<&CredentialsBinding>,
    ) -> AdmissionResult<()> {
        let spec = (&binding.credentials_ref, &binding.quotas, &binding.provider);
        let old_spec = old.map(|o| (&o.credentials_ref, &o.quotas, &o.provider));
        let gate = gate::evaluate(
            request.operation,
            old.zip(old_spec.as_ref()).map(|(o, s)| (&o.metadata, s)),
            (&binding.metadata, &spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            debug!(namespace = %request.namespace, name = %request.name, "credentials binding unchanged, skipping");
            return Ok(());
        }

        let credentials = &binding.credentials_ref;
        if changed(old.map(|o| &o.credentials_ref), credentials) {
            self.check_credentials(request, credentials).await?;
        }

        if changed(old.map(|o| &o.quotas), &binding.quotas) {
            self.check_quotas(request, "credentials binding", &binding.quotas)
                .await?;
        }
        Ok(())
    }

    async fn check_credentials(
        &self,
        request: &Request,
        credentials: &ObjectReference,
    ) -> AdmissionResult<()> {
        let workload_identity_version = format!("{}/v1alpha1", SECURITY_GROUP_NAME);
        let (namespace, name) = (credentials.namespace.as_str(), credentials.name.as_str());

        if credentials.api_version == "v1" && credentials.kind == "Secret" {
            self.authorize_read(
                request,
                "credentials binding",
                &core_resource("secrets"),
                namespace,
                name,
            )
            .await?;
            self.lookup(request, &self.secrets, "secret", namespace, name)
                .await?;
        } else if credentials.api_version == workload_identity_version
            && credentials.kind == "WorkloadIdentity"
        {
            self.authorize_read(
                request,
                "credentials binding",
                &security_resource("workloadidentities"),
                namespace,
                name,
            )
            .await?;
            self.lookup(
                request,
                &self.workload_identities,
                "workload identity",
                namespace,
                name,
            )
            .await?;
        } else {
            return Err(AdmissionError::bad_request(format!(
                "unsupported credentials reference: {} {}",
                credentials.api_version, credentials.kind
            )));
        }
        Ok(())
    }

    /// Every quota must be readable and exist, and at most one quota per scope may
    /// be bound.
    async fn check_quotas(
        &self,
        request: &Request,
        referrer: &str,
        quotas: &[ObjectReference],
    ) -> AdmissionResult<()> {
        let mut scopes: HashMap<&'static str, &str> = HashMap::new();
        for reference in quotas {
            self.authorize_read(
                request,
                referrer,
                &garden_resource("quotas"),
                &reference.namespace,
                &reference.name,
            )
            .await?;
            let quota = request.resolve(
                &self.quota_lister,
                "quota",
                &reference.namespace,
                &reference.name,
            )?;

            let scope = quota_scope(&quota.spec.scope).ok_or_else(|| {
                request.forbidden(format!(
                    "quota {}/{} has an unsupported scope {} {}",
                    reference.namespace,
                    reference.name,
                    quota.spec.scope.api_version,
                    quota.spec.scope.kind
                ))
            })?;
            if let Some(other) = scopes.insert(scope, reference.name.as_str()) {
                return Err(request.forbidden(format!(
                    "only one quota per scope (project or credentials) can be assigned, quotas {:?} and {:?} both have scope {}",
                    other, reference.name, scope
                )));
            }
        }
        Ok(())
    }
}

fn quota_scope(scope: &ObjectReference) -> Option<&'static str> {
    let group = scope
        .api_version
        .split_once('/')
        .map(|(group, _)| group)
        .unwrap_or_default();
    match (group, scope.kind.as_str()) {
        (GROUP_NAME, "Project") => Some(SCOPE_PROJECT),
        ("", "Secret") | (SECURITY_GROUP_NAME, "WorkloadIdentity") => Some(SCOPE_CREDENTIALS),
        _ => None,
    }
}
