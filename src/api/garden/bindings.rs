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

//! Credential bindings and the quotas attached to them.

use crate::api::core::{ObjectMeta, ObjectReference, SecretReference};
use crate::impl_resource;
use std::collections::BTreeMap;

/// Quota limits what a project or a set of credentials may consume.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Quota {
    pub metadata: ObjectMeta,
    pub spec: QuotaSpec,
}

impl_resource!(Quota, "Quota", "quotas");

impl Quota {
    pub fn new(namespace: &str, name: &str, scope_kind: &str) -> Self {
        let api_version = if scope_kind == "Project" {
            "core.gardener.cloud/v1beta1"
        } else if scope_kind == "WorkloadIdentity" {
            "security.gardener.cloud/v1alpha1"
        } else {
            "v1"
        };
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: QuotaSpec {
                scope: ObjectReference::new(api_version, scope_kind, "", ""),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuotaSpec {
    /// Only `apiVersion` and `kind` are meaningful.
    pub scope: ObjectReference,
    pub cluster_lifetime_days: Option<i32>,
    pub metrics: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingProvider {
    pub provider_type: String,
}

/// SecretBinding grants shoots in its namespace use of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretBinding {
    pub metadata: ObjectMeta,
    pub secret_ref: SecretReference,
    pub quotas: Vec<ObjectReference>,
    pub provider: Option<BindingProvider>,
}

impl_resource!(SecretBinding, "SecretBinding", "secretbindings");

impl SecretBinding {
    pub fn new(namespace: &str, name: &str, secret_ref: SecretReference) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            secret_ref,
            quotas: Vec::new(),
            provider: None,
        }
    }
}

/// CredentialsBinding grants use of a Secret or WorkloadIdentity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialsBinding {
    pub metadata: ObjectMeta,
    pub credentials_ref: ObjectReference,
    pub quotas: Vec<ObjectReference>,
    pub provider: BindingProvider,
}

impl_resource!(CredentialsBinding, "CredentialsBinding", "credentialsbindings");

impl CredentialsBinding {
    pub fn new(namespace: &str, name: &str, credentials_ref: ObjectReference) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            credentials_ref,
            quotas: Vec::new(),
            provider: BindingProvider::default(),
        }
    }
}

/// WorkloadIdentity is a credential issued as a short-lived token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkloadIdentity {
    pub metadata: ObjectMeta,
    pub audiences: Vec<String>,
    pub target_provider_type: String,
}

impl_resource!(WorkloadIdentity, "WorkloadIdentity", "workloadidentities");

impl WorkloadIdentity {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            ..Default::default()
        }
    }
}
