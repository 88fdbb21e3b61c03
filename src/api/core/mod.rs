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

//! Core API types shared by every resource kind (metadata, secrets, config maps, subjects).

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Resource is implemented by every API object the plugins read or admit.
pub trait Resource: Clone + Send + Sync + 'static {
    /// Kind of the object, e.g. "Shoot".
    const KIND: &'static str;
    /// Plural resource name, e.g. "shoots".
    const RESOURCE: &'static str;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;
}

/// Implements [`Resource`] for a type with a `metadata: ObjectMeta` field.
#[macro_export]
macro_rules! impl_resource {
    ($ty:ty, $kind:expr, $resource:expr) => {
        impl $crate::api::core::Resource for $ty {
            const KIND: &'static str = $kind;
            const RESOURCE: &'static str = $resource;

            fn meta(&self) -> &$crate::api::core::ObjectMeta {
                &self.metadata
            }

            fn meta_mut(&mut self) -> &mut $crate::api::core::ObjectMeta {
                &mut self.metadata
            }
        }
    };
}

// ============================================================================
// Constants
// ============================================================================

/// Namespace holding seed-level objects such as ManagedSeeds.
pub const GARDEN_NAMESPACE: &str = "garden";

/// Annotation recording the user that created an object.
pub const ANNOTATION_CREATED_BY: &str = "gardener.cloud/created-by";

/// API group of RBAC subjects.
pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

// ============================================================================
// Metadata
// ============================================================================

/// ObjectMeta is the metadata every persisted resource carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    /// Set once the object is being torn down.
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    /// Cluster-scoped metadata.
    pub fn cluster(name: &str) -> Self {
        Self::new("", name)
    }

    pub fn is_deleting(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}

// ============================================================================
// References
// ============================================================================

/// SecretReference points at a secret in an explicit namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretReference {
    pub namespace: String,
    pub name: String,
}

impl SecretReference {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// ObjectReference points at an object of an arbitrary kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectReference {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectReference {
    pub fn new(api_version: &str, kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Subject identifies a user, group or service account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subject {
    pub kind: String,
    pub api_group: String,
    pub name: String,
    pub namespace: String,
}

impl Subject {
    /// A user subject.
    pub fn user(name: &str) -> Self {
        Self {
            kind: "User".to_string(),
            api_group: RBAC_API_GROUP.to_string(),
            name: name.to_string(),
            namespace: String::new(),
        }
    }
}

// ============================================================================
// Secrets and ConfigMaps
// ============================================================================

/// Secret holds sensitive data such as provider credentials or kubeconfigs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Secret {
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            data: BTreeMap::new(),
        }
    }
}

impl_resource!(Secret, "Secret", "secrets");

/// ConfigMap holds non-confidential configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigMap {
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            data: BTreeMap::new(),
        }
    }
}

impl_resource!(ConfigMap, "ConfigMap", "configmaps");
