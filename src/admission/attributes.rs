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

//! Admission attributes that describe an admission request.

use super::interfaces::Operation;
use crate::api::core::Resource;
use crate::api::garden::GROUP_NAME;
use crate::api::seedmanagement::GROUP_NAME as SEEDMANAGEMENT_GROUP_NAME;
use crate::api::Object;
use std::fmt;

/// GroupVersionResource identifies a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Returns just the group and resource portion.
    pub fn group_resource(&self) -> GroupResource {
        GroupResource {
            group: self.group.clone(),
            resource: self.resource.clone(),
        }
    }
}

/// GroupResource identifies a resource without version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl GroupResource {
    pub fn new(group: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            resource: resource.to_string(),
        }
    }
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// GroupVersionKind identifies a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// UserInfo describes the user on whose behalf the request is made.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInfo {
    pub name: String,
    pub uid: String,
    pub groups: Vec<String>,
}

impl UserInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Requests issued by the API server itself carry no user.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

/// Attributes is an interface used by AdmissionController to get information about a request
/// that is used to make an admission decision.
pub trait Attributes: Send + Sync {
    /// Returns the name of the object as presented in the request.
    fn get_name(&self) -> &str;

    /// Returns the namespace associated with the request (if any).
    fn get_namespace(&self) -> &str;

    /// Returns the resource being requested.
    fn get_resource(&self) -> &GroupVersionResource;

    /// Returns the name of the subresource being requested.
    fn get_subresource(&self) -> &str;

    /// Returns the operation being performed.
    fn get_operation(&self) -> Operation;

    /// Returns the object from the incoming request.
    fn get_object(&self) -> Option<&Object>;

    /// Returns the object as a mutable reference.
    fn get_object_mut(&mut self) -> Option<&mut Object>;

    /// Returns the existing object (only populated for UPDATE and DELETE requests).
    fn get_old_object(&self) -> Option<&Object>;

    /// Returns the kind of object being manipulated.
    fn get_kind(&self) -> &GroupVersionKind;

    /// Returns the user who issued the request.
    fn get_user_info(&self) -> &UserInfo;

    /// Check if this request is a dry run.
    fn is_dry_run(&self) -> bool;
}

/// AttributesRecord is a concrete implementation of Attributes.
#[derive(Debug, Clone)]
pub struct AttributesRecord {
    pub name: String,
    pub namespace: String,
    pub resource: GroupVersionResource,
    pub subresource: String,
    pub operation: Operation,
    pub object: Option<Object>,
    pub old_object: Option<Object>,
    pub kind: GroupVersionKind,
    pub user_info: UserInfo,
    pub dry_run: bool,
}

impl AttributesRecord {
    /// Builds the attributes of a request for a typed object; names, resource and kind
    /// are derived from the object.
    pub fn for_object<T>(
        operation: Operation,
        object: Option<T>,
        old_object: Option<T>,
        user: &str,
    ) -> Self
    where
        T: Resource + Into<Object>,
    {
        let meta = object
            .as_ref()
            .or(old_object.as_ref())
            .map(|o| o.meta().clone())
            .unwrap_or_default();
        let group = group_for_kind(T::KIND);
        Self {
            name: meta.name,
            namespace: meta.namespace,
            resource: GroupVersionResource::new(group, "v1beta1", T::RESOURCE),
            subresource: String::new(),
            operation,
            object: object.map(Into::into),
            old_object: old_object.map(Into::into),
            kind: GroupVersionKind::new(group, "v1beta1", T::KIND),
            user_info: UserInfo::new(user),
            dry_run: false,
        }
    }

    /// Attributes of a DELETE request, which carries only the kind and the key.
    pub fn for_delete<T: Resource>(namespace: &str, name: &str, user: &str) -> Self {
        let group = group_for_kind(T::KIND);
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            resource: GroupVersionResource::new(group, "v1beta1", T::RESOURCE),
            subresource: String::new(),
            operation: Operation::Delete,
            object: None,
            old_object: None,
            kind: GroupVersionKind::new(group, "v1beta1", T::KIND),
            user_info: UserInfo::new(user),
            dry_run: false,
        }
    }

    pub fn with_subresource(mut self, subresource: &str) -> Self {
        self.subresource = subresource.to_string();
        self
    }
}

fn group_for_kind(kind: &str) -> &'static str {
    match kind {
        "ManagedSeed" | "Gardenlet" => SEEDMANAGEMENT_GROUP_NAME,
        _ => GROUP_NAME,
    }
}

impl Attributes for AttributesRecord {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_namespace(&self) -> &str {
        &self.namespace
    }

    fn get_resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    fn get_subresource(&self) -> &str {
        &self.subresource
    }

    fn get_operation(&self) -> Operation {
        self.operation
    }

    fn get_object(&self) -> Option<&Object> {
        self.object.as_ref()
    }

    fn get_object_mut(&mut self) -> Option<&mut Object> {
        self.object.as_mut()
    }

    fn get_old_object(&self) -> Option<&Object> {
        self.old_object.as_ref()
    }

    fn get_kind(&self) -> &GroupVersionKind {
        &self.kind
    }

    fn get_user_info(&self) -> &UserInfo {
        &self.user_info
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::garden::{BackupBucket, Shoot};
    use crate::api::seedmanagement::ManagedSeed;

    #[test]
    fn test_attributes_record_for_object() {
        let shoot = Shoot::new("garden-dev", "crazy-botany");
        let attrs = AttributesRecord::for_object(Operation::Create, Some(shoot), None, "alice");

        assert_eq!(attrs.get_name(), "crazy-botany");
        assert_eq!(attrs.get_namespace(), "garden-dev");
        assert_eq!(attrs.get_operation(), Operation::Create);
        assert_eq!(attrs.get_resource().resource, "shoots");
        assert_eq!(attrs.get_kind().kind, "Shoot");
        assert_eq!(attrs.get_kind().group, GROUP_NAME);
        assert_eq!(attrs.get_user_info().name, "alice");
        assert!(matches!(attrs.get_object(), Some(Object::Shoot(_))));
        assert!(attrs.get_old_object().is_none());
    }

    #[test]
    fn test_attributes_record_for_delete() {
        let attrs = AttributesRecord::for_delete::<BackupBucket>("", "bucket-1", "bob");
        assert_eq!(attrs.get_operation(), Operation::Delete);
        assert_eq!(attrs.get_resource().resource, "backupbuckets");
        assert!(attrs.get_object().is_none());

        let attrs = AttributesRecord::for_delete::<ManagedSeed>("garden", "ms", "bob");
        assert_eq!(attrs.get_kind().group, SEEDMANAGEMENT_GROUP_NAME);
    }

    #[test]
    fn test_group_version_resource() {
        let gvr = GroupVersionResource::new("apps", "v1", "deployments");
        let gr = gvr.group_resource();
        assert_eq!(gr.group, "apps");
        assert_eq!(gr.resource, "deployments");
        assert_eq!(gr.to_string(), "deployments.apps");
        assert_eq!(GroupResource::new("", "secrets").to_string(), "secrets");
    }

    #[test]
    fn test_user_info() {
        assert!(UserInfo::default().is_anonymous());
        assert!(!UserInfo::new("alice").is_anonymous());
    }
}
