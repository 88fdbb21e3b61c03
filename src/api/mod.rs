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

//! API types admitted and read by the plugins.

pub mod core;
pub mod garden;
pub mod seedmanagement;

use self::core::{ObjectMeta, Resource};
use self::garden::{
    BackupBucket, BackupEntry, CloudProfile, ControllerRegistration, CredentialsBinding,
    NamespacedCloudProfile, Project, SecretBinding, Seed, Shoot,
};
use self::seedmanagement::{Gardenlet, ManagedSeed};

/// Object is the admitted object, resolved to one of the supported kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Shoot(Shoot),
    Seed(Seed),
    Project(Project),
    SecretBinding(SecretBinding),
    CredentialsBinding(CredentialsBinding),
    CloudProfile(CloudProfile),
    NamespacedCloudProfile(NamespacedCloudProfile),
    BackupBucket(BackupBucket),
    BackupEntry(BackupEntry),
    ControllerRegistration(ControllerRegistration),
    ManagedSeed(ManagedSeed),
    Gardenlet(Gardenlet),
}

macro_rules! for_each_kind {
    ($self:expr, $obj:ident => $body:expr) => {
        match $self {
            Object::Shoot($obj) => $body,
            Object::Seed($obj) => $body,
            Object::Project($obj) => $body,
            Object::SecretBinding($obj) => $body,
            Object::CredentialsBinding($obj) => $body,
            Object::CloudProfile($obj) => $body,
            Object::NamespacedCloudProfile($obj) => $body,
            Object::BackupBucket($obj) => $body,
            Object::BackupEntry($obj) => $body,
            Object::ControllerRegistration($obj) => $body,
            Object::ManagedSeed($obj) => $body,
            Object::Gardenlet($obj) => $body,
        }
    };
}

impl Object {
    /// Kind of the wrapped object.
    pub fn kind(&self) -> &'static str {
        fn kind_of<T: Resource>(_: &T) -> &'static str {
            T::KIND
        }
        for_each_kind!(self, o => kind_of(o))
    }

    pub fn meta(&self) -> &ObjectMeta {
        for_each_kind!(self, o => o.meta())
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        for_each_kind!(self, o => o.meta_mut())
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Object {
                fn from(obj: $variant) -> Self {
                    Object::$variant(obj)
                }
            }
        )*
    };
}

impl_from_kind!(
    Shoot,
    Seed,
    Project,
    SecretBinding,
    CredentialsBinding,
    CloudProfile,
    NamespacedCloudProfile,
    BackupBucket,
    BackupEntry,
    ControllerRegistration,
    ManagedSeed,
    Gardenlet,
);

macro_rules! impl_downcast {
    ($($variant:ident => $method:ident),* $(,)?) => {
        impl Object {
            $(
                pub fn $method(&self) -> Option<&$variant> {
                    match self {
                        Object::$variant(obj) => Some(obj),
                        _ => None,
                    }
                }
            )*
        }
    };
}

impl_downcast!(
    Shoot => as_shoot,
    Seed => as_seed,
    Project => as_project,
    SecretBinding => as_secret_binding,
    CredentialsBinding => as_credentials_binding,
    CloudProfile => as_cloud_profile,
    NamespacedCloudProfile => as_namespaced_cloud_profile,
    BackupBucket => as_backup_bucket,
    BackupEntry => as_backup_entry,
    ControllerRegistration => as_controller_registration,
    ManagedSeed => as_managed_seed,
    Gardenlet => as_gardenlet,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_and_meta() {
        let mut obj = Object::from(Shoot::new("garden-dev", "crazy-botany"));
        assert_eq!(obj.kind(), "Shoot");
        assert_eq!(obj.meta().name, "crazy-botany");

        obj.meta_mut().labels.insert("a".to_string(), "b".to_string());
        assert_eq!(obj.meta().labels.len(), 1);

        assert_eq!(Object::from(Seed::new("aws-eu1")).kind(), "Seed");
        assert_eq!(
            Object::from(Gardenlet::new("garden", "local")).kind(),
            "Gardenlet"
        );
    }

    #[test]
    fn test_object_downcast() {
        let obj = Object::from(Seed::new("aws-eu1"));
        assert_eq!(obj.as_seed().map(|s| s.metadata.name.as_str()), Some("aws-eu1"));
        assert!(obj.as_shoot().is_none());
    }
}
