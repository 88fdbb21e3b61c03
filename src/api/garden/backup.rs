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

//! Backup buckets and the per-shoot entries stored in them.

use crate::api::core::{ObjectMeta, SecretReference};
use crate::impl_resource;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackupBucket {
    pub metadata: ObjectMeta,
    pub spec: BackupBucketSpec,
}

impl_resource!(BackupBucket, "BackupBucket", "backupbuckets");

impl BackupBucket {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackupBucketSpec {
    pub provider_type: String,
    pub region: String,
    pub secret_ref: SecretReference,
    pub seed_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackupEntry {
    pub metadata: ObjectMeta,
    pub spec: BackupEntrySpec,
}

impl_resource!(BackupEntry, "BackupEntry", "backupentries");

impl BackupEntry {
    pub fn new(namespace: &str, name: &str, bucket_name: &str) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: BackupEntrySpec {
                bucket_name: bucket_name.to_string(),
                seed_name: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackupEntrySpec {
    pub bucket_name: String,
    pub seed_name: Option<String>,
}
