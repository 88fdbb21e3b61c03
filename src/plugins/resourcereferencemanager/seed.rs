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

use super::{core_resource, Request, ReferenceManager};
use crate::admission::gate::{self, changed, Gate, MetadataPolicy};
use crate::admission::AdmissionResult;
use crate::api::garden::{BackupBucket, BackupEntry, Seed};
use tracing::debug;

impl ReferenceManager {
    pub(super) async fn admit_seed(
        &self,
        request: &Request,
        seed: &Seed,
        old: Option<&Seed>,
    ) -> AdmissionResult<()> {
        let gate = gate::evaluate(
            request.operation,
            old.map(|o| (&o.metadata, &o.spec)),
            (&seed.metadata, &seed.spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            debug!(name = %request.name, "seed unchanged, skipping");
            return Ok(());
        }

        let old_spec = old.map(|o| &o.spec);
        if let Some(backup) = &seed.spec.backup {
            if changed(old_spec.map(|s| &s.backup), &seed.spec.backup) {
                let secret = &backup.secret_ref;
                self.lookup(request, &self.secrets, "backup secret", &secret.namespace, &secret.name)
                    .await?;
            }
        }

        if let Some(provider) = &seed.spec.dns.provider {
            if changed(old_spec.map(|s| &s.dns), &seed.spec.dns) {
                let secret = &provider.secret_ref;
                self.lookup(
                    request,
                    &self.secrets,
                    "DNS provider secret",
                    &secret.namespace,
                    &secret.name,
                )
                .await?;
            }
        }
        Ok(())
    }

    pub(super) async fn admit_backup_bucket(
        &self,
        request: &Request,
        bucket: &BackupBucket,
        old: Option<&BackupBucket>,
    ) -> AdmissionResult<()> {
        let gate = gate::evaluate(
            request.operation,
            old.map(|o| (&o.metadata, &o.spec)),
            (&bucket.metadata, &bucket.spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            return Ok(());
        }

        let old_spec = old.map(|o| &o.spec);
        if let Some(seed) = bucket.spec.seed_name.as_deref() {
            if changed(old_spec.map(|s| &s.seed_name), &bucket.spec.seed_name) {
                request.resolve(&self.seed_lister, "seed", "", seed)?;
            }
        }

        let secret = &bucket.spec.secret_ref;
        if changed(old_spec.map(|s| &s.secret_ref), secret) {
            self.authorize_read(
                request,
                "backup bucket",
                &core_resource("secrets"),
                &secret.namespace,
                &secret.name,
            )
            .await?;
            self.lookup(request, &self.secrets, "secret", &secret.namespace, &secret.name)
                .await?;
        }
        Ok(())
    }

    pub(super) async fn admit_backup_entry(
        &self,
        request: &Request,
        entry: &BackupEntry,
        old: Option<&BackupEntry>,
    ) -> AdmissionResult<()> {
        let gate = gate::evaluate(
            request.operation,
            old.map(|o| (&o.metadata, &o.spec)),
            (&entry.metadata, &entry.spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            return Ok(());
        }

        let old_spec = old.map(|o| &o.spec);
        if let Some(seed) = entry.spec.seed_name.as_deref() {
            if changed(old_spec.map(|s| &s.seed_name), &entry.spec.seed_name) {
                request.resolve(&self.seed_lister, "seed", "", seed)?;
            }
        }

        if changed(old_spec.map(|s| &s.bucket_name), &entry.spec.bucket_name) {
            request.resolve(
                &self.backup_bucket_lister,
                "backup bucket",
                "",
                &entry.spec.bucket_name,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::Fixture;
    use crate::admission::{AdmissionError, AttributesRecord, MutationInterface, Operation};
    use crate::api::core::{Secret, SecretReference};
    use crate::api::garden::{BackupBucket, BackupEntry, Seed, SeedBackup, SeedDnsProvider};

    fn bucket(seed: Option<&str>) -> BackupBucket {
        let mut bucket = BackupBucket::new("bucket-1");
        bucket.spec.seed_name = seed.map(str::to_string);
        bucket.spec.secret_ref = SecretReference::new("garden", "backup-credentials");
        bucket
    }

    #[tokio::test]
    async fn test_seed_secrets() {
        let fixture = Fixture::new();
        let plugin = fixture.plugin();

        let mut seed = Seed::new("aws-eu1");
        seed.spec.backup = Some(SeedBackup {
            provider: "aws".to_string(),
            region: None,
            secret_ref: SecretReference::new("garden", "backup-credentials"),
        });
        let mut attrs = AttributesRecord::for_object(Operation::Create, Some(seed.clone()), None, "alice");
        let err = plugin.admit(&mut attrs).await.unwrap_err();
        assert!(err.to_string().contains("could not find referenced backup secret"));

        fixture
            .informers
            .secrets
            .add(Secret::new("garden", "backup-credentials"));
        seed.spec.dns.provider = Some(SeedDnsProvider {
            provider_type: "aws-route53".to_string(),
            secret_ref: SecretReference::new("garden", "dns-credentials"),
        });
        let mut attrs = AttributesRecord::for_object(Operation::Create, Some(seed.clone()), None, "alice");
        let err = plugin.admit(&mut attrs).await.unwrap_err();
        assert!(err.to_string().contains("could not find referenced DNS provider secret"));

        // Unchanged sections are not re-checked.
        let mut updated = seed.clone();
        updated.spec.provider.zones.push("eu-west-1a".to_string());
        let mut attrs =
            AttributesRecord::for_object(Operation::Update, Some(updated), Some(seed), "alice");
        assert!(plugin.admit(&mut attrs).await.is_ok());
    }

    #[tokio::test]
    async fn test_backup_bucket_references() {
        let fixture = Fixture::new();
        fixture
            .informers
            .secrets
            .add(Secret::new("garden", "backup-credentials"));
        let plugin = fixture.plugin();

        let mut attrs =
            AttributesRecord::for_object(Operation::Create, Some(bucket(Some("aws-eu1"))), None, "alice");
        let err = plugin.admit(&mut attrs).await.unwrap_err();
        assert!(err.to_string().contains("could not find referenced seed \"aws-eu1\""));

        fixture.informers.seeds.add(Seed::new("aws-eu1"));
        let mut attrs =
            AttributesRecord::for_object(Operation::Create, Some(bucket(Some("aws-eu1"))), None, "alice");
        assert!(plugin.admit(&mut attrs).await.is_ok());

        fixture.authorizer.deny("secrets", "backup-credentials");
        let mut attrs =
            AttributesRecord::for_object(Operation::Create, Some(bucket(None)), None, "alice");
        let err = plugin.admit(&mut attrs).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("backup bucket cannot reference a resource you are not allowed to read"));
    }

    #[tokio::test]
    async fn test_backup_entry_references() {
        let fixture = Fixture::new();
        fixture.informers.seeds.add(Seed::new("aws-eu1"));
        let plugin = fixture.plugin();

        let mut entry = BackupEntry::new("shoot--dev--crazy-botany", "entry-1", "bucket-1");
        entry.spec.seed_name = Some("aws-eu1".to_string());
        let mut attrs = AttributesRecord::for_object(Operation::Create, Some(entry.clone()), None, "alice");
        let err = plugin.admit(&mut attrs).await.unwrap_err();
        assert!(err.to_string().contains("could not find referenced backup bucket \"bucket-1\""));

        fixture.informers.backup_buckets.add(bucket(None));
        let mut attrs = AttributesRecord::for_object(Operation::Create, Some(entry), None, "alice");
        assert!(plugin.admit(&mut attrs).await.is_ok());
    }

    #[tokio::test]
    async fn test_backup_bucket_deletion() {
        let fixture = Fixture::new();
        let plugin = fixture.plugin();

        let mut attrs = AttributesRecord::for_delete::<BackupBucket>("", "bucket-1", "alice");
        assert!(plugin.admit(&mut attrs).await.is_ok());

        fixture
            .informers
            .backup_entries
            .add(BackupEntry::new("shoot--dev--a", "entry-a", "bucket-1"));
        fixture
            .informers
            .backup_entries
            .add(BackupEntry::new("shoot--dev--b", "entry-b", "bucket-2"));
        let err = plugin.admit(&mut attrs).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Forbidden(_)));
        assert!(err.to_string().ends_with(
            "cannot delete BackupBucket because BackupEntries are still referencing it: shoot--dev--a/entry-a"
        ));
    }
}
