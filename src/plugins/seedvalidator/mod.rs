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

//! SeedValidator admission controller.
//!
//! Protects the shoots running on a seed: a seed may not lose zones while shoots
//! are scheduled onto it, and it may not be deleted while shoots or backup
//! buckets still use it.

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Instance, Interface, Operation,
    Plugins, ValidationInterface,
};
use crate::api::core::Resource;
use crate::api::garden::{BackupBucket, Seed, Shoot};
use crate::cache::{Informers, Lister};
use crate::config::Configuration;
use async_trait::async_trait;
use std::io::Read;
use std::sync::Arc;

/// Plugin name for the SeedValidator admission controller.
pub const PLUGIN_NAME: &str = "SeedValidator";

/// Register the SeedValidator plugin with the plugin registry.
pub fn register(plugins: &Plugins) {
    plugins.register(PLUGIN_NAME, new_factory);
}

fn new_factory(config: Option<&mut dyn Read>, informers: &Informers) -> AdmissionResult<Instance> {
    let configuration = Configuration::from_reader(config)?;
    let plugin = Plugin::new()
        .with_configuration(&configuration)
        .with_shoot_lister(informers.shoots.clone())
        .with_backup_bucket_lister(informers.backup_buckets.clone());
    Ok(Instance::Validating(Arc::new(plugin)))
}

/// Names of the shoots scheduled onto the seed, sorted.
pub(crate) fn shoots_on_seed(shoots: &[Shoot], seed_name: &str) -> Vec<String> {
    let mut names: Vec<String> = shoots
        .iter()
        .filter(|shoot| shoot.is_scheduled_on(seed_name))
        .map(|shoot| format!("{}/{}", shoot.metadata.namespace, shoot.metadata.name))
        .collect();
    names.sort();
    names
}

/// Fails if zones were removed from a seed that still has shoots scheduled onto it.
pub(crate) fn ensure_zones_kept(
    shoots: &[Shoot],
    seed_name: &str,
    old_zones: &[String],
    new_zones: &[String],
) -> Result<(), String> {
    let removed: Vec<&str> = old_zones
        .iter()
        .filter(|zone| !new_zones.contains(zone))
        .map(String::as_str)
        .collect();
    if removed.is_empty() {
        return Ok(());
    }
    let scheduled = shoots_on_seed(shoots, seed_name);
    if scheduled.is_empty() {
        return Ok(());
    }
    Err(format!(
        "zones [{}] cannot be removed from seed {:?} while shoots are scheduled onto it: {}",
        removed.join(", "),
        seed_name,
        scheduled.join(", ")
    ))
}

pub struct Plugin {
    handler: Handler,
    shoot_lister: Option<Arc<dyn Lister<Shoot>>>,
    backup_bucket_lister: Option<Arc<dyn Lister<BackupBucket>>>,
}

impl Plugin {
    pub fn new() -> Self {
        Self {
            handler: Handler::new(&[Operation::Update, Operation::Delete]),
            shoot_lister: None,
            backup_bucket_lister: None,
        }
    }

    pub fn with_configuration(mut self, configuration: &Configuration) -> Self {
        self.handler.set_ready_timeout(configuration.ready_timeout());
        self
    }

    pub fn with_shoot_lister(mut self, lister: Arc<dyn Lister<Shoot>>) -> Self {
        let synced = lister.clone();
        self.handler.add_ready_func(move || synced.has_synced());
        self.shoot_lister = Some(lister);
        self
    }

    pub fn with_backup_bucket_lister(mut self, lister: Arc<dyn Lister<BackupBucket>>) -> Self {
        let synced = lister.clone();
        self.handler.add_ready_func(move || synced.has_synced());
        self.backup_bucket_lister = Some(lister);
        self
    }

    fn shoots(&self) -> AdmissionResult<Vec<Shoot>> {
        let lister = self.shoot_lister.as_ref().ok_or_else(|| {
            AdmissionError::internal_error(format!("{} is missing a shoot lister", PLUGIN_NAME))
        })?;
        Ok(lister.list()?)
    }

    fn validate_update(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        let (Some(seed), Some(old)) = (
            attributes.get_object().and_then(|o| o.as_seed()),
            attributes.get_old_object().and_then(|o| o.as_seed()),
        ) else {
            return Err(AdmissionError::bad_request(
                "seed update request carries no object",
            ));
        };

        ensure_zones_kept(
            &self.shoots()?,
            &seed.metadata.name,
            &old.spec.provider.zones,
            &seed.spec.provider.zones,
        )
        .map_err(|message| AdmissionError::new_forbidden(attributes, message))
    }

    fn validate_delete(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        let name = attributes.get_name();
        let shoots = shoots_on_seed(&self.shoots()?, name);
        if !shoots.is_empty() {
            return Err(AdmissionError::new_forbidden(
                attributes,
                format!(
                    "cannot delete seed {:?} which is still used by shoot(s): {}",
                    name,
                    shoots.join(", ")
                ),
            ));
        }

        let lister = self.backup_bucket_lister.as_ref().ok_or_else(|| {
            AdmissionError::internal_error(format!("{} is missing a backup bucket lister", PLUGIN_NAME))
        })?;
        let mut buckets: Vec<String> = lister
            .list()?
            .into_iter()
            .filter(|bucket| bucket.spec.seed_name.as_deref() == Some(name))
            .map(|bucket| bucket.metadata.name)
            .collect();
        buckets.sort();
        if !buckets.is_empty() {
            return Err(AdmissionError::new_forbidden(
                attributes,
                format!(
                    "cannot delete seed {:?} which is still used by backup bucket(s): {}",
                    name,
                    buckets.join(", ")
                ),
            ));
        }
        Ok(())
    }
}

impl Default for Plugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface for Plugin {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }

    fn validate_initialization(&self) -> AdmissionResult<()> {
        if self.shoot_lister.is_none() {
            return Err(AdmissionError::internal_error(format!(
                "{} is not initialized: missing shoot lister",
                PLUGIN_NAME
            )));
        }
        if self.backup_bucket_lister.is_none() {
            return Err(AdmissionError::internal_error(format!(
                "{} is not initialized: missing backup bucket lister",
                PLUGIN_NAME
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ValidationInterface for Plugin {
    async fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        if !attributes.get_subresource().is_empty() || attributes.get_kind().kind != Seed::KIND {
            return Ok(());
        }

        self.handler.ensure_ready(attributes).await?;

        match attributes.get_operation() {
            Operation::Update => self.validate_update(attributes),
            Operation::Delete => self.validate_delete(attributes),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AlwaysAllowAuthorizer, AttributesRecord, StaticDiscovery};

    fn informers() -> Informers {
        Informers::new(
            Arc::new(AlwaysAllowAuthorizer),
            Arc::new(StaticDiscovery::new()),
        )
    }

    fn plugin(informers: &Informers) -> Plugin {
        Plugin::new()
            .with_configuration(&Configuration::immediate())
            .with_shoot_lister(informers.shoots.clone())
            .with_backup_bucket_lister(informers.backup_buckets.clone())
    }

    fn seed(zones: &[&str]) -> Seed {
        let mut seed = Seed::new("aws-eu1");
        seed.spec.provider.zones = zones.iter().map(|z| z.to_string()).collect();
        seed
    }

    fn scheduled_shoot(name: &str) -> Shoot {
        let mut shoot = Shoot::new("garden-dev", name);
        shoot.spec.seed_name = Some("aws-eu1".to_string());
        shoot
    }

    #[test]
    fn test_handles() {
        let plugin = Plugin::new();
        assert!(!plugin.handles(Operation::Create));
        assert!(plugin.handles(Operation::Update));
        assert!(plugin.handles(Operation::Delete));
    }

    #[test]
    fn test_registration() {
        let plugins = Plugins::new();
        register(&plugins);
        let plugin = plugins.new_from_plugins(PLUGIN_NAME, None, &informers()).unwrap();
        assert!(matches!(plugin, Instance::Validating(_)));

        let err = Plugin::new().validate_initialization().unwrap_err();
        assert!(err.to_string().contains("missing shoot lister"));
    }

    #[test]
    fn test_ensure_zones_kept() {
        let zones = |z: &[&str]| z.iter().map(|z| z.to_string()).collect::<Vec<_>>();
        let shoots = vec![scheduled_shoot("a")];

        assert!(ensure_zones_kept(&shoots, "aws-eu1", &zones(&["a", "b"]), &zones(&["a", "b", "c"])).is_ok());
        assert!(ensure_zones_kept(&[], "aws-eu1", &zones(&["a", "b"]), &zones(&["a"])).is_ok());
        assert!(ensure_zones_kept(&shoots, "aws-eu2", &zones(&["a", "b"]), &zones(&["a"])).is_ok());

        let err = ensure_zones_kept(&shoots, "aws-eu1", &zones(&["a", "b"]), &zones(&["a"])).unwrap_err();
        assert_eq!(
            err,
            "zones [b] cannot be removed from seed \"aws-eu1\" while shoots are scheduled onto it: garden-dev/a"
        );
    }

    #[tokio::test]
    async fn test_zone_removal() {
        let informers = informers();
        let plugin = plugin(&informers);

        let mut attrs = AttributesRecord::for_object(
            Operation::Update,
            Some(seed(&["a"])),
            Some(seed(&["a", "b"])),
            "alice",
        );
        assert!(plugin.validate(&attrs).await.is_ok());

        let mut shoot = Shoot::new("garden-dev", "migrating");
        shoot.status.seed_name = Some("aws-eu1".to_string());
        informers.shoots.add(shoot);
        let err = plugin.validate(&attrs).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Forbidden(_)));

        attrs.object = Some(seed(&["a", "b", "c"]).into());
        assert!(plugin.validate(&attrs).await.is_ok());
    }

    #[tokio::test]
    async fn test_seed_deletion() {
        let informers = informers();
        let plugin = plugin(&informers);
        let attrs = AttributesRecord::for_delete::<Seed>("", "aws-eu1", "alice");
        assert!(plugin.validate(&attrs).await.is_ok());

        let mut bucket = BackupBucket::new("bucket-1");
        bucket.spec.seed_name = Some("aws-eu1".to_string());
        informers.backup_buckets.add(bucket);
        let err = plugin.validate(&attrs).await.unwrap_err();
        assert!(err.to_string().contains("still used by backup bucket(s): bucket-1"));

        informers.shoots.add(scheduled_shoot("b"));
        informers.shoots.add(scheduled_shoot("a"));
        let err = plugin.validate(&attrs).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("still used by shoot(s): garden-dev/a, garden-dev/b"));
    }

    #[tokio::test]
    async fn test_not_ready() {
        let informers = informers();
        informers.backup_buckets.set_synced(false);
        let plugin = plugin(&informers);

        let attrs = AttributesRecord::for_delete::<Seed>("", "aws-eu1", "alice");
        let err = plugin.validate(&attrs).await.unwrap_err();
        assert!(err.to_string().contains("not yet ready to handle request"));
    }
}
