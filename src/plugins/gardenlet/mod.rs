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

//! Gardenlet admission controller.
//!
//! A Gardenlet object and a ManagedSeed of the same name would deploy two
//! gardenlets for one seed, so creating a Gardenlet is rejected while such a
//! ManagedSeed exists.

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Instance, Interface, Operation,
    Plugins, ValidationInterface,
};
use crate::api::core::Resource;
use crate::api::seedmanagement::{Gardenlet, ManagedSeed};
use crate::cache::{Informers, Lister};
use crate::config::Configuration;
use async_trait::async_trait;
use std::io::Read;
use std::sync::Arc;

/// Plugin name for the Gardenlet admission controller.
pub const PLUGIN_NAME: &str = "Gardenlet";

/// Register the Gardenlet plugin with the plugin registry.
pub fn register(plugins: &Plugins) {
    plugins.register(PLUGIN_NAME, new_factory);
}

fn new_factory(config: Option<&mut dyn Read>, informers: &Informers) -> AdmissionResult<Instance> {
    let configuration = Configuration::from_reader(config)?;
    let plugin = Plugin::new()
        .with_configuration(&configuration)
        .with_managed_seed_lister(informers.managed_seeds.clone());
    Ok(Instance::Validating(Arc::new(plugin)))
}

pub struct Plugin {
    handler: Handler,
    managed_seed_lister: Option<Arc<dyn Lister<ManagedSeed>>>,
}

impl Plugin {
    pub fn new() -> Self {
        Self {
            handler: Handler::new(&[Operation::Create]),
            managed_seed_lister: None,
        }
    }

    pub fn with_configuration(mut self, configuration: &Configuration) -> Self {
        self.handler.set_ready_timeout(configuration.ready_timeout());
        self
    }

    pub fn with_managed_seed_lister(mut self, lister: Arc<dyn Lister<ManagedSeed>>) -> Self {
        let synced = lister.clone();
        self.handler.add_ready_func(move || synced.has_synced());
        self.managed_seed_lister = Some(lister);
        self
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
        if self.managed_seed_lister.is_none() {
            return Err(AdmissionError::internal_error(format!(
                "{} is not initialized: missing managed seed lister",
                PLUGIN_NAME
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ValidationInterface for Plugin {
    async fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        if !attributes.get_subresource().is_empty()
            || attributes.get_kind().kind != Gardenlet::KIND
            || attributes.get_operation() != Operation::Create
        {
            return Ok(());
        }

        self.handler.ensure_ready(attributes).await?;

        let lister = self.managed_seed_lister.as_ref().ok_or_else(|| {
            AdmissionError::internal_error(format!("{} is missing a managed seed lister", PLUGIN_NAME))
        })?;
        match lister.get(attributes.get_namespace(), attributes.get_name()) {
            Ok(_) => Err(AdmissionError::new_forbidden(
                attributes,
                format!(
                    "there is already a ManagedSeed object with the same name {:?}",
                    attributes.get_name()
                ),
            )),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(AdmissionError::internal_error(format!(
                "could not get managed seed {}/{}: {}",
                attributes.get_namespace(),
                attributes.get_name(),
                err
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AlwaysAllowAuthorizer, AttributesRecord, StaticDiscovery};
    use crate::cache::Error;

    fn informers() -> Informers {
        Informers::new(
            Arc::new(AlwaysAllowAuthorizer),
            Arc::new(StaticDiscovery::new()),
        )
    }

    fn plugin(informers: &Informers) -> Plugin {
        Plugin::new()
            .with_configuration(&Configuration::immediate())
            .with_managed_seed_lister(informers.managed_seeds.clone())
    }

    fn create() -> AttributesRecord {
        AttributesRecord::for_object(
            Operation::Create,
            Some(Gardenlet::new("garden", "soil")),
            None,
            "alice",
        )
    }

    #[test]
    fn test_registration() {
        let plugins = Plugins::new();
        register(&plugins);
        let plugin = plugins.new_from_plugins(PLUGIN_NAME, None, &informers()).unwrap();
        assert!(matches!(plugin, Instance::Validating(_)));
        assert!(plugin.handles(Operation::Create));
        assert!(!plugin.handles(Operation::Update));

        assert!(Plugin::new().validate_initialization().is_err());
    }

    #[tokio::test]
    async fn test_conflicting_managed_seed() {
        let informers = informers();
        let plugin = plugin(&informers);
        assert!(plugin.validate(&create()).await.is_ok());

        informers
            .managed_seeds
            .add(ManagedSeed::new("garden", "other", "other"));
        assert!(plugin.validate(&create()).await.is_ok());

        informers
            .managed_seeds
            .add(ManagedSeed::new("garden", "soil", "soil"));
        let err = plugin.validate(&create()).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Forbidden(_)));
        assert!(err.to_string().contains("already a ManagedSeed object with the same name \"soil\""));
    }

    #[tokio::test]
    async fn test_lister_failure_is_internal() {
        let informers = informers();
        informers
            .managed_seeds
            .fail_with(Error::Other("cache unavailable".to_string()));
        let plugin = plugin(&informers);

        let err = plugin.validate(&create()).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("cache unavailable"));
    }
}
