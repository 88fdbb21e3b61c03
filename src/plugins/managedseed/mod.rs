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

//! ManagedSeed admission controller.
//!
//! A ManagedSeed registers one of the shoots in the `garden` namespace as a seed.
//! Most of the seed spec is dictated by that shoot, so unset fields of the seed
//! template are defaulted from it and values contradicting it are rejected:
//!
//! - provider type and region,
//! - the ingress domain, `ingress.<shoot domain>`,
//! - node, pod and service networks,
//! - zones, where newly added ones must be among the shoot's worker zones,
//! - the seed's own VPA, which must stay disabled if the shoot runs one,
//! - topology-aware routing, which needs a multi-zonal shoot.

use crate::admission::errors::{field_forbidden, field_invalid, field_not_supported, field_required};
use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, ErrorList, Handler, Instance, Interface,
    MutationInterface, Operation, Plugins,
};
use crate::api::core::{Resource, GARDEN_NAMESPACE};
use crate::api::garden::{SeedSettings, SeedSpec, SettingEnabled, Shoot};
use crate::api::seedmanagement::{Gardenlet, ManagedSeed};
use crate::api::Object;
use crate::cache::{Informers, Lister, Source};
use crate::config::Configuration;
use crate::plugins::seedvalidator::ensure_zones_kept;
use async_trait::async_trait;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Plugin name for the ManagedSeed admission controller.
pub const PLUGIN_NAME: &str = "ManagedSeed";

const SEED_SPEC_PATH: &str = "spec.gardenlet.config.seedConfig.spec";

/// Register the ManagedSeed plugin with the plugin registry.
pub fn register(plugins: &Plugins) {
    plugins.register(PLUGIN_NAME, new_factory);
}

fn new_factory(config: Option<&mut dyn Read>, informers: &Informers) -> AdmissionResult<Instance> {
    let configuration = Configuration::from_reader(config)?;
    let plugin = Plugin::new()
        .with_configuration(&configuration)
        .with_shoots(Informers::source(&informers.shoots))
        .with_managed_seed_lister(informers.managed_seeds.clone())
        .with_gardenlet_lister(informers.gardenlets.clone());
    Ok(Instance::Mutating(Arc::new(plugin)))
}

pub struct Plugin {
    handler: Handler,
    settle_wait: Duration,
    shoots: Option<Source<Shoot>>,
    managed_seed_lister: Option<Arc<dyn Lister<ManagedSeed>>>,
    gardenlet_lister: Option<Arc<dyn Lister<Gardenlet>>>,
}

impl Plugin {
    pub fn new() -> Self {
        Self {
            handler: Handler::new_create_update(),
            settle_wait: crate::config::DEFAULT_CACHE_SETTLE_WAIT,
            shoots: None,
            managed_seed_lister: None,
            gardenlet_lister: None,
        }
    }

    pub fn with_configuration(mut self, configuration: &Configuration) -> Self {
        self.settle_wait = configuration.cache_settle_wait();
        self.handler.set_ready_timeout(configuration.ready_timeout());
        self
    }

    pub fn with_shoots(mut self, source: Source<Shoot>) -> Self {
        let synced = source.clone();
        self.handler.add_ready_func(move || synced.has_synced());
        self.shoots = Some(source);
        self
    }

    pub fn with_managed_seed_lister(mut self, lister: Arc<dyn Lister<ManagedSeed>>) -> Self {
        let synced = lister.clone();
        self.handler.add_ready_func(move || synced.has_synced());
        self.managed_seed_lister = Some(lister);
        self
    }

    pub fn with_gardenlet_lister(mut self, lister: Arc<dyn Lister<Gardenlet>>) -> Self {
        let synced = lister.clone();
        self.handler.add_ready_func(move || synced.has_synced());
        self.gardenlet_lister = Some(lister);
        self
    }

    async fn admit_managed_seed(
        &self,
        attributes: &dyn Attributes,
        managed_seed: &mut ManagedSeed,
        old: Option<&ManagedSeed>,
    ) -> AdmissionResult<()> {
        let invalid = |errors: ErrorList| AdmissionError::new_invalid(attributes, errors);

        if managed_seed.metadata.namespace != GARDEN_NAMESPACE {
            let mut errors = ErrorList::new();
            errors.push(field_invalid(
                "metadata.namespace",
                &managed_seed.metadata.namespace,
                &format!("namespace must be {}", GARDEN_NAMESPACE),
            ));
            return Err(invalid(errors));
        }

        let shoot_name = match &managed_seed.spec.shoot {
            Some(shoot) if !shoot.name.is_empty() => shoot.name.clone(),
            _ => {
                let mut errors = ErrorList::new();
                errors.push(field_required("spec.shoot.name", "shoot name is required"));
                return Err(invalid(errors));
            }
        };

        let shoot = match self.shoot(GARDEN_NAMESPACE, &shoot_name).await {
            Ok(shoot) => shoot,
            Err(err) if err.is_not_found() => {
                let mut errors = ErrorList::new();
                errors.push(field_invalid(
                    "spec.shoot.name",
                    &shoot_name,
                    "shoot does not exist",
                ));
                return Err(invalid(errors));
            }
            Err(err) => {
                return Err(AdmissionError::internal_error(format!(
                    "could not get shoot {}/{}: {}",
                    GARDEN_NAMESPACE, shoot_name, err
                )))
            }
        };

        if attributes.get_operation() == Operation::Create {
            self.ensure_shoot_available(attributes, managed_seed, &shoot)?;
            self.ensure_no_gardenlet(attributes, managed_seed)?;
        }

        let Some(template) = managed_seed.spec.gardenlet.seed_config.as_mut() else {
            let mut errors = ErrorList::new();
            errors.push(field_required(
                "spec.gardenlet.config.seedConfig",
                "seed template is required",
            ));
            return Err(invalid(errors));
        };

        let old_template = old.and_then(ManagedSeed::seed_template);
        let old_zones = old_template.map(|t| t.spec.provider.zones.as_slice());
        let errors = derive_seed_spec(&mut template.spec, &shoot, old_zones.unwrap_or_default());
        if !errors.is_empty() {
            return Err(invalid(errors));
        }

        if let Some(old_template) = old_template {
            let shoots = self.shoot_source()?.lister.list()?;
            ensure_zones_kept(
                &shoots,
                &managed_seed.metadata.name,
                &old_template.spec.provider.zones,
                &template.spec.provider.zones,
            )
            .map_err(|message| AdmissionError::new_forbidden(attributes, message))?;
        }

        debug!(name = %managed_seed.metadata.name, shoot = %shoot_name, "seed template derived from shoot");
        Ok(())
    }

    fn shoot_source(&self) -> AdmissionResult<&Source<Shoot>> {
        self.shoots.as_ref().ok_or_else(|| {
            AdmissionError::internal_error(format!("{} is missing a shoot source", PLUGIN_NAME))
        })
    }

    async fn shoot(&self, namespace: &str, name: &str) -> Result<Shoot, crate::cache::Error> {
        match self.shoots.as_ref() {
            Some(source) => source.lookup(self.settle_wait, namespace, name).await,
            None => Err(crate::cache::Error::Other(format!(
                "{} is missing a shoot source",
                PLUGIN_NAME
            ))),
        }
    }

    /// The shoot may not be going away or already serve as another seed.
    fn ensure_shoot_available(
        &self,
        attributes: &dyn Attributes,
        managed_seed: &ManagedSeed,
        shoot: &Shoot,
    ) -> AdmissionResult<()> {
        if shoot.metadata.is_deleting() {
            return Err(AdmissionError::new_forbidden(
                attributes,
                format!(
                    "cannot register shoot {}/{} as seed as it is being deleted",
                    shoot.metadata.namespace, shoot.metadata.name
                ),
            ));
        }

        let lister = self.managed_seed_lister.as_ref().ok_or_else(|| {
            AdmissionError::internal_error(format!("{} is missing a managed seed lister", PLUGIN_NAME))
        })?;
        let other = lister.list_namespaced(GARDEN_NAMESPACE)?.into_iter().find(|other| {
            other.metadata.name != managed_seed.metadata.name
                && other.spec.shoot.as_ref().map(|s| s.name.as_str())
                    == Some(shoot.metadata.name.as_str())
        });
        if let Some(other) = other {
            return Err(AdmissionError::new_forbidden(
                attributes,
                format!(
                    "shoot {}/{} is already registered as seed by managed seed {}",
                    shoot.metadata.namespace, shoot.metadata.name, other.metadata.name
                ),
            ));
        }
        Ok(())
    }

    fn ensure_no_gardenlet(
        &self,
        attributes: &dyn Attributes,
        managed_seed: &ManagedSeed,
    ) -> AdmissionResult<()> {
        let lister = self.gardenlet_lister.as_ref().ok_or_else(|| {
            AdmissionError::internal_error(format!("{} is missing a gardenlet lister", PLUGIN_NAME))
        })?;
        match lister.get(&managed_seed.metadata.namespace, &managed_seed.metadata.name) {
            Ok(_) => Err(AdmissionError::new_forbidden(
                attributes,
                format!(
                    "there is already a Gardenlet object with the same name {:?}",
                    managed_seed.metadata.name
                ),
            )),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl Default for Plugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Defaults unset seed fields from the shoot and reports the ones contradicting it.
/// Zones the seed already had are kept even if the shoot no longer lists them.
fn derive_seed_spec(spec: &mut SeedSpec, shoot: &Shoot, old_zones: &[String]) -> ErrorList {
    let mut errors = ErrorList::new();

    default_or_match(
        &mut errors,
        &format!("{}.provider.type", SEED_SPEC_PATH),
        &mut spec.provider.provider_type,
        Some(&shoot.spec.provider.provider_type),
        "seed provider type is not equal to shoot provider type",
    );
    default_or_match(
        &mut errors,
        &format!("{}.provider.region", SEED_SPEC_PATH),
        &mut spec.provider.region,
        Some(&shoot.spec.region),
        "seed provider region is not equal to shoot region",
    );

    if let Some(ingress) = spec.ingress.as_mut() {
        let field = format!("{}.ingress.domain", SEED_SPEC_PATH);
        match shoot.spec.dns.as_ref().and_then(|dns| dns.domain.as_deref()) {
            Some(domain) => default_or_match(
                &mut errors,
                &field,
                &mut ingress.domain,
                Some(&format!("ingress.{}", domain)),
                "seed ingress domain must be the ingress subdomain of the shoot domain",
            ),
            None => errors.push(field_invalid(
                &field,
                &ingress.domain,
                "shoot does not specify a domain",
            )),
        }
    }

    let networking = shoot.spec.networking.as_ref();
    let mut nodes = spec.networks.nodes.clone().unwrap_or_default();
    default_or_match(
        &mut errors,
        &format!("{}.networks.nodes", SEED_SPEC_PATH),
        &mut nodes,
        networking.and_then(|n| n.nodes.as_deref()),
        "seed nodes CIDR is not equal to shoot nodes CIDR",
    );
    spec.networks.nodes = Some(nodes).filter(|nodes| !nodes.is_empty());
    default_or_match(
        &mut errors,
        &format!("{}.networks.pods", SEED_SPEC_PATH),
        &mut spec.networks.pods,
        networking.and_then(|n| n.pods.as_deref()),
        "seed pods CIDR is not equal to shoot pods CIDR",
    );
    default_or_match(
        &mut errors,
        &format!("{}.networks.services", SEED_SPEC_PATH),
        &mut spec.networks.services,
        networking.and_then(|n| n.services.as_deref()),
        "seed services CIDR is not equal to shoot services CIDR",
    );

    let worker_zones = shoot.worker_zones();
    if spec.provider.zones.is_empty() {
        spec.provider.zones = worker_zones.iter().cloned().collect();
    } else {
        let supported: Vec<&str> = worker_zones.iter().map(String::as_str).collect();
        for (i, zone) in spec.provider.zones.iter().enumerate() {
            if !old_zones.contains(zone) && !worker_zones.contains(zone) {
                errors.push(field_not_supported(
                    &format!("{}.provider.zones[{}]", SEED_SPEC_PATH, i),
                    zone,
                    supported.clone(),
                ));
            }
        }
    }

    let shoot_vpa = shoot
        .spec
        .kubernetes
        .vertical_pod_autoscaler
        .as_ref()
        .is_some_and(|vpa| vpa.enabled);
    let settings = spec.settings.get_or_insert_with(SeedSettings::default);
    if shoot_vpa {
        match settings.vertical_pod_autoscaler {
            None => settings.vertical_pod_autoscaler = Some(SettingEnabled { enabled: false }),
            Some(SettingEnabled { enabled: true }) => errors.push(field_forbidden(
                &format!("{}.settings.verticalPodAutoscaler.enabled", SEED_SPEC_PATH),
                "seed VPA is not supported for managed seeds whose shoot runs a VPA",
            )),
            Some(_) => {}
        }
    }
    let routing = settings.topology_aware_routing.is_some_and(|s| s.enabled);
    if routing && worker_zones.len() < 2 {
        errors.push(field_forbidden(
            &format!("{}.settings.topologyAwareRouting.enabled", SEED_SPEC_PATH),
            "topology-aware routing can only be enabled on multi-zonal shoots",
        ));
    }

    errors
}

/// Defaults an empty value from the shoot, or reports a differing one.
fn default_or_match(
    errors: &mut ErrorList,
    field: &str,
    value: &mut String,
    expected: Option<&str>,
    detail: &str,
) {
    let Some(expected) = expected.filter(|e| !e.is_empty()) else {
        return;
    };
    if value.is_empty() {
        *value = expected.to_string();
    } else if value != expected {
        errors.push(field_invalid(field, value, detail));
    }
}

impl Interface for Plugin {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }

    fn validate_initialization(&self) -> AdmissionResult<()> {
        let missing: Vec<&str> = [
            ("shoot source", self.shoots.is_none()),
            ("managed seed lister", self.managed_seed_lister.is_none()),
            ("gardenlet lister", self.gardenlet_lister.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name)
        .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(AdmissionError::internal_error(format!(
            "{} is not initialized: missing {}",
            PLUGIN_NAME,
            missing.join(", ")
        )))
    }
}

#[async_trait]
impl MutationInterface for Plugin {
    async fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        if !attributes.get_subresource().is_empty()
            || attributes.get_kind().kind != ManagedSeed::KIND
        {
            return Ok(());
        }

        self.handler.ensure_ready(attributes).await?;

        let Some(mut managed_seed) = attributes
            .get_object()
            .and_then(Object::as_managed_seed)
            .cloned()
        else {
            return Err(AdmissionError::bad_request(
                "resource was marked with kind ManagedSeed but carries no managed seed",
            ));
        };
        let old = attributes
            .get_old_object()
            .and_then(Object::as_managed_seed)
            .cloned();

        self.admit_managed_seed(attributes, &mut managed_seed, old.as_ref())
            .await?;

        if let Some(object) = attributes.get_object_mut() {
            *object = Object::ManagedSeed(managed_seed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AlwaysAllowAuthorizer, AttributesRecord, StaticDiscovery};
    use crate::api::garden::{Dns, Ingress, Networking, VerticalPodAutoscaler, Worker};
    use crate::api::seedmanagement::SeedTemplate;

    fn informers() -> Informers {
        let informers = Informers::new(
            Arc::new(AlwaysAllowAuthorizer),
            Arc::new(StaticDiscovery::new()),
        );
        informers.shoots.add(shoot());
        informers
    }

    fn plugin(informers: &Informers) -> Plugin {
        Plugin::new()
            .with_configuration(&Configuration::immediate())
            .with_shoots(Informers::source(&informers.shoots))
            .with_managed_seed_lister(informers.managed_seeds.clone())
            .with_gardenlet_lister(informers.gardenlets.clone())
    }

    fn shoot() -> Shoot {
        let mut shoot = Shoot::new(GARDEN_NAMESPACE, "soil");
        shoot.spec.provider.provider_type = "aws".to_string();
        shoot.spec.region = "eu-west-1".to_string();
        shoot.spec.dns = Some(Dns {
            domain: Some("soil.example.com".to_string()),
            providers: Vec::new(),
        });
        shoot.spec.networking = Some(Networking {
            networking_type: Some("calico".to_string()),
            nodes: Some("10.250.0.0/16".to_string()),
            pods: Some("100.96.0.0/11".to_string()),
            services: Some("100.64.0.0/13".to_string()),
        });
        shoot.spec.provider.workers = vec![Worker {
            name: "pool-a".to_string(),
            zones: vec!["eu-west-1a".to_string(), "eu-west-1b".to_string()],
            ..Default::default()
        }];
        shoot
    }

    fn managed_seed(spec: SeedSpec) -> ManagedSeed {
        let mut managed_seed = ManagedSeed::new(GARDEN_NAMESPACE, "soil", "soil");
        managed_seed.spec.gardenlet.seed_config = Some(SeedTemplate {
            labels: Default::default(),
            spec,
        });
        managed_seed
    }

    fn ingress() -> Option<Ingress> {
        Some(Ingress {
            domain: String::new(),
            controller_kind: "nginx".to_string(),
        })
    }

    async fn create(plugin: &Plugin, managed_seed: ManagedSeed) -> AdmissionResult<SeedSpec> {
        let mut attrs =
            AttributesRecord::for_object(Operation::Create, Some(managed_seed), None, "alice");
        plugin.admit(&mut attrs).await?;
        let admitted = attrs.object.as_ref().and_then(Object::as_managed_seed).unwrap();
        Ok(admitted.seed_template().unwrap().spec.clone())
    }

    #[test]
    fn test_registration() {
        let plugins = Plugins::new();
        register(&plugins);
        let plugin = plugins.new_from_plugins(PLUGIN_NAME, None, &informers()).unwrap();
        assert!(matches!(plugin, Instance::Mutating(_)));
        assert!(!plugin.handles(Operation::Delete));
    }

    #[tokio::test]
    async fn test_defaults_seed_spec_from_shoot() {
        let informers = informers();
        let plugin = plugin(&informers);

        let spec = create(
            &plugin,
            managed_seed(SeedSpec {
                ingress: ingress(),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(spec.provider.provider_type, "aws");
        assert_eq!(spec.provider.region, "eu-west-1");
        assert_eq!(spec.provider.zones, vec!["eu-west-1a", "eu-west-1b"]);
        assert_eq!(spec.ingress.unwrap().domain, "ingress.soil.example.com");
        assert_eq!(spec.networks.nodes.as_deref(), Some("10.250.0.0/16"));
        assert_eq!(spec.networks.pods, "100.96.0.0/11");
        assert_eq!(spec.networks.services, "100.64.0.0/13");
    }

    #[tokio::test]
    async fn test_conflicting_values_are_invalid() {
        let informers = informers();
        let plugin = plugin(&informers);

        let mut spec = SeedSpec::default();
        spec.provider.provider_type = "gcp".to_string();
        spec.networks.pods = "10.0.0.0/8".to_string();
        spec.provider.zones = vec!["eu-west-1c".to_string()];
        let err = create(&plugin, managed_seed(spec)).await.unwrap_err();

        assert_eq!(err.status_code(), 422);
        let message = err.to_string();
        assert!(message.contains("provider.type: Invalid value: \"gcp\""));
        assert!(message.contains("networks.pods: Invalid value: \"10.0.0.0/8\""));
        assert!(message.contains("provider.zones[0]: Unsupported value: \"eu-west-1c\""));
    }

    #[tokio::test]
    async fn test_shoot_requirements() {
        let informers = informers();
        let plugin = plugin(&informers);

        let mut elsewhere = managed_seed(SeedSpec::default());
        elsewhere.metadata.namespace = "garden-dev".to_string();
        let err = create(&plugin, elsewhere).await.unwrap_err();
        assert!(err.to_string().contains("metadata.namespace"));

        let mut unknown = managed_seed(SeedSpec::default());
        unknown.spec.shoot.as_mut().unwrap().name = "missing".to_string();
        let err = create(&plugin, unknown).await.unwrap_err();
        assert!(err.to_string().contains("shoot does not exist"));

        let mut no_template = managed_seed(SeedSpec::default());
        no_template.spec.gardenlet.seed_config = None;
        let err = create(&plugin, no_template).await.unwrap_err();
        assert!(err.to_string().contains("spec.gardenlet.config.seedConfig: Required value"));

        let mut undomained = shoot();
        undomained.spec.dns = None;
        informers.shoots.add(undomained);
        let err = create(
            &plugin,
            managed_seed(SeedSpec {
                ingress: ingress(),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("shoot does not specify a domain"));
    }

    #[tokio::test]
    async fn test_exclusivity_on_create() {
        let informers = informers();
        let plugin = plugin(&informers);

        informers
            .gardenlets
            .add(Gardenlet::new(GARDEN_NAMESPACE, "soil"));
        let err = create(&plugin, managed_seed(SeedSpec::default())).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Forbidden(_)));
        assert!(err.to_string().contains("already a Gardenlet object"));
        informers.gardenlets.delete(GARDEN_NAMESPACE, "soil");

        informers
            .managed_seeds
            .add(ManagedSeed::new(GARDEN_NAMESPACE, "other", "soil"));
        let err = create(&plugin, managed_seed(SeedSpec::default())).await.unwrap_err();
        assert!(err.to_string().contains("already registered as seed by managed seed other"));
        informers.managed_seeds.delete(GARDEN_NAMESPACE, "other");

        let mut deleting = shoot();
        deleting.metadata.deletion_timestamp = Some(chrono::Utc::now());
        informers.shoots.add(deleting);
        let err = create(&plugin, managed_seed(SeedSpec::default())).await.unwrap_err();
        assert!(err.to_string().contains("being deleted"));
    }

    #[tokio::test]
    async fn test_vpa_and_topology_aware_routing() {
        let informers = informers();
        let mut shoot = shoot();
        shoot.spec.kubernetes.vertical_pod_autoscaler = Some(VerticalPodAutoscaler { enabled: true });
        informers.shoots.add(shoot.clone());
        let plugin = plugin(&informers);

        let spec = create(&plugin, managed_seed(SeedSpec::default())).await.unwrap();
        let settings = spec.settings.unwrap();
        assert_eq!(settings.vertical_pod_autoscaler, Some(SettingEnabled { enabled: false }));

        let mut spec = SeedSpec::default();
        spec.settings = Some(SeedSettings {
            vertical_pod_autoscaler: Some(SettingEnabled { enabled: true }),
            topology_aware_routing: None,
        });
        let err = create(&plugin, managed_seed(spec)).await.unwrap_err();
        assert!(err.to_string().contains("settings.verticalPodAutoscaler.enabled: Forbidden"));

        shoot.spec.kubernetes.vertical_pod_autoscaler = None;
        shoot.spec.provider.workers[0].zones = vec!["eu-west-1a".to_string()];
        informers.shoots.add(shoot);
        let mut spec = SeedSpec::default();
        spec.settings = Some(SeedSettings {
            vertical_pod_autoscaler: None,
            topology_aware_routing: Some(SettingEnabled { enabled: true }),
        });
        let err = create(&plugin, managed_seed(spec)).await.unwrap_err();
        assert!(err.to_string().contains("topology-aware routing"));
    }

    #[tokio::test]
    async fn test_existing_zones_survive_shoot_changes() {
        let informers = informers();
        let mut shrunk = shoot();
        shrunk.spec.provider.workers[0].zones = vec!["eu-west-1a".to_string()];
        informers.shoots.add(shrunk);
        let plugin = plugin(&informers);

        let mut spec = SeedSpec::default();
        spec.provider.zones = vec!["eu-west-1a".to_string(), "eu-west-1b".to_string()];
        let mut attrs = AttributesRecord::for_object(
            Operation::Update,
            Some(managed_seed(spec.clone())),
            Some(managed_seed(spec.clone())),
            "alice",
        );
        assert!(plugin.admit(&mut attrs).await.is_ok());

        let mut added = spec.clone();
        added.provider.zones.push("eu-west-1c".to_string());
        let mut attrs = AttributesRecord::for_object(
            Operation::Update,
            Some(managed_seed(added)),
            Some(managed_seed(spec)),
            "alice",
        );
        let err = plugin.admit(&mut attrs).await.unwrap_err();
        assert!(err.to_string().contains("provider.zones[2]: Unsupported value: \"eu-west-1c\""));
        assert!(!err.to_string().contains("\"eu-west-1b\""));
    }

    #[tokio::test]
    async fn test_zone_removal_on_update() {
        let informers = informers();
        let plugin = plugin(&informers);

        let mut old_spec = SeedSpec::default();
        old_spec.provider.zones = vec!["eu-west-1a".to_string(), "eu-west-1b".to_string()];
        let mut new_spec = SeedSpec::default();
        new_spec.provider.zones = vec!["eu-west-1a".to_string()];

        let update = || {
            AttributesRecord::for_object(
                Operation::Update,
                Some(managed_seed(new_spec.clone())),
                Some(managed_seed(old_spec.clone())),
                "alice",
            )
        };
        assert!(plugin.admit(&mut update()).await.is_ok());

        let mut scheduled = Shoot::new("garden-dev", "crazy-botany");
        scheduled.spec.seed_name = Some("soil".to_string());
        informers.shoots.add(scheduled);
        let err = plugin.admit(&mut update()).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Forbidden(_)));
        assert!(err.to_string().contains("zones [eu-west-1b] cannot be removed"));
    }
}
