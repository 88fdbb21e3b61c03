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

//! Discovery of the resources served per group version.
//!
//! Arbitrary object references only carry `apiVersion` and `kind`; discovery maps
//! them to the plural resource name and scope needed for authorization and lookups.

use super::attributes::GroupVersionResource;
use async_trait::async_trait;
use std::collections::HashMap;

/// APIResource describes one resource served by the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APIResource {
    /// Plural resource name.
    pub name: String,
    pub kind: String,
    pub namespaced: bool,
}

impl APIResource {
    pub fn new(name: &str, kind: &str, namespaced: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            namespaced,
        }
    }
}

/// Discovery lists the resources of a group version.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> Result<Vec<APIResource>, String>;
}

/// StaticDiscovery serves a fixed resource table.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    resources: HashMap<String, Vec<APIResource>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to a group version.
    pub fn add(&mut self, group_version: &str, resource: APIResource) {
        self.resources
            .entry(group_version.to_string())
            .or_default()
            .push(resource);
    }

    /// A discovery table with the resources shoots commonly reference.
    pub fn with_common_resources() -> Self {
        let mut discovery = Self::new();
        discovery.add("v1", APIResource::new("secrets", "Secret", true));
        discovery.add("v1", APIResource::new("configmaps", "ConfigMap", true));
        discovery.add("v1", APIResource::new("namespaces", "Namespace", false));
        discovery.add("apps/v1", APIResource::new("deployments", "Deployment", true));
        discovery.add(
            "rbac.authorization.k8s.io/v1",
            APIResource::new("clusterroles", "ClusterRole", false),
        );
        discovery
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> Result<Vec<APIResource>, String> {
        self.resources
            .get(group_version)
            .cloned()
            .ok_or_else(|| format!("the server could not find the requested resource ({})", group_version))
    }
}

/// Parse a Kubernetes API version string into group and version.
pub fn parse_group_version(api_version: &str) -> Result<(String, String), String> {
    if api_version.is_empty() {
        return Err("empty API version".to_string());
    }

    let mut parts = api_version.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(version), None, None) => Ok((String::new(), version.to_string())),
        (Some(group), Some(version), None) if !version.is_empty() => {
            Ok((group.to_string(), version.to_string()))
        }
        _ => Err(format!("unexpected GroupVersion string: {}", api_version)),
    }
}

/// Resolves `apiVersion` + `kind` to the served resource.
///
/// Fails if the group version is unknown, malformed, or does not serve the kind.
pub async fn resolve_resource(
    discovery: &dyn Discovery,
    api_version: &str,
    kind: &str,
) -> Result<(GroupVersionResource, APIResource), String> {
    let (group, version) = parse_group_version(api_version)?;
    let resources = discovery
        .server_resources_for_group_version(api_version)
        .await?;
    let resource = resources
        .into_iter()
        .find(|r| r.kind == kind)
        .ok_or_else(|| format!("no resource for kind {} found in {}", kind, api_version))?;
    Ok((
        GroupVersionResource::new(&group, &version, &resource.name),
        resource,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_version() {
        assert_eq!(
            parse_group_version("v1"),
            Ok((String::new(), "v1".to_string()))
        );
        assert_eq!(
            parse_group_version("apps/v1"),
            Ok(("apps".to_string(), "v1".to_string()))
        );
        assert!(parse_group_version("").is_err());
        assert!(parse_group_version("a/b/c").is_err());
        assert!(parse_group_version("apps/").is_err());
    }

    #[tokio::test]
    async fn test_resolve_resource() {
        let discovery = StaticDiscovery::with_common_resources();

        let (gvr, resource) = resolve_resource(&discovery, "apps/v1", "Deployment")
            .await
            .unwrap();
        assert_eq!(gvr, GroupVersionResource::new("apps", "v1", "deployments"));
        assert!(resource.namespaced);

        let (_, resource) = resolve_resource(&discovery, "rbac.authorization.k8s.io/v1", "ClusterRole")
            .await
            .unwrap();
        assert!(!resource.namespaced);

        assert!(resolve_resource(&discovery, "v1", "Pod").await.is_err());
        assert!(resolve_resource(&discovery, "batch/v1", "Job").await.is_err());
        assert!(resolve_resource(&discovery, "a/b/c", "Job").await.is_err());
    }
}
