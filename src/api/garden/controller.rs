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

//! Extension controller registrations and their deployments.

use crate::api::core::ObjectMeta;
use crate::impl_resource;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerRegistration {
    pub metadata: ObjectMeta,
    pub spec: ControllerRegistrationSpec,
}

impl_resource!(
    ControllerRegistration,
    "ControllerRegistration",
    "controllerregistrations"
);

impl ControllerRegistration {
    pub fn new(name: &str, deployment_refs: &[&str]) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            spec: ControllerRegistrationSpec {
                resources: Vec::new(),
                deployment: Some(ControllerRegistrationDeployment {
                    deployment_refs: deployment_refs
                        .iter()
                        .map(|name| DeploymentRef {
                            name: name.to_string(),
                        })
                        .collect(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerRegistrationSpec {
    pub resources: Vec<ControllerResource>,
    pub deployment: Option<ControllerRegistrationDeployment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerResource {
    pub kind: String,
    pub provider_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerRegistrationDeployment {
    pub deployment_refs: Vec<DeploymentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeploymentRef {
    pub name: String,
}

/// ControllerDeployment describes how an extension controller is installed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerDeployment {
    pub metadata: ObjectMeta,
    pub helm_chart_ref: Option<String>,
}

impl_resource!(
    ControllerDeployment,
    "ControllerDeployment",
    "controllerdeployments"
);

impl ControllerDeployment {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            helm_chart_ref: None,
        }
    }
}
