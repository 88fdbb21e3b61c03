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

//! Authorizer interface consulted before a user may reference another object.

use super::attributes::{GroupVersionResource, UserInfo};
use async_trait::async_trait;

/// AuthorizerDecision is the result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizerDecision {
    /// Allow means the request is authorized.
    Allow,
    /// Deny means the request is denied.
    Deny,
    /// NoOpinion means the authorizer has no opinion.
    NoOpinion,
}

/// AuthorizerAttributes contains the attributes needed to make an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerAttributes {
    pub user: UserInfo,
    pub verb: String,
    pub namespace: String,
    pub api_group: String,
    pub api_version: String,
    pub resource: String,
    pub subresource: String,
    pub name: String,
    pub resource_request: bool,
}

impl AuthorizerAttributes {
    /// Attributes asking whether the user may read the named object.
    pub fn get_check(
        user: &UserInfo,
        resource: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> Self {
        Self {
            user: user.clone(),
            verb: "get".to_string(),
            namespace: namespace.to_string(),
            api_group: resource.group.clone(),
            api_version: resource.version.clone(),
            resource: resource.resource.clone(),
            subresource: String::new(),
            name: name.to_string(),
            resource_request: true,
        }
    }
}

/// Authorizer makes authorization decisions.
///
/// Returns the decision, a human readable reason and, if the authorizer itself
/// failed, the error it ran into.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(
        &self,
        attrs: &AuthorizerAttributes,
    ) -> (AuthorizerDecision, String, Option<String>);
}

/// AlwaysAllowAuthorizer always allows requests.
pub struct AlwaysAllowAuthorizer;

#[async_trait]
impl Authorizer for AlwaysAllowAuthorizer {
    async fn authorize(
        &self,
        _attrs: &AuthorizerAttributes,
    ) -> (AuthorizerDecision, String, Option<String>) {
        (AuthorizerDecision::Allow, String::new(), None)
    }
}
