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

//! Project: a tenant grouping shoots and members behind one namespace.

use crate::api::core::{ObjectMeta, Subject};
use crate::impl_resource;

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_VIEWER: &str = "viewer";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Project {
    pub metadata: ObjectMeta,
    pub spec: ProjectSpec,
}

impl_resource!(Project, "Project", "projects");

impl Project {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectSpec {
    pub created_by: Option<Subject>,
    pub owner: Option<Subject>,
    pub members: Vec<ProjectMember>,
    /// Namespace backing the project; exclusive once claimed.
    pub namespace: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectMember {
    pub subject: Subject,
    pub roles: Vec<String>,
}

impl ProjectMember {
    pub fn new(subject: Subject, roles: &[&str]) -> Self {
        Self {
            subject,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
