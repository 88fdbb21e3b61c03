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

//! Project defaulting and namespace exclusivity.

use super::{required, Request, ReferenceManager};
use crate::admission::gate::{self, Gate, MetadataPolicy};
use crate::admission::{AdmissionResult, Operation};
use crate::api::core::Subject;
use crate::api::garden::{Project, ProjectMember, ProjectSpec, ROLE_ADMIN, ROLE_OWNER, ROLE_VIEWER};
use tracing::debug;

impl ReferenceManager {
    pub(super) fn admit_project(
        &self,
        request: &Request,
        project: &mut Project,
        old: Option<&Project>,
    ) -> AdmissionResult<()> {
        let gate = gate::evaluate(
            request.operation,
            old.map(|o| (&o.metadata, &o.spec)),
            (&project.metadata, &project.spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            debug!(name = %request.name, "project unchanged, skipping");
            return Ok(());
        }

        if request.operation == Operation::Create && !request.user.is_anonymous() {
            project.spec.created_by = Some(Subject::user(&request.user.name));
        }
        if project.spec.owner.is_none() {
            project.spec.owner = default_owner(&project.spec);
        }
        if let Some(owner) = project.spec.owner.clone() {
            ensure_owner_membership(&mut project.spec, &owner);
        }

        let old_namespace = old.and_then(|o| o.spec.namespace.as_deref());
        if let Some(namespace) = project.spec.namespace.as_deref() {
            if request.operation == Operation::Create || old_namespace.is_none() {
                self.ensure_namespace_unused(request, &project.metadata.name, namespace)?;
            }
        }
        Ok(())
    }

    fn ensure_namespace_unused(
        &self,
        request: &Request,
        project: &str,
        namespace: &str,
    ) -> AdmissionResult<()> {
        let projects = required(&self.project_lister, "project lister")?.list()?;
        let conflict = projects.iter().find(|other| {
            other.metadata.name != project && other.spec.namespace.as_deref() == Some(namespace)
        });
        match conflict {
            Some(other) => Err(request.forbidden(format!(
                "namespace {:?} is already used by project {:?}",
                namespace, other.metadata.name
            ))),
            None => Ok(()),
        }
    }
}

/// The first member holding the owner role, else the creator.
fn default_owner(spec: &ProjectSpec) -> Option<Subject> {
    spec.members
        .iter()
        .find(|member| member.has_role(ROLE_OWNER))
        .map(|member| member.subject.clone())
        .or_else(|| spec.created_by.clone())
}

fn same_subject(a: &Subject, b: &Subject) -> bool {
    a.kind == b.kind && a.name == b.name && a.namespace == b.namespace
}

/// Makes the owner an admin and the only holder of the owner role.
fn ensure_owner_membership(spec: &mut ProjectSpec, owner: &Subject) {
    let mut found = false;
    for member in spec.members.iter_mut() {
        if same_subject(&member.subject, owner) {
            found = true;
            for role in [ROLE_ADMIN, ROLE_OWNER] {
                if !member.has_role(role) {
                    member.roles.push(role.to_string());
                }
            }
            continue;
        }

        if member.has_role(ROLE_OWNER) {
            member.roles.retain(|role| role != ROLE_OWNER);
            if member.roles.is_empty() {
                member.roles.push(ROLE_VIEWER.to_string());
            }
        }
    }

    if !found {
        spec.members
            .push(ProjectMember::new(owner.clone(), &[ROLE_ADMIN, ROLE_OWNER]));
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::Fixture;
    use super::*;
    use crate::admission::{AdmissionError, AttributesRecord, MutationInterface};

    fn project(name: &str, namespace: Option<&str>) -> Project {
        let mut project = Project::new(name);
        project.spec.namespace = namespace.map(str::to_string);
        project
    }

    async fn admit_create(fixture: &Fixture, project: Project) -> Result<Project, AdmissionError> {
        let mut attrs = AttributesRecord::for_object(Operation::Create, Some(project), None, "alice");
        fixture.plugin().admit(&mut attrs).await?;
        Ok(attrs.object.and_then(|o| o.as_project().cloned()).unwrap())
    }

    #[tokio::test]
    async fn test_create_defaults_creator_and_owner() {
        let fixture = Fixture::new();
        let project = admit_create(&fixture, project("dev", None)).await.unwrap();

        let alice = Subject::user("alice");
        assert_eq!(project.spec.created_by, Some(alice.clone()));
        assert_eq!(project.spec.owner, Some(alice.clone()));
        assert_eq!(project.spec.members.len(), 1);
        assert_eq!(project.spec.members[0].subject, alice);
        assert!(project.spec.members[0].has_role(ROLE_ADMIN));
        assert!(project.spec.members[0].has_role(ROLE_OWNER));
    }

    #[tokio::test]
    async fn test_owner_derived_from_members() {
        let fixture = Fixture::new();
        let mut input = project("dev", None);
        input.spec.members = vec![
            ProjectMember::new(Subject::user("bob"), &[ROLE_VIEWER]),
            ProjectMember::new(Subject::user("carol"), &[ROLE_OWNER]),
            ProjectMember::new(Subject::user("dave"), &[ROLE_OWNER]),
            ProjectMember::new(Subject::user("erin"), &[ROLE_OWNER, ROLE_ADMIN]),
        ];
        let project = admit_create(&fixture, input).await.unwrap();

        assert_eq!(project.spec.owner, Some(Subject::user("carol")));
        assert_eq!(project.spec.members.len(), 4);
        let roles = |name: &str| {
            project
                .spec
                .members
                .iter()
                .find(|m| m.subject.name == name)
                .map(|m| m.roles.clone())
                .unwrap()
        };
        assert_eq!(roles("carol"), vec![ROLE_OWNER, ROLE_ADMIN]);
        assert_eq!(roles("dave"), vec![ROLE_VIEWER]);
        assert_eq!(roles("erin"), vec![ROLE_ADMIN]);
    }

    #[test]
    fn test_ensure_owner_membership_matches_subject_kind() {
        let mut spec = ProjectSpec::default();
        let mut group = Subject::user("admins");
        group.kind = "Group".to_string();
        spec.members.push(ProjectMember::new(group, &[ROLE_VIEWER]));

        ensure_owner_membership(&mut spec, &Subject::user("admins"));
        assert_eq!(spec.members.len(), 2);
        assert_eq!(spec.members[1].roles, vec![ROLE_ADMIN, ROLE_OWNER]);
    }

    #[tokio::test]
    async fn test_namespace_uniqueness() {
        for (first, second) in [("dev", "prod"), ("prod", "dev")] {
            let fixture = Fixture::new();
            fixture
                .informers
                .projects
                .add(project(first, Some("garden-shared")));

            let err = admit_create(&fixture, project(second, Some("garden-shared")))
                .await
                .unwrap_err();
            assert!(matches!(err, AdmissionError::Forbidden(_)));
            assert!(err.to_string().contains(&format!(
                "namespace \"garden-shared\" is already used by project {:?}",
                first
            )));

            assert!(admit_create(&fixture, project(second, Some("garden-Shared")))
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn test_unset_namespaces_never_conflict() {
        let fixture = Fixture::new();
        fixture.informers.projects.add(project("dev", None));
        assert!(admit_create(&fixture, project("prod", None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_namespace_checked_when_newly_set() {
        let fixture = Fixture::new();
        fixture
            .informers
            .projects
            .add(project("dev", Some("garden-dev")));
        let plugin = fixture.plugin();

        let old = project("prod", None);
        let new = project("prod", Some("garden-dev"));
        let mut attrs = AttributesRecord::for_object(Operation::Update, Some(new), Some(old), "alice");
        assert!(plugin.admit(&mut attrs).await.is_err());

        let old = project("prod", Some("garden-prod"));
        let mut new = old.clone();
        new.spec.description = Some("production".to_string());
        let mut attrs = AttributesRecord::for_object(Operation::Update, Some(new), Some(old), "alice");
        assert!(plugin.admit(&mut attrs).await.is_ok());
        assert_eq!(fixture.informers.projects.list_calls(), 1);
    }
}
