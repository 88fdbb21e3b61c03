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

//! Cloud profile consistency.
//!
//! Removing a version or lowering the node limit of a profile must not strand
//! shoots bound to it. The diff between the old and new profile is computed once;
//! every candidate shoot is then checked by its own task and all violations are
//! collected through a channel, so the user sees every offending shoot at once.

use super::{namespaced_name, required, Request, ReferenceManager};
use crate::admission::gate::{self, Gate, MetadataPolicy};
use crate::admission::{AdmissionError, AdmissionResult, Operation};
use crate::api::garden::{
    CloudProfile, ExpirableVersion, MachineImage, NamespacedCloudProfile, Shoot,
    KIND_CLOUD_PROFILE, KIND_NAMESPACED_CLOUD_PROFILE,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

// ============================================================================
// Diff
// ============================================================================

/// What an update takes away from the shoots bound to a profile.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Removals {
    kubernetes_versions: BTreeSet<String>,
    /// Image name to its removed versions.
    machine_image_versions: BTreeMap<String, BTreeSet<String>>,
    /// The new, lower node limit.
    node_limit: Option<i32>,
}

impl Removals {
    fn is_empty(&self) -> bool {
        self.kubernetes_versions.is_empty()
            && self.machine_image_versions.is_empty()
            && self.node_limit.is_none()
    }

    fn removed_image_version_count(&self) -> usize {
        self.machine_image_versions.values().map(BTreeSet::len).sum()
    }

    /// Everything the shoot still uses that the update removes.
    fn violations(&self, shoot: &Shoot, check_limit: bool) -> Vec<Violation> {
        let name = namespaced_name(&shoot.metadata);
        let mut violations = Vec::new();

        if self.kubernetes_versions.contains(&shoot.spec.kubernetes.version) {
            violations.push(Violation::KubernetesVersion {
                version: shoot.spec.kubernetes.version.clone(),
                shoot: name.clone(),
            });
        }

        for worker in &shoot.spec.provider.workers {
            let Some(image) = &worker.machine.image else {
                continue;
            };
            let Some(version) = &image.version else {
                continue;
            };
            let removed = self
                .machine_image_versions
                .get(&image.name)
                .is_some_and(|versions| versions.contains(version));
            if removed {
                violations.push(Violation::MachineImageVersion {
                    image: image.name.clone(),
                    version: version.clone(),
                    worker: worker.name.clone(),
                    shoot: name.clone(),
                });
            }
        }

        if let Some(limit) = self.node_limit.filter(|_| check_limit) {
            for worker in &shoot.spec.provider.workers {
                if worker.maximum > limit {
                    violations.push(Violation::NodeLimit {
                        shoot: name.clone(),
                        message: format!(
                            "worker pool {} of shoot {} has a maximum of {} nodes, above the limit of {}",
                            worker.name, name, worker.maximum, limit
                        ),
                    });
                }
            }
            let minimum: i64 = shoot
                .spec
                .provider
                .workers
                .iter()
                .map(|worker| i64::from(worker.minimum))
                .sum();
            if minimum > i64::from(limit) {
                violations.push(Violation::NodeLimit {
                    shoot: name.clone(),
                    message: format!(
                        "shoot {} requests a minimum of {} nodes in total, above the limit of {}",
                        name, minimum, limit
                    ),
                });
            }
        }

        violations
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Violation {
    KubernetesVersion {
        version: String,
        shoot: String,
    },
    MachineImageVersion {
        image: String,
        version: String,
        worker: String,
        shoot: String,
    },
    NodeLimit {
        shoot: String,
        message: String,
    },
}

/// Versions of `old` missing from `new`.
fn removed_versions(old: &[ExpirableVersion], new: &[ExpirableVersion]) -> BTreeSet<String> {
    old.iter()
        .filter(|o| !new.iter().any(|n| n.version == o.version))
        .map(|o| o.version.clone())
        .collect()
}

/// Versions of `old` that were usable and are now missing or expired.
fn withdrawn_versions(
    old: &[ExpirableVersion],
    new: &[ExpirableVersion],
    now: DateTime<Utc>,
) -> BTreeSet<String> {
    old.iter()
        .filter(|o| !o.is_expired(now))
        .filter(|o| match new.iter().find(|n| n.version == o.version) {
            Some(n) => n.is_expired(now),
            None => true,
        })
        .map(|o| o.version.clone())
        .collect()
}

/// Per image, the versions removed from it. Removing a whole image removes all of
/// its versions.
fn removed_image_versions(
    old: &[MachineImage],
    new: &[MachineImage],
    removed: impl Fn(&[ExpirableVersion], &[ExpirableVersion]) -> BTreeSet<String>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut result = BTreeMap::new();
    for image in old {
        let new_versions = new
            .iter()
            .find(|n| n.name == image.name)
            .map(|n| n.versions.as_slice())
            .unwrap_or_default();
        let versions = removed(&image.versions, new_versions);
        if !versions.is_empty() {
            result.insert(image.name.clone(), versions);
        }
    }
    result
}

/// The new limit, if it is stricter than the old one. Introducing a limit where
/// there was none tightens; dropping one does not.
fn tightened_limit(old: Option<i32>, new: Option<i32>) -> Option<i32> {
    match (old, new) {
        (None, Some(new)) => Some(new),
        (Some(old), Some(new)) if new < old => Some(new),
        _ => None,
    }
}

/// Whether the parent still offers the version after a child drops its override.
fn covered_upstream(parent: &[ExpirableVersion], version: &str, now: DateTime<Utc>) -> bool {
    parent
        .iter()
        .any(|v| v.version == version && !v.is_expired(now))
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

// ============================================================================
// Fan-out
// ============================================================================

#[derive(Debug, Clone)]
struct Candidate {
    shoot: Shoot,
    /// False when a child profile overrides the limit for this shoot.
    check_limit: bool,
}

/// Checks every non-deleting candidate concurrently and returns all violations.
async fn fan_out(
    candidates: Vec<Candidate>,
    removals: Arc<Removals>,
) -> AdmissionResult<Vec<Violation>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut tasks = JoinSet::new();

    for candidate in candidates {
        if candidate.shoot.metadata.is_deleting() {
            continue;
        }
        let tx = tx.clone();
        let removals = removals.clone();
        tasks.spawn(async move {
            for violation in removals.violations(&candidate.shoot, candidate.check_limit) {
                // The receiver is drained until every sender is gone.
                let _ = tx.send(violation);
            }
        });
    }
    drop(tx);

    let mut violations = Vec::new();
    while let Some(violation) = rx.recv().await {
        violations.push(violation);
    }
    while let Some(result) = tasks.join_next().await {
        result.map_err(|err| {
            AdmissionError::internal_error(format!("consistency check failed: {}", err))
        })?;
    }
    Ok(violations)
}

/// Renders violations grouped by version, versions in ascending order.
fn describe(profile: &str, violations: &[Violation]) -> Vec<String> {
    let mut kubernetes: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut images: BTreeMap<(&str, &str), BTreeSet<String>> = BTreeMap::new();
    let mut limits: BTreeSet<&str> = BTreeSet::new();

    for violation in violations {
        match violation {
            Violation::KubernetesVersion { version, shoot } => {
                kubernetes.entry(version).or_default().insert(shoot);
            }
            Violation::MachineImageVersion {
                image,
                version,
                worker,
                shoot,
            } => {
                images
                    .entry((image.as_str(), version.as_str()))
                    .or_default()
                    .insert(format!("worker {} of shoot {}", worker, shoot));
            }
            Violation::NodeLimit { message, .. } => {
                limits.insert(message);
            }
        }
    }

    let mut versions: Vec<_> = kubernetes.into_iter().collect();
    versions.sort_by(|(a, _), (b, _)| compare_versions(a, b));
    let mut image_versions: Vec<_> = images.into_iter().collect();
    image_versions.sort_by(|((a_image, a), _), ((b_image, b), _)| {
        a_image.cmp(b_image).then_with(|| compare_versions(a, b))
    });

    let mut messages = Vec::new();
    for (version, shoots) in versions {
        messages.push(format!(
            "unable to delete Kubernetes version {:?} from {}: still in use by shoot(s) {}",
            version,
            profile,
            shoots.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    for ((image, version), workers) in image_versions {
        messages.push(format!(
            "unable to delete machine image version {} {:?} from {}: still in use by {}",
            image,
            version,
            profile,
            workers.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    for message in limits {
        messages.push(format!("unable to lower the node limit of {}: {}", profile, message));
    }
    messages
}

// ============================================================================
// Admission
// ============================================================================

impl ReferenceManager {
    pub(super) async fn admit_cloud_profile(
        &self,
        request: &Request,
        profile: &CloudProfile,
        old: Option<&CloudProfile>,
    ) -> AdmissionResult<()> {
        let Some(old) = old.filter(|_| request.operation == Operation::Update) else {
            return Ok(());
        };
        let gate = gate::evaluate(
            request.operation,
            Some((&old.metadata, &old.spec)),
            (&profile.metadata, &profile.spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            debug!(name = %request.name, "cloud profile unchanged, skipping");
            return Ok(());
        }

        let removals = Removals {
            kubernetes_versions: removed_versions(
                &old.spec.kubernetes.versions,
                &profile.spec.kubernetes.versions,
            ),
            machine_image_versions: removed_image_versions(
                &old.spec.machine_images,
                &profile.spec.machine_images,
                removed_versions,
            ),
            node_limit: tightened_limit(
                old.spec.limits.as_ref().and_then(|l| l.max_nodes_total),
                profile.spec.limits.as_ref().and_then(|l| l.max_nodes_total),
            ),
        };
        if removals.is_empty() {
            return Ok(());
        }

        let name = profile.metadata.name.as_str();
        let label = format!("CloudProfile {:?}", name);
        let children: Vec<NamespacedCloudProfile> =
            required(&self.namespaced_cloud_profile_lister, "namespaced cloud profile lister")?
                .list()?
                .into_iter()
                .filter(|child| {
                    child.spec.parent.kind == KIND_CLOUD_PROFILE && child.spec.parent.name == name
                })
                .collect();
        let mut messages = child_override_conflicts(&label, &removals, &children);

        let candidates: Vec<Candidate> = required(&self.shoot_lister, "shoot lister")?
            .list()?
            .into_iter()
            .filter_map(|shoot| {
                let reference = shoot.spec.cloud_profile_reference()?;
                let check_limit = match reference.kind.as_str() {
                    KIND_CLOUD_PROFILE if reference.name == name => true,
                    KIND_NAMESPACED_CLOUD_PROFILE => {
                        let child = children.iter().find(|child| {
                            child.metadata.namespace == shoot.metadata.namespace
                                && child.metadata.name == reference.name
                        })?;
                        child
                            .spec
                            .limits
                            .as_ref()
                            .and_then(|l| l.max_nodes_total)
                            .is_none()
                    }
                    _ => return None,
                };
                Some(Candidate { shoot, check_limit })
            })
            .collect();

        info!(
            profile = %label,
            candidates = candidates.len(),
            kubernetes_versions = removals.kubernetes_versions.len(),
            machine_image_versions = removals.removed_image_version_count(),
            "checking shoots against cloud profile update"
        );
        let violations = fan_out(candidates, Arc::new(removals)).await?;
        messages.extend(describe(&label, &violations));
        request.forbidden_all(messages)
    }

    pub(super) async fn admit_namespaced_cloud_profile(
        &self,
        request: &Request,
        profile: &NamespacedCloudProfile,
        old: Option<&NamespacedCloudProfile>,
    ) -> AdmissionResult<()> {
        let Some(old) = old.filter(|_| request.operation == Operation::Update) else {
            return Ok(());
        };
        let gate = gate::evaluate(
            request.operation,
            Some((&old.metadata, &old.spec)),
            (&profile.metadata, &profile.spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            debug!(namespace = %request.namespace, name = %request.name, "namespaced cloud profile unchanged, skipping");
            return Ok(());
        }

        let parent = request.resolve(
            &self.cloud_profile_lister,
            "parent cloud profile",
            "",
            &profile.spec.parent.name,
        )?;
        let now = Utc::now();

        let no_versions = Vec::new();
        let kubernetes_versions = withdrawn_versions(
            old.spec.kubernetes.as_ref().map(|k| &k.versions).unwrap_or(&no_versions),
            profile.spec.kubernetes.as_ref().map(|k| &k.versions).unwrap_or(&no_versions),
            now,
        )
        .into_iter()
        .filter(|v| !covered_upstream(&parent.spec.kubernetes.versions, v, now))
        .collect();

        let mut machine_image_versions = removed_image_versions(
            &old.spec.machine_images,
            &profile.spec.machine_images,
            |old, new| withdrawn_versions(old, new, now),
        );
        for (image, versions) in machine_image_versions.iter_mut() {
            let upstream = parent
                .spec
                .machine_images
                .iter()
                .find(|i| &i.name == image)
                .map(|i| i.versions.as_slice())
                .unwrap_or_default();
            versions.retain(|v| !covered_upstream(upstream, v, now));
        }
        machine_image_versions.retain(|_, versions| !versions.is_empty());

        let parent_limit = parent.spec.limits.as_ref().and_then(|l| l.max_nodes_total);
        let effective_limit = |p: &NamespacedCloudProfile| {
            p.spec
                .limits
                .as_ref()
                .and_then(|l| l.max_nodes_total)
                .or(parent_limit)
        };
        let removals = Removals {
            kubernetes_versions,
            machine_image_versions,
            node_limit: tightened_limit(effective_limit(old), effective_limit(profile)),
        };
        if removals.is_empty() {
            return Ok(());
        }

        let namespace = profile.metadata.namespace.as_str();
        let name = profile.metadata.name.as_str();
        let label = format!("NamespacedCloudProfile \"{}/{}\"", namespace, name);
        let candidates: Vec<Candidate> = required(&self.shoot_lister, "shoot lister")?
            .list_namespaced(namespace)?
            .into_iter()
            .filter(|shoot| {
                shoot
                    .spec
                    .cloud_profile_reference()
                    .is_some_and(|r| r.kind == KIND_NAMESPACED_CLOUD_PROFILE && r.name == name)
            })
            .map(|shoot| Candidate {
                shoot,
                check_limit: true,
            })
            .collect();

        info!(
            profile = %label,
            candidates = candidates.len(),
            kubernetes_versions = removals.kubernetes_versions.len(),
            machine_image_versions = removals.removed_image_version_count(),
            "checking shoots against namespaced cloud profile update"
        );
        let violations = fan_out(candidates, Arc::new(removals)).await?;
        request.forbidden_all(describe(&label, &violations))
    }
}

/// A child profile overriding a version the parent removes would keep a dangling
/// entry.
fn child_override_conflicts(
    profile: &str,
    removals: &Removals,
    children: &[NamespacedCloudProfile],
) -> Vec<String> {
    let mut messages = Vec::new();
    for child in children {
        let child_name = namespaced_name(&child.metadata);
        let overridden = child.spec.kubernetes.iter().flat_map(|k| k.versions.iter());
        for version in overridden.filter(|v| removals.kubernetes_versions.contains(&v.version)) {
            messages.push(format!(
                "unable to delete Kubernetes version {:?} from {}: still overridden by NamespacedCloudProfile {}",
                version.version, profile, child_name
            ));
        }
        for image in &child.spec.machine_images {
            let Some(removed) = removals.machine_image_versions.get(&image.name) else {
                continue;
            };
            for version in image.versions.iter().filter(|v| removed.contains(&v.version)) {
                messages.push(format!(
                    "unable to delete machine image version {} {:?} from {}: still overridden by NamespacedCloudProfile {}",
                    image.name, version.version, profile, child_name
                ));
            }
        }
    }
    messages
}
