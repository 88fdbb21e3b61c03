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

use super::{added, Request, ReferenceManager};
use crate::admission::gate::{self, Gate, MetadataPolicy};
use crate::admission::{AdmissionError, AdmissionResult};
use crate::api::garden::{ControllerRegistration, ControllerRegistrationSpec};

fn deployment_names(spec: &ControllerRegistrationSpec) -> impl Iterator<Item = &str> {
    spec.deployment
        .iter()
        .flat_map(|d| d.deployment_refs.iter())
        .map(|r| r.name.as_str())
}

impl ReferenceManager {
    /// Every newly referenced ControllerDeployment must exist. All missing
    /// deployments are reported together.
    pub(super) async fn admit_controller_registration(
        &self,
        request: &Request,
        registration: &ControllerRegistration,
        old: Option<&ControllerRegistration>,
    ) -> AdmissionResult<()> {
        let gate = gate::evaluate(
            request.operation,
            old.map(|o| (&o.metadata, &o.spec)),
            (&registration.metadata, &registration.spec),
            MetadataPolicy::Ignore,
        );
        if gate == Gate::Skip {
            return Ok(());
        }

        let old_names = old.into_iter().flat_map(|o| deployment_names(&o.spec));
        let mut failures = Vec::new();
        for name in added(old_names, deployment_names(&registration.spec)) {
            match self
                .lookup(request, &self.controller_deployments, "controller deployment", "", name)
                .await
            {
                Ok(_) => {}
                Err(err @ AdmissionError::Forbidden(_)) => failures.push(err),
                Err(err) => return Err(err),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AdmissionError::aggregate(failures))
        }
    }
}
