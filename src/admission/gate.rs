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

//! Change detection for update requests.
//!
//! Reference checks are expensive (cache reads, live reads, authorization calls) and
//! may fail for fields the acting user never touched. The gate decides up front
//! whether a request needs validation at all, and [`changed`] lets plugins re-check
//! only the sub-references whose value differs from the stored object.

use super::interfaces::Operation;
use crate::api::core::ObjectMeta;

/// Outcome of the change gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Nothing relevant changed or the object is being torn down.
    Skip,
    /// A new object: every reference is checked.
    ValidateAll,
    /// An update with a relevant diff: only changed references are checked.
    ValidateChanged,
}

/// Whether metadata changes count as relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataPolicy {
    Ignore,
    Compare,
}

/// Evaluates the gate for one request.
pub fn evaluate<S: PartialEq + ?Sized>(
    operation: Operation,
    old: Option<(&ObjectMeta, &S)>,
    new: (&ObjectMeta, &S),
    metadata: MetadataPolicy,
) -> Gate {
    let (new_meta, new_spec) = new;
    match operation {
        Operation::Create => Gate::ValidateAll,
        Operation::Update => {
            if new_meta.is_deleting() {
                return Gate::Skip;
            }
            let Some((old_meta, old_spec)) = old else {
                return Gate::ValidateAll;
            };
            let spec_unchanged = old_spec == new_spec;
            let meta_unchanged = metadata == MetadataPolicy::Ignore || old_meta == new_meta;
            if spec_unchanged && meta_unchanged {
                Gate::Skip
            } else {
                Gate::ValidateChanged
            }
        }
        Operation::Delete | Operation::Connect => Gate::ValidateAll,
    }
}

/// Reports whether a field differs from its stored value. Without a stored object
/// (creation) every field counts as changed.
pub fn changed<T: PartialEq + ?Sized>(old: Option<&T>, new: &T) -> bool {
    match old {
        Some(old) => old != new,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta() -> ObjectMeta {
        ObjectMeta::new("garden-dev", "crazy-botany")
    }

    #[test]
    fn test_create_validates_all() {
        let m = meta();
        assert_eq!(
            evaluate(Operation::Create, None, (&m, "spec"), MetadataPolicy::Ignore),
            Gate::ValidateAll
        );
    }

    #[test]
    fn test_update_with_deletion_timestamp_skips() {
        let old = meta();
        let mut new = meta();
        new.deletion_timestamp = Some(Utc::now());
        assert_eq!(
            evaluate(
                Operation::Update,
                Some((&old, "a")),
                (&new, "b"),
                MetadataPolicy::Compare
            ),
            Gate::Skip
        );
    }

    #[test]
    fn test_update_without_spec_change_skips() {
        let old = meta();
        let mut new = meta();
        new.labels.insert("team".to_string(), "blue".to_string());

        assert_eq!(
            evaluate(
                Operation::Update,
                Some((&old, "same")),
                (&new, "same"),
                MetadataPolicy::Ignore
            ),
            Gate::Skip
        );
        assert_eq!(
            evaluate(
                Operation::Update,
                Some((&old, "same")),
                (&new, "same"),
                MetadataPolicy::Compare
            ),
            Gate::ValidateChanged
        );
    }

    #[test]
    fn test_update_with_spec_change_validates_changed() {
        let m = meta();
        assert_eq!(
            evaluate(
                Operation::Update,
                Some((&m, "a")),
                (&m, "b"),
                MetadataPolicy::Ignore
            ),
            Gate::ValidateChanged
        );
    }

    #[test]
    fn test_changed() {
        assert!(changed(None, &Some("seed")));
        assert!(changed(Some(&None), &Some("seed")));
        assert!(!changed(Some(&Some("seed")), &Some("seed")));
    }
}
