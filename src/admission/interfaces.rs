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

//! Plugin traits shared by every admission controller in this crate.

use super::attributes::Attributes;
use super::errors::AdmissionResult;
use async_trait::async_trait;
use std::fmt;

/// Verb of the API request under admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// Streaming subresource requests. No plugin here handles them.
    Connect,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Connect => "CONNECT",
        }
    }

    /// Case-insensitive inverse of [`Operation::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        [
            Operation::Create,
            Operation::Update,
            Operation::Delete,
            Operation::Connect,
        ]
        .into_iter()
        .find(|op| op.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common surface of mutating and validating plugins.
pub trait Interface: Send + Sync {
    /// Whether the plugin wants to see requests with this operation.
    fn handles(&self, operation: Operation) -> bool;

    /// Reports collaborators that were never wired into the plugin.
    fn validate_initialization(&self) -> AdmissionResult<()> {
        Ok(())
    }
}

/// A plugin that may default or rewrite the admitted object.
#[async_trait]
pub trait MutationInterface: Interface {
    async fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()>;
}

/// A plugin that only accepts or rejects the request.
#[async_trait]
pub trait ValidationInterface: Interface {
    async fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_operation_parse() {
        assert_eq!(Operation::parse("CREATE"), Some(Operation::Create));
        assert_eq!(Operation::parse("update"), Some(Operation::Update));
        assert_eq!(Operation::parse("Delete"), Some(Operation::Delete));
        assert_eq!(Operation::parse("UNKNOWN"), None);
    }
}
