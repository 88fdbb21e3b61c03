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

//! Admission plugins for a Gardener-style control plane.
//!
//! The plugins validate cross-object references of garden resources, default
//! fields derived from other objects and guard deletions of objects still in use.
//! Referenced objects are read from informer caches, falling back to a live read
//! for objects created right before they are referenced.

pub mod admission;
pub mod api;
pub mod cache;
pub mod config;
pub mod plugins;

// Re-export commonly used types
pub use admission::{
    AdmissionError, AdmissionResult, Attributes, AttributesRecord, Handler, Instance, Interface,
    MutationInterface, Operation, Plugins, ValidationInterface,
};
pub use api::Object;
pub use cache::Informers;
pub use config::Configuration;
