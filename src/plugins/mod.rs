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

//! Admission plugins module.

pub mod gardenlet;
pub mod managedseed;
pub mod resourcereferencemanager;
pub mod seedvalidator;

use crate::admission::Plugins;

/// All plugins in execution order. Mutating plugins run before validating ones,
/// so validators see the defaulted objects.
pub const ALL_ORDERED_PLUGINS: &[&str] = &[
    resourcereferencemanager::PLUGIN_NAME,
    managedseed::PLUGIN_NAME,
    seedvalidator::PLUGIN_NAME,
    gardenlet::PLUGIN_NAME,
];

/// Register all admission plugins.
pub fn register_all_admission_plugins(plugins: &Plugins) {
    resourcereferencemanager::register(plugins);
    managedseed::register(plugins);
    seedvalidator::register(plugins);
    gardenlet::register(plugins);
}
