// Jetporch
// Copyright (C) 2023 - Michael DeHaan <michael@michaeldehaan.net> + contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

use crate::error::ProvcheckError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Provisioning layer. `First` is the management/frontend layer, `Default` is compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    First,
    Default,
}

impl FromStr for Layer {
    type Err = ProvcheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Layer::First),
            "default" => Ok(Layer::Default),
            other => Err(ProvcheckError::Config(format!("unknown layer '{}', expected first or default", other))),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::First => f.write_str("first"),
            Layer::Default => f.write_str("default"),
        }
    }
}

/// The fixed classification of role names. Passed explicitly to the roles
/// validator and the resolver so tests can swap in other role sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerTaxonomy {
    pub management_roles: BTreeSet<String>,
    pub compute_roles: BTreeSet<String>,
    pub service_role: String,
    /// compute roles whose groups carry a resource_mgr_id
    pub worker_roles: BTreeSet<String>,
    /// roles whose groups may never declare a parent
    pub empty_parent_roles: BTreeSet<String>,
    /// the compute roles used when a service node exists
    pub hierarchical_compute_roles: BTreeSet<String>,
    pub group_prefix: String,
    pub max_roles: usize,
    pub max_roles_per_group: usize,
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for LayerTaxonomy {
    fn default() -> Self {
        Self {
            management_roles: set(&[
                "service_node",
                "login",
                "compiler_node",
                "kube_control_plane",
                "etcd",
                "slurm_control_node",
                "slurm_dbd",
                "auth_server",
                "oim_ha_node",
            ]),
            compute_roles: set(&["default", "kube_node", "slurm_node"]),
            service_role: String::from("service_node"),
            worker_roles: set(&["kube_node", "slurm_node"]),
            empty_parent_roles: set(&[
                "login",
                "compiler_node",
                "service_node",
                "kube_control_plane",
                "etcd",
                "slurm_control_node",
                "slurm_dbd",
                "auth_server",
            ]),
            hierarchical_compute_roles: set(&["default", "kube_node", "slurm_node"]),
            group_prefix: String::from("grp"),
            max_roles: 100,
            max_roles_per_group: 5,
        }
    }
}

impl LayerTaxonomy {
    pub fn layer_of(&self, role: &str) -> Option<Layer> {
        if self.management_roles.contains(role) {
            Some(Layer::First)
        } else if self.compute_roles.contains(role) {
            Some(Layer::Default)
        } else {
            None
        }
    }

    pub fn is_service_role(&self, role: &str) -> bool {
        self.service_role == role
    }

    pub fn is_worker(&self, role: &str) -> bool {
        self.worker_roles.contains(role)
    }

    pub fn forbids_parent(&self, role: &str) -> bool {
        self.empty_parent_roles.contains(role)
    }
}
