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

//! Turns a validated roles_config into the role/group mapping the provisioning
//! layer consumes. Unlike the validator this stops at the first problem.

use crate::error::{ProvcheckError, Result};
use crate::topology::model::{Group, Role, RolesConfig};
use crate::topology::taxonomy::{Layer, LayerTaxonomy};
use crate::validation::roles::validate_layer_group_separation;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// What one group resolves to for the requested layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResolvedGroup {
    pub roles: Vec<String>,
    pub parent: Option<String>,
    /// the group's attributes as written in Groups
    pub attributes: IndexMap<String, Value>,
    pub bmc_required: bool,
    pub switch_status: bool,
    pub bmc_static_status: bool,
    /// filled in by `hierarchy::apply_hierarchy`
    pub hierarchical_provision_status: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RolesGroupsMapping {
    pub layer: Layer,
    pub needs_bmc: bool,
    pub needs_switch: bool,
    pub hierarchical_provision_required: bool,
    /// role -> group -> group attributes
    pub roles_groups_data: IndexMap<String, IndexMap<String, IndexMap<String, Value>>>,
    pub groups_roles_info: IndexMap<String, ResolvedGroup>,
}

// ==============================================================================================================
// PUBLIC API
// ==============================================================================================================

/// Check the defined roles can be provisioned in `layer`.
pub fn validate_layers(roles: &[Role], layer: Layer, taxonomy: &LayerTaxonomy) -> Result<()> {
    let defined: IndexSet<&str> = roles.iter().map(|r| r.name.as_str()).collect();

    let unknown: Vec<&str> = defined.iter().copied().filter(|r| taxonomy.layer_of(r).is_none()).collect();
    if !unknown.is_empty() {
        warn!(roles = %unknown.join(", "), "roles outside both layers are ignored");
    }

    let in_layer = filter_roles(roles, layer, taxonomy);
    if in_layer.is_empty() {
        return Err(ProvcheckError::Topology(format!(
            "roles_config.yml defines no roles that can be provisioned in the {} layer",
            layer
        )));
    }

    if let Some(err) = validate_layer_group_separation(roles, taxonomy).into_iter().next() {
        return Err(ProvcheckError::Topology(err.message));
    }
    Ok(())
}

/// The roles resolved for `layer`, in file order.
///
/// `first` takes the management roles. `default` takes the hierarchical compute
/// roles when a service node is defined, otherwise every classified role but the
/// service role. Unclassified roles never resolve.
pub fn filter_roles<'a>(roles: &'a [Role], layer: Layer, taxonomy: &LayerTaxonomy) -> Vec<&'a Role> {
    let has_service = roles.iter().any(|r| taxonomy.is_service_role(&r.name));
    roles
        .iter()
        .filter(|r| match layer {
            Layer::First => taxonomy.management_roles.contains(&r.name),
            Layer::Default if has_service => taxonomy.hierarchical_compute_roles.contains(&r.name),
            Layer::Default => taxonomy.layer_of(&r.name).is_some() && !taxonomy.is_service_role(&r.name),
        })
        .collect()
}

/// Build the role/group mapping for `layer`. The first group referenced by a
/// role but absent from `groups` aborts.
pub fn resolve(
    roles: &[Role],
    groups: &IndexMap<String, Group>,
    layer: Layer,
    taxonomy: &LayerTaxonomy,
) -> Result<RolesGroupsMapping> {
    let mut mapping = RolesGroupsMapping {
        layer,
        needs_bmc: false,
        needs_switch: false,
        hierarchical_provision_required: false,
        roles_groups_data: IndexMap::new(),
        groups_roles_info: IndexMap::new(),
    };

    for role in filter_roles(roles, layer, taxonomy) {
        for group_name in role.groups.iter() {
            let group = groups.get(group_name).ok_or_else(|| {
                ProvcheckError::ReferentialIntegrity(format!(
                    "Group '{}' doesn't exist in roles_config.yml Groups dict",
                    group_name
                ))
            })?;

            let bmc_required = group.has_static_range();
            let switch_required = bmc_required && group.switch_complete() && layer != Layer::First;

            mapping
                .roles_groups_data
                .entry(role.name.clone())
                .or_default()
                .insert(group_name.clone(), group.attributes.clone());

            let resolved = mapping.groups_roles_info.entry(group_name.clone()).or_insert_with(|| ResolvedGroup {
                parent: group.parent.clone(),
                attributes: group.attributes.clone(),
                ..Default::default()
            });
            if !resolved.roles.contains(&role.name) {
                resolved.roles.push(role.name.clone());
            }
            resolved.bmc_required |= bmc_required;
            resolved.switch_status |= switch_required;
            resolved.bmc_static_status = resolved.bmc_required && !resolved.switch_status;

            mapping.needs_bmc |= bmc_required;
            mapping.needs_switch |= switch_required;
        }
    }

    debug!(
        layer = %layer,
        groups = mapping.groups_roles_info.len(),
        needs_bmc = mapping.needs_bmc,
        needs_switch = mapping.needs_switch,
        "resolved roles and groups"
    );
    Ok(mapping)
}

/// `validate_layers` then `resolve` over a parsed roles_config.
pub fn resolve_config(config: &RolesConfig, layer: Layer, taxonomy: &LayerTaxonomy) -> Result<RolesGroupsMapping> {
    validate_layers(&config.roles, layer, taxonomy)?;
    resolve(&config.roles, &config.groups, layer, taxonomy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config(doc: Value) -> RolesConfig {
        RolesConfig::from_document(&doc).unwrap()
    }

    fn cluster() -> RolesConfig {
        config(json!({
            "Roles": [
                {"name": "login", "groups": ["grp0"]},
                {"name": "kube_control_plane", "groups": ["grp1"]},
                {"name": "kube_node", "groups": ["grp2", "grp3"]},
                {"name": "slurm_node", "groups": ["grp3"]}
            ],
            "Groups": {
                "grp0": {"bmc_details": {"static_range": "10.3.0.1-10.3.0.10"}},
                "grp1": {"switch_details": {"ip": "10.1.1.1", "ports": "1-4"},
                         "bmc_details": {"static_range": "10.3.0.20-10.3.0.30"}},
                "grp2": {"resource_mgr_id": "rack1",
                         "switch_details": {"ip": "10.1.1.1", "ports": "5-8"},
                         "bmc_details": {"static_range": "10.3.0.40-10.3.0.50"}},
                "grp3": {"resource_mgr_id": "rack2", "location_id": "SU-1.RACK-2"}
            }
        }))
    }

    #[test]
    fn test_first_layer() {
        let config = cluster();
        let mapping = resolve_config(&config, Layer::First, &LayerTaxonomy::default()).unwrap();
        let roles: Vec<&String> = mapping.roles_groups_data.keys().collect();
        assert_eq!(roles, vec!["login", "kube_control_plane"]);
        assert!(mapping.needs_bmc);
        // switches are never used on the first layer
        assert!(!mapping.needs_switch);
        assert!(mapping.groups_roles_info["grp1"].bmc_static_status);
    }

    #[test]
    fn test_default_layer_without_service_node() {
        let config = cluster();
        let mapping = resolve_config(&config, Layer::Default, &LayerTaxonomy::default()).unwrap();
        // without a service node every non-service role resolves
        assert_eq!(mapping.roles_groups_data.len(), 4);
        assert_eq!(mapping.roles_groups_data["kube_node"].len(), 2);

        let grp2 = &mapping.groups_roles_info["grp2"];
        assert!(grp2.switch_status);
        assert!(!grp2.bmc_static_status);
        assert!(mapping.needs_switch);

        let grp3 = &mapping.groups_roles_info["grp3"];
        assert_eq!(grp3.roles, vec!["kube_node", "slurm_node"]);
        assert!(!grp3.bmc_required);
        assert_eq!(grp3.attributes["location_id"], json!("SU-1.RACK-2"));
    }

    #[test]
    fn test_unclassified_role_is_not_resolved() {
        let config = config(json!({
            "Roles": [
                {"name": "kube_node", "groups": ["grp1"]},
                {"name": "nfs_server", "groups": ["grp5"]}
            ],
            "Groups": {
                "grp1": {"resource_mgr_id": "rack1"},
                "grp5": {"bmc_details": {"static_range": "10.3.0.1-10.3.0.10"}}
            }
        }));
        let taxonomy = LayerTaxonomy::default();
        let filtered: Vec<&str> = filter_roles(&config.roles, Layer::Default, &taxonomy)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(filtered, vec!["kube_node"]);

        let mapping = resolve_config(&config, Layer::Default, &taxonomy).unwrap();
        let roles: Vec<&String> = mapping.roles_groups_data.keys().collect();
        assert_eq!(roles, vec!["kube_node"]);
        assert!(!mapping.groups_roles_info.contains_key("grp5"));
        assert!(!mapping.needs_bmc);
    }

    #[test]
    fn test_only_unclassified_roles_abort() {
        let config = config(json!({
            "Roles": [{"name": "nfs_server", "groups": ["grp5"]}],
            "Groups": {"grp5": {}}
        }));
        let err = resolve_config(&config, Layer::Default, &LayerTaxonomy::default()).unwrap_err();
        assert!(matches!(err, ProvcheckError::Topology(_)));
    }

    #[test]
    fn test_default_layer_with_service_node() {
        let config = config(json!({
            "Roles": [
                {"name": "service_node", "groups": ["grp0"]},
                {"name": "login", "groups": ["grp1"]},
                {"name": "default", "groups": ["grp2"]}
            ],
            "Groups": {"grp0": {}, "grp1": {}, "grp2": {"parent": "ABC123"}}
        }));
        let mapping = resolve_config(&config, Layer::Default, &LayerTaxonomy::default()).unwrap();
        let roles: Vec<&String> = mapping.roles_groups_data.keys().collect();
        assert_eq!(roles, vec!["default"]);
        assert_eq!(mapping.groups_roles_info["grp2"].parent.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_missing_group_aborts() {
        let config = config(json!({
            "Roles": [{"name": "login", "groups": ["grp0", "grp9"]}],
            "Groups": {"grp0": {}}
        }));
        let err = resolve_config(&config, Layer::First, &LayerTaxonomy::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Referential integrity error: Group 'grp9' doesn't exist in roles_config.yml Groups dict"
        );
    }

    #[test]
    fn test_layer_without_roles_aborts() {
        let config = config(json!({
            "Roles": [{"name": "kube_node", "groups": ["grp0"]}],
            "Groups": {"grp0": {}}
        }));
        assert!(matches!(
            resolve_config(&config, Layer::First, &LayerTaxonomy::default()),
            Err(ProvcheckError::Topology(_))
        ));
    }

    #[test]
    fn test_shared_group_across_layers_aborts() {
        let config = config(json!({
            "Roles": [{"name": "login", "groups": ["grp0"]}, {"name": "default", "groups": ["grp0"]}],
            "Groups": {"grp0": {}}
        }));
        assert!(matches!(
            validate_layers(&config.roles, Layer::Default, &LayerTaxonomy::default()),
            Err(ProvcheckError::Topology(_))
        ));
    }
}
