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

//! Hierarchical provisioning: groups whose `parent` names a booted service
//! node are provisioned through that node.

use crate::error::{ProvcheckError, Result};
use crate::inventory::store::{Filter, InventoryStore};
use crate::topology::model::text_field;
use crate::topology::resolver::RolesGroupsMapping;
use crate::validation::common::{passive_service_tags, service_ha_blocks};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

const INVALID_TAGS_MSG: &str = "These tags are either not a service node not in booted state.";

/// A booted service node, optionally part of an HA pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ServiceNode {
    pub service_tag: String,
    pub node: String,
    pub admin_ip: Option<String>,
    pub enable_service_ha: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ha: Option<HaEntry>,
    pub child_groups: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HaEntry {
    pub virtual_ip_address: String,
    pub active: bool,
    /// set on active entries
    pub passive_nodes: Vec<String>,
    /// set on passive entries
    pub active_service_tag: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceTagEntry {
    pub node: String,
    pub admin_ip: String,
}

// ==============================================================================================================
// PUBLIC API
// ==============================================================================================================

/// Service nodes in booted state, keyed by service tag.
pub fn booted_service_nodes(store: &dyn InventoryStore) -> Result<IndexMap<String, ServiceNode>> {
    let filter = Filter::new().with("status", "booted").with("role", "service_node");
    let mut out = IndexMap::new();
    for row in store.query_nodes(&filter)?.into_iter() {
        out.insert(
            row.service_tag.clone(),
            ServiceNode { service_tag: row.service_tag, node: row.node, admin_ip: row.admin_ip, ..Default::default() },
        );
    }
    debug!(count = out.len(), "booted service nodes");
    Ok(out)
}

/// The HA table from high_availability_config. Entries without an active tag
/// or virtual IP are skipped; duplicates and tags that are not booted service
/// nodes abort.
pub fn service_node_ha(
    ha_config: &Value,
    booted: &IndexMap<String, ServiceNode>,
) -> Result<IndexMap<String, HaEntry>> {
    let mut table: IndexMap<String, HaEntry> = IndexMap::new();
    let mut vips: Vec<String> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();

    for block in service_ha_blocks(ha_config) {
        if !block.get("enable_service_ha").and_then(Value::as_bool).unwrap_or(false) {
            continue;
        }
        let nodes = match block.get("service_nodes") {
            Some(Value::Array(nodes)) => nodes,
            _ => continue,
        };
        for entry in nodes.iter() {
            let (active, vip) = match (
                text_field(entry.get("active_node_service_tag")),
                text_field(entry.get("virtual_ip_address")),
            ) {
                (Some(active), Some(vip)) => (active, vip),
                _ => continue,
            };
            if table.contains_key(&active) {
                return Err(ProvcheckError::Topology(String::from(
                    "Duplicate entries found for active_node_service_tag field.",
                )));
            }
            if vips.contains(&vip) {
                return Err(ProvcheckError::Topology(String::from(
                    "Duplicate entries found for service nodes virtual_ip_address field.",
                )));
            }
            if !booted.contains_key(&active) {
                invalid.push(active.clone());
            }
            vips.push(vip.clone());
            table.insert(
                active.clone(),
                HaEntry { virtual_ip_address: vip.clone(), active: true, passive_nodes: Vec::new(), active_service_tag: None },
            );

            let mut passives = Vec::new();
            for passive in passive_service_tags(entry).into_iter() {
                if table.contains_key(&passive) {
                    return Err(ProvcheckError::Topology(String::from(
                        "Duplicate entries found for passive_node_service_tags field.",
                    )));
                }
                if !booted.contains_key(&passive) {
                    invalid.push(passive.clone());
                }
                table.insert(
                    passive.clone(),
                    HaEntry {
                        virtual_ip_address: vip.clone(),
                        active: false,
                        passive_nodes: Vec::new(),
                        active_service_tag: Some(active.clone()),
                    },
                );
                passives.push(passive);
            }
            if let Some(active_entry) = table.get_mut(&active) {
                active_entry.passive_nodes = passives;
            }
        }
    }

    if !invalid.is_empty() {
        return Err(ProvcheckError::Topology(format!(
            "These service tags '{}' mentioned in 'high_availability_config.yml' for service node HA are invalid. {}",
            invalid.join(", "),
            INVALID_TAGS_MSG
        )));
    }
    Ok(table)
}

/// Attach HA data to the booted nodes.
pub fn combine(mut booted: IndexMap<String, ServiceNode>, ha: &IndexMap<String, HaEntry>) -> IndexMap<String, ServiceNode> {
    for (tag, node) in booted.iter_mut() {
        node.ha = ha.get(tag).cloned();
        node.enable_service_ha = node.ha.is_some();
        node.child_groups.clear();
    }
    booted
}

/// Mark every group with a parent for hierarchical provisioning and record it
/// as a child of that service node. A parent that is not a booted service node
/// aborts. Returns whether any group needs hierarchical provisioning.
pub fn apply_hierarchy(
    mapping: &mut RolesGroupsMapping,
    service_nodes: &mut IndexMap<String, ServiceNode>,
) -> Result<bool> {
    let mut required = false;
    for (group, resolved) in mapping.groups_roles_info.iter_mut() {
        let parent = match resolved.parent.as_deref() {
            Some(parent) => parent,
            None => {
                resolved.hierarchical_provision_status = false;
                continue;
            }
        };
        let service_node = service_nodes.get_mut(parent).ok_or_else(|| {
            ProvcheckError::Topology(format!(
                "The service tag '{}' specified in the 'parent' field for group '{}' in roles_config.yml is invalid. {}",
                parent, group, INVALID_TAGS_MSG
            ))
        })?;
        service_node.child_groups.push(group.clone());
        resolved.hierarchical_provision_status = true;
        required = true;
    }
    mapping.hierarchical_provision_required = required;
    info!(required = required, "hierarchical provisioning checked");
    Ok(required)
}

/// Service tag to node name and the address to reach it at. An active HA node
/// is reached at its virtual IP.
pub fn service_tag_map(service_nodes: &IndexMap<String, ServiceNode>) -> IndexMap<String, ServiceTagEntry> {
    service_nodes
        .values()
        .map(|sn| {
            let admin_ip = match &sn.ha {
                Some(ha) if ha.active => ha.virtual_ip_address.clone(),
                _ => sn.admin_ip.clone().unwrap_or_default(),
            };
            (sn.service_tag.clone(), ServiceTagEntry { node: sn.node.clone(), admin_ip })
        })
        .collect()
}

/// The whole hierarchy pass over a resolved mapping.
pub fn resolve_hierarchy(
    mapping: &mut RolesGroupsMapping,
    store: &dyn InventoryStore,
    ha_config: Option<&Value>,
) -> Result<IndexMap<String, ServiceNode>> {
    let booted = booted_service_nodes(store)?;
    let ha = match ha_config {
        Some(ha_config) => service_node_ha(ha_config, &booted)?,
        None => IndexMap::new(),
    };
    let mut service_nodes = combine(booted, &ha);
    apply_hierarchy(mapping, &mut service_nodes)?;
    Ok(service_nodes)
}
