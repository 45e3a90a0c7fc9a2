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

//! Semantic validation of roles_config.yml.
//!
//! Every problem is collected; only a broken document shape or a duplicated
//! group name stops the later checks, since the parsed tables cannot be
//! trusted after either.

use crate::topology::model::{Group, Role, GROUPS_KEY, ROLES_KEY};
use crate::topology::taxonomy::LayerTaxonomy;
use crate::util::netaddr::{check_port_ranges, is_valid_ipv4, overlapping_ranges, Ipv4Range, PortSet};
use crate::validation::messages as msg;
use crate::validation::ValidationError;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

// ==============================================================================================================
// PUBLIC API
// ==============================================================================================================

/// Validate a roles document. `raw` is the file text, used for the duplicate
/// group scan since the parser keeps only one of two equal keys.
pub fn validate_roles_config(document: Option<&Value>, raw: &str, taxonomy: &LayerTaxonomy) -> Vec<ValidationError> {
    let document = match document {
        Some(doc) if !is_empty(doc) => doc,
        _ => {
            // a document with duplicate keys may not have parsed at all
            if let Some(err) = check_group_duplicates(raw, &taxonomy.group_prefix) {
                return vec![err];
            }
            return vec![ValidationError::general(msg::EMPTY_OR_SYNTAX_ERROR_ROLES_CONFIG_MSG)];
        }
    };

    let structural = validate_basic_structure(document);
    if !structural.is_empty() {
        return structural;
    }

    if let Some(err) = check_group_duplicates(raw, &taxonomy.group_prefix) {
        return vec![err];
    }

    let roles: Vec<Role> = match document.get(ROLES_KEY) {
        Some(Value::Array(items)) => items.iter().map(Role::from_value).collect(),
        _ => Vec::new(),
    };
    let groups: IndexMap<String, Group> = match document.get(GROUPS_KEY) {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), Group::from_value(v))).collect(),
        _ => IndexMap::new(),
    };

    let mut errors = validate_layer_group_separation(&roles, taxonomy);
    errors.extend(validate_cardinality(&roles, &groups, taxonomy));
    errors.extend(validate_role_groups(&roles, &groups, taxonomy));
    errors.extend(validate_group_details(&roles, &groups, taxonomy));
    errors
}

/// First group name declared twice in the raw text, as an error.
pub fn check_group_duplicates(raw: &str, prefix: &str) -> Option<ValidationError> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for line in raw.lines() {
        let line = line.trim();
        if !line.starts_with(prefix) {
            continue;
        }
        let name = match line.split_once(':') {
            Some((name, _)) => name.trim(),
            None => continue,
        };
        if !seen.insert(name) {
            return Some(ValidationError::field(
                GROUPS_KEY,
                format!("Duplicate group name found: {}", name),
                msg::DUPLICATE_GROUP_NAME_MSG,
            ));
        }
    }
    None
}

// ==============================================================================================================
// CHECKS
// ==============================================================================================================

fn is_empty(doc: &Value) -> bool {
    match doc {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn validate_basic_structure(document: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match document.get(ROLES_KEY) {
        None | Some(Value::Null) => errors.push(ValidationError::new(Some(ROLES_KEY), None, msg::NO_ROLES_MSG)),
        Some(Value::Array(items)) => {
            if items.iter().any(|r| !r.is_object()) {
                errors.push(ValidationError::new(Some(ROLES_KEY), None, msg::INVALID_ATTRIBUTES_ROLE_MSG));
            }
        }
        Some(_) => errors.push(ValidationError::new(Some(ROLES_KEY), None, msg::INVALID_ATTRIBUTES_ROLE_MSG)),
    }

    match document.get(GROUPS_KEY) {
        None | Some(Value::Null) => errors.push(ValidationError::new(Some(GROUPS_KEY), None, msg::NO_GROUPS_MSG)),
        Some(Value::Object(_)) => {}
        Some(_) => errors.push(ValidationError::new(Some(GROUPS_KEY), None, msg::INVALID_ATTRIBUTES_GROUP_MSG)),
    }

    errors
}

pub(crate) fn validate_layer_group_separation(roles: &[Role], taxonomy: &LayerTaxonomy) -> Vec<ValidationError> {
    // group -> (management roles, compute roles)
    let mut layers: IndexMap<&str, (Vec<&str>, Vec<&str>)> = IndexMap::new();
    for role in roles.iter() {
        let management = taxonomy.management_roles.contains(&role.name);
        let compute = taxonomy.compute_roles.contains(&role.name);
        if !management && !compute {
            continue;
        }
        for group in role.groups.iter() {
            let entry = layers.entry(group.as_str()).or_default();
            if management {
                entry.0.push(role.name.as_str());
            } else {
                entry.1.push(role.name.as_str());
            }
        }
    }

    let mut errors = Vec::new();
    for (group, (management, compute)) in layers.iter() {
        let group: &str = group;
        if !management.is_empty() && !compute.is_empty() {
            errors.push(ValidationError::new(
                Some(group),
                None,
                msg::duplicate_group_name_in_layers_msg(group, &sorted_join(management), &sorted_join(compute)),
            ));
        }
        if management.iter().any(|r| taxonomy.is_service_role(r)) {
            let others: Vec<&str> = management.iter().copied().filter(|r| !taxonomy.is_service_role(r)).collect();
            if !others.is_empty() {
                errors.push(ValidationError::new(
                    Some(group),
                    None,
                    msg::service_node_group_shared_msg(group, &sorted_join(&others)),
                ));
            }
        }
    }
    errors
}

fn sorted_join(names: &[&str]) -> String {
    let mut names: Vec<&str> = names.to_vec();
    names.sort_unstable();
    names.dedup();
    names.join(", ")
}

fn validate_cardinality(roles: &[Role], groups: &IndexMap<String, Group>, taxonomy: &LayerTaxonomy) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if groups.is_empty() {
        errors.push(ValidationError::field(GROUPS_KEY, "Current number of groups is 0:", msg::MIN_NUMBER_OF_GROUPS_MSG));
    }
    if roles.is_empty() {
        errors.push(ValidationError::field(ROLES_KEY, "Current number of roles is 0:", msg::MIN_NUMBER_OF_ROLES_MSG));
    }
    if roles.len() > taxonomy.max_roles {
        errors.push(ValidationError::field(
            ROLES_KEY,
            format!("Current number of roles is {}:", roles.len()),
            msg::MAX_NUMBER_OF_ROLES_MSG,
        ));
    }
    errors
}

fn validate_role_groups(roles: &[Role], groups: &IndexMap<String, Group>, taxonomy: &LayerTaxonomy) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let service_role_defined = roles.iter().any(|r| taxonomy.is_service_role(&r.name));
    let mut roles_per_group: IndexMap<&str, usize> = IndexMap::new();

    for role in roles.iter() {
        let role_field = if role.name.is_empty() { ROLES_KEY } else { role.name.as_str() };
        if role.groups.is_empty() {
            errors.push(ValidationError::field(
                role_field,
                format!("Role {} must be associated with a group:", role.name),
                msg::MIN_NUMBER_OF_GROUPS_MSG,
            ));
        }

        for group_name in role.groups.iter() {
            let count = roles_per_group.entry(group_name.as_str()).or_insert(0);
            *count += 1;
            if *count == taxonomy.max_roles_per_group + 1 {
                errors.push(ValidationError::field(
                    role_field,
                    format!("Current number of roles for {} is {}:", group_name, count),
                    msg::MAX_NUMBER_OF_ROLES_PER_GROUP_MSG,
                ));
            }

            let group = match groups.get(group_name) {
                Some(group) => group,
                None => {
                    errors.push(ValidationError::field(
                        group_name,
                        format!("Group {} does not exist.", group_name),
                        msg::GRP_EXIST_MSG,
                    ));
                    continue;
                }
            };

            if taxonomy.forbids_parent(&role.name) {
                if group.has_parent() {
                    errors.push(ValidationError::field(
                        group_name,
                        format!("Group {} should not have parent defined.", group_name),
                        msg::PARENT_SERVICE_NODE_MSG,
                    ));
                }
            } else if taxonomy.hierarchical_compute_roles.contains(&role.name) {
                if !service_role_defined && group.has_parent() {
                    errors.push(ValidationError::field(
                        group_name,
                        format!("Group {} should not have parent defined.", group_name),
                        msg::PARENT_SERVICE_ROLE_MSG,
                    ));
                } else if service_role_defined && !group.has_parent() {
                    errors.push(ValidationError::field(
                        group_name,
                        format!("Group {} is missing its parent.", group_name),
                        msg::PARENT_REQUIRED_MSG,
                    ));
                }
            } else if !service_role_defined && group.has_parent() {
                errors.push(ValidationError::field(
                    group_name,
                    format!("Group {} parent is provided.", group_name),
                    msg::PARENT_SERVICE_ROLE_DNE_MSG,
                ));
            }
        }
    }
    errors
}

fn validate_group_details(roles: &[Role], groups: &IndexMap<String, Group>, taxonomy: &LayerTaxonomy) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let used: IndexSet<&str> = roles.iter().flat_map(|r| r.groups.iter().map(String::as_str)).collect();
    let needs_resource_mgr_id: IndexSet<&str> = roles
        .iter()
        .filter(|r| taxonomy.is_worker(&r.name))
        .flat_map(|r| r.groups.iter().map(String::as_str))
        .collect();

    // switch ip -> (groups so far, ports so far)
    let mut switch_ports: IndexMap<String, (Vec<String>, PortSet)> = IndexMap::new();
    let mut static_ranges: IndexMap<String, Ipv4Range> = IndexMap::new();

    for (name, group) in groups.iter() {
        if !used.contains(name.as_str()) {
            errors.push(ValidationError::field(
                name,
                format!("Group {} is not associated with a role.", name),
                msg::GRP_ROLE_MSG,
            ));
        }

        let ip = group.switch_details.ip.as_deref();
        let ports = group.switch_details.ports.as_deref();
        match (ip, ports) {
            (Some(ip), Some(ports)) => {
                errors.extend(check_switch(name, ip, ports, &mut switch_ports));
                if !group.has_static_range() {
                    errors.push(ValidationError::field(
                        name,
                        format!("Group {} switch details provided:", name),
                        msg::SWITCH_DETAILS_NO_BMC_DETAILS_MSG,
                    ));
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                errors.push(ValidationError::field(
                    name,
                    format!("Group {} switch details are incomplete:", name),
                    msg::SWITCH_DETAILS_INCOMPLETE_MSG,
                ));
            }
            (None, None) => {}
        }

        if let Some(static_range) = group.bmc_details.static_range.as_deref() {
            match static_range.parse::<Ipv4Range>() {
                Err(_) => errors.push(ValidationError::field(
                    name,
                    format!("Group {} BMC static range is invalid.", name),
                    msg::BMC_STATIC_RANGE_INVALID_MSG,
                )),
                Ok(range) => {
                    let overlaps = overlapping_ranges(&range, static_ranges.iter());
                    if !overlaps.is_empty() {
                        errors.push(ValidationError::field(
                            name,
                            format!(
                                "Static range {} overlaps with the following group(s): {}.",
                                static_range,
                                overlaps.join(", ")
                            ),
                            msg::OVERLAPPING_STATIC_RANGE_MSG,
                        ));
                    }
                    static_ranges.insert(name.clone(), range);
                }
            }
        }

        let requires_id = needs_resource_mgr_id.contains(name.as_str());
        match (requires_id, group.resource_mgr_id.is_some()) {
            (true, false) => errors.push(ValidationError::field(
                name,
                format!("Group {} is missing resource_mgr_id.", name),
                msg::RESOURCE_MGR_ID_MSG,
            )),
            (false, true) => errors.push(ValidationError::field(
                name,
                format!("Group {} should not have the resource_mgr_id set.", name),
                msg::RESOURCE_MGR_ID_MSG,
            )),
            _ => {}
        }
    }
    errors
}

fn check_switch(
    name: &str,
    ip: &str,
    ports: &str,
    seen: &mut IndexMap<String, (Vec<String>, PortSet)>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if !is_valid_ipv4(ip) {
        errors.push(ValidationError::field(
            name,
            format!("Group {} switch IP is invalid:", name),
            msg::INVALID_SWITCH_IP_MSG,
        ));
    }
    if !check_port_ranges(ports) {
        errors.push(ValidationError::field(
            name,
            format!("Group {} switch port range(s) are invalid, start > end:", name),
            msg::INVALID_SWITCH_PORTS_MSG,
        ));
    }
    // an unparseable list was reported above and takes no part in overlap checks
    let parsed = match ports.parse::<PortSet>() {
        Ok(parsed) => parsed,
        Err(_) => return errors,
    };

    let entry = seen.entry(ip.to_string()).or_insert_with(|| (Vec::new(), PortSet::default()));
    // on a shared switch the group's own entries must not repeat a port either
    if !entry.0.is_empty() && (entry.1.overlaps(&parsed) || parsed.has_internal_overlap()) {
        errors.push(ValidationError::field(
            name,
            format!(
                "Group {} has duplicate ports for switch IP {}, this switch IP is shared with the following groups: {}.",
                name,
                ip,
                entry.0.join(", ")
            ),
            msg::DUPLICATE_SWITCH_IP_PORT_MSG,
        ));
    }
    entry.0.push(name.to_string());
    entry.1.merge(&parsed);
    errors
}
