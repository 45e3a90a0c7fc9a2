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

use crate::topology::model::text_field;
use crate::validation::logic::LogicContext;
use crate::validation::messages as msg;
use crate::validation::ValidationError;
use indexmap::IndexSet;
use serde_json::Value;

// ==============================================================================================================
// software_config.json
// ==============================================================================================================

pub fn validate_software_config(document: &Value, ctx: &LogicContext) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let os_type = text_field(document.get("cluster_os_type"));
    let os_version = text_field(document.get("cluster_os_version"));

    let os_type = match os_type {
        Some(os_type) => os_type,
        None => {
            errors.push(ValidationError::new(Some("cluster_os_type"), None, msg::missing_key_msg("cluster_os_type")));
            return errors;
        }
    };

    let versions = match ctx.os_versions.get(&os_type) {
        Some(versions) => versions,
        None => {
            let supported: Vec<&str> = ctx.os_versions.keys().map(String::as_str).collect();
            errors.push(ValidationError::field("cluster_os_type", os_type, msg::os_type_fail_msg(&supported.join(", "))));
            return errors;
        }
    };

    match os_version {
        None => errors.push(ValidationError::new(
            Some("cluster_os_version"),
            None,
            msg::missing_key_msg("cluster_os_version"),
        )),
        Some(version) if !versions.contains(&version) => errors.push(ValidationError::field(
            "cluster_os_version",
            version,
            msg::os_version_fail_msg(&os_type, &versions.join(", ")),
        )),
        Some(_) => {}
    }
    errors
}

// ==============================================================================================================
// passwordless_ssh_config.yml, k8s_access_config.yml
// ==============================================================================================================

pub fn validate_usernames(document: &Value, _ctx: &LogicContext) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let names = match text_field(document.get("user_name")) {
        Some(names) => names,
        None => return errors,
    };

    let mut seen: IndexSet<&str> = IndexSet::new();
    let mut duplicates: IndexSet<&str> = IndexSet::new();
    let mut has_empty = false;
    for name in names.split(',').map(str::trim) {
        if name.is_empty() {
            has_empty = true;
        } else if !seen.insert(name) {
            duplicates.insert(name);
        }
    }
    if has_empty {
        errors.push(ValidationError::field("user_name", names.clone(), msg::USER_NAME_EMPTY_MSG));
    }
    if !duplicates.is_empty() {
        let repeated: Vec<&str> = duplicates.into_iter().collect();
        errors.push(ValidationError::field("user_name", repeated.join(", "), msg::USER_NAME_DUPLICATE_MSG));
    }
    errors
}

// ==============================================================================================================
// high_availability_config.yml
// ==============================================================================================================

/// `service_node_ha` may hold one HA block or a list of them.
pub fn service_ha_blocks(document: &Value) -> Vec<&Value> {
    match document.get("service_node_ha") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(block @ Value::Object(_)) => vec![block],
        _ => Vec::new(),
    }
}

pub fn validate_high_availability_config(document: &Value, _ctx: &LogicContext) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut active_tags: IndexSet<String> = IndexSet::new();
    let mut virtual_ips: IndexSet<String> = IndexSet::new();
    let mut passive_tags: IndexSet<String> = IndexSet::new();

    for block in service_ha_blocks(document) {
        if !block.get("enable_service_ha").and_then(Value::as_bool).unwrap_or(false) {
            continue;
        }
        let nodes = match block.get("service_nodes") {
            Some(Value::Array(nodes)) => nodes,
            _ => continue,
        };
        for node in nodes.iter() {
            if let Some(tag) = text_field(node.get("active_node_service_tag")) {
                if !active_tags.insert(tag.clone()) {
                    errors.push(ValidationError::field("service_node_ha", tag, msg::DUPLICATE_ACTIVE_NODE_SERVICE_TAG_MSG));
                }
            }
            if let Some(vip) = text_field(node.get("virtual_ip_address")) {
                if !virtual_ips.insert(vip.clone()) {
                    errors.push(ValidationError::field("service_node_ha", vip, msg::DUPLICATE_VIRTUAL_IP_MSG));
                }
            }
            for passive in passive_service_tags(node) {
                if active_tags.contains(&passive) || !passive_tags.insert(passive.clone()) {
                    errors.push(ValidationError::field("service_node_ha", passive, msg::DUPLICATE_PASSIVE_NODE_SERVICE_TAG_MSG));
                }
            }
        }
    }
    errors
}

/// Every tag listed under `passive_nodes[].node_service_tags` of one HA entry.
pub fn passive_service_tags(node: &Value) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(Value::Array(groups)) = node.get("passive_nodes") {
        for group in groups.iter() {
            if let Some(Value::Array(items)) = group.get("node_service_tags") {
                tags.extend(items.iter().filter_map(|t| text_field(Some(t))));
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;

    fn with_ctx<F: FnOnce(&LogicContext)>(f: F) {
        let config = ValidatorConfig::new();
        let path = PathBuf::from("input.yml");
        let ctx = LogicContext::new(&config, &path, "", None);
        f(&ctx);
    }

    #[test]
    fn test_software_config() {
        with_ctx(|ctx| {
            let good = json!({"cluster_os_type": "ubuntu", "cluster_os_version": "22.04"});
            assert_eq!(validate_software_config(&good, ctx), vec![]);

            let bad_version = json!({"cluster_os_type": "rhel", "cluster_os_version": "8.8"});
            let errors = validate_software_config(&bad_version, ctx);
            assert_eq!(errors[0].field_path.as_deref(), Some("cluster_os_version"));
            assert_eq!(errors[0].message, msg::os_version_fail_msg("rhel", "9.4"));

            let bad_type = json!({"cluster_os_type": "windows", "cluster_os_version": "11"});
            let errors = validate_software_config(&bad_type, ctx);
            assert_eq!(errors[0].message, msg::os_type_fail_msg("rhel, rocky, ubuntu"));
        });
    }

    #[test]
    fn test_software_version_as_number() {
        with_ctx(|ctx| {
            let doc = json!({"cluster_os_type": "rocky", "cluster_os_version": 9.4});
            assert_eq!(validate_software_config(&doc, ctx), vec![]);
        });
    }

    #[test]
    fn test_usernames() {
        with_ctx(|ctx| {
            assert_eq!(validate_usernames(&json!({"user_name": "user1,user2"}), ctx), vec![]);
            let errors = validate_usernames(&json!({"user_name": "user1,,user2,user1"}), ctx);
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            assert_eq!(messages, vec![msg::USER_NAME_EMPTY_MSG, msg::USER_NAME_DUPLICATE_MSG]);
            assert_eq!(errors[1].value.as_deref(), Some("user1"));
        });
    }

    #[test]
    fn test_high_availability_duplicates() {
        with_ctx(|ctx| {
            let doc = json!({
                "service_node_ha": [{
                    "enable_service_ha": true,
                    "service_nodes": [
                        {"active_node_service_tag": "ABC", "virtual_ip_address": "10.5.0.111",
                         "passive_nodes": [{"node_service_tags": ["DEF"]}]},
                        {"active_node_service_tag": "ABC", "virtual_ip_address": "10.5.0.111",
                         "passive_nodes": [{"node_service_tags": ["DEF"]}]}
                    ]
                }]
            });
            let errors = validate_high_availability_config(&doc, ctx);
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            assert_eq!(
                messages,
                vec![
                    msg::DUPLICATE_ACTIVE_NODE_SERVICE_TAG_MSG,
                    msg::DUPLICATE_VIRTUAL_IP_MSG,
                    msg::DUPLICATE_PASSIVE_NODE_SERVICE_TAG_MSG,
                ]
            );
        });
    }

    #[test]
    fn test_high_availability_disabled_is_skipped() {
        with_ctx(|ctx| {
            let doc = json!({"service_node_ha": {"enable_service_ha": false, "service_nodes": [
                {"active_node_service_tag": "ABC"}, {"active_node_service_tag": "ABC"}
            ]}});
            assert_eq!(validate_high_availability_config(&doc, ctx), vec![]);
        });
    }
}
