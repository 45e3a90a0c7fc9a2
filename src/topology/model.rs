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

//! Roles and groups as read from roles_config.yml.
//!
//! Extraction is lenient: a field with the wrong shape reads as absent, since
//! shape problems are the schema layer's to report.

use crate::error::{ProvcheckError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

pub const ROLES_KEY: &str = "Roles";
pub const GROUPS_KEY: &str = "Groups";

/// Scalar field as text. Numbers are accepted (YAML port lists like `1` or ids
/// like `42` are not quoted by users). Blank strings read as absent.
pub fn text_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Role {
    pub name: String,
    pub groups: Vec<String>,
}

impl Role {
    pub fn from_value(value: &Value) -> Role {
        let name = text_field(value.get("name")).unwrap_or_default();
        let groups = match value.get("groups") {
            Some(Value::Array(items)) => items.iter().filter_map(|g| text_field(Some(g))).collect(),
            Some(single) => text_field(Some(single)).into_iter().collect(),
            None => Vec::new(),
        };
        Role { name, groups }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SwitchDetails {
    pub ip: Option<String>,
    pub ports: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BmcDetails {
    pub static_range: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Group {
    pub parent: Option<String>,
    pub location_id: Option<String>,
    pub architecture: Option<String>,
    pub resource_mgr_id: Option<String>,
    pub switch_details: SwitchDetails,
    pub bmc_details: BmcDetails,
    /// every attribute as written, including ones not modelled above
    pub attributes: IndexMap<String, Value>,
}

impl Group {
    pub fn from_value(value: &Value) -> Group {
        let switch = value.get("switch_details");
        let bmc = value.get("bmc_details");
        let attributes = match value {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => IndexMap::new(),
        };
        Group {
            parent: text_field(value.get("parent")),
            location_id: text_field(value.get("location_id")),
            architecture: text_field(value.get("architecture")),
            resource_mgr_id: text_field(value.get("resource_mgr_id")),
            switch_details: SwitchDetails {
                ip: text_field(switch.and_then(|s| s.get("ip"))),
                ports: text_field(switch.and_then(|s| s.get("ports"))),
            },
            bmc_details: BmcDetails { static_range: text_field(bmc.and_then(|b| b.get("static_range"))) },
            attributes,
        }
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn switch_complete(&self) -> bool {
        self.switch_details.ip.is_some() && self.switch_details.ports.is_some()
    }

    pub fn has_static_range(&self) -> bool {
        self.bmc_details.static_range.is_some()
    }
}

/// The parsed Roles list and Groups table of a roles_config document.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RolesConfig {
    pub roles: Vec<Role>,
    pub groups: IndexMap<String, Group>,
}

impl RolesConfig {
    /// Requires both sections. Roles must be a list and Groups a mapping.
    pub fn from_document(value: &Value) -> Result<RolesConfig> {
        let roles = match value.get(ROLES_KEY) {
            Some(Value::Array(items)) => items.iter().map(Role::from_value).collect(),
            Some(Value::Null) | None => {
                return Err(ProvcheckError::Structural(String::from("the Roles section is missing")))
            }
            Some(_) => return Err(ProvcheckError::Structural(String::from("the Roles section must be a list"))),
        };
        let groups = match value.get(GROUPS_KEY) {
            Some(Value::Object(map)) => map.iter().map(|(name, g)| (name.clone(), Group::from_value(g))).collect(),
            Some(Value::Null) | None => {
                return Err(ProvcheckError::Structural(String::from("the Groups section is missing")))
            }
            Some(_) => return Err(ProvcheckError::Structural(String::from("the Groups section must be a mapping"))),
        };
        Ok(RolesConfig { roles, groups })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_field() {
        assert_eq!(text_field(Some(&json!(" grp1 "))), Some(String::from("grp1")));
        assert_eq!(text_field(Some(&json!(7))), Some(String::from("7")));
        assert_eq!(text_field(Some(&json!(""))), None);
        assert_eq!(text_field(Some(&json!(null))), None);
        assert_eq!(text_field(Some(&json!(["a"]))), None);
        assert_eq!(text_field(None), None);
    }

    #[test]
    fn test_group_from_value() {
        let group = Group::from_value(&json!({
            "parent": "",
            "location_id": "SU-1.RACK-1",
            "switch_details": {"ip": "10.1.1.1", "ports": "1-4"},
            "bmc_details": {"static_range": null},
            "resource_mgr_id": "rack1"
        }));
        assert!(!group.has_parent());
        assert!(group.switch_complete());
        assert!(!group.has_static_range());
        assert_eq!(group.resource_mgr_id.as_deref(), Some("rack1"));
        assert_eq!(group.attributes.len(), 5);
    }

    #[test]
    fn test_roles_config_from_document() {
        let doc = json!({
            "Roles": [{"name": "login", "groups": ["grp0"]}, {"name": "default", "groups": null}],
            "Groups": {"grp0": {}}
        });
        let config = RolesConfig::from_document(&doc).unwrap();
        assert_eq!(config.roles[0], Role { name: String::from("login"), groups: vec![String::from("grp0")] });
        assert!(config.roles[1].groups.is_empty());
        assert!(config.groups.contains_key("grp0"));
    }

    #[test]
    fn test_roles_config_structure_errors() {
        assert!(matches!(
            RolesConfig::from_document(&json!({"Groups": {}})),
            Err(ProvcheckError::Structural(_))
        ));
        assert!(matches!(
            RolesConfig::from_document(&json!({"Roles": {}, "Groups": {}})),
            Err(ProvcheckError::Structural(_))
        ));
    }
}
