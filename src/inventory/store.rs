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

use crate::error::{ProvcheckError, Result};
use crate::util::io::read_local_file;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::RwLock;

/// One row of the node inventory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub service_tag: String,
    pub node: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub admin_ip: Option<String>,
    #[serde(default)]
    pub bmc_ip: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

/// One row of the switch inventory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchInfo {
    pub switch_ip: String,
    #[serde(default)]
    pub switch_name: Option<String>,
    #[serde(default)]
    pub switch_ports: Option<String>,
}

/// A conjunction of `field = value` conditions over one record type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: IndexMap<String, String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.conditions.insert(field.to_string(), value.to_string());
        self
    }

    /// Compare against the serialized record. An absent field never matches.
    pub fn matches<T: Serialize>(&self, record: &T) -> bool {
        let value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(_) => return false,
        };
        self.conditions.iter().all(|(field, expected)| match value.get(field) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Null) | None => false,
            Some(other) => &other.to_string() == expected,
        })
    }
}

/// The node and switch inventory the provisioning layer reads and writes.
pub trait InventoryStore: Send + Sync {
    fn query_nodes(&self, filter: &Filter) -> Result<Vec<NodeInfo>>;
    fn insert_node(&self, node: NodeInfo) -> Result<()>;
    fn query_switches(&self, filter: &Filter) -> Result<Vec<SwitchInfo>>;
    fn insert_switch(&self, switch: SwitchInfo) -> Result<()>;
}

/// In-memory inventory, keyed by service tag and switch IP.
#[derive(Default)]
pub struct MemoryInventory {
    nodes: RwLock<IndexMap<String, NodeInfo>>,
    switches: RwLock<IndexMap<String, SwitchInfo>>,
}

fn poisoned() -> ProvcheckError {
    ProvcheckError::Inventory(String::from("inventory lock poisoned"))
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load nodes from a JSON list of node records.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = read_local_file(path)?;
        let nodes: Vec<NodeInfo> = serde_json::from_str(&text)
            .map_err(|e| ProvcheckError::Inventory(format!("{}: {}", path.display(), e)))?;
        let inventory = MemoryInventory::new();
        for node in nodes.into_iter() {
            inventory.insert_node(node)?;
        }
        Ok(inventory)
    }
}

impl InventoryStore for MemoryInventory {
    fn query_nodes(&self, filter: &Filter) -> Result<Vec<NodeInfo>> {
        let nodes = self.nodes.read().map_err(|_| poisoned())?;
        Ok(nodes.values().filter(|n| filter.matches(*n)).cloned().collect())
    }

    fn insert_node(&self, node: NodeInfo) -> Result<()> {
        let mut nodes = self.nodes.write().map_err(|_| poisoned())?;
        if nodes.contains_key(&node.service_tag) {
            return Err(ProvcheckError::Inventory(format!("node with service tag {} already exists", node.service_tag)));
        }
        nodes.insert(node.service_tag.clone(), node);
        Ok(())
    }

    fn query_switches(&self, filter: &Filter) -> Result<Vec<SwitchInfo>> {
        let switches = self.switches.read().map_err(|_| poisoned())?;
        Ok(switches.values().filter(|s| filter.matches(*s)).cloned().collect())
    }

    fn insert_switch(&self, switch: SwitchInfo) -> Result<()> {
        let mut switches = self.switches.write().map_err(|_| poisoned())?;
        if switches.contains_key(&switch.switch_ip) {
            return Err(ProvcheckError::Inventory(format!("switch {} already exists", switch.switch_ip)));
        }
        switches.insert(switch.switch_ip.clone(), switch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn node(tag: &str, status: &str, role: &str) -> NodeInfo {
        NodeInfo {
            service_tag: tag.to_string(),
            node: format!("node-{}", tag.to_lowercase()),
            status: Some(status.to_string()),
            role: Some(role.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_query_nodes_by_filter() {
        let inventory = MemoryInventory::new();
        inventory.insert_node(node("ABC", "booted", "service_node")).unwrap();
        inventory.insert_node(node("DEF", "booting", "service_node")).unwrap();
        inventory.insert_node(node("GHI", "booted", "login")).unwrap();

        let filter = Filter::new().with("status", "booted").with("role", "service_node");
        let found = inventory.query_nodes(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].service_tag, "ABC");
        assert_eq!(inventory.query_nodes(&Filter::new()).unwrap().len(), 3);
    }

    #[test]
    fn test_absent_field_never_matches() {
        let inventory = MemoryInventory::new();
        inventory.insert_node(node("ABC", "booted", "service_node")).unwrap();
        let filter = Filter::new().with("admin_ip", "10.5.0.1");
        assert!(inventory.query_nodes(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_inserts_rejected() {
        let inventory = MemoryInventory::new();
        inventory.insert_node(node("ABC", "booted", "service_node")).unwrap();
        assert!(inventory.insert_node(node("ABC", "booted", "login")).is_err());

        let switch = SwitchInfo { switch_ip: String::from("10.0.0.1"), ..Default::default() };
        inventory.insert_switch(switch.clone()).unwrap();
        assert!(inventory.insert_switch(switch).is_err());
        let found = inventory.query_switches(&Filter::new().with("switch_ip", "10.0.0.1")).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nodes.json");
        fs::write(&path, r#"[{"service_tag": "ABC", "node": "sn1", "admin_ip": "10.5.0.10", "status": "booted", "role": "service_node"}]"#).unwrap();
        let inventory = MemoryInventory::from_json_file(&path).unwrap();
        let found = inventory.query_nodes(&Filter::new().with("node", "sn1")).unwrap();
        assert_eq!(found[0].admin_ip.as_deref(), Some("10.5.0.10"));
    }
}
