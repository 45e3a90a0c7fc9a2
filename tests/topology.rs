mod common;

use common::yaml;
use pretty_assertions::assert_eq;
use provcheck::topology::hierarchy::{resolve_hierarchy, service_tag_map};
use provcheck::topology::model::RolesConfig;
use provcheck::validation::roles::validate_roles_config;
use provcheck::{resolve_config, InventoryStore, Layer, LayerTaxonomy, MemoryInventory, NodeInfo, ProvcheckError};

const HIERARCHICAL_ROLES: &str = "\
Roles:
  - name: service_node
    groups:
      - grp0
  - name: login
    groups:
      - grp1
  - name: slurm_node
    groups:
      - grp2
Groups:
  grp0:
    parent: ''
    bmc_details:
      static_range: 10.3.0.1-10.3.0.10
  grp1:
    parent: ''
  grp2:
    parent: SN0001
    resource_mgr_id: rack1
    switch_details:
      ip: 10.1.1.1
      ports: 1-16
    bmc_details:
      static_range: 10.3.0.20-10.3.0.60
";

const HA_CONFIG: &str = "\
service_node_ha:
  enable_service_ha: true
  service_nodes:
    - active_node_service_tag: SN0001
      virtual_ip_address: 10.5.0.200
      passive_nodes:
        - node_service_tags:
            - SN0002
";

fn inventory() -> MemoryInventory {
    let store = MemoryInventory::new();
    for (tag, node, ip) in [("SN0001", "servicenode1", "10.5.0.11"), ("SN0002", "servicenode2", "10.5.0.12")] {
        store
            .insert_node(NodeInfo {
                service_tag: tag.to_string(),
                node: node.to_string(),
                admin_ip: Some(ip.to_string()),
                status: Some(String::from("booted")),
                role: Some(String::from("service_node")),
                ..Default::default()
            })
            .unwrap();
    }
    store
}

#[test]
fn test_validated_config_resolves_for_both_layers() {
    let doc = yaml(HIERARCHICAL_ROLES);
    let taxonomy = LayerTaxonomy::default();
    assert_eq!(validate_roles_config(Some(&doc), HIERARCHICAL_ROLES, &taxonomy), vec![]);

    let config = RolesConfig::from_document(&doc).unwrap();
    let first = resolve_config(&config, Layer::First, &taxonomy).unwrap();
    let first_groups: Vec<&String> = first.groups_roles_info.keys().collect();
    assert_eq!(first_groups, vec!["grp0", "grp1"]);
    assert!(first.needs_bmc);
    assert!(!first.needs_switch);

    let compute = resolve_config(&config, Layer::Default, &taxonomy).unwrap();
    let compute_groups: Vec<&String> = compute.groups_roles_info.keys().collect();
    assert_eq!(compute_groups, vec!["grp2"]);
    assert!(compute.needs_switch);
    assert!(compute.groups_roles_info["grp2"].switch_status);
}

#[test]
fn test_hierarchy_with_service_node_ha() {
    let doc = yaml(HIERARCHICAL_ROLES);
    let config = RolesConfig::from_document(&doc).unwrap();
    let mut mapping = resolve_config(&config, Layer::Default, &LayerTaxonomy::default()).unwrap();

    let ha = yaml(HA_CONFIG);
    let service_nodes = resolve_hierarchy(&mut mapping, &inventory(), Some(&ha)).unwrap();

    assert!(mapping.hierarchical_provision_required);
    assert!(mapping.groups_roles_info["grp2"].hierarchical_provision_status);
    assert_eq!(service_nodes["SN0001"].child_groups, vec!["grp2"]);
    assert!(service_nodes["SN0002"].enable_service_ha);

    let map = service_tag_map(&service_nodes);
    assert_eq!(map["SN0001"].admin_ip, "10.5.0.200");
    assert_eq!(map["SN0002"].admin_ip, "10.5.0.12");
}

#[test]
fn test_parent_not_in_inventory_aborts() {
    let doc = yaml(HIERARCHICAL_ROLES);
    let config = RolesConfig::from_document(&doc).unwrap();
    let mut mapping = resolve_config(&config, Layer::Default, &LayerTaxonomy::default()).unwrap();

    let err = resolve_hierarchy(&mut mapping, &MemoryInventory::new(), None).unwrap_err();
    assert!(matches!(err, ProvcheckError::Topology(_)));
}

#[test]
fn test_missing_group_aborts_resolution() {
    let doc = yaml("Roles:\n  - name: login\n    groups:\n      - grp0\n      - grp5\nGroups:\n  grp0: {}\n");
    let config = RolesConfig::from_document(&doc).unwrap();
    let err = resolve_config(&config, Layer::First, &LayerTaxonomy::default()).unwrap_err();
    assert!(matches!(err, ProvcheckError::ReferentialIntegrity(_)));
}
