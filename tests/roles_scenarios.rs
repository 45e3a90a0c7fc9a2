mod common;

use common::yaml;
use provcheck::validation::messages as msg;
use provcheck::validation::roles::validate_roles_config;
use provcheck::{LayerTaxonomy, ValidationError};
use test_case::test_case;

fn run(text: &str) -> Vec<ValidationError> {
    validate_roles_config(Some(&yaml(text)), text, &LayerTaxonomy::default())
}

fn has(errors: &[ValidationError], message: &str) -> bool {
    errors.iter().any(|e| e.message == message)
}

#[test]
fn test_too_many_roles() {
    let mut text = String::from("Roles:\n");
    for i in 0..101 {
        text.push_str(&format!("  - name: role{}\n    groups:\n      - grp{}\n", i, i % 50));
    }
    text.push_str("Groups:\n");
    for i in 0..50 {
        text.push_str(&format!("  grp{}:\n    parent: ''\n", i));
    }
    let errors = run(&text);
    assert!(has(&errors, msg::MAX_NUMBER_OF_ROLES_MSG));
}

#[test]
fn test_no_groups() {
    let errors = run("Roles:\n  - name: login\n    groups:\n      - grp0\nGroups: {}\n");
    assert!(has(&errors, msg::MIN_NUMBER_OF_GROUPS_MSG));
}

#[test]
fn test_worker_group_without_resource_mgr_id() {
    let errors = run("Roles:\n  - name: kube_node\n    groups:\n      - grp1\nGroups:\n  grp1:\n    parent: ''\n");
    let error = errors.iter().find(|e| e.message == msg::RESOURCE_MGR_ID_MSG).unwrap();
    assert_eq!(error.field_path.as_deref(), Some("grp1"));
}

#[test]
fn test_login_group_with_parent() {
    let errors = run("Roles:\n  - name: login\n    groups:\n      - grp0\nGroups:\n  grp0:\n    parent: ABC123\n");
    assert!(has(&errors, msg::PARENT_SERVICE_NODE_MSG));
}

#[test]
fn test_duplicate_group_found_in_raw_text() {
    // the parser keeps one of the two grp0 entries, the raw scan still sees both
    let text = "Roles:\n  - name: login\n    groups:\n      - grp0\nGroups:\n  grp0:\n    parent: ''\n  grp0:\n    parent: ''\n";
    let errors = validate_roles_config(None, text, &LayerTaxonomy::default());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, msg::DUPLICATE_GROUP_NAME_MSG);
    assert_eq!(errors[0].value.as_deref(), Some("Duplicate group name found: grp0"));
}

fn bmc_pair(first: &str, second: &str) -> String {
    format!(
        "Roles:\n  - name: login\n    groups:\n      - grp0\n      - grp1\nGroups:\n  grp0:\n    bmc_details:\n      static_range: {}\n  grp1:\n    bmc_details:\n      static_range: {}\n",
        first, second
    )
}

#[test_case("10.0.0.1-10.0.0.10", "10.0.0.5-10.0.0.20", true ; "intersecting ranges")]
#[test_case("10.0.0.1-10.0.0.10", "10.0.0.20-10.0.0.30", false ; "disjoint ranges")]
#[test_case("10.0.0.1-10.0.0.10", "10.0.0.10-10.0.0.30", true ; "shared endpoint")]
fn test_bmc_static_range_overlap(first: &str, second: &str, overlaps: bool) {
    let errors = run(&bmc_pair(first, second));
    let found: Vec<&ValidationError> = errors.iter().filter(|e| e.message == msg::OVERLAPPING_STATIC_RANGE_MSG).collect();
    assert_eq!(found.len(), usize::from(overlaps));
    if overlaps {
        assert_eq!(found[0].field_path.as_deref(), Some("grp1"));
        assert!(found[0].value.as_deref().unwrap().contains("grp0"));
    }
}

#[test]
fn test_malformed_range_is_not_checked_for_overlap() {
    let errors = run(&bmc_pair("10.0.0.1-10.0.0.10", "10.0.0.300-10.0.0.5"));
    assert!(has(&errors, msg::BMC_STATIC_RANGE_INVALID_MSG));
    assert!(!has(&errors, msg::OVERLAPPING_STATIC_RANGE_MSG));
}

fn switch_group(switch: &str) -> String {
    format!(
        "Roles:\n  - name: login\n    groups:\n      - grp0\nGroups:\n  grp0:\n    bmc_details:\n      static_range: 10.0.0.1-10.0.0.10\n{}",
        switch
    )
}

#[test_case("    switch_details:\n      ip: 10.1.1.1\n", true ; "ip without ports")]
#[test_case("    switch_details:\n      ports: 1-4\n", true ; "ports without ip")]
#[test_case("    switch_details:\n      ip: 10.1.1.1\n      ports: 1-4\n", false ; "both present")]
#[test_case("", false ; "both absent")]
fn test_switch_details_incomplete(switch: &str, incomplete: bool) {
    let errors = run(&switch_group(switch));
    assert_eq!(has(&errors, msg::SWITCH_DETAILS_INCOMPLETE_MSG), incomplete);
}

#[test]
fn test_errors_are_collected_not_stopped_early() {
    let text = "\
Roles:
  - name: login
    groups:
      - grp0
      - grp9
  - name: kube_node
    groups:
      - grp1
Groups:
  grp0:
    parent: ABC
  grp1:
    parent: ''
  grp2:
    parent: ''
";
    let errors = run(text);
    for message in [msg::GRP_EXIST_MSG, msg::PARENT_SERVICE_NODE_MSG, msg::RESOURCE_MGR_ID_MSG, msg::GRP_ROLE_MSG] {
        assert!(has(&errors, message), "missing {}", message);
    }
}
