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

// user facing validation messages

// any input file
pub const SYNTAX_ERROR_MSG: &str = "Syntax error when loading the file. Please check the file is valid and not empty.";

// schema overrides
pub const INVALID_GROUP_NAME_MSG: &str =
    "Groups must be defined in the form of grp<n> where n is 0-99.";
pub const INVALID_LOCATION_ID_MSG: &str =
    "location_id must follow the format SU-<n>.RACK-<n> where n is 0-99. Omit the leading zeros.";
pub const INVALID_SWITCH_PORTS_FORMAT_MSG: &str =
    "Please provide any port ranges as start-end (example: 0-15,4:4,51-53).";

// roles_config.yml
pub const EMPTY_OR_SYNTAX_ERROR_ROLES_CONFIG_MSG: &str =
    "File is either empty or contains syntax errors. File must contain valid YAML with 'Roles' and 'Groups' sections.";
pub const NO_ROLES_MSG: &str = "The 'Roles' section is missing from roles_config.yml.";
pub const NO_GROUPS_MSG: &str = "The 'Groups' section is missing from roles_config.yml.";
pub const INVALID_ATTRIBUTES_ROLE_MSG: &str = "The 'Roles' section must be a list of roles, each with a name and groups.";
pub const INVALID_ATTRIBUTES_GROUP_MSG: &str = "The 'Groups' section must map group names to their attributes.";
pub const DUPLICATE_GROUP_NAME_MSG: &str = "Duplicate group names are not allowed in roles_config.yml.";
pub const MAX_NUMBER_OF_ROLES_MSG: &str = "A max of 100 roles can be supported.";
pub const MIN_NUMBER_OF_GROUPS_MSG: &str = "At least 1 group is required.";
pub const MIN_NUMBER_OF_ROLES_MSG: &str = "At least 1 role is required.";
pub const MAX_NUMBER_OF_ROLES_PER_GROUP_MSG: &str = "Groups can support a maximum of 5 roles.";
pub const RESOURCE_MGR_ID_MSG: &str =
    "The resource_mgr_id needs to be set for groups of the kube_node and slurm_node roles, and must not be set for any other group.";
pub const GRP_EXIST_MSG: &str = "A group mentioned in a role was not found in the Groups section.";
pub const GRP_ROLE_MSG: &str = "Please associate this group with a role.";
pub const PARENT_SERVICE_NODE_MSG: &str =
    "Groups of the login, compiler_node, service_node, kube_control_plane, etcd, slurm_control_node, slurm_dbd and auth_server roles must not declare a parent.";
pub const PARENT_SERVICE_ROLE_DNE_MSG: &str =
    "A parent is declared but no service_node role exists. Remove the parent or define a service_node role.";
pub const PARENT_SERVICE_ROLE_MSG: &str =
    "Without a service_node role, groups of the kube_node, slurm_node and default roles must not declare a parent.";
pub const PARENT_REQUIRED_MSG: &str =
    "With a service_node role defined, groups of the kube_node, slurm_node and default roles must declare their service node parent.";
pub const SWITCH_DETAILS_INCOMPLETE_MSG: &str =
    "If providing switch details, please provide both the IP and Ports fields.";
pub const SWITCH_DETAILS_NO_BMC_DETAILS_MSG: &str =
    "If switch details are provided then bmc_detail's static_range must also be provided.";
pub const INVALID_SWITCH_IP_MSG: &str = "Please provide a valid switch IPv4 address (example: 10.5.0.1).";
pub const INVALID_SWITCH_PORTS_MSG: &str =
    "Please provide any port ranges as start-end (example: 0-15,4:4,51-53).";
pub const DUPLICATE_SWITCH_IP_PORT_MSG: &str =
    "Please remove duplicate ports. Groups sharing a switch IP must not share switch ports.";
pub const BMC_STATIC_RANGE_INVALID_MSG: &str =
    "Static range should be in the following format: IPv4Start-IPv4End (example: 10.5.0.1-10.5.0.200) or a CIDR block.";
pub const OVERLAPPING_STATIC_RANGE_MSG: &str = "bmc_detail's static_range is overlapping with other static ranges.";
pub const SERVICE_NODE_GROUP_SHARED_MSG: &str =
    "A group used by the service_node role must not be used by any other management role.";

pub fn duplicate_group_name_in_layers_msg(group: &str, management: &str, compute: &str) -> String {
    format!(
        "Group '{}' is shared between management layer roles ({}) and compute layer roles ({}). A group can only belong to one layer.",
        group, management, compute
    )
}

pub fn service_node_group_shared_msg(group: &str, others: &str) -> String {
    format!(
        "Group '{}' is used by service_node and by the management roles ({}). {}",
        group, others, SERVICE_NODE_GROUP_SHARED_MSG
    )
}

// provision_config.yml
pub const PXE_MAPPING_FILE_PATH_FAIL_MSG: &str =
    "File path is invalid. Please ensure the file path specified in pxe_mapping_file_path exists and points to a valid file.";
pub const TIMEZONE_FAIL_MSG: &str = "Timezone is invalid. Please provide a timezone from the supported timezone list.";
pub const DEFAULT_LEASE_TIME_FAIL_MSG: &str =
    "Please provide a valid default_lease_time between 21600 and 31536000 seconds.";
pub const NTP_SUPPORT_EMPTY_MSG: &str = "The ntp_support must have a boolean value set.";

pub fn missing_key_msg(key: &str) -> String {
    format!("The '{}' field is required.", key)
}

// software_config.json
pub fn os_type_fail_msg(supported: &str) -> String {
    format!("Unsupported cluster_os_type. Supported operating systems are: {}.", supported)
}

pub fn os_version_fail_msg(os_type: &str, supported: &str) -> String {
    format!("Unsupported cluster_os_version for {}. Supported versions are: {}.", os_type, supported)
}

// network_spec.yml
pub const INVALID_NETWORK_RANGE_MSG: &str =
    "Ranges should be in the following format: IPv4Start-IPv4End (example: 10.5.0.1-10.5.0.200) or a CIDR block.";
pub const NETMASK_BITS_FAIL_MSG: &str = "netmask_bits must be an integer between 1 and 32.";
pub const RANGE_OVERLAP_MSG: &str = "IP ranges must not overlap with any other range in network_spec.yml.";

// user lists
pub const USER_NAME_EMPTY_MSG: &str = "user_name must not contain empty entries.";
pub const USER_NAME_DUPLICATE_MSG: &str = "user_name must not contain duplicate entries.";

// high_availability_config.yml
pub const DUPLICATE_ACTIVE_NODE_SERVICE_TAG_MSG: &str = "The active service node service tag is repeated.";
pub const DUPLICATE_VIRTUAL_IP_MSG: &str = "The virtual_ip_address is repeated across service node HA entries.";
pub const DUPLICATE_PASSIVE_NODE_SERVICE_TAG_MSG: &str = "A passive service node service tag is repeated.";
