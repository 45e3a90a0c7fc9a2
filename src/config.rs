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
use crate::topology::taxonomy::LayerTaxonomy;
use expanduser::expanduser;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const ROLES_CONFIG: &str = "roles_config.yml";
pub const PROVISION_CONFIG: &str = "provision_config.yml";
pub const NETWORK_SPEC: &str = "network_spec.yml";
pub const SERVER_SPEC: &str = "server_spec.yml";
pub const SOFTWARE_CONFIG: &str = "software_config.json";
pub const OMNIA_CONFIG: &str = "omnia_config.yml";
pub const NETWORK_CONFIG: &str = "network_config.yml";
pub const LOCAL_REPO_CONFIG: &str = "local_repo_config.yml";
pub const TELEMETRY_CONFIG: &str = "telemetry_config.yml";
pub const SECURITY_CONFIG: &str = "security_config.yml";
pub const PASSWORDLESS_SSH_CONFIG: &str = "passwordless_ssh_config.yml";
pub const K8S_ACCESS_CONFIG: &str = "k8s_access_config.yml";
pub const ROCE_PLUGIN_CONFIG: &str = "roce_plugin_config.yml";
pub const STORAGE_CONFIG: &str = "storage_config.yml";
pub const LOGIN_NODE_SECURITY_CONFIG: &str = "login_node_security_config.yml";
pub const SITE_CONFIG: &str = "site_config.yml";
pub const HIGH_AVAILABILITY_CONFIG: &str = "high_availability_config.yml";

/// Tags and the input files validated when the tag is requested.
pub static INPUT_FILE_INVENTORY: Lazy<IndexMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut inventory = IndexMap::new();
    inventory.insert("scheduler", vec![OMNIA_CONFIG, SOFTWARE_CONFIG]);
    inventory.insert("provision", vec![PROVISION_CONFIG, NETWORK_SPEC, SERVER_SPEC, SOFTWARE_CONFIG, ROLES_CONFIG]);
    inventory.insert("security", vec![SECURITY_CONFIG, LOGIN_NODE_SECURITY_CONFIG, PASSWORDLESS_SSH_CONFIG, SOFTWARE_CONFIG]);
    inventory.insert("monitoring", vec![TELEMETRY_CONFIG]);
    inventory.insert("local_repo", vec![LOCAL_REPO_CONFIG, SOFTWARE_CONFIG]);
    inventory.insert("k8s", vec![K8S_ACCESS_CONFIG]);
    inventory.insert("roce", vec![ROCE_PLUGIN_CONFIG]);
    inventory.insert("storage", vec![STORAGE_CONFIG]);
    inventory.insert("proxy", vec![SITE_CONFIG]);
    inventory.insert("high_availability", vec![HIGH_AVAILABILITY_CONFIG]);
    // site_config is deliberately left out of "all"
    inventory.insert("all", vec![
        PASSWORDLESS_SSH_CONFIG,
        LOCAL_REPO_CONFIG,
        NETWORK_SPEC,
        SERVER_SPEC,
        OMNIA_CONFIG,
        SECURITY_CONFIG,
        LOGIN_NODE_SECURITY_CONFIG,
        TELEMETRY_CONFIG,
        PROVISION_CONFIG,
        ROCE_PLUGIN_CONFIG,
        K8S_ACCESS_CONFIG,
        SOFTWARE_CONFIG,
        STORAGE_CONFIG,
        ROLES_CONFIG,
        HIGH_AVAILABILITY_CONFIG,
    ]);
    inventory
});

/// Leaf field names whose values must never be logged.
pub static PASSWORD_FIELDS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "slurm_db_password",
        "directory_manager_password",
        "kerberos_admin_password",
        "openldap_db_password",
        "openldap_config_password",
        "openldap_monitor_password",
        "timescaledb_password",
        "idrac_password",
        "mysqldb_password",
        "mysqldb_root_password",
        "grafana_password",
        "provision_password",
        "postgresdb_password",
        "bmc_password",
        "switch_snmp3_password",
        "docker_password",
    ]
    .into_iter()
    .collect()
});

/// Supported cluster operating systems and their versions.
pub static OS_VERSION_RANGES: Lazy<IndexMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut versions = IndexMap::new();
    versions.insert("rhel", vec!["9.4"]);
    versions.insert("rocky", vec!["9.4"]);
    versions.insert("ubuntu", vec!["20.04", "22.04", "24.04"]);
    versions
});

/// Files that may be vault encrypted, and the key file that opens each one.
pub static VAULT_KEYS: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut keys = IndexMap::new();
    keys.insert("omnia_config_credentials.yml", ".omnia_config_credentials_key");
    keys
});

/// Configuration for validating a project directory programmatically
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    pub project_dir: PathBuf,
    pub schema_dir: PathBuf,
    pub tags: Vec<String>,
    pub files: Vec<String>,
    pub threads: usize,
    pub verbosity: u32,
    pub vault_command: String,
    pub vault_key_dir: Option<PathBuf>,
    pub vault_keys: IndexMap<String, String>,
    pub timezone_file: Option<PathBuf>,
    pub password_fields: BTreeSet<String>,
    pub os_versions: IndexMap<String, Vec<String>>,
    pub file_inventory: IndexMap<String, Vec<String>>,
    pub taxonomy: LayerTaxonomy,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            schema_dir: PathBuf::from("./schema"),
            tags: Vec::new(),
            files: Vec::new(),
            threads: 1,
            verbosity: 0,
            vault_command: String::from("ansible-vault"),
            vault_key_dir: None,
            vault_keys: VAULT_KEYS.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            timezone_file: None,
            password_fields: PASSWORD_FIELDS.iter().map(|s| s.to_string()).collect(),
            os_versions: OS_VERSION_RANGES
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
            file_inventory: INPUT_FILE_INVENTORY
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
            taxonomy: LayerTaxonomy::default(),
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_dir = expand(path.as_ref());
        self
    }

    pub fn schema_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.schema_dir = expand(path.as_ref());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn file(mut self, name: impl Into<String>) -> Self {
        self.files.push(name.into());
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn vault_command(mut self, command: impl Into<String>) -> Self {
        self.vault_command = command.into();
        self
    }

    pub fn vault_key_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.vault_key_dir = Some(expand(path.as_ref()));
        self
    }

    pub fn vault_key(mut self, file_name: impl Into<String>, key_file: impl Into<String>) -> Self {
        self.vault_keys.insert(file_name.into(), key_file.into());
        self
    }

    pub fn timezone_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.timezone_file = Some(expand(path.as_ref()));
        self
    }

    pub fn taxonomy(mut self, taxonomy: LayerTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// The project name is the last component of the project directory.
    pub fn project_name(&self) -> String {
        self.project_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("project"))
    }

    /// Input file names selected by the tags and explicit files, tag files first,
    /// without duplicates.
    pub fn selected_files(&self) -> Result<Vec<String>> {
        let mut selected: Vec<String> = Vec::new();
        for tag in self.tags.iter() {
            let files = self.file_inventory.get(tag).ok_or_else(|| {
                ProvcheckError::Config(format!(
                    "unknown tag '{}', expected one of: {}",
                    tag,
                    self.file_inventory.keys().cloned().collect::<Vec<_>>().join(", ")
                ))
            })?;
            for file in files.iter() {
                if !selected.contains(file) {
                    selected.push(file.clone());
                }
            }
        }
        for file in self.files.iter() {
            if file.is_empty() {
                continue;
            }
            if !selected.contains(file) {
                selected.push(file.clone());
            }
        }
        if selected.is_empty() {
            return Err(ProvcheckError::Config(String::from(
                "No validation has been performed. Please provide tags or include individual file names.",
            )));
        }
        Ok(selected)
    }

    /// Path of the schema document for an input file: `<schema_dir>/<stem>.json`
    pub fn schema_path_for(&self, file_name: &str) -> PathBuf {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string());
        self.schema_dir.join(format!("{}.json", stem))
    }
}

fn expand(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => expanduser(text).unwrap_or_else(|_| path.to_path_buf()),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ValidatorConfig::new()
            .project_dir("/opt/input/project_default")
            .schema_dir("/opt/schema")
            .tag("provision")
            .threads(4);

        assert_eq!(config.project_name(), "project_default");
        assert_eq!(config.schema_dir, PathBuf::from("/opt/schema"));
        assert_eq!(config.threads, 4);
        assert_eq!(config.tags, vec!["provision".to_string()]);
    }

    #[test]
    fn test_threads_never_zero() {
        let config = ValidatorConfig::new().threads(0);
        assert_eq!(config.threads, 1);
    }

    #[test]
    fn test_selected_files_merges_tags_and_files() {
        let config = ValidatorConfig::new()
            .tag("scheduler")
            .tag("local_repo")
            .file("roles_config.yml")
            .file("software_config.json");

        let files = config.selected_files().unwrap();
        assert_eq!(
            files,
            vec![
                OMNIA_CONFIG.to_string(),
                SOFTWARE_CONFIG.to_string(),
                LOCAL_REPO_CONFIG.to_string(),
                ROLES_CONFIG.to_string(),
            ]
        );
    }

    #[test]
    fn test_selected_files_unknown_tag() {
        let config = ValidatorConfig::new().tag("nonsense");
        let err = config.selected_files().unwrap_err();
        assert!(err.to_string().contains("unknown tag 'nonsense'"));
    }

    #[test]
    fn test_selected_files_nothing_selected() {
        let config = ValidatorConfig::new().file("");
        assert!(matches!(config.selected_files(), Err(ProvcheckError::Config(_))));
    }

    #[test]
    fn test_all_tag_skips_site_config() {
        let all = INPUT_FILE_INVENTORY.get("all").unwrap();
        assert!(!all.contains(&SITE_CONFIG));
        assert!(all.contains(&ROLES_CONFIG));
    }

    #[test]
    fn test_schema_path_for() {
        let config = ValidatorConfig::new().schema_dir("/schemas");
        assert_eq!(config.schema_path_for("roles_config.yml"), PathBuf::from("/schemas/roles_config.json"));
        assert_eq!(config.schema_path_for("software_config.json"), PathBuf::from("/schemas/software_config.json"));
    }

    #[test]
    fn test_password_fields_present() {
        let config = ValidatorConfig::new();
        assert!(config.password_fields.contains("bmc_password"));
        assert!(config.password_fields.contains("provision_password"));
    }

    #[test]
    fn test_vault_key_overrides_default_table() {
        let config = ValidatorConfig::new().vault_key("site_config.yml", ".site_vault_key");
        assert_eq!(config.vault_keys.get("site_config.yml").map(String::as_str), Some(".site_vault_key"));
        assert!(config.vault_keys.len() > 1);
    }
}
