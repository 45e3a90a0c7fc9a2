// Common test utilities

use provcheck::loading::vault::{Vault, VAULT_MARKER};
use provcheck::ValidatorConfig;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const GOOD_ROLES_CONFIG: &str = "\
Roles:
  - name: login
    groups:
      - grp0
  - name: kube_node
    groups:
      - grp1
Groups:
  grp0:
    location_id: SU-1.RACK-1
    parent: ''
    bmc_details:
      static_range: 172.16.107.1-172.16.107.10
  grp1:
    location_id: SU-1.RACK-2
    parent: ''
    resource_mgr_id: rack2
    switch_details:
      ip: 172.96.28.12
      ports: 1-8
    bmc_details:
      static_range: 172.16.107.20-172.16.107.40
";

pub const ROLES_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "required": ["Roles", "Groups"],
  "properties": {
    "Roles": {"type": "array", "items": {"type": "object", "required": ["name", "groups"]}},
    "Groups": {"type": "object"}
  }
}"#;

pub const PROVISION_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "required": ["timezone", "default_lease_time"],
  "properties": {
    "timezone": {"type": "string"},
    "default_lease_time": {"type": ["string", "integer"]}
  }
}"#;

/// A project directory and a sibling schema directory on disk.
pub struct Project {
    _root: TempDir,
    pub project_dir: PathBuf,
    pub schema_dir: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let project_dir = root.path().join("project_default");
        let schema_dir = root.path().join("schema");
        fs::create_dir_all(&project_dir).unwrap();
        fs::create_dir_all(&schema_dir).unwrap();
        Self { _root: root, project_dir, schema_dir }
    }

    pub fn input(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.project_dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn schema(&self, stem: &str, contents: &str) {
        fs::write(self.schema_dir.join(format!("{}.json", stem)), contents).unwrap();
    }

    pub fn config(&self) -> ValidatorConfig {
        ValidatorConfig::new().project_dir(&self.project_dir).schema_dir(&self.schema_dir)
    }
}

/// Stores encrypted files as the vault marker line followed by the reversed text.
pub struct ReversingVault {
    pub decrypts: AtomicUsize,
    pub encrypts: AtomicUsize,
}

impl ReversingVault {
    pub fn new() -> Self {
        Self { decrypts: AtomicUsize::new(0), encrypts: AtomicUsize::new(0) }
    }

    pub fn seal(&self, path: &Path) {
        self.encrypt(path).unwrap();
        self.encrypts.store(0, Ordering::SeqCst);
    }
}

impl Vault for ReversingVault {
    fn decrypt(&self, path: &Path) -> provcheck::Result<()> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        let text = fs::read_to_string(path).unwrap();
        let body = text.split_once('\n').map(|(_, b)| b).unwrap_or("");
        fs::write(path, body.chars().rev().collect::<String>()).unwrap();
        Ok(())
    }

    fn encrypt(&self, path: &Path) -> provcheck::Result<()> {
        self.encrypts.fetch_add(1, Ordering::SeqCst);
        let text = fs::read_to_string(path).unwrap();
        let body: String = text.chars().rev().collect();
        fs::write(path, format!("{};1.1;AES256\n{}", VAULT_MARKER, body)).unwrap();
        Ok(())
    }
}

pub fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap()
}
