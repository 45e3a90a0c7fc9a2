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

//! Logical (L2) validation, dispatched on the input file name.

use crate::config::{self, ValidatorConfig};
use crate::topology::taxonomy::LayerTaxonomy;
use crate::util::io::path_basename_as_string;
use crate::validation::{common, provision, roles, sort_errors, ValidationError};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

/// Everything a file validator may consult besides the document itself.
pub struct LogicContext<'a> {
    pub input_path: &'a Path,
    pub project_dir: &'a Path,
    /// the file text as read, before parsing
    pub raw: &'a str,
    pub taxonomy: &'a LayerTaxonomy,
    pub os_versions: &'a IndexMap<String, Vec<String>>,
    pub timezones: Option<&'a BTreeSet<String>>,
}

impl<'a> LogicContext<'a> {
    pub fn new(
        config: &'a ValidatorConfig,
        input_path: &'a Path,
        raw: &'a str,
        timezones: Option<&'a BTreeSet<String>>,
    ) -> Self {
        Self {
            input_path,
            project_dir: &config.project_dir,
            raw,
            taxonomy: &config.taxonomy,
            os_versions: &config.os_versions,
            timezones,
        }
    }
}

/// The closed set of input files with logical rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFile {
    Roles,
    Provision,
    NetworkSpec,
    Software,
    PasswordlessSsh,
    K8sAccess,
    HighAvailability,
    /// known file whose only rules live in its schema
    SchemaOnly(&'static str),
    /// a file this tool knows nothing about
    Unknown,
}

impl ConfigFile {
    pub fn from_name(name: &str) -> ConfigFile {
        match name {
            config::ROLES_CONFIG => ConfigFile::Roles,
            config::PROVISION_CONFIG => ConfigFile::Provision,
            config::NETWORK_SPEC => ConfigFile::NetworkSpec,
            config::SOFTWARE_CONFIG => ConfigFile::Software,
            config::PASSWORDLESS_SSH_CONFIG => ConfigFile::PasswordlessSsh,
            config::K8S_ACCESS_CONFIG => ConfigFile::K8sAccess,
            config::HIGH_AVAILABILITY_CONFIG => ConfigFile::HighAvailability,
            config::SERVER_SPEC => ConfigFile::SchemaOnly(config::SERVER_SPEC),
            config::OMNIA_CONFIG => ConfigFile::SchemaOnly(config::OMNIA_CONFIG),
            config::NETWORK_CONFIG => ConfigFile::SchemaOnly(config::NETWORK_CONFIG),
            config::LOCAL_REPO_CONFIG => ConfigFile::SchemaOnly(config::LOCAL_REPO_CONFIG),
            config::TELEMETRY_CONFIG => ConfigFile::SchemaOnly(config::TELEMETRY_CONFIG),
            config::SECURITY_CONFIG => ConfigFile::SchemaOnly(config::SECURITY_CONFIG),
            config::ROCE_PLUGIN_CONFIG => ConfigFile::SchemaOnly(config::ROCE_PLUGIN_CONFIG),
            config::STORAGE_CONFIG => ConfigFile::SchemaOnly(config::STORAGE_CONFIG),
            config::LOGIN_NODE_SECURITY_CONFIG => ConfigFile::SchemaOnly(config::LOGIN_NODE_SECURITY_CONFIG),
            config::SITE_CONFIG => ConfigFile::SchemaOnly(config::SITE_CONFIG),
            _ => ConfigFile::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> ConfigFile {
        ConfigFile::from_name(&path_basename_as_string(path))
    }

    /// Run this file's rules. A document that failed to parse has no rules to
    /// run, except for roles where the raw text is still scanned.
    pub fn validate(&self, document: Option<&Value>, ctx: &LogicContext) -> Vec<ValidationError> {
        if let ConfigFile::Roles = self {
            return roles::validate_roles_config(document, ctx.raw, ctx.taxonomy);
        }
        let document = match document {
            Some(document) => document,
            None => return Vec::new(),
        };
        match self {
            ConfigFile::Provision => provision::validate_provision_config(document, ctx),
            ConfigFile::NetworkSpec => provision::validate_network_spec(document, ctx),
            ConfigFile::Software => common::validate_software_config(document, ctx),
            ConfigFile::PasswordlessSsh | ConfigFile::K8sAccess => common::validate_usernames(document, ctx),
            ConfigFile::HighAvailability => common::validate_high_availability_config(document, ctx),
            ConfigFile::SchemaOnly(_) | ConfigFile::Unknown | ConfigFile::Roles => Vec::new(),
        }
    }
}

/// L2 entry point: route by file name and return the errors ordered by field path.
pub fn validate_logic(document: Option<&Value>, ctx: &LogicContext) -> Vec<ValidationError> {
    let file = ConfigFile::from_path(ctx.input_path);
    debug!(file = %ctx.input_path.display(), kind = ?file, "running logical validation");
    if file == ConfigFile::Unknown {
        warn!(file = %ctx.input_path.display(), "unsupported file, no logical validation performed");
        return Vec::new();
    }
    let mut errors = file.validate(document, ctx);
    sort_errors(&mut errors);
    errors
}
