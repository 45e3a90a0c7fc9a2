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

use crate::error::Result;
use crate::topology::model::text_field;
use crate::util::io::read_local_file;
use crate::util::netaddr::Ipv4Range;
use crate::validation::logic::LogicContext;
use crate::validation::messages as msg;
use crate::validation::ValidationError;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const MIN_LEASE_TIME: i64 = 21600;
pub const MAX_LEASE_TIME: i64 = 31536000;

/// One timezone name per line, blank lines and comments ignored.
pub fn load_timezones(path: &Path) -> Result<BTreeSet<String>> {
    let text = read_local_file(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}

fn lease_time(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

// ==============================================================================================================
// provision_config.yml
// ==============================================================================================================

pub fn validate_provision_config(document: &Value, ctx: &LogicContext) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(pxe_path) = text_field(document.get("pxe_mapping_file_path")) {
        let mut resolved = PathBuf::from(&pxe_path);
        if resolved.is_relative() {
            resolved = ctx.project_dir.join(resolved);
        }
        if !resolved.is_file() {
            errors.push(ValidationError::field("pxe_mapping_file_path", pxe_path, msg::PXE_MAPPING_FILE_PATH_FAIL_MSG));
        }
    }

    match text_field(document.get("timezone")) {
        None => errors.push(ValidationError::new(Some("timezone"), None, msg::missing_key_msg("timezone"))),
        Some(timezone) => match ctx.timezones {
            Some(known) if !known.contains(&timezone) => {
                errors.push(ValidationError::field("timezone", timezone, msg::TIMEZONE_FAIL_MSG));
            }
            Some(_) => {}
            None => warn!("no timezone list configured, skipping timezone check"),
        },
    }

    match document.get("default_lease_time") {
        None | Some(Value::Null) => errors.push(ValidationError::new(
            Some("default_lease_time"),
            None,
            msg::missing_key_msg("default_lease_time"),
        )),
        Some(value) => {
            let in_range = lease_time(value).map(|t| (MIN_LEASE_TIME..=MAX_LEASE_TIME).contains(&t)).unwrap_or(false);
            if !in_range {
                errors.push(ValidationError::field(
                    "default_lease_time",
                    value.to_string(),
                    msg::DEFAULT_LEASE_TIME_FAIL_MSG,
                ));
            }
        }
    }

    let ntp_set = match document.get("ntp_support") {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    };
    if !ntp_set {
        errors.push(ValidationError::new(Some("ntp_support"), None, msg::NTP_SUPPORT_EMPTY_MSG));
    }

    errors
}

// ==============================================================================================================
// network_spec.yml
// ==============================================================================================================

const RANGE_KEYS: [&str; 2] = ["static_range", "dynamic_range"];

// Networks is a list of single key mappings: `- admin_network: {...}`
fn networks(document: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    match document.get("Networks") {
        Some(Value::Array(items)) => {
            for item in items.iter() {
                if let Value::Object(map) = item {
                    out.extend(map.iter().map(|(k, v)| (k.clone(), v)));
                }
            }
        }
        Some(Value::Object(map)) => out.extend(map.iter().map(|(k, v)| (k.clone(), v))),
        _ => {}
    }
    out
}

pub fn validate_network_spec(document: &Value, _ctx: &LogicContext) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut accepted: Vec<(String, Ipv4Range)> = Vec::new();

    for (network, attrs) in networks(document) {
        if let Some(bits) = attrs.get("netmask_bits").filter(|v| !v.is_null()) {
            let valid = match bits {
                Value::Number(n) => n.as_u64().map(|b| (1..=32).contains(&b)).unwrap_or(false),
                Value::String(s) => s.trim().parse::<u64>().map(|b| (1..=32).contains(&b)).unwrap_or(false),
                _ => false,
            };
            if !valid {
                errors.push(ValidationError::field(
                    &format!("{}.netmask_bits", network),
                    bits.to_string(),
                    msg::NETMASK_BITS_FAIL_MSG,
                ));
            }
        }

        for key in RANGE_KEYS.iter() {
            let field = format!("{}.{}", network, key);
            let text = match text_field(attrs.get(*key)) {
                Some(text) => text,
                None => continue,
            };
            let range = match text.parse::<Ipv4Range>() {
                Ok(range) => range,
                Err(_) => {
                    errors.push(ValidationError::field(&field, text, msg::INVALID_NETWORK_RANGE_MSG));
                    continue;
                }
            };
            let clashes: Vec<&str> = accepted
                .iter()
                .filter(|(_, other)| other.overlaps(&range))
                .map(|(name, _)| name.as_str())
                .collect();
            if !clashes.is_empty() {
                errors.push(ValidationError::field(
                    &field,
                    format!("{} overlaps with {}", text, clashes.join(", ")),
                    msg::RANGE_OVERLAP_MSG,
                ));
            }
            accepted.push((field, range));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn fields(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().filter_map(|e| e.field_path.as_deref()).collect()
    }

    #[test]
    fn test_load_timezones() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timezone.txt");
        fs::write(&path, "# zones\nGMT\n\nAsia/Kolkata\n").unwrap();
        let zones = load_timezones(&path).unwrap();
        assert_eq!(zones.len(), 2);
        assert!(zones.contains("Asia/Kolkata"));
    }

    #[test]
    fn test_provision_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pxe_mapping_file.csv"), "SERVICE_TAG,HOSTNAME\n").unwrap();
        let config = ValidatorConfig::new().project_dir(dir.path());
        let zones: BTreeSet<String> = ["GMT".to_string()].into_iter().collect();
        let path = dir.path().join("provision_config.yml");
        let ctx = LogicContext::new(&config, &path, "", Some(&zones));

        let good = json!({
            "pxe_mapping_file_path": "pxe_mapping_file.csv",
            "timezone": "GMT",
            "default_lease_time": "86400",
            "ntp_support": true
        });
        assert_eq!(validate_provision_config(&good, &ctx), vec![]);

        let bad = json!({
            "pxe_mapping_file_path": "/no/such/file.csv",
            "timezone": "Mars/Olympus",
            "default_lease_time": 60,
            "ntp_support": null
        });
        let errors = validate_provision_config(&bad, &ctx);
        assert_eq!(fields(&errors), vec!["pxe_mapping_file_path", "timezone", "default_lease_time", "ntp_support"]);
    }

    #[test]
    fn test_provision_missing_keys_are_errors() {
        let config = ValidatorConfig::new();
        let path = PathBuf::from("provision_config.yml");
        let ctx = LogicContext::new(&config, &path, "", None);
        let errors = validate_provision_config(&json!({"ntp_support": false}), &ctx);
        assert_eq!(fields(&errors), vec!["timezone", "default_lease_time"]);
    }

    #[test]
    fn test_network_spec() {
        let config = ValidatorConfig::new();
        let path = PathBuf::from("network_spec.yml");
        let ctx = LogicContext::new(&config, &path, "", None);
        let doc = json!({
            "Networks": [
                {"admin_network": {
                    "netmask_bits": "16",
                    "static_range": "172.16.107.1-172.16.107.100",
                    "dynamic_range": "172.16.107.201-172.16.107.250"
                }},
                {"bmc_network": {
                    "netmask_bits": 40,
                    "static_range": "172.16.107.50-172.16.107.60",
                    "dynamic_range": "not-a-range"
                }}
            ]
        });
        let errors = validate_network_spec(&doc, &ctx);
        assert_eq!(
            fields(&errors),
            vec!["bmc_network.netmask_bits", "bmc_network.static_range", "bmc_network.dynamic_range"]
        );
        assert_eq!(errors[1].message, msg::RANGE_OVERLAP_MSG);
        assert!(errors[1].value.as_deref().unwrap().contains("admin_network.static_range"));
    }
}
