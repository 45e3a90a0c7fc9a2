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

//! Structural (L1) validation of an input document against its Draft 7 schema.

use crate::error::{ProvcheckError, Result};
use crate::util::io::read_local_file;
use crate::validation::messages;
use crate::validation::ValidationError;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

// ==============================================================================================================
// PUBLIC API
// ==============================================================================================================

/// Read a schema document. A schema that is not JSON is malformed, not missing.
pub fn load_schema(path: &Path) -> Result<Value> {
    let text = read_local_file(path)?;
    serde_json::from_str(&text)
        .map_err(|e| ProvcheckError::SchemaMalformed(format!("{}: {}", path.display(), e)))
}

/// Validate `document` against `schema`. Violations come back ordered by field
/// path; only a broken schema is an `Err`.
pub fn validate(document: &Value, schema: &Value, password_fields: &BTreeSet<String>) -> Result<Vec<ValidationError>> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| ProvcheckError::SchemaMalformed(e.to_string()))?;

    let mut found: Vec<(Vec<String>, ValidationError)> = Vec::new();
    if let Err(errors) = compiled.validate(document) {
        for err in errors {
            let segments = pointer_segments(&err.instance_path.to_string());
            let message = err.to_string();
            let rendered = render_message(&segments, &message, &err.instance, password_fields);
            found.push((segments, rendered));
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(violations = found.len(), "schema validation finished");
    Ok(found.into_iter().map(|(_, e)| e).collect())
}

// ==============================================================================================================
// PRIVATE
// ==============================================================================================================

// "/Groups/grp0/location_id" -> ["Groups", "grp0", "location_id"]
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn render_message(segments: &[String], message: &str, instance: &Value, password_fields: &BTreeSet<String>) -> ValidationError {
    let path = segments.join(".");

    let mut message = if path == "Groups" {
        String::from(messages::INVALID_GROUP_NAME_MSG)
    } else if path.contains("location_id") {
        String::from(messages::INVALID_LOCATION_ID_MSG)
    } else if path.contains("ports") {
        String::from(messages::INVALID_SWITCH_PORTS_FORMAT_MSG)
    } else {
        message.to_string()
    };

    let is_secret = segments.last().map(|leaf| password_fields.contains(leaf)).unwrap_or(false);
    if is_secret {
        message = mask_secret(&message, instance);
    }

    let field_path = if path.is_empty() { None } else { Some(path.as_str()) };
    ValidationError::new(field_path, None, message)
}

fn mask_secret(message: &str, instance: &Value) -> String {
    let stars = match instance {
        Value::String(s) => "*".repeat(s.chars().count()),
        other => "*".repeat(other.to_string().chars().count()),
    };
    let rendered = instance.to_string();
    if !rendered.is_empty() && message.contains(&rendered) {
        return message.replace(&rendered, &format!("'{}'", stars));
    }
    // the value did not appear verbatim, hide the leading token instead
    match message.split_once(' ') {
        Some((_, rest)) => format!("'{}' {}", stars, rest),
        None => format!("'{}'", stars),
    }
}
