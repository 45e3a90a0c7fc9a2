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

pub mod common;
pub mod logic;
pub mod messages;
pub mod provision;
pub mod roles;
pub mod schema;

use crate::loading::document::FileFormat;
use crate::loading::locator::{locate_in_text, LineMatch};
use crate::loading::vault::{DecryptedFile, Vault};
use crate::util::io::read_local_file;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// One problem found in an input file, by either validation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Dotted path of the offending field, `None` when no single field applies.
    pub field_path: Option<String>,
    /// The offending value or a short description of it. Secrets arrive masked.
    pub value: Option<String>,
    pub message: String,
    pub source_line: Option<usize>,
    pub is_exact_line: bool,
}

impl ValidationError {
    pub fn new(field_path: Option<&str>, value: Option<String>, message: impl Into<String>) -> Self {
        Self {
            field_path: field_path.map(String::from),
            value,
            message: message.into(),
            source_line: None,
            is_exact_line: false,
        }
    }

    /// An error about a named field.
    pub fn field(field_path: &str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Some(field_path), Some(value.into()), message)
    }

    /// An error that cannot be pinned to one field.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(None, None, message)
    }

    pub fn with_line(mut self, found: LineMatch) -> Self {
        self.source_line = Some(found.line);
        self.is_exact_line = found.is_exact;
        self
    }

    pub fn line_message(&self) -> Option<String> {
        self.source_line.map(|line| {
            if self.is_exact_line {
                format!("Error occurs on line {}", line)
            } else {
                format!("Error occurs on object or list entry on line {}", line)
            }
        })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field_path {
            Some(path) => write!(f, "{}: {}", path, self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(value) = &self.value {
            write!(f, " [{}]", value)?;
        }
        if let Some(line) = self.line_message() {
            write!(f, " ({})", line)?;
        }
        Ok(())
    }
}

/// Stable ordering by field path, errors without a path first.
pub fn sort_errors(errors: &mut [ValidationError]) {
    errors.sort_by(|a, b| a.field_path.cmp(&b.field_path));
}

/// Fill in source lines for every error with a field path. The file is read
/// once, through a single decrypt and re-encrypt. A file that cannot be read for
/// lookup leaves the errors unlocated and does not fail the run.
pub fn attach_lines(errors: &mut [ValidationError], path: &Path, format: FileFormat, vault: &dyn Vault) {
    if errors.iter().all(|e| e.field_path.is_none()) {
        return;
    }
    let text = match DecryptedFile::open(vault, path).and_then(|guard| read_local_file(guard.path())) {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => {
            warn!(file = %path.display(), "line lookup skipped, file is empty");
            return;
        }
        Err(e) => {
            warn!(file = %path.display(), "line lookup failed: {}", e);
            return;
        }
    };

    for err in errors.iter_mut() {
        let found = match &err.field_path {
            Some(field) => locate_in_text(&text, field, format),
            None => continue,
        };
        if let Some(found) = found {
            err.source_line = Some(found.line);
            err.is_exact_line = found.is_exact;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::vault::NoVault;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_line_messages() {
        let exact = ValidationError::field("Roles", "x", "bad").with_line(LineMatch { line: 3, is_exact: true });
        let inexact = ValidationError::field("Roles.0", "x", "bad").with_line(LineMatch { line: 3, is_exact: false });
        assert_eq!(exact.line_message().unwrap(), "Error occurs on line 3");
        assert_eq!(inexact.line_message().unwrap(), "Error occurs on object or list entry on line 3");
        assert_eq!(ValidationError::general("x").line_message(), None);
    }

    #[test]
    fn test_display() {
        let err = ValidationError::field("grp1", "Group grp1 does not exist.", messages::GRP_EXIST_MSG)
            .with_line(LineMatch { line: 7, is_exact: true });
        assert_eq!(
            err.to_string(),
            format!("grp1: {} [Group grp1 does not exist.] (Error occurs on line 7)", messages::GRP_EXIST_MSG)
        );
    }

    #[test]
    fn test_sort_is_stable_with_general_first() {
        let mut errors = vec![
            ValidationError::field("grp2", "a", "first grp2"),
            ValidationError::general("general"),
            ValidationError::field("grp1", "b", "grp1"),
            ValidationError::field("grp2", "c", "second grp2"),
        ];
        sort_errors(&mut errors);
        let order: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(order, vec!["general", "grp1", "first grp2", "second grp2"]);
    }

    #[test]
    fn test_attach_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provision_config.yml");
        fs::write(&path, "timezone: Mars/Olympus\ndefault_lease_time: 10\n").unwrap();
        let mut errors = vec![
            ValidationError::field("default_lease_time", "10", "bad lease"),
            ValidationError::general("general"),
        ];
        attach_lines(&mut errors, &path, FileFormat::Yaml, &NoVault);
        assert_eq!(errors[0].source_line, Some(2));
        assert!(errors[0].is_exact_line);
        assert_eq!(errors[1].source_line, None);
    }
}
