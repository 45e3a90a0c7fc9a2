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

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for provcheck operations.
///
/// Expected configuration mistakes are not errors: validators hand those back
/// as [`crate::validation::ValidationError`] lists. These variants cover the
/// infrastructure failures that stop a file or a whole run.
#[derive(Debug, Error)]
pub enum ProvcheckError {
    /// Runner configuration errors (bad tag, nothing selected, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file extension that is neither JSON nor YAML
    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(String),

    /// The schema document itself is broken
    #[error("Internal schema validation error: {0}")]
    SchemaMalformed(String),

    /// Missing Roles/Groups sections or other unusable document shape
    #[error("Structural error: {0}")]
    Structural(String),

    /// A role references a group that does not exist
    #[error("Referential integrity error: {0}")]
    ReferentialIntegrity(String),

    /// Line lookup could not read the file
    #[error("Unable to access and read file: {}", .0.display())]
    IntegrityCheck(PathBuf),

    /// Vault decrypt/encrypt failures
    #[error("Vault error: {0}")]
    Vault(String),

    /// A required file or directory does not exist
    #[error("{what} does not exist: {}", .path.display())]
    MissingPath { what: String, path: PathBuf },

    /// Inventory store errors
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Topology resolution errors
    #[error("Topology error: {0}")]
    Topology(String),

    /// IO errors
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl ProvcheckError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProvcheckError::Io { path: path.into(), source }
    }

    pub fn missing(what: &str, path: impl Into<PathBuf>) -> Self {
        ProvcheckError::MissingPath { what: what.to_string(), path: path.into() }
    }
}

impl From<String> for ProvcheckError {
    fn from(err: String) -> Self {
        ProvcheckError::Other(err)
    }
}

impl From<&str> for ProvcheckError {
    fn from(err: &str) -> Self {
        ProvcheckError::Other(err.to_string())
    }
}

/// Result type alias for provcheck operations
pub type Result<T> = std::result::Result<T, ProvcheckError>;
