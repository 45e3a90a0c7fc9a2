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
use crate::loading::vault::{DecryptedFile, Vault};
use crate::util::io::read_local_file;
use crate::util::yaml::{parse_yaml_document, show_yaml_error_in_context};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<FileFormat> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(FileFormat::Json),
            Some("yml") | Some("yaml") => Ok(FileFormat::Yaml),
            Some(other) => Err(ProvcheckError::UnsupportedFormat(format!(".{}", other))),
            None => Err(ProvcheckError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed input file. Never modified after loading.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigDocument {
    pub path: PathBuf,
    pub format: FileFormat,
    pub value: Value,
}

impl ConfigDocument {
    /// True for an empty file or a document that is null, `{}` or `[]`.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }
}

/// Read the text of an input file, decrypting vault protected YAML for the
/// duration of the read.
pub fn read_source(path: &Path, vault: &dyn Vault) -> Result<String> {
    let format = FileFormat::from_path(path)?;
    if !path.exists() {
        return Err(ProvcheckError::missing("The file", path));
    }
    match format {
        FileFormat::Json => read_local_file(path),
        FileFormat::Yaml => {
            let guard = DecryptedFile::open(vault, path)?;
            read_local_file(guard.path())
        }
    }
}

/// Parse already read text. A syntax error is shown to the user and yields `None`.
pub fn parse(path: &Path, format: FileFormat, text: &str) -> Option<ConfigDocument> {
    if text.trim().is_empty() {
        return Some(ConfigDocument { path: path.to_path_buf(), format, value: Value::Null });
    }
    let parsed = match format {
        FileFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| {
            warn!(file = %path.display(), "JSON syntax error: {}", e);
        }),
        FileFormat::Yaml => parse_yaml_document(text).map_err(|e| {
            warn!(file = %path.display(), "YAML syntax error: {}", e);
            show_yaml_error_in_context(&e, path, text);
        }),
    };
    match parsed {
        Ok(value) => Some(ConfigDocument { path: path.to_path_buf(), format, value }),
        Err(()) => None,
    }
}

/// Load an input file as `(document, format)`. The document is `None` when the
/// file did not parse; the failure has already been reported.
pub fn load(path: &Path, vault: &dyn Vault) -> Result<(Option<ConfigDocument>, FileFormat)> {
    let format = FileFormat::from_path(path)?;
    debug!(file = %path.display(), format = %format, "loading input file");
    let text = read_source(path, vault)?;
    Ok((parse(path, format, &text), format))
}
