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

//! Maps a dotted field path back to a line of the source file.
//!
//! Only the first segment of a nested path is searched. A hit on a nested
//! path is reported as inexact: the error is somewhere inside the object or
//! list that starts on that line.

use crate::error::{ProvcheckError, Result};
use crate::loading::document::FileFormat;
use crate::loading::vault::{DecryptedFile, Vault};
use crate::util::io::read_local_file;
use regex::Regex;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineMatch {
    pub line: usize,
    pub is_exact: bool,
}

fn key_patterns(key: &str, format: FileFormat) -> Option<(Regex, Regex)> {
    let escaped = regex::escape(key);
    let (definition, mention) = match format {
        FileFormat::Json => (format!(r#""{}"\s*:"#, escaped), format!(r#""{}""#, escaped)),
        FileFormat::Yaml => (
            format!(r#"^\s*(-\s+)?["']?{}["']?\s*:"#, escaped),
            format!(r"(^|[^\w-]){}($|[^\w-])", escaped),
        ),
    };
    Some((Regex::new(&definition).ok()?, Regex::new(&mention).ok()?))
}

/// Search already read text. A line defining the key wins over a line that only
/// mentions it; YAML comment lines are never matched.
pub fn locate_in_text(text: &str, field_path: &str, format: FileFormat) -> Option<LineMatch> {
    let (key, is_exact) = match field_path.split_once('.') {
        Some((first, _)) => (first, false),
        None => (field_path, true),
    };
    if key.is_empty() {
        return None;
    }
    let (definition, mention) = key_patterns(key, format)?;

    let candidates = text
        .lines()
        .enumerate()
        .filter(|(_, line)| format == FileFormat::Json || !line.trim_start().starts_with('#'));

    let mut first_mention: Option<usize> = None;
    for (index, line) in candidates {
        if definition.is_match(line) {
            return Some(LineMatch { line: index + 1, is_exact });
        }
        if first_mention.is_none() && mention.is_match(line) {
            first_mention = Some(index + 1);
        }
    }
    first_mention.map(|line| LineMatch { line, is_exact })
}

/// Find the line for `field_path` in `path`. Encrypted files are decrypted for
/// the search and encrypted again afterwards, found or not.
pub fn locate_line(path: &Path, field_path: &str, format: FileFormat, vault: &dyn Vault) -> Result<Option<LineMatch>> {
    let guard = DecryptedFile::open(vault, path)?;
    let text = read_local_file(guard.path()).map_err(|_| ProvcheckError::IntegrityCheck(path.to_path_buf()))?;
    if text.is_empty() {
        return Err(ProvcheckError::IntegrityCheck(path.to_path_buf()));
    }
    Ok(locate_in_text(&text, field_path, format))
}
