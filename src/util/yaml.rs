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

use crate::util::terminal::{banner, markdown_print};
use std::path::Path;

const YAML_ERROR_SHOW_LINES: usize = 10;
const YAML_ERROR_WIDTH: usize = 180; // things will wrap in terminal anyway

// ==============================================================================================================
// PUBLIC API
// ==============================================================================================================

/// Parse YAML text straight into the generic document tree shared with JSON inputs.
pub fn parse_yaml_document(text: &str) -> Result<serde_json::Value, serde_yaml::Error> {
    serde_yaml::from_str::<serde_json::Value>(text)
}

pub fn show_yaml_error_in_context(yaml_error: &serde_yaml::Error, path: &Path, contents: &str) {
    println!();

    let mut yaml_error_str = format!("{}", yaml_error);
    yaml_error_str.truncate(YAML_ERROR_WIDTH);
    if yaml_error_str.len() > YAML_ERROR_WIDTH - 3 {
        yaml_error_str.push_str("...");
    }

    let location = match yaml_error.location() {
        Some(location) => location,
        None => {
            let markdown_table = format!(
                "|:-|\n|Error reading YAML file: {}|\n|{}|\n|-",
                path.display(),
                yaml_error_str
            );
            markdown_print(&markdown_table);
            return;
        }
    };

    banner(&format!("Error reading YAML file: {}, {}", path.display(), yaml_error_str));
    println!();
    for line in context_lines(contents, location.line(), location.column()) {
        println!("{}", line);
    }
    println!();
}

// the lines around a YAML error, the failing line marked with its column
fn context_lines(contents: &str, error_line: usize, error_column: usize) -> Vec<String> {
    let show_start = error_line.saturating_sub(YAML_ERROR_SHOW_LINES);
    let show_stop = error_line + YAML_ERROR_SHOW_LINES;

    let mut out = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let count = index + 1;
        if count < show_start || count > show_stop {
            continue;
        }
        if count == error_line {
            out.push(format!("     {count:5}:{error_column:5} | >>> | {}", line));
        } else {
            out.push(format!("     {count:5}       |     | {}", line));
        }
    }
    out
}
