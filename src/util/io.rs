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
use std::fs;
use std::fs::ReadDir;
use std::path::{Path, PathBuf};
use std::process;

// read a directory as per the normal rust way, but map any errors to ours
pub fn read_dir(path: &Path) -> Result<ReadDir> {
    fs::read_dir(path).map_err(|e| ProvcheckError::io(path, e))
}

// call fn on every file below the original path, recursing into subdirectories.
// each step is allowed to return an error to stop the walking.
pub fn path_walk<F>(path: &Path, with_each_file: &mut F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in read_dir(path)? {
        let entry = entry.map_err(|e| ProvcheckError::io(path, e))?;
        entries.push(entry.path());
    }
    // directory order is filesystem dependent
    entries.sort();
    for entry in entries.iter() {
        if entry.is_dir() {
            path_walk(entry, with_each_file)?;
        } else {
            with_each_file(entry)?;
        }
    }
    Ok(())
}

/// Every file below `path` whose extension is one of `extensions`.
pub fn find_files(path: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut found: Vec<PathBuf> = Vec::new();
    path_walk(path, &mut |p: &Path| {
        if let Some(ext) = p.extension().and_then(|e| e.to_str()) {
            if extensions.contains(&ext) {
                found.push(p.to_path_buf());
            }
        }
        Ok(())
    })?;
    Ok(found)
}

pub fn read_local_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ProvcheckError::io(path, e))
}

// get the last part of the file ignoring the directory part
pub fn path_basename_as_string(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => path.to_string_lossy().to_string(),
    }
}

pub fn quit(s: &str) -> ! {
    // quit with a message - don't use this except in main.rs!
    eprintln!("{}", s);
    process::exit(0x01)
}
