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
use crate::util::io::path_basename_as_string;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error};

pub const VAULT_MARKER: &str = "$ANSIBLE_VAULT";

/// True when the first line of the file carries the vault marker.
pub fn has_vault_marker(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(|e| ProvcheckError::io(path, e))?;
    let mut first = String::new();
    BufReader::new(file)
        .read_line(&mut first)
        .map_err(|e| ProvcheckError::io(path, e))?;
    Ok(first.trim_start().starts_with(VAULT_MARKER))
}

/// Encrypts and decrypts input files in place.
pub trait Vault: Send + Sync {
    fn is_encrypted(&self, path: &Path) -> Result<bool> {
        has_vault_marker(path)
    }
    fn decrypt(&self, path: &Path) -> Result<()>;
    fn encrypt(&self, path: &Path) -> Result<()>;
}

/// For projects that keep no encrypted inputs. Any encrypted file is an error.
pub struct NoVault;

impl Vault for NoVault {
    fn decrypt(&self, path: &Path) -> Result<()> {
        Err(ProvcheckError::Vault(format!("no vault configured to decrypt {}", path.display())))
    }

    fn encrypt(&self, path: &Path) -> Result<()> {
        Err(ProvcheckError::Vault(format!("no vault configured to encrypt {}", path.display())))
    }
}

/// Runs the external vault tool with the key file registered for each input file name.
pub struct AnsibleVault {
    command: Vec<String>,
    key_dir: PathBuf,
    keys: IndexMap<String, String>,
}

impl AnsibleVault {
    pub fn new(command: &str, key_dir: &Path, keys: IndexMap<String, String>) -> Result<Self> {
        let command = shlex::split(command)
            .filter(|words| !words.is_empty())
            .ok_or_else(|| ProvcheckError::Vault(format!("invalid vault command: {}", command)))?;
        Ok(Self { command, key_dir: key_dir.to_path_buf(), keys })
    }

    fn key_file(&self, path: &Path) -> Result<PathBuf> {
        let name = path_basename_as_string(path);
        match self.keys.get(&name) {
            Some(key) => Ok(self.key_dir.join(key)),
            None => Err(ProvcheckError::Vault(format!("no vault key registered for {}", name))),
        }
    }

    fn run(&self, action: &str, path: &Path) -> Result<()> {
        let key_file = self.key_file(path)?;
        debug!(action, file = %path.display(), "running vault command");
        let output = Command::new(&self.command[0])
            .args(&self.command[1..])
            .arg(action)
            .arg(path)
            .arg("--vault-password-file")
            .arg(&key_file)
            .output()
            .map_err(|e| ProvcheckError::Vault(format!("failed to run {}: {}", self.command[0], e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProvcheckError::Vault(format!(
                "{} {} failed: {}",
                action,
                path.display(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Vault for AnsibleVault {
    fn decrypt(&self, path: &Path) -> Result<()> {
        self.run("decrypt", path)
    }

    fn encrypt(&self, path: &Path) -> Result<()> {
        self.run("encrypt", path)
    }
}

/// Holds a vault file decrypted for as long as the guard lives.
///
/// Files that were not encrypted are left alone. Files that were are encrypted
/// again on drop, so early returns and panics cannot leave plaintext behind.
pub struct DecryptedFile<'a> {
    vault: &'a dyn Vault,
    path: PathBuf,
    was_encrypted: bool,
}

impl<'a> DecryptedFile<'a> {
    pub fn open(vault: &'a dyn Vault, path: &Path) -> Result<Self> {
        let was_encrypted = vault.is_encrypted(path)?;
        if was_encrypted {
            vault.decrypt(path)?;
        }
        Ok(Self { vault, path: path.to_path_buf(), was_encrypted })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn was_encrypted(&self) -> bool {
        self.was_encrypted
    }
}

impl Drop for DecryptedFile<'_> {
    fn drop(&mut self) {
        if !self.was_encrypted {
            return;
        }
        if let Err(e) = self.vault.encrypt(&self.path) {
            error!(file = %self.path.display(), "failed to re-encrypt: {}", e);
        }
    }
}
