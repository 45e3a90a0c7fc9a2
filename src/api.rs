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

use crate::config::ValidatorConfig;
use crate::error::{ProvcheckError, Result};
use crate::loading::document::{parse, read_source, FileFormat};
use crate::loading::vault::{AnsibleVault, NoVault, Vault};
use crate::output::{OutputHandler, OutputHandlerRef, NullOutputHandler, RecapData};
use crate::util::io::{find_files, path_basename_as_string};
use crate::validation::logic::{validate_logic, LogicContext};
use crate::validation::messages as msg;
use crate::validation::provision::load_timezones;
use crate::validation::schema;
use crate::validation::{attach_lines, sort_errors, ValidationError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const INPUT_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// Main API for validating a project's input files
pub struct ValidationRunner {
    config: ValidatorConfig,
    output_handler: OutputHandlerRef,
    vault: Option<Box<dyn Vault>>,
}

impl ValidationRunner {
    /// Create a new ValidationRunner with the given configuration
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            output_handler: Arc::new(NullOutputHandler),
            vault: None,
        }
    }

    /// Set a custom output handler
    pub fn with_output_handler(mut self, handler: Arc<dyn OutputHandler>) -> Self {
        self.output_handler = handler;
        self
    }

    /// Use this vault instead of the one described by the configuration
    pub fn with_vault(mut self, vault: Box<dyn Vault>) -> Self {
        self.vault = Some(vault);
        self
    }

    /// Validate every selected file. Missing directories, files or schemas stop
    /// the run before any file is validated; everything else ends up in the report.
    pub fn run(&self) -> Result<ValidationReport> {
        let configured;
        let vault: &dyn Vault = match &self.vault {
            Some(vault) => vault.as_ref(),
            None => {
                configured = vault_for(&self.config)?;
                configured.as_ref()
            }
        };

        let jobs = self.plan()?;
        let timezones = match &self.config.timezone_file {
            Some(path) => Some(load_timezones(path)?),
            None => None,
        };

        let project = self.config.project_name();
        let names: Vec<String> = jobs.iter().map(|(path, _)| path_basename_as_string(path)).collect();
        info!(project = %project, files = jobs.len(), threads = self.config.threads, "starting validation run");
        self.output_handler.on_run_start(&project, &names);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| ProvcheckError::Config(format!("Failed to build thread pool: {}", e)))?;

        let mut files: Vec<FileReport> = pool.install(|| {
            jobs.par_iter()
                .map(|(path, schema_path)| self.validate_file(path, schema_path, timezones.as_ref(), vault))
                .collect()
        });
        files.sort_by(|a, b| b.status.cmp(&a.status).then_with(|| a.file.cmp(&b.file)));

        let report = ValidationReport::new(project, files);
        info!(project = %report.project, status = ?report.status, "validation run finished");
        self.output_handler.on_recap(report.recap());
        Ok(report)
    }

    // ==========================================================================================================
    // PRIVATE
    // ==========================================================================================================

    /// Pair each selected file with its schema, checking both exist.
    fn plan(&self) -> Result<Vec<(PathBuf, PathBuf)>> {
        let project_dir = &self.config.project_dir;
        if !project_dir.is_dir() {
            return Err(ProvcheckError::missing("The project directory", project_dir));
        }
        let selected = self.config.selected_files()?;

        let found = find_files(project_dir, &INPUT_EXTENSIONS)?;
        if found.is_empty() {
            return Err(ProvcheckError::missing("Input files (.json, .yml) under the project directory", project_dir));
        }
        let mut by_name: HashMap<String, PathBuf> = HashMap::new();
        for path in found.into_iter() {
            by_name.insert(path_basename_as_string(&path), path);
        }

        let mut jobs = Vec::new();
        for name in selected.iter() {
            let path = by_name
                .get(name)
                .cloned()
                .ok_or_else(|| ProvcheckError::missing("The input file", project_dir.join(name)))?;
            let schema_path = self.config.schema_path_for(name);
            if !schema_path.is_file() {
                return Err(ProvcheckError::missing("The schema file", schema_path));
            }
            jobs.push((path, schema_path));
        }
        Ok(jobs)
    }

    fn validate_file(
        &self,
        path: &Path,
        schema_path: &Path,
        timezones: Option<&BTreeSet<String>>,
        vault: &dyn Vault,
    ) -> FileReport {
        info!(file = %path.display(), "validating");
        self.output_handler.on_file_start(path);

        let errors = match self.check_file(path, schema_path, timezones, vault) {
            Ok(errors) => errors,
            Err(e) => vec![ValidationError::general(e.to_string())],
        };
        for error in errors.iter() {
            self.output_handler.on_validation_error(path, error);
        }
        let status = if errors.is_empty() { FileStatus::Passed } else { FileStatus::Failed };
        info!(file = %path.display(), errors = errors.len(), status = ?status, "validated");
        self.output_handler.on_file_end(path, status == FileStatus::Passed);
        FileReport { file: path.to_path_buf(), status, errors }
    }

    /// Schema (L1) then logic (L2), reported together in field path order. Logic
    /// runs even when the schema check failed.
    fn check_file(
        &self,
        path: &Path,
        schema_path: &Path,
        timezones: Option<&BTreeSet<String>>,
        vault: &dyn Vault,
    ) -> Result<Vec<ValidationError>> {
        let format = FileFormat::from_path(path)?;
        let raw = read_source(path, vault)?;
        let document = parse(path, format, &raw);

        let mut errors = match &document {
            None => vec![ValidationError::general(msg::SYNTAX_ERROR_MSG)],
            Some(document) => match schema::load_schema(schema_path) {
                Ok(schema_doc) => {
                    match schema::validate(&document.value, &schema_doc, &self.config.password_fields) {
                        Ok(errors) => errors,
                        Err(e) => vec![ValidationError::general(e.to_string())],
                    }
                }
                Err(e) => vec![ValidationError::general(e.to_string())],
            },
        };
        debug!(file = %path.display(), errors = errors.len(), "schema validation done");

        let ctx = LogicContext::new(&self.config, path, &raw, timezones);
        errors.extend(validate_logic(document.as_ref().map(|d| &d.value), &ctx));
        sort_errors(&mut errors);

        attach_lines(&mut errors, path, format, vault);
        Ok(errors)
    }
}

/// The vault described by the configuration: the external tool when a key
/// directory is configured, otherwise none.
pub fn vault_for(config: &ValidatorConfig) -> Result<Box<dyn Vault>> {
    match &config.vault_key_dir {
        Some(key_dir) => Ok(Box::new(AnsibleVault::new(&config.vault_command, key_dir, config.vault_keys.clone())?)),
        None => Ok(Box::new(NoVault)),
    }
}

/// Failed sorts before Passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FileStatus {
    Passed,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub status: FileStatus,
    pub errors: Vec<ValidationError>,
}

/// Rollup over all files: none, some, or all failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Success,
    Partial,
    Failure,
}

impl RunStatus {
    pub fn from_counts(failed: usize, total: usize) -> RunStatus {
        if failed == 0 {
            RunStatus::Success
        } else if failed < total {
            RunStatus::Partial
        } else {
            RunStatus::Failure
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Success => 0,
            _ => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failure => "failure",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    pub project: String,
    pub files: Vec<FileReport>,
    pub status: RunStatus,
}

impl ValidationReport {
    pub fn new(project: String, files: Vec<FileReport>) -> Self {
        let failed = files.iter().filter(|f| f.status == FileStatus::Failed).count();
        let status = RunStatus::from_counts(failed, files.len());
        Self { project, files, status }
    }

    pub fn passed(&self) -> Vec<&FileReport> {
        self.files.iter().filter(|f| f.status == FileStatus::Passed).collect()
    }

    pub fn failed(&self) -> Vec<&FileReport> {
        self.files.iter().filter(|f| f.status == FileStatus::Failed).collect()
    }

    pub fn file(&self, name: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| path_basename_as_string(&f.file) == name)
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    fn recap(&self) -> RecapData {
        let names = |reports: Vec<&FileReport>| -> Vec<String> {
            reports.iter().map(|f| f.file.display().to_string()).collect()
        };
        RecapData {
            project: self.project.clone(),
            passed: names(self.passed()),
            failed: names(self.failed()),
            status: self.status.as_str().to_string(),
        }
    }
}

/// Builder-style API for simpler use cases
pub fn validate_project(project_dir: &str) -> ValidationRunnerBuilder {
    ValidationRunnerBuilder::new(project_dir)
}

pub struct ValidationRunnerBuilder {
    config: ValidatorConfig,
    vault: Option<Box<dyn Vault>>,
}

impl ValidationRunnerBuilder {
    fn new(project_dir: &str) -> Self {
        let config = ValidatorConfig::new()
            .project_dir(project_dir);
        Self { config, vault: None }
    }

    pub fn schema_dir(mut self, path: &str) -> Self {
        self.config = self.config.schema_dir(path);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.config = self.config.tag(tag);
        self
    }

    pub fn file(mut self, name: &str) -> Self {
        self.config = self.config.file(name);
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.config = self.config.threads(threads);
        self
    }

    pub fn timezone_file(mut self, path: &str) -> Self {
        self.config = self.config.timezone_file(path);
        self
    }

    pub fn vault(mut self, vault: Box<dyn Vault>) -> Self {
        self.vault = Some(vault);
        self
    }

    fn runner(self) -> ValidationRunner {
        let runner = ValidationRunner::new(self.config);
        match self.vault {
            Some(vault) => runner.with_vault(vault),
            None => runner,
        }
    }

    pub fn run(self) -> Result<ValidationReport> {
        self.runner().run()
    }

    pub fn run_with_output(self, handler: Arc<dyn OutputHandler>) -> Result<ValidationReport> {
        self.runner().with_output_handler(handler).run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_rollup() {
        assert_eq!(RunStatus::from_counts(0, 3), RunStatus::Success);
        assert_eq!(RunStatus::from_counts(1, 3), RunStatus::Partial);
        assert_eq!(RunStatus::from_counts(3, 3), RunStatus::Failure);
        assert_eq!(RunStatus::Partial.exit_code(), 1);
        assert_eq!(RunStatus::Success.exit_code(), 0);
    }

    #[test]
    fn test_report_order_and_lookup() {
        let report = ValidationReport::new(
            String::from("project_default"),
            vec![
                FileReport { file: PathBuf::from("/p/a.yml"), status: FileStatus::Failed, errors: vec![ValidationError::general("x")] },
                FileReport { file: PathBuf::from("/p/b.yml"), status: FileStatus::Passed, errors: vec![] },
            ],
        );
        assert_eq!(report.status, RunStatus::Partial);
        assert_eq!(report.failed().len(), 1);
        assert!(report.file("b.yml").is_some());
        let recap = report.recap();
        assert_eq!(recap.failed, vec!["/p/a.yml"]);
        assert_eq!(recap.status, "partial");
    }

    #[test]
    fn test_missing_project_dir() {
        let runner = ValidationRunner::new(ValidatorConfig::new().project_dir("/no/such/project").file("roles_config.yml"));
        assert!(matches!(runner.run(), Err(ProvcheckError::MissingPath { .. })));
    }
}
