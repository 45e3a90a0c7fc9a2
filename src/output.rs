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

use crate::validation::ValidationError;
use std::path::Path;
use std::sync::Arc;
use inline_colorization::{color_red, color_green, color_yellow, color_reset};

/// Trait for reporting the progress of a validation run
pub trait OutputHandler: Send + Sync {
    fn on_run_start(&self, project: &str, files: &[String]);

    fn on_file_start(&self, file: &Path);
    fn on_validation_error(&self, file: &Path, error: &ValidationError);
    fn on_file_end(&self, file: &Path, passed: bool);

    fn on_recap(&self, recap_data: RecapData);

    fn log(&self, level: LogLevel, message: &str);
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }
    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

#[derive(Debug, Clone)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct RecapData {
    pub project: String,
    pub passed: Vec<String>,
    pub failed: Vec<String>,
    pub status: String,
}

/// A no-op output handler for when output is not needed
pub struct NullOutputHandler;

impl OutputHandler for NullOutputHandler {
    fn on_run_start(&self, _project: &str, _files: &[String]) {}
    fn on_file_start(&self, _file: &Path) {}
    fn on_validation_error(&self, _file: &Path, _error: &ValidationError) {}
    fn on_file_end(&self, _file: &Path, _passed: bool) {}
    fn on_recap(&self, _recap_data: RecapData) {}
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Terminal output: banners per file, colored status words, a two column recap
pub struct TerminalOutputHandler {
    pub verbosity: u32,
}

impl TerminalOutputHandler {
    pub fn new(verbosity: u32) -> Self {
        Self { verbosity }
    }
}

impl OutputHandler for TerminalOutputHandler {
    fn on_run_start(&self, project: &str, files: &[String]) {
        let started = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        crate::util::terminal::banner(&format!("VALIDATING: {} ({} files) at {}", project, files.len(), started));
        if self.verbosity > 0 {
            for file in files.iter() {
                println!("  {}", file);
            }
        }
    }

    fn on_file_start(&self, file: &Path) {
        if self.verbosity > 0 {
            println!();
            crate::util::terminal::banner(&format!("FILE: {}", file.display()));
        }
    }

    fn on_validation_error(&self, file: &Path, error: &ValidationError) {
        println!("{color_red}ERROR{color_reset} => {}: {}", file.display(), error);
    }

    fn on_file_end(&self, file: &Path, passed: bool) {
        if passed {
            println!("{color_green}PASSED{color_reset} => {}", file.display());
        } else {
            println!("{color_red}FAILED{color_reset} => {}", file.display());
        }
    }

    fn on_recap(&self, recap_data: RecapData) {
        println!();
        crate::util::terminal::banner(&String::from("RECAP"));
        let mut rows: Vec<(String, String)> = Vec::new();
        for file in recap_data.failed.iter() {
            rows.push((file.clone(), String::from("failed")));
        }
        for file in recap_data.passed.iter() {
            rows.push((file.clone(), String::from("passed")));
        }
        crate::util::terminal::two_column_table("file", "status", &rows);
        let status = match recap_data.status.as_str() {
            "success" => format!("{color_green}SUCCESS{color_reset}"),
            "partial" => format!("{color_yellow}PARTIAL{color_reset}"),
            _ => format!("{color_red}FAILURE{color_reset}"),
        };
        println!("{} : {} passed={} failed={}",
            recap_data.project,
            status,
            recap_data.passed.len(),
            recap_data.failed.len()
        );
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug if self.verbosity >= 3 => println!("DEBUG: {}", message),
            LogLevel::Info if self.verbosity >= 1 => println!("INFO: {}", message),
            LogLevel::Warning => println!("{color_yellow}WARNING{color_reset}: {}", message),
            LogLevel::Error => eprintln!("{color_red}ERROR{color_reset}: {}", message),
            _ => {}
        }
    }
}

/// Thread-safe wrapper for output handlers
pub type OutputHandlerRef = Arc<dyn OutputHandler>;
