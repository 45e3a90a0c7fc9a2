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

pub mod inventory;
pub mod loading;
pub mod topology;
pub mod util;
pub mod validation;

pub mod api;
pub mod config;
pub mod error;
pub mod output;

// Re-export commonly used types for library users
pub use api::{ValidationRunner, ValidationReport, FileReport, FileStatus, RunStatus, validate_project};
pub use config::ValidatorConfig;
pub use error::{ProvcheckError, Result};
pub use output::{OutputHandler, OutputHandlerRef, TerminalOutputHandler, NullOutputHandler, LogLevel, RecapData};
pub use loading::document::{ConfigDocument, FileFormat};
pub use validation::ValidationError;
pub use topology::taxonomy::{Layer, LayerTaxonomy};
pub use topology::resolver::{resolve, resolve_config, RolesGroupsMapping, ResolvedGroup};
pub use inventory::store::{InventoryStore, MemoryInventory, NodeInfo, SwitchInfo, Filter};
