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

use clap::{Args, Parser, Subcommand};
use provcheck::api::vault_for;
use provcheck::loading::document::{load, parse, read_source, FileFormat};
use provcheck::topology::hierarchy::{resolve_hierarchy, service_tag_map};
use provcheck::topology::model::RolesConfig;
use provcheck::util::io::quit;
use provcheck::validation::roles::validate_roles_config;
use provcheck::{
    resolve_config, Layer, MemoryInventory, ProvcheckError, Result, TerminalOutputHandler, ValidationRunner,
    ValidatorConfig,
};
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "provcheck", version, about = "Validate cluster provisioning input files")]
struct Cli {
    /// -v for info, -vv for debug, -vvv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// write logs to <dir>/validation_<project>.log instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run schema and logic validation over a project's input files
    Validate(ValidateArgs),
    /// Resolve roles_config.yml into its role/group mapping and print it as JSON
    Roles(RolesArgs),
}

#[derive(Args)]
struct VaultArgs {
    /// directory holding the vault key files; vault support is off without it
    #[arg(long)]
    vault_key_dir: Option<PathBuf>,

    #[arg(long, default_value = "ansible-vault")]
    vault_command: String,
}

#[derive(Args)]
struct ValidateArgs {
    #[arg(long, default_value = "/opt/omnia/input/project_default")]
    project_dir: PathBuf,

    #[arg(long, default_value = "./schema")]
    schema_dir: PathBuf,

    /// comma separated tags, e.g. provision,security
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// an input file name to validate; repeatable
    #[arg(long = "file")]
    files: Vec<String>,

    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// one supported timezone per line
    #[arg(long)]
    timezone_file: Option<PathBuf>,

    #[command(flatten)]
    vault: VaultArgs,
}

#[derive(Args)]
struct RolesArgs {
    #[arg(long)]
    file: PathBuf,

    #[arg(long, default_value = "default")]
    layer: String,

    /// JSON list of node records standing in for the node inventory
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// high_availability_config.yml, used with --nodes
    #[arg(long)]
    ha: Option<PathBuf>,

    #[command(flatten)]
    vault: VaultArgs,
}

fn main() {
    match liftoff() {
        Err(e) => quit(&e.to_string()),
        Ok(code) => process::exit(code),
    }
}

fn liftoff() -> Result<i32> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Validate(args) => {
            let project_name = args.project_dir.file_name().map(|n| n.to_string_lossy().to_string());
            init_logging(cli.verbose, cli.log_dir.as_deref(), project_name.as_deref())?;
            validate(args, cli.verbose)
        }
        Command::Roles(args) => {
            init_logging(cli.verbose, cli.log_dir.as_deref(), Some("roles"))?;
            roles(args)
        }
    }
}

fn validate(args: &ValidateArgs, verbose: u8) -> Result<i32> {
    let mut config = ValidatorConfig::new()
        .project_dir(&args.project_dir)
        .schema_dir(&args.schema_dir)
        .tags(args.tags.clone())
        .threads(args.threads)
        .verbosity(verbose as u32)
        .vault_command(args.vault.vault_command.clone());
    for file in args.files.iter() {
        config = config.file(file.clone());
    }
    if let Some(dir) = &args.vault.vault_key_dir {
        config = config.vault_key_dir(dir);
    }
    if let Some(path) = &args.timezone_file {
        config = config.timezone_file(path);
    }

    let output_handler = Arc::new(TerminalOutputHandler::new(verbose as u32));
    let report = ValidationRunner::new(config)
        .with_output_handler(output_handler)
        .run()?;
    Ok(report.exit_code())
}

fn roles(args: &RolesArgs) -> Result<i32> {
    let mut config = ValidatorConfig::new().vault_command(args.vault.vault_command.clone());
    if let Some(dir) = &args.vault.vault_key_dir {
        config = config.vault_key_dir(dir);
    }
    let vault = vault_for(&config)?;
    let layer: Layer = args.layer.parse()?;

    let format = FileFormat::from_path(&args.file)?;
    let raw = read_source(&args.file, vault.as_ref())?;
    let value = parse(&args.file, format, &raw).map(|d| d.value);

    let errors = validate_roles_config(value.as_ref(), &raw, &config.taxonomy);
    if !errors.is_empty() {
        for error in errors.iter() {
            eprintln!("{}: {}", args.file.display(), error);
        }
        return Ok(1);
    }
    let value = value.ok_or_else(|| ProvcheckError::Structural(String::from("roles_config.yml did not parse")))?;

    let roles_config = RolesConfig::from_document(&value)?;
    let mut mapping = resolve_config(&roles_config, layer, &config.taxonomy)?;

    let mut output = json!({ "roles": &mapping });
    if let Some(nodes) = &args.nodes {
        let store = MemoryInventory::from_json_file(nodes)?;
        let ha = match &args.ha {
            Some(path) => load(path, vault.as_ref())?.0.map(|d| d.value),
            None => None,
        };
        let service_nodes = resolve_hierarchy(&mut mapping, &store, ha.as_ref())?;
        output = json!({
            "roles": &mapping,
            "service_nodes": &service_nodes,
            "service_tag_map": service_tag_map(&service_nodes),
        });
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}

fn init_logging(verbose: u8, log_dir: Option<&Path>, project: Option<&str>) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("PROVCHECK_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_dir {
        Some(dir) => {
            let path = dir.join(format!("validation_{}.log", project.unwrap_or("project")));
            let file = File::create(&path).map_err(|e| ProvcheckError::io(&path, e))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
