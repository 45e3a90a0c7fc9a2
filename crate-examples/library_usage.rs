// Example of using provcheck as a library

use provcheck::{
    FileStatus, LogLevel, OutputHandler, RecapData, TerminalOutputHandler, ValidationError, ValidationRunner,
    ValidatorConfig,
};
use provcheck::topology::model::RolesConfig;
use provcheck::loading::document::load;
use provcheck::loading::vault::NoVault;
use std::path::Path;
use std::sync::Arc;

fn main() -> provcheck::Result<()> {
    // Example 1: validate a project by tag
    tag_example()?;

    // Example 2: custom output handler
    custom_output_example()?;

    // Example 3: the builder API
    builder_example()?;

    // Example 4: resolving roles_config.yml for the compute layer
    topology_example()?;

    Ok(())
}

fn tag_example() -> provcheck::Result<()> {
    println!("=== Validate by tag ===");

    let config = ValidatorConfig::new()
        .project_dir("/opt/omnia/input/project_default")
        .schema_dir("./schema")
        .tag("provision")
        .threads(4);

    let output = Arc::new(TerminalOutputHandler::new(1));
    let report = ValidationRunner::new(config)
        .with_output_handler(output)
        .run()?;

    println!("Validation finished: {:?}", report.status);
    Ok(())
}

fn custom_output_example() -> provcheck::Result<()> {
    println!("\n=== Custom Output Handler Example ===");

    // one JSON line per event
    struct JsonOutputHandler;

    impl OutputHandler for JsonOutputHandler {
        fn on_run_start(&self, project: &str, files: &[String]) {
            println!(r#"{{"event": "run_start", "project": "{}", "files": {:?}}}"#, project, files);
        }

        fn on_file_start(&self, file: &Path) {
            println!(r#"{{"event": "file_start", "file": "{}"}}"#, file.display());
        }

        fn on_validation_error(&self, file: &Path, error: &ValidationError) {
            let rendered = serde_json::to_string(error).unwrap_or_default();
            println!(r#"{{"event": "error", "file": "{}", "error": {}}}"#, file.display(), rendered);
        }

        fn on_file_end(&self, file: &Path, passed: bool) {
            println!(r#"{{"event": "file_end", "file": "{}", "passed": {}}}"#, file.display(), passed);
        }

        fn on_recap(&self, recap: RecapData) {
            println!(r#"{{"event": "recap", "project": "{}", "status": "{}", "failed": {}}}"#,
                recap.project, recap.status, recap.failed.len());
        }

        fn log(&self, level: LogLevel, message: &str) {
            let level_str = match level {
                LogLevel::Debug => "debug",
                LogLevel::Info => "info",
                LogLevel::Warning => "warning",
                LogLevel::Error => "error",
            };
            println!(r#"{{"event": "log", "level": "{}", "message": "{}"}}"#, level_str, message);
        }
    }

    let config = ValidatorConfig::new()
        .project_dir("./input/project_default")
        .file("roles_config.yml");

    let report = ValidationRunner::new(config)
        .with_output_handler(Arc::new(JsonOutputHandler))
        .run()?;

    for file in report.files.iter().filter(|f| f.status == FileStatus::Failed) {
        println!("{} has {} problem(s)", file.file.display(), file.errors.len());
    }
    Ok(())
}

fn builder_example() -> provcheck::Result<()> {
    println!("\n=== Builder API Example ===");

    let report = provcheck::validate_project("./input/project_default")
        .schema_dir("./schema")
        .tag("security")
        .file("software_config.json")
        .timezone_file("./timezone.txt")
        .threads(2)
        .run()?;

    println!("exit code would be {}", report.exit_code());
    Ok(())
}

fn topology_example() -> provcheck::Result<()> {
    println!("\n=== Topology Example ===");

    let (document, _) = load(Path::new("./input/project_default/roles_config.yml"), &NoVault)?;
    if let Some(document) = document {
        let roles = RolesConfig::from_document(&document.value)?;
        let mapping = provcheck::resolve_config(&roles, provcheck::Layer::Default, &Default::default())?;
        println!("needs_bmc={} needs_switch={}", mapping.needs_bmc, mapping.needs_switch);
    }
    Ok(())
}
