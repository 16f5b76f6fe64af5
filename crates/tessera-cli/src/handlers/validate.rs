//! Validation command handler and related utilities

use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::loader::{self, DirectoryResolver};
use crate::logging::timing::Timer;
use crate::output::{InstanceReport, OutputWriter};
use std::path::{Path, PathBuf};
use tessera_schema::{SchemaRegistry, ValidationOptions, Validator};
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
#[instrument(skip(config, output), fields(schema = %args.schema.display(), instances = args.instances.len()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &format!("schema: {}", args.schema.display()));
    info!("Starting validation");

    let mut registry = SchemaRegistry::new();
    let schema = {
        let _load_timer = Timer::new("schema_loading");
        loader::register_schema_file(&mut registry, &args.schema)?
    };
    let preload = preload_directories(&args, config);
    let preloaded = loader::preload_directories(&mut registry, &preload, Some(&args.schema))?;
    if preloaded > 0 {
        output.info(&format!("Loaded {} schema document(s) from {} director(ies)", preloaded, preload.len()))?;
    } else if !preload.is_empty() {
        output.warning("No schema documents found in the schema directories")?;
    }

    let options = effective_options(&args, config)
        .with_resolver(DirectoryResolver::new(search_directories(&args.schema, &preload)));
    debug!(options = ?options, "Validation options");
    let validator = Validator::new(registry, options);

    let mut reports = Vec::with_capacity(args.instances.len());
    for path in &args.instances {
        let _instance_timer = Timer::with_details("instance_validation", &path.display().to_string());
        let instance = loader::load_document(path)?;
        let results = validator.validate(&schema, &instance)?;
        debug!(instance = %path.display(), valid = results.is_valid, "Instance evaluated");
        reports.push(InstanceReport::new(path, results));
    }

    output.reports(&reports)?;

    let invalid = reports.iter().filter(|report| !report.is_valid()).count();
    if invalid > 0 {
        warn!(invalid, total = reports.len(), "Validation failed");
        return Err(Error::InstanceInvalid {
            invalid,
            total: reports.len(),
        });
    }

    info!(total = reports.len(), "All instances are valid");
    Ok(())
}

/// Configuration options with command-line overrides applied
fn effective_options(args: &ValidateArgs, config: &Config) -> ValidationOptions {
    let mut options = config.validation_options();
    if let Some(format) = args.format {
        options = options.with_output_format(format.into());
    }
    if let Some(draft) = args.default_draft {
        options = options.with_default_draft(draft);
    }
    if let Some(draft) = args.draft {
        options = options.with_draft(draft);
    }
    options
}

/// Directories named on the command line, then those from the configuration
fn preload_directories(args: &ValidateArgs, config: &Config) -> Vec<PathBuf> {
    let mut dirs = args.schema_dirs.clone();
    for dir in &config.schemas.directories {
        if !dirs.contains(dir) {
            dirs.push(dir.clone());
        }
    }
    dirs
}

/// The schema's own directory first, then the preload directories
fn search_directories(schema: &Path, preload: &[PathBuf]) -> Vec<PathBuf> {
    let parent = schema
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut dirs = vec![parent.to_path_buf()];
    dirs.extend(preload.iter().cloned());
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OutputFormat, ResultFormat};
    use std::fs;
    use std::io;
    use tempfile::TempDir;
    use tessera_schema::Draft;

    fn args(schema: PathBuf, instances: Vec<PathBuf>) -> ValidateArgs {
        ValidateArgs {
            schema,
            instances,
            format: None,
            draft: None,
            default_draft: None,
            schema_dirs: Vec::new(),
        }
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn sink() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Human, false, false, Box::new(io::sink()))
    }

    #[test]
    fn test_valid_instances_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(&dir, "schema.json", r#"{"type": "object", "required": ["id"]}"#);
        let a = write(&dir, "a.json", r#"{"id": 1}"#);
        let b = write(&dir, "b.yaml", "id: 2\n");

        let outcome = handle_validate(args(schema, vec![a, b]), &Config::default(), &mut sink());
        assert!(outcome.is_ok());
    }

    #[test]
    fn test_invalid_instances_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(&dir, "schema.json", r#"{"type": "object", "required": ["id"]}"#);
        let good = write(&dir, "good.json", r#"{"id": 1}"#);
        let bad = write(&dir, "bad.json", r#"{"name": "x"}"#);

        let outcome = handle_validate(args(schema, vec![good, bad]), &Config::default(), &mut sink());
        match outcome {
            Err(error @ Error::InstanceInvalid { invalid: 1, total: 2 }) => assert_eq!(error.exit_code(), 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_schema_dir_supplies_identified_documents() {
        let dir = tempfile::tempdir().unwrap();
        let defs = dir.path().join("defs");
        fs::create_dir(&defs).unwrap();
        fs::write(
            defs.join("positive.yaml"),
            "$id: https://example.com/positive.json\nminimum: 0\n",
        )
        .unwrap();
        let schema = write(&dir, "schema.json", r#"{"items": {"$ref": "https://example.com/positive.json"}}"#);
        let good = write(&dir, "good.json", "[0, 1]");
        let bad = write(&dir, "bad.json", "[0, -1]");

        let mut with_dir = args(schema.clone(), vec![good]);
        with_dir.schema_dirs.push(defs.clone());
        assert!(handle_validate(with_dir, &Config::default(), &mut sink()).is_ok());

        let mut config = Config::default();
        config.schemas.directories.push(defs);
        let outcome = handle_validate(args(schema, vec![bad]), &config, &mut sink());
        assert!(matches!(outcome, Err(Error::InstanceInvalid { invalid: 1, total: 1 })));
    }

    #[test]
    fn test_missing_instance_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(&dir, "schema.json", "{}");
        let outcome = handle_validate(
            args(schema, vec![dir.path().join("absent.json")]),
            &Config::default(),
            &mut sink(),
        );
        assert!(matches!(outcome, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_command_line_overrides_configuration() {
        let mut config = Config::default();
        config.validation.default_draft = Some(Draft::Draft04);
        config.templates.insert("type".to_string(), "bad type".to_string());

        let mut cli = args(PathBuf::from("s.json"), vec![PathBuf::from("i.json")]);
        cli.format = Some(ResultFormat::Verbose);
        cli.draft = Some(Draft::Draft07);

        let options = effective_options(&cli, &config);
        assert_eq!(options.output_format, tessera_schema::OutputFormat::Verbose);
        assert_eq!(options.default_draft, Draft::Draft04);
        assert_eq!(options.draft, Some(Draft::Draft07));
        assert_eq!(options.templates.get("type"), Some("bad type"));
    }

    #[test]
    fn test_search_directories_start_with_schema_parent() {
        let dirs = search_directories(Path::new("schema.json"), &[PathBuf::from("defs")]);
        assert_eq!(dirs, vec![PathBuf::from("."), PathBuf::from("defs")]);

        let dirs = search_directories(Path::new("schemas/root.json"), &[]);
        assert_eq!(dirs, vec![PathBuf::from("schemas")]);
    }
}
