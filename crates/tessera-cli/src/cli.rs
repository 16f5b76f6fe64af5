//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use tessera_schema::Draft;

/// Tessera CLI - JSON Schema validation for JSON and YAML documents
///
/// Validates instance documents against a schema written in draft-04, draft-06,
/// draft-07 or 2019-09 and explains every failure.
#[derive(Parser, Debug)]
#[command(
    name = "tessera",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TESSERA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate one or more instance documents against a schema
    Validate(ValidateArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the given shell
    Completions(CompletionsArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the schema document (JSON or YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Instance documents to validate (JSON or YAML)
    #[arg(value_name = "INSTANCE", required = true)]
    pub instances: Vec<PathBuf>,

    /// How much of the result tree to report
    #[arg(short, long, value_enum)]
    pub format: Option<ResultFormat>,

    /// Evaluate every schema without `$schema` under this draft
    #[arg(long, value_parser = parse_draft)]
    pub draft: Option<Draft>,

    /// Draft used when a schema neither declares nor implies one
    #[arg(long, value_parser = parse_draft)]
    pub default_draft: Option<Draft>,

    /// Directory of schema documents available to `$ref` (repeatable)
    #[arg(long = "schema-dir", value_name = "DIR")]
    pub schema_dirs: Vec<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// File to create; the extension picks YAML, JSON or TOML
    #[arg(value_name = "PATH", default_value = ".tessera.yaml")]
    pub path: PathBuf,

    /// Force overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in the given format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Shape of the reported result tree
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResultFormat {
    /// Verdict only
    Flag,
    /// Flat list of failing keywords
    Basic,
    /// Failing branches, condensed
    Detailed,
    /// Every evaluated keyword
    Verbose,
}

impl From<ResultFormat> for tessera_schema::OutputFormat {
    fn from(format: ResultFormat) -> Self {
        match format {
            ResultFormat::Flag => tessera_schema::OutputFormat::Flag,
            ResultFormat::Basic => tessera_schema::OutputFormat::Basic,
            ResultFormat::Detailed => tessera_schema::OutputFormat::Detailed,
            ResultFormat::Verbose => tessera_schema::OutputFormat::Verbose,
        }
    }
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Shell {
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

fn parse_draft(value: &str) -> Result<Draft, String> {
    value.parse::<Draft>().map_err(|e| e.to_string())
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_arguments() {
        let cli = Cli::parse_from([
            "tessera",
            "validate",
            "schema.json",
            "a.json",
            "b.yaml",
            "--format",
            "basic",
            "--draft",
            "7",
            "--schema-dir",
            "defs",
        ]);
        let Commands::Validate(args) = cli.command else {
            panic!("expected the validate command");
        };
        assert_eq!(args.schema, PathBuf::from("schema.json"));
        assert_eq!(args.instances.len(), 2);
        assert_eq!(args.format, Some(ResultFormat::Basic));
        assert_eq!(args.draft, Some(Draft::Draft07));
        assert_eq!(args.default_draft, None);
        assert_eq!(args.schema_dirs, vec![PathBuf::from("defs")]);
    }

    #[test]
    fn test_validate_requires_an_instance() {
        assert!(Cli::try_parse_from(["tessera", "validate", "schema.json"]).is_err());
    }

    #[test]
    fn test_unknown_draft_is_rejected() {
        let parsed = Cli::try_parse_from(["tessera", "validate", "s.json", "i.json", "--draft", "3"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_draft_accepts_release_names() {
        let cli = Cli::parse_from(["tessera", "validate", "s.json", "i.json", "--default-draft", "2019-09"]);
        let Commands::Validate(args) = cli.command else {
            panic!("expected the validate command");
        };
        assert_eq!(args.default_draft, Some(Draft::Draft2019_09));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["tessera", "-vv", "--output", "json-pretty", "completions", "zsh"]);
        assert_eq!(cli.verbosity_level(), 2);
        assert_eq!(cli.output, OutputFormat::JsonPretty);

        let cli = Cli::parse_from(["tessera", "--quiet", "completions", "bash"]);
        assert_eq!(cli.verbosity_level(), 0);
        assert!(Cli::try_parse_from(["tessera", "-q", "-v", "completions", "bash"]).is_err());
    }
}
