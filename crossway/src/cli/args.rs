//! CLI argument definitions
//!
//! All Clap derive structs for `Crossway` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Four-way intersection signal controller.
#[derive(Parser, Debug)]
#[command(name = "crossway", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CROSSWAY_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "CROSSWAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

impl Cli {
    /// Verbosity after applying `--quiet`.
    #[must_use]
    pub const fn effective_verbosity(&self) -> u8 {
        if self.quiet { 0 } else { self.verbose }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the controller and its HTTP API.
    Run(RunArgs),

    /// Validate configuration files without starting the controller.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version and build information.
    Version(VersionArgs),
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "CROSSWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind the HTTP API on `[host:]port` (overrides the config file).
    #[arg(long, env = "CROSSWAY_HTTP")]
    pub http: Option<String>,

    /// Number of history records kept (overrides the config file).
    #[arg(long, env = "CROSSWAY_HISTORY_SIZE", value_parser = clap::value_parser!(u32).range(1..))]
    pub history_size: Option<u32>,

    /// Expose Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, env = "CROSSWAY_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Write the JSONL event stream to this file (`-` for stderr).
    #[arg(long, env = "CROSSWAY_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
