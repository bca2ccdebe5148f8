//! `validate` command: check configuration files without starting.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::ConfigLoader;
use crate::error::{ConfigError, CrosswayError};

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total: usize,
    valid: usize,
    invalid: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    files: Vec<FileReport>,
    summary: Summary,
}

/// Validates every file and prints a report.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationFailed`] if any file is invalid, or a
/// JSON error if the report cannot be rendered.
pub fn run(args: &ValidateArgs) -> Result<(), CrosswayError> {
    let loader = ConfigLoader::with_defaults();
    let files: Vec<FileReport> = args.files.iter().map(|p| check(&loader, p)).collect();

    let invalid = files.iter().filter(|f| !f.valid).count();
    let report = Report {
        summary: Summary {
            total: files.len(),
            valid: files.len() - invalid,
            invalid,
        },
        files,
    };

    match args.format {
        OutputFormat::Human => print!("{}", render_human(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if invalid > 0 {
        return Err(ConfigError::ValidationFailed { count: invalid }.into());
    }
    Ok(())
}

fn check(loader: &ConfigLoader, path: &Path) -> FileReport {
    tracing::info!(file = %path.display(), "validating configuration");
    let (error, warnings) = match loader.load(path) {
        Ok(result) => (
            None,
            result.warnings.iter().map(ToString::to_string).collect(),
        ),
        Err(e) => (Some(e.to_string()), Vec::new()),
    };
    FileReport {
        path: path.display().to_string(),
        valid: error.is_none(),
        error,
        warnings,
    }
}

fn render_human(report: &Report) -> String {
    let mut out = String::new();
    for file in &report.files {
        match &file.error {
            None => out.push_str(&format!("ok      {}\n", file.path)),
            Some(e) => out.push_str(&format!("invalid {}: {e}\n", file.path)),
        }
        for w in &file.warnings {
            out.push_str(&format!("  warning: {w}\n"));
        }
    }
    out.push_str(&format!(
        "{} file(s) checked, {} valid, {} invalid\n",
        report.summary.total, report.summary.valid, report.summary.invalid
    ));
    out
}
