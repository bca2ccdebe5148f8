//! Version information display.

use serde::Serialize;

use crate::cli::args::{OutputFormat, VersionArgs};

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    core_version: &'static str,
}

const INFO: VersionInfo = VersionInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    core_version: crossway_core::VERSION,
};

/// Print version and build information.
pub fn run(args: &VersionArgs) {
    println!("{}", render(args.format));
}

fn render(format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format!("{} {}", INFO.name, INFO.version),
        OutputFormat::Json => serde_json::to_string(&INFO)
            .unwrap_or_else(|_| format!(r#"{{"name":"{}"}}"#, INFO.name)),
    }
}
