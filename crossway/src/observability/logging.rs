//! Logging setup.
//!
//! Controller logs go to stderr so `validate --format json` and
//! `version --format json` keep stdout clean. `-v` raises the level of the
//! controller's own targets only; axum, hyper and the exporter stay at
//! `warn` until `-vvv`. `CROSSWAY_LOG_LEVEL` replaces the whole filter.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable, optionally colored lines
    #[default]
    Human,
    /// One JSON object per line
    Json,
}

/// Environment variable holding a full `EnvFilter` directive.
pub const LOG_LEVEL_ENV: &str = "CROSSWAY_LOG_LEVEL";

/// Crate targets whose level follows `-v`.
const OWN_TARGETS: [&str; 2] = ["crossway", "crossway_core"];

/// Filter directive for a `-v` count.
///
/// Phase commits and the listen address are logged at `info`, timer
/// arming and stale fires at `debug`.
#[must_use]
pub fn filter_directive(verbosity: u8) -> String {
    let own = match verbosity {
        0 => return "warn".to_string(),
        1 => "info",
        2 => "debug",
        _ => return "trace".to_string(),
    };
    let mut directive = String::from("warn");
    for target in OWN_TARGETS {
        directive.push_str(&format!(",{target}={own}"));
    }
    directive
}

/// Whether to emit ANSI escapes. `NO_COLOR` only affects `auto`.
#[must_use]
pub const fn use_ansi(color: ColorChoice, stderr_is_tty: bool, no_color_set: bool) -> bool {
    match color {
        ColorChoice::Auto => stderr_is_tty && !no_color_set,
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity)));
    let ansi = use_ansi(
        color,
        std::io::stderr().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    );
    // Targets only help once debug output from several modules interleaves.
    let with_target = verbosity >= 2;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(with_target)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Human => builder.with_ansi(ansi).try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
}
