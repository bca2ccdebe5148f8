//! Configuration loader
//!
//! Turns a YAML file into a validated, frozen [`ControllerConfig`]:
//! 1. Size check against [`LoaderOptions::max_config_size`]
//! 2. Environment variable expansion on the raw text
//! 3. YAML parsing into the typed schema (unknown keys rejected)
//! 4. Validation of values the schema cannot express
//! 5. Freeze with `Arc`

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crossway_core::config::ControllerConfig;

use crate::error::ConfigError;
use crate::transport::parse_bind_addr;

/// Default maximum configuration file size (1 MiB).
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Largest file accepted, in bytes.
    pub max_config_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_config_size: env_or("CROSSWAY_MAX_CONFIG_SIZE", DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<ControllerConfig>,
    /// Non-fatal problems found while loading.
    pub warnings: Vec<LoadWarning>,
}

/// Non-fatal problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,
    /// `file:line` the warning refers to, when known.
    pub location: Option<String>,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingFile`] if the file cannot be read
    /// - [`ConfigError::FileTooLarge`] above the size limit
    /// - [`ConfigError::EnvVarNotSet`] for an unset `${VAR:?msg}`
    /// - [`ConfigError::ParseError`] for malformed YAML or unknown keys
    /// - [`ConfigError::InvalidValue`] when validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > self.options.max_config_size {
            return Err(ConfigError::FileTooLarge {
                size,
                limit: self.options.max_config_size,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_str(&raw, path)
    }

    /// Runs the pipeline on already-read text. `source` is only used in
    /// error messages.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the file access errors.
    pub fn load_str(&self, raw: &str, source: &Path) -> Result<LoadResult, ConfigError> {
        self.load_with(raw, source, |name| std::env::var(name).ok())
    }

    fn load_with(
        &self,
        raw: &str,
        source: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LoadResult, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let (text, mut warnings) = expand_env(raw, source, lookup)?;

        let config = if text.trim().is_empty() {
            warnings.push(LoadWarning {
                message: "configuration is empty, using defaults".to_string(),
                location: Some(source.display().to_string()),
            });
            ControllerConfig::default()
        } else {
            serde_yaml::from_str::<ControllerConfig>(&text).map_err(|e| {
                ConfigError::ParseError {
                    path: source.to_path_buf(),
                    line: e.location().map(|l| l.line()),
                    message: e.to_string(),
                }
            })?
        };

        validate(&config)?;

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }
}

/// Full validation: schema checks plus a parseable bind address.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidValue`] found.
pub fn validate(config: &ControllerConfig) -> Result<(), ConfigError> {
    config.validate()?;
    parse_bind_addr(&config.http.bind).map_err(|e| ConfigError::InvalidValue {
        field: "http.bind".to_string(),
        value: config.http.bind.clone(),
        expected: format!("a [host:]port address ({e})"),
    })?;
    Ok(())
}

// ============================================================================
// Environment expansion
// ============================================================================

/// Expands environment references in raw config text.
///
/// - `${VAR}` expands to the value, or to nothing with a warning if unset
/// - `${VAR:-default}` falls back to `default`
/// - `${VAR:?message}` fails with `message` if unset
/// - `$$` is a literal `$`
///
/// Any other `$` is copied through.
fn expand_env(
    raw: &str,
    source: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(String, Vec<LoadWarning>), ConfigError> {
    let mut out = String::with_capacity(raw.len());
    let mut warnings = Vec::new();

    for (line_no, line) in raw.split_inclusive('\n').enumerate() {
        let location = || format!("{}:{}", source.display(), line_no + 1);
        let mut rest = line;

        while let Some(dollar) = rest.find('$') {
            out.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
            } else if let Some(body) = after.strip_prefix('{') {
                let close = body.find('}').ok_or_else(|| ConfigError::ParseError {
                    path: source.to_path_buf(),
                    line: Some(line_no + 1),
                    message: format!("unclosed environment reference: ${{{}", body.trim_end()),
                })?;
                let reference = EnvReference::parse(&body[..close]);

                match (lookup(reference.name), reference.fallback) {
                    (Some(value), _) => out.push_str(&value),
                    (None, Fallback::Default(default)) => out.push_str(default),
                    (None, Fallback::Required(message)) => {
                        return Err(ConfigError::EnvVarNotSet {
                            var: reference.name.to_string(),
                            location: format!("{}: {message}", location()),
                        });
                    }
                    (None, Fallback::Empty) => warnings.push(LoadWarning {
                        message: format!(
                            "environment variable '{}' is not set, using empty string",
                            reference.name
                        ),
                        location: Some(location()),
                    }),
                }
                rest = &body[close + 1..];
            } else {
                out.push('$');
                rest = after;
            }
        }
        out.push_str(rest);
    }

    Ok((out, warnings))
}

#[derive(Debug, PartialEq, Eq)]
enum Fallback<'a> {
    Empty,
    Default(&'a str),
    Required(&'a str),
}

#[derive(Debug, PartialEq, Eq)]
struct EnvReference<'a> {
    name: &'a str,
    fallback: Fallback<'a>,
}

impl<'a> EnvReference<'a> {
    fn parse(spec: &'a str) -> Self {
        if let Some((name, default)) = spec.split_once(":-") {
            Self {
                name,
                fallback: Fallback::Default(default),
            }
        } else if let Some((name, message)) = spec.split_once(":?") {
            Self {
                name,
                fallback: Fallback::Required(message),
            }
        } else {
            Self {
                name: spec,
                fallback: Fallback::Empty,
            }
        }
    }
}

/// Reads `name` from the environment, falling back to `default` when unset
/// or unparseable.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
