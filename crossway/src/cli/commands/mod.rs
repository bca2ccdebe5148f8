//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod run;
pub mod validate;
pub mod version;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::error::CrosswayError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// `cancel` is the process-wide shutdown token; only `run` waits on it.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), CrosswayError> {
    match cli.command {
        Commands::Run(args) => run::run(&args, cancel).await,
        Commands::Validate(args) => validate::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
