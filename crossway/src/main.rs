//! `Crossway`: four-way intersection signal controller

use clap::Parser;
use tokio_util::sync::CancellationToken;

use crossway::cli::args::Cli;
use crossway::cli::commands;
use crossway::error::ExitCode;
use crossway::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests are not failures.
            let code = if e.use_stderr() {
                ExitCode::USAGE_ERROR
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.log_format, cli.effective_verbosity(), cli.color);

    let cancel = CancellationToken::new();

    // First signal requests graceful shutdown, a second one forces exit.
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            tracing::warn!("failed to register SIGTERM handler");
            return;
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }

        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        signal_cancel.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
        }
    });

    match commands::dispatch(cli, cancel).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
