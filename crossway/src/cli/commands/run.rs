//! `run` command: start the controller and its HTTP API.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::args::RunArgs;
use crate::config::{ConfigLoader, ControllerConfig, LoadWarning, validate};
use crate::error::CrosswayError;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::{init_metrics, metrics};
use crate::scheduler::{PhaseScheduler, SchedulerConfig};
use crate::transport::{HttpConfig, HttpServer, parse_bind_addr};

/// How often the uptime gauge is refreshed.
const UPTIME_INTERVAL: Duration = Duration::from_secs(5);

/// Runs the controller until `cancel` fires.
///
/// # Errors
///
/// Returns a config error for an invalid file or override, a transport
/// error if the API cannot bind, or a scheduler error if the first phase
/// trips the conflict guard.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), CrosswayError> {
    let config = resolve_config(args)?;

    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    let events = Arc::new(event_sink(args.events_file.as_deref())?);

    let scheduler = Arc::new(
        PhaseScheduler::new(SchedulerConfig::from(&config))?.with_events(Arc::clone(&events)),
    );

    let bind_addr = parse_bind_addr(&config.http.bind)?;
    let server = HttpServer::bind(
        HttpConfig::new(bind_addr),
        Arc::clone(&scheduler),
        cancel.clone(),
    )
    .await?;
    let bound_addr = server.local_addr();

    if let Err(e) = scheduler.start() {
        cancel.cancel();
        return Err(e.into());
    }

    events.emit(Event::ServerStarted {
        timestamp: Utc::now(),
        bind_addr: bound_addr.to_string(),
        history_size: scheduler.history_size(),
    });
    info!(%bound_addr, "HTTP server listening");

    spawn_uptime_ticker(cancel.clone());

    cancel.cancelled().await;
    info!("shutdown requested");
    scheduler.stop();
    server.wait().await?;

    events.emit(Event::ServerStopped {
        timestamp: Utc::now(),
        reason: "shutdown signal".to_string(),
    });
    Ok(())
}

/// Builds the effective configuration: defaults, then the file, then
/// CLI/env overrides, validated as a whole.
fn resolve_config(args: &RunArgs) -> Result<ControllerConfig, CrosswayError> {
    let mut config = match args.config {
        Some(ref path) => {
            info!(config = %path.display(), "loading configuration");
            let loaded = ConfigLoader::with_defaults().load(path)?;
            log_warnings(&loaded.warnings);
            (*loaded.config).clone()
        }
        None => ControllerConfig::default(),
    };

    apply_overrides(&mut config, args);
    validate(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut ControllerConfig, args: &RunArgs) {
    if let Some(ref bind) = args.http {
        config.http.bind.clone_from(bind);
    }
    if let Some(size) = args.history_size {
        config.history.max_records = usize::try_from(size).unwrap_or(usize::MAX);
    }
}

/// Opens the event stream target; `-` means stderr.
fn event_sink(path: Option<&Path>) -> std::io::Result<EventEmitter> {
    match path {
        Some(p) if p == Path::new("-") => Ok(EventEmitter::stderr()),
        Some(p) => EventEmitter::from_file(p),
        None => Ok(EventEmitter::noop()),
    }
}

fn log_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
}

fn spawn_uptime_ticker(cancel: CancellationToken) {
    let started = Instant::now();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_INTERVAL);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => metrics::set_uptime(started.elapsed()),
            }
        }
    });
}
