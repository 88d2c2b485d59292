// # homeipd - homeip daemon
//
// Thin integration layer: reads the YAML config, wires the Cloudflare
// provider and HTTP IP source into the core reconciler, and runs the
// scheduler until SIGTERM or SIGINT.
//
// All DNS logic lives in homeip-core.
//
// ## Configuration
//
// - `--config` / `-c` / `-config` (env `HOMEIP_CONFIG`): YAML config path, default `./config.yaml`
// - `HOMEIP_API_TOKEN`: overrides `token` from the file
// - `RUST_LOG`: overrides `log.level` from the file
//
// ## Example
//
// ```bash
// export HOMEIP_API_TOKEN=your_token
// homeipd --config /etc/homeip/config.yaml
// ```

use anyhow::{Context, Result};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use homeip_core::config::LogFormat;
use homeip_core::{AppConfig, Reconciler, Scheduler, SchedulerEvent};
use homeip_ip_http::HttpIpSource;
use homeip_provider_cloudflare::CloudflareProvider;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Environment variable that overrides the configured API token
const TOKEN_ENV: &str = "HOMEIP_API_TOKEN";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum HomeipExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<HomeipExitCode> for ExitCode {
    fn from(code: HomeipExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep Cloudflare A records pointed at this host's public IPv4 address
#[derive(Debug, Parser)]
#[command(name = "homeipd", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "HOMEIP_CONFIG", default_value = "./config.yaml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

/// Rewrite the single-dash `-config` long form to `--config`
///
/// clap would otherwise read `-config` as `-c onfig`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let rewritten = match arg.to_str() {
                Some("-config") => Some(OsString::from("--config")),
                Some(s) if s.starts_with("-config=") => Some(OsString::from(format!("-{}", s))),
                _ => None,
            };
            rewritten.unwrap_or(arg)
        })
        .collect()
}

/// Load, override and validate the configuration
fn load_config(args: &Args) -> homeip_core::Result<AppConfig> {
    let mut config = AppConfig::from_file(&args.config)?;
    config.apply_token_override(std::env::var(TOKEN_ENV).ok());
    config.validate()?;
    Ok(config)
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.log.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

fn main() -> ExitCode {
    let args = Args::parse_from(normalize_args(std::env::args_os()));

    let config = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return HomeipExitCode::ConfigError.into();
        }
    };

    if args.check {
        println!(
            "Configuration OK: {} entr{} in {}",
            config.domains.len(),
            if config.domains.len() == 1 { "y" } else { "ies" },
            args.config.display()
        );
        return HomeipExitCode::CleanShutdown.into();
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("{:#}", e);
        return HomeipExitCode::ConfigError.into();
    }

    info!(config = %args.config.display(), "Starting homeipd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HomeipExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Wire components and run until a shutdown signal arrives
async fn run_daemon(config: AppConfig) -> HomeipExitCode {
    let (scheduler, events) = match build_scheduler(&config) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return HomeipExitCode::ConfigError;
        }
    };

    let event_logger = tokio::spawn(log_events(events));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let runner = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move {
            scheduler
                .run(async {
                    let _ = shutdown_rx.await;
                })
                .await
        })
    };

    match wait_for_shutdown().await {
        Ok(signal) => info!("Received {}, shutting down", signal),
        Err(e) => error!("Signal handling failed, shutting down: {:#}", e),
    }

    // The scheduler may already have stopped on its own.
    let _ = shutdown_tx.send(());

    let code = match runner.await {
        Ok(Ok(())) => HomeipExitCode::CleanShutdown,
        Ok(Err(e)) => {
            error!("Scheduler error: {}", e);
            HomeipExitCode::RuntimeError
        }
        Err(e) => {
            error!("Scheduler task panicked: {}", e);
            HomeipExitCode::RuntimeError
        }
    };

    // Dropping the scheduler closes the event channel and ends the logger.
    drop(scheduler);
    if let Err(e) = event_logger.await {
        warn!("Event logger ended abnormally: {}", e);
    }

    info!("homeipd stopped");
    code
}

/// Build provider, IP source, reconciler and scheduler from the config
fn build_scheduler(
    config: &AppConfig,
) -> Result<(Arc<Scheduler>, mpsc::Receiver<SchedulerEvent>)> {
    let provider = CloudflareProvider::from_config(config.token.clone(), &config.provider)
        .context("Failed to create Cloudflare provider")?;

    let ip_source =
        HttpIpSource::from_config(&config.ip_source).context("Failed to create IP source")?;

    let reconciler = Reconciler::new(
        Arc::new(provider),
        Arc::new(ip_source),
        config.update.clone(),
        config.reconcile.clone(),
    );

    let (scheduler, events) = Scheduler::new(
        Arc::new(reconciler),
        config.domains.clone(),
        &config.schedule,
    );

    Ok((Arc::new(scheduler), events))
}

/// Forward scheduler events to the log
async fn log_events(mut events: mpsc::Receiver<SchedulerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SchedulerEvent::CycleCompleted {
                cycle,
                updated,
                failed,
                skipped,
            } if failed > 0 || skipped > 0 => {
                warn!(cycle, updated, failed, skipped, "Cycle finished with failures");
            }
            other => debug!(event = ?other, "Scheduler event"),
        }
    }
}

/// Wait for SIGTERM or SIGINT
///
/// No timeout: the daemon runs until it is told to stop.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(received)
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
