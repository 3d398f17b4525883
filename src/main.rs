use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use tracing_subscriber::EnvFilter;

use lights_gateway::{LanConnector, Orchestrator, Registry, SessionManager, Settings, api};

/// Control a set of smart lights and plugs over HTTP
#[derive(Parser)]
#[command(name = "lights-gateway", version, about)]
struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the settings file)
    #[arg(long)]
    bind: Option<std::net::IpAddr>,

    /// Port to listen on (overrides the settings file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "lights_gateway=debug,info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        settings.bind = bind;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    if settings.devices.is_empty() {
        info!("No devices configured; every request will get an empty result");
    }

    let connector = Arc::new(LanConnector);
    let credentials = settings.credentials();
    let registry = Registry::connect_all(
        settings.endpoints(),
        connector.as_ref(),
        &credentials,
        settings.connect_timeout(),
    )
    .await;
    info!(
        "{} of {} device(s) connected",
        registry.connected(),
        registry.len()
    );

    let sessions = SessionManager::new(Arc::new(registry), connector, credentials);
    let orchestrator = Orchestrator::new(sessions, settings.device_timeout());

    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, api::router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}
