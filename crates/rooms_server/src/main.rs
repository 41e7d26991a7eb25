//! Tic-tac-toe rooms server binary.

use anyhow::{Context, Result};
use clap::Parser;
use rooms_server::{
    AppState, Cli, Command, ExpirySweeper, Registry, ServerConfig, SessionEngine, StatePublisher,
    router,
};
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            poll_interval_ms,
            turn_policy,
            room_ttl_secs,
        } => {
            let mut config = ServerConfig::load(config.as_deref())?;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(ms) = poll_interval_ms {
                config = config.with_poll_interval_ms(ms);
            }
            if let Some(policy) = turn_policy {
                config = config.with_turn_policy(policy);
            }
            if let Some(ttl) = room_ttl_secs {
                config = config.with_room_ttl_secs(ttl);
            }
            config.validate()?;
            run_server(config).await
        }
        Command::PrintConfig { config } => print_config(config),
    }
}

fn init_tracing(config: &ServerConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();
}

/// Run the HTTP game server
async fn run_server(config: ServerConfig) -> Result<()> {
    init_tracing(&config);
    serve(config).await
}

#[instrument(skip_all, fields(bind = %config.bind_addr()))]
async fn serve(config: ServerConfig) -> Result<()> {
    info!(policy = %config.turn_policy(), "Starting tic-tac-toe room server");

    let registry = Registry::new();
    let engine = SessionEngine::new(registry.clone(), *config.turn_policy());
    let publisher = StatePublisher::new(registry, config.poll_interval());

    let sweeper = config
        .room_ttl()
        .map(|ttl| ExpirySweeper::new(engine.clone(), ttl, config.sweep_interval()).spawn());

    let app = router(AppState::new(engine, publisher, *config.stream_buffer()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!("Server ready at http://{}/", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

fn print_config(path: Option<PathBuf>) -> Result<()> {
    let config = ServerConfig::load(path.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}
