use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;

use logzio_provider::api::{create_router, PluginState};
use logzio_provider::cli::Cli;
use logzio_provider::config::Config;
use logzio_provider::error::ProviderError;
use logzio_provider::logging::init_logging;
use logzio_provider::metrics::ProviderMetrics;
use logzio_provider::provider::{handshake_line, Provider};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    if let Err(err) = run(Cli::parse()).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ProviderError> {
    let config = Config::from_env()
        .map_err(ProviderError::Config)?
        .with_overrides(cli.api_token, cli.base_url, cli.listen_addr);

    tracing::info!(
        base_url = %config.base_url,
        listen_addr = %config.listen_addr,
        token_from_env = config.api_token.is_some(),
        "Starting Logz.io provider"
    );

    let metrics = Arc::new(
        ProviderMetrics::new().map_err(|err| ProviderError::Config(err.to_string()))?,
    );
    let provider = Arc::new(Provider::new(config.clone(), metrics.clone()));
    let app = create_router(PluginState { provider, metrics });

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|err| ProviderError::Network(format!("bind {}: {}", config.listen_addr, err)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|err| ProviderError::Network(err.to_string()))?;

    // The host reads exactly one line from stdout to find us.
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", handshake_line(local_addr))
        .and_then(|_| stdout.flush())
        .map_err(|err| ProviderError::Network(format!("handshake: {}", err)))?;
    tracing::info!(%local_addr, "Plugin listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| ProviderError::Network(err.to_string()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
