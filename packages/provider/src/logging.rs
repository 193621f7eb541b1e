use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging for the plugin.
///
/// Logs go to stderr: stdout is reserved for the handshake line the host
/// reads on startup. Must be called once, in main.rs.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    info!("Logging initialized");
}
