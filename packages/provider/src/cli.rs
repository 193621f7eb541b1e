use std::net::SocketAddr;

use clap::Parser;

/// Logz.io provider plugin CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "logzio-provider",
    version,
    about = "Manage Logz.io alerts, notification endpoints and users from declarative configuration"
)]
pub struct Cli {
    /// Address the plugin listens on (reported in the handshake line)
    #[arg(long)]
    pub listen_addr: Option<SocketAddr>,

    /// Logz.io API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Logz.io API token used when the provider block does not set one
    #[arg(long)]
    pub api_token: Option<String>,
}
