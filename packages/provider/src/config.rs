use std::env;
use std::net::SocketAddr;

use crate::services::logzio::DEFAULT_BASE_URL;

/// Default listen address; port 0 lets the OS pick a free port that is then
/// reported to the host in the handshake line.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:0";

#[derive(Debug, Clone)]
pub struct Config {
    /// Fallback token used when the host's provider block omits `api_token`.
    pub api_token: Option<String>,
    pub base_url: String,
    pub listen_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let api_token = env::var("LOGZIO_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let base_url = env::var("LOGZIO_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let listen_addr = env::var("PROVIDER_LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|_| "PROVIDER_LISTEN_ADDR must be a valid socket address")?;

        Ok(Self {
            api_token,
            base_url,
            listen_addr,
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        api_token: Option<String>,
        base_url: Option<String>,
        listen_addr: Option<SocketAddr>,
    ) -> Self {
        if let Some(token) = api_token {
            self.api_token = Some(token);
        }
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(addr) = listen_addr {
            self.listen_addr = addr;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_values() {
        let config = Config {
            api_token: Some("env-token".into()),
            ..Config::default()
        }
        .with_overrides(None, Some("https://api-eu.logz.io".into()), None);

        assert_eq!(config.api_token.as_deref(), Some("env-token"));
        assert_eq!(config.base_url, "https://api-eu.logz.io");
        assert_eq!(config.listen_addr.port(), 0);
    }
}
