use thiserror::Error;

/// Unified provider error.
///
/// Local failures (bad configuration, malformed IDs, unknown resource types)
/// carry a descriptive message. Failures reported by the Logz.io API keep the
/// status and response body exactly as the service sent them.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Logz.io API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid resource ID '{0}': expected a numeric identifier")]
    InvalidId(String),

    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    #[error("Provider is not configured; call configure with an api_token first")]
    NotConfigured,
}

impl ProviderError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Config(_) => "config",
            ProviderError::Network(_) => "network",
            ProviderError::Parse(_) => "parse",
            ProviderError::Validation(_) => "validation",
            ProviderError::NotFound(_) => "not_found",
            ProviderError::Api { .. } => "api",
            ProviderError::InvalidId(_) => "invalid_id",
            ProviderError::UnknownResource(_) => "unknown_resource",
            ProviderError::NotConfigured => "not_configured",
        }
    }
}
