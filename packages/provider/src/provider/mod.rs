//! Plugin contract: provider configuration, resource registry and dispatch.
//!
//! The host drives everything through [`Provider`]: it fetches the schema,
//! configures the provider with an API token once, then calls
//! create/read/update/delete per resource type. Each call validates the
//! configuration against the resource schema, applies defaults, and forwards
//! to the matching [`Resource`].

pub mod resource;
pub mod schema;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::ProviderError;
use crate::metrics::ProviderMetrics;
use crate::resources;
use crate::services::LogzioClient;

pub use resource::{parse_id, Resource};
pub use schema::{Attribute, AttributeType, ProviderSchema, Schema};

pub const HANDSHAKE_PREFIX: &str = "LOGZIO_PROVIDER";
pub const PROTOCOL_VERSION: u32 = 1;

/// The single line printed to stdout once the plugin is listening.
pub fn handshake_line(addr: SocketAddr) -> String {
    format!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr)
}

/// Provider block as sent by the host.
#[derive(Debug, Deserialize)]
struct ProviderConfig {
    api_token: String,
    #[serde(default)]
    base_url: Option<String>,
}

/// Outcome of comparing prior state with new configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResult {
    pub changed: Vec<String>,
    pub requires_replace: Vec<String>,
}

pub struct Provider {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    client: RwLock<Option<LogzioClient>>,
    defaults: Config,
    metrics: Arc<ProviderMetrics>,
}

impl Provider {
    /// Provider with the alert, endpoint and user resources registered.
    pub fn new(defaults: Config, metrics: Arc<ProviderMetrics>) -> Self {
        let resources = resources::all()
            .into_iter()
            .map(|resource| (resource.type_name(), resource))
            .collect();

        Self {
            resources,
            client: RwLock::new(None),
            defaults,
            metrics,
        }
    }

    pub fn provider_schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "api_token",
                Attribute::required_string()
                    .sensitive()
                    .with_description("Logz.io API token. Falls back to LOGZIO_API_TOKEN."),
            )
            .with_attribute(
                "base_url",
                Attribute::optional_string()
                    .with_description("Logz.io API base URL. Falls back to LOGZIO_BASE_URL."),
            )
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: Self::provider_schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, resource)| (name.to_string(), resource.schema()))
                .collect(),
        }
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Build the API client from the provider block.
    ///
    /// A missing `api_token` or `base_url` falls back to the environment
    /// configuration the plugin was started with.
    pub async fn configure(&self, mut config: Value) -> Result<(), ProviderError> {
        if config.is_null() {
            config = json!({});
        }
        if let Some(object) = config.as_object_mut() {
            let token_missing = object.get("api_token").map_or(true, Value::is_null);
            if token_missing {
                if let Some(token) = &self.defaults.api_token {
                    object.insert("api_token".to_string(), Value::String(token.clone()));
                }
            }
        }

        let problems = Self::provider_schema().validate(&config);
        if !problems.is_empty() {
            return Err(ProviderError::Config(problems.join("; ")));
        }

        let provider_config: ProviderConfig = serde_json::from_value(config)
            .map_err(|err| ProviderError::Config(err.to_string()))?;
        if provider_config.api_token.trim().is_empty() {
            return Err(ProviderError::Config("api_token must not be empty".to_string()));
        }

        let base_url = provider_config
            .base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.defaults.base_url.clone());

        tracing::info!(%base_url, "Provider configured");
        *self.client.write().await = Some(LogzioClient::new(provider_config.api_token, base_url));
        self.metrics.configured.set(1.0);
        Ok(())
    }

    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    pub async fn create(&self, type_name: &str, config: Value) -> Result<Value, ProviderError> {
        let started = Instant::now();
        let result = async {
            let resource = self.resource(type_name)?;
            let config = prepare(resource.as_ref(), config)?;
            let client = self.client().await?;
            resource.create(&client, config).await
        }
        .await;

        if let Ok(state) = &result {
            tracing::info!(resource = type_name, id = ?state.get("id"), "Created resource");
        }
        self.record(type_name, "create", started, &result);
        result
    }

    pub async fn read(&self, type_name: &str, id: &str) -> Result<Value, ProviderError> {
        let started = Instant::now();
        let result = async {
            let resource = self.resource(type_name)?;
            let client = self.client().await?;
            resource.read(&client, id).await
        }
        .await;

        self.record(type_name, "read", started, &result);
        result
    }

    pub async fn update(
        &self,
        type_name: &str,
        id: &str,
        prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let started = Instant::now();
        let result = async {
            let resource = self.resource(type_name)?;
            let config = prepare(resource.as_ref(), config)?;

            let plan = diff(&resource.schema(), &prior, &config);
            if !plan.requires_replace.is_empty() {
                return Err(ProviderError::validation(format!(
                    "changing {} requires replacing the {} resource",
                    plan.requires_replace.join(", "),
                    type_name
                )));
            }

            let client = self.client().await?;
            resource.update(&client, id, prior, config).await
        }
        .await;

        if result.is_ok() {
            tracing::info!(resource = type_name, id, "Updated resource");
        }
        self.record(type_name, "update", started, &result);
        result
    }

    pub async fn delete(&self, type_name: &str, id: &str) -> Result<(), ProviderError> {
        let started = Instant::now();
        let result = async {
            let resource = self.resource(type_name)?;
            let client = self.client().await?;
            resource.delete(&client, id).await
        }
        .await;

        if result.is_ok() {
            tracing::info!(resource = type_name, id, "Deleted resource");
        }
        self.record(type_name, "delete", started, &result);
        result
    }

    /// Report which attributes a new configuration changes relative to the
    /// prior state, and which of those force a replacement. Does not call
    /// the API.
    pub fn plan(&self, type_name: &str, prior: &Value, config: Value) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(type_name)?;
        let config = prepare(resource.as_ref(), config)?;
        Ok(diff(&resource.schema(), prior, &config))
    }

    fn resource(&self, type_name: &str) -> Result<Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(type_name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    async fn client(&self) -> Result<LogzioClient, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(ProviderError::NotConfigured)
    }

    fn record<T>(&self, type_name: &str, operation: &str, started: Instant, result: &Result<T, ProviderError>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(err) => {
                tracing::warn!(resource = type_name, operation, "Operation failed: {}", err);
                err.kind()
            }
        };
        self.metrics
            .observe(type_name, operation, outcome, started.elapsed().as_secs_f64());
    }
}

/// Validate configuration against the resource schema, fill defaults and
/// normalize it to the shape state is stored in.
fn prepare(resource: &dyn Resource, mut config: Value) -> Result<Value, ProviderError> {
    let schema = resource.schema();
    let problems = schema.validate(&config);
    if !problems.is_empty() {
        return Err(ProviderError::validation(format!(
            "{}: {}",
            resource.type_name(),
            problems.join("; ")
        )));
    }
    schema.apply_defaults(&mut config);
    resource.normalize(&mut config)?;
    Ok(config)
}

/// Compare configurable top-level attributes. Computed-only attributes are
/// owned by the remote service and never count as a change.
fn diff(schema: &Schema, prior: &Value, config: &Value) -> PlanResult {
    let mut changed = Vec::new();
    let mut requires_replace = Vec::new();

    for (name, attr) in &schema.attributes {
        if attr.computed && !attr.optional && !attr.required {
            continue;
        }
        let before = prior.get(name).unwrap_or(&Value::Null);
        let after = config.get(name).unwrap_or(&Value::Null);
        if before != after {
            changed.push(name.clone());
            if attr.force_new && !prior.is_null() {
                requires_replace.push(name.clone());
            }
        }
    }

    PlanResult {
        changed,
        requires_replace,
    }
}
