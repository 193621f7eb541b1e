//! The CRUD contract every managed resource implements.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::provider::schema::Schema;
use crate::services::LogzioClient;

/// A resource type the host can manage.
///
/// State values are JSON objects holding the resource's attributes plus a
/// string `id`. `create` and `update` receive configuration that already
/// passed [`Schema::validate`] and had defaults applied.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Host-visible type name, e.g. `logzio_alert`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Rewrite validated configuration into the form `read` reports, so
    /// equivalent spellings do not show up as changes. Runs after defaults
    /// are applied.
    fn normalize(&self, _config: &mut Value) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn create(&self, client: &LogzioClient, config: Value) -> Result<Value, ProviderError>;

    async fn read(&self, client: &LogzioClient, id: &str) -> Result<Value, ProviderError>;

    async fn update(
        &self,
        client: &LogzioClient,
        id: &str,
        prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError>;

    async fn delete(&self, client: &LogzioClient, id: &str) -> Result<(), ProviderError>;
}

/// Parse a host-side resource ID into the numeric ID Logz.io assigns.
pub fn parse_id(id: &str) -> Result<i64, ProviderError> {
    id.trim()
        .parse::<i64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| ProviderError::InvalidId(id.to_string()))
}

/// Deserialize validated configuration into a resource's typed config struct.
pub fn decode_config<T: DeserializeOwned>(resource: &str, config: Value) -> Result<T, ProviderError> {
    serde_json::from_value(config)
        .map_err(|err| ProviderError::validation(format!("invalid {} configuration: {}", resource, err)))
}

/// Serialize a state struct and stamp the string `id` the host tracks.
pub fn encode_state<T: Serialize>(id: i64, state: &T) -> Result<Value, ProviderError> {
    let mut value = serde_json::to_value(state).map_err(|err| ProviderError::parse(err.to_string()))?;
    match value.as_object_mut() {
        Some(object) => {
            object.insert("id".to_string(), Value::String(id.to_string()));
            Ok(value)
        }
        None => Err(ProviderError::parse("resource state must serialize to an object")),
    }
}
