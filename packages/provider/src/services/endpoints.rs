//! Notification endpoints API (`/v1/endpoints`).
//!
//! Logz.io models every endpoint kind as one flat JSON object tagged by
//! `endpointType`, with only the fields of that kind filled in. Here the
//! payload is an enum instead, so an [`Endpoint`] always carries exactly one
//! kind's fields; [`EndpointWire`] does the conversion at the edge.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::services::logzio::{CreatedId, LogzioClient};

const ENDPOINTS_PATH: &str = "/v1/endpoints";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointType {
    Slack,
    Custom,
    PagerDuty,
    BigPanda,
    DataDog,
    VictorOps,
}

impl EndpointType {
    pub const ALL: [EndpointType; 6] = [
        EndpointType::Slack,
        EndpointType::Custom,
        EndpointType::PagerDuty,
        EndpointType::BigPanda,
        EndpointType::DataDog,
        EndpointType::VictorOps,
    ];

    /// Tag used in declarative configuration, e.g. `endpoint_type = "pagerduty"`.
    pub fn config_name(&self) -> &'static str {
        match self {
            EndpointType::Slack => "slack",
            EndpointType::Custom => "custom",
            EndpointType::PagerDuty => "pagerduty",
            EndpointType::BigPanda => "bigpanda",
            EndpointType::DataDog => "datadog",
            EndpointType::VictorOps => "victorops",
        }
    }

    /// Value of `endpointType` in API bodies.
    pub fn api_name(&self) -> &'static str {
        match self {
            EndpointType::Slack => "Slack",
            EndpointType::Custom => "Custom",
            EndpointType::PagerDuty => "PagerDuty",
            EndpointType::BigPanda => "BigPanda",
            EndpointType::DataDog => "Datadog",
            EndpointType::VictorOps => "VictorOps",
        }
    }

    /// Path segment for create and update calls.
    pub fn path_segment(&self) -> &'static str {
        match self {
            EndpointType::Slack => "slack",
            EndpointType::Custom => "custom",
            EndpointType::PagerDuty => "pager-duty",
            EndpointType::BigPanda => "big-panda",
            EndpointType::DataDog => "data-dog",
            EndpointType::VictorOps => "victorops",
        }
    }

    fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.api_name().eq_ignore_ascii_case(name))
    }
}

impl FromStr for EndpointType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.config_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|k| k.config_name()).collect();
                ProviderError::validation(format!(
                    "unrecognized endpoint_type '{}'. Must be one of: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(ProviderError::validation(format!(
                "unsupported HTTP method '{}'. Must be one of: GET, POST, PUT, DELETE",
                s
            ))),
        }
    }
}

/// Type-specific endpoint fields.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointPayload {
    Slack {
        url: String,
    },
    Custom {
        url: String,
        method: HttpMethod,
        headers: BTreeMap<String, String>,
        body_template: Value,
    },
    PagerDuty {
        service_key: String,
    },
    BigPanda {
        api_token: String,
        app_key: String,
    },
    DataDog {
        api_key: String,
    },
    VictorOps {
        routing_key: String,
        message_type: String,
        service_api_key: String,
    },
}

impl EndpointPayload {
    pub fn endpoint_type(&self) -> EndpointType {
        match self {
            EndpointPayload::Slack { .. } => EndpointType::Slack,
            EndpointPayload::Custom { .. } => EndpointType::Custom,
            EndpointPayload::PagerDuty { .. } => EndpointType::PagerDuty,
            EndpointPayload::BigPanda { .. } => EndpointType::BigPanda,
            EndpointPayload::DataDog { .. } => EndpointType::DataDog,
            EndpointPayload::VictorOps { .. } => EndpointType::VictorOps,
        }
    }
}

/// Create/update input.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRequest {
    pub title: String,
    pub description: String,
    pub payload: EndpointPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub payload: EndpointPayload,
}

/// The flat JSON shape Logz.io sends and accepts.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_template: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_api_key: Option<String>,
}

/// Encode custom headers the way the API stores them: `k=v,k=v`, ordered by key.
pub fn encode_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Inverse of [`encode_headers`]. Pairs without `=` are skipped.
pub fn decode_headers(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn required(field: Option<String>, name: &str, kind: EndpointType) -> Result<String, ProviderError> {
    field.ok_or_else(|| {
        ProviderError::parse(format!(
            "{} endpoint response is missing '{}'",
            kind.api_name(),
            name
        ))
    })
}

impl From<&EndpointRequest> for EndpointWire {
    fn from(request: &EndpointRequest) -> Self {
        let mut wire = EndpointWire {
            endpoint_type: Some(request.payload.endpoint_type().api_name().to_string()),
            title: request.title.clone(),
            description: request.description.clone(),
            ..EndpointWire::default()
        };

        match &request.payload {
            EndpointPayload::Slack { url } => {
                wire.url = Some(url.clone());
            }
            EndpointPayload::Custom {
                url,
                method,
                headers,
                body_template,
            } => {
                wire.url = Some(url.clone());
                wire.method = Some(method.as_str().to_string());
                wire.headers = Some(encode_headers(headers));
                wire.body_template = Some(body_template.clone());
            }
            EndpointPayload::PagerDuty { service_key } => {
                wire.service_key = Some(service_key.clone());
            }
            EndpointPayload::BigPanda { api_token, app_key } => {
                wire.api_token = Some(api_token.clone());
                wire.app_key = Some(app_key.clone());
            }
            EndpointPayload::DataDog { api_key } => {
                wire.api_key = Some(api_key.clone());
            }
            EndpointPayload::VictorOps {
                routing_key,
                message_type,
                service_api_key,
            } => {
                wire.routing_key = Some(routing_key.clone());
                wire.message_type = Some(message_type.clone());
                wire.service_api_key = Some(service_api_key.clone());
            }
        }

        wire
    }
}

impl TryFrom<EndpointWire> for Endpoint {
    type Error = ProviderError;

    fn try_from(wire: EndpointWire) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .ok_or_else(|| ProviderError::parse("endpoint response is missing 'id'"))?;
        let type_name = wire
            .endpoint_type
            .ok_or_else(|| ProviderError::parse("endpoint response is missing 'endpointType'"))?;
        let kind = EndpointType::from_api_name(&type_name).ok_or_else(|| {
            ProviderError::parse(format!("unrecognized endpointType '{}' in response", type_name))
        })?;

        let payload = match kind {
            EndpointType::Slack => EndpointPayload::Slack {
                url: required(wire.url, "url", kind)?,
            },
            EndpointType::Custom => EndpointPayload::Custom {
                url: required(wire.url, "url", kind)?,
                method: required(wire.method, "method", kind)?.parse()?,
                headers: wire.headers.as_deref().map(decode_headers).unwrap_or_default(),
                body_template: wire.body_template.unwrap_or(Value::Null),
            },
            EndpointType::PagerDuty => EndpointPayload::PagerDuty {
                service_key: required(wire.service_key, "serviceKey", kind)?,
            },
            EndpointType::BigPanda => EndpointPayload::BigPanda {
                api_token: required(wire.api_token, "apiToken", kind)?,
                app_key: required(wire.app_key, "appKey", kind)?,
            },
            EndpointType::DataDog => EndpointPayload::DataDog {
                api_key: required(wire.api_key, "apiKey", kind)?,
            },
            EndpointType::VictorOps => EndpointPayload::VictorOps {
                routing_key: required(wire.routing_key, "routingKey", kind)?,
                message_type: required(wire.message_type, "messageType", kind)?,
                service_api_key: required(wire.service_api_key, "serviceApiKey", kind)?,
            },
        };

        Ok(Endpoint {
            id,
            title: wire.title,
            description: wire.description,
            payload,
        })
    }
}

impl LogzioClient {
    pub async fn create_endpoint(&self, request: &EndpointRequest) -> Result<i64, ProviderError> {
        let path = format!(
            "{}/{}",
            ENDPOINTS_PATH,
            request.payload.endpoint_type().path_segment()
        );
        let created: CreatedId = self.post_json(&path, &EndpointWire::from(request)).await?;
        Ok(created.id)
    }

    pub async fn get_endpoint(&self, endpoint_id: i64) -> Result<Endpoint, ProviderError> {
        let wire: EndpointWire = self
            .get_json(&format!("{}/{}", ENDPOINTS_PATH, endpoint_id))
            .await?;
        Endpoint::try_from(wire)
    }

    pub async fn update_endpoint(
        &self,
        endpoint_id: i64,
        request: &EndpointRequest,
    ) -> Result<(), ProviderError> {
        let path = format!(
            "{}/{}/{}",
            ENDPOINTS_PATH,
            request.payload.endpoint_type().path_segment(),
            endpoint_id
        );
        self.put_discard(&path, &EndpointWire::from(request)).await
    }

    pub async fn delete_endpoint(&self, endpoint_id: i64) -> Result<(), ProviderError> {
        self.delete(&format!("{}/{}", ENDPOINTS_PATH, endpoint_id))
            .await
    }

    /// Endpoints whose type this client does not model are skipped.
    pub async fn list_endpoints(&self) -> Result<Vec<Endpoint>, ProviderError> {
        let wires: Vec<EndpointWire> = self.get_json(ENDPOINTS_PATH).await?;
        let mut endpoints = Vec::with_capacity(wires.len());
        for wire in wires {
            match Endpoint::try_from(wire) {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(err) => tracing::warn!("Skipping endpoint in list response: {}", err),
            }
        }
        Ok(endpoints)
    }
}
