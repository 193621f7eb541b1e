//! `logzio_endpoint`: notification channels alerts deliver to.
//!
//! Configuration carries an `endpoint_type` tag plus one block named after
//! it (`slack { url = ... }`, `custom { ... }`, ...). Mapping checks that
//! exactly the matching block is present and turns it into an
//! [`EndpointPayload`]; reads do the reverse, so state only ever holds the
//! block for the endpoint's own type.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::provider::resource::{decode_config, encode_state, parse_id, Resource};
use crate::provider::schema::{Attribute, AttributeType, Schema};
use crate::resources::validation;
use crate::services::endpoints::{
    Endpoint, EndpointPayload, EndpointRequest, EndpointType, HttpMethod,
};
use crate::services::LogzioClient;

pub const TYPE_NAME: &str = "logzio_endpoint";

pub struct EndpointResource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SlackBlock {
    url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CustomBlock {
    url: String,
    method: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    /// JSON document as text.
    #[serde(default)]
    body_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PagerDutyBlock {
    service_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BigPandaBlock {
    api_token: String,
    app_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DataDogBlock {
    api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct VictorOpsBlock {
    routing_key: String,
    message_type: String,
    service_api_key: String,
}

/// Used both to decode configuration and to encode state.
#[derive(Debug, Default, Serialize, Deserialize)]
struct EndpointDocument {
    endpoint_type: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slack: Option<SlackBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom: Option<CustomBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pagerduty: Option<PagerDutyBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bigpanda: Option<BigPandaBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datadog: Option<DataDogBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    victorops: Option<VictorOpsBlock>,
}

impl EndpointDocument {
    /// Names of the payload blocks that are set.
    fn present_blocks(&self) -> Vec<&'static str> {
        [
            ("slack", self.slack.is_some()),
            ("custom", self.custom.is_some()),
            ("pagerduty", self.pagerduty.is_some()),
            ("bigpanda", self.bigpanda.is_some()),
            ("datadog", self.datadog.is_some()),
            ("victorops", self.victorops.is_some()),
        ]
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| name)
        .collect()
    }

    fn into_request(self) -> Result<EndpointRequest, ProviderError> {
        let kind: EndpointType = self.endpoint_type.parse()?;
        validation::non_empty("title", &self.title)?;

        let expected = kind.config_name();
        let present = self.present_blocks();
        if let Some(other) = present.iter().find(|name| **name != expected) {
            return Err(ProviderError::validation(format!(
                "block '{}' does not match endpoint_type '{}'",
                other, expected
            )));
        }
        let missing = || {
            ProviderError::validation(format!(
                "endpoint_type '{}' requires a '{}' block",
                expected, expected
            ))
        };

        let payload = match kind {
            EndpointType::Slack => {
                let block = self.slack.ok_or_else(missing)?;
                validation::http_url("slack.url", &block.url)?;
                EndpointPayload::Slack { url: block.url }
            }
            EndpointType::Custom => {
                let block = self.custom.ok_or_else(missing)?;
                validation::http_url("custom.url", &block.url)?;
                validate_headers(&block.headers)?;
                EndpointPayload::Custom {
                    url: block.url,
                    method: block.method.parse()?,
                    headers: block.headers,
                    body_template: parse_body_template(&block.body_template)?,
                }
            }
            EndpointType::PagerDuty => {
                let block = self.pagerduty.ok_or_else(missing)?;
                validation::non_empty("pagerduty.service_key", &block.service_key)?;
                EndpointPayload::PagerDuty {
                    service_key: block.service_key,
                }
            }
            EndpointType::BigPanda => {
                let block = self.bigpanda.ok_or_else(missing)?;
                validation::non_empty("bigpanda.api_token", &block.api_token)?;
                validation::non_empty("bigpanda.app_key", &block.app_key)?;
                EndpointPayload::BigPanda {
                    api_token: block.api_token,
                    app_key: block.app_key,
                }
            }
            EndpointType::DataDog => {
                let block = self.datadog.ok_or_else(missing)?;
                validation::non_empty("datadog.api_key", &block.api_key)?;
                EndpointPayload::DataDog {
                    api_key: block.api_key,
                }
            }
            EndpointType::VictorOps => {
                let block = self.victorops.ok_or_else(missing)?;
                validation::non_empty("victorops.routing_key", &block.routing_key)?;
                validation::non_empty("victorops.message_type", &block.message_type)?;
                validation::non_empty("victorops.service_api_key", &block.service_api_key)?;
                EndpointPayload::VictorOps {
                    routing_key: block.routing_key,
                    message_type: block.message_type,
                    service_api_key: block.service_api_key,
                }
            }
        };

        Ok(EndpointRequest {
            title: self.title,
            description: self.description,
            payload,
        })
    }
}

fn parse_body_template(text: &str) -> Result<Value, ProviderError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|err| {
        ProviderError::validation(format!("custom.body_template must be valid JSON: {}", err))
    })
}

/// Body template text as state stores it: compact JSON, or empty.
fn body_template_text(template: &Value) -> String {
    if template.is_null() {
        String::new()
    } else {
        template.to_string()
    }
}

/// Headers travel to the API as one `k=v,k=v` string and must survive the
/// trip back unchanged.
fn validate_headers(headers: &BTreeMap<String, String>) -> Result<(), ProviderError> {
    for (key, value) in headers {
        if key.trim().is_empty() || key.contains([',', '=']) || key.trim() != key {
            return Err(ProviderError::validation(format!(
                "custom.headers key '{}' must be non-empty, must not contain ',' or '=' and must not start or end with whitespace",
                key
            )));
        }
        if value.contains(',') || value.trim() != value {
            return Err(ProviderError::validation(format!(
                "custom.headers value for '{}' must not contain ',' or start or end with whitespace",
                key
            )));
        }
    }
    Ok(())
}

impl From<Endpoint> for EndpointDocument {
    fn from(endpoint: Endpoint) -> Self {
        let mut document = EndpointDocument {
            endpoint_type: endpoint.payload.endpoint_type().config_name().to_string(),
            title: endpoint.title,
            description: endpoint.description,
            ..EndpointDocument::default()
        };

        match endpoint.payload {
            EndpointPayload::Slack { url } => document.slack = Some(SlackBlock { url }),
            EndpointPayload::Custom {
                url,
                method,
                headers,
                body_template,
            } => {
                document.custom = Some(CustomBlock {
                    url,
                    method: method.as_str().to_string(),
                    headers,
                    body_template: body_template_text(&body_template),
                });
            }
            EndpointPayload::PagerDuty { service_key } => {
                document.pagerduty = Some(PagerDutyBlock { service_key })
            }
            EndpointPayload::BigPanda { api_token, app_key } => {
                document.bigpanda = Some(BigPandaBlock { api_token, app_key })
            }
            EndpointPayload::DataDog { api_key } => {
                document.datadog = Some(DataDogBlock { api_key })
            }
            EndpointPayload::VictorOps {
                routing_key,
                message_type,
                service_api_key,
            } => {
                document.victorops = Some(VictorOpsBlock {
                    routing_key,
                    message_type,
                    service_api_key,
                })
            }
        }

        document
    }
}

fn state(endpoint: Endpoint) -> Result<Value, ProviderError> {
    let id = endpoint.id;
    encode_state(id, &EndpointDocument::from(endpoint))
}

#[async_trait]
impl Resource for EndpointResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let secret = || Attribute::required_string().sensitive();

        Schema::v0()
            .with_attribute(
                "endpoint_type",
                Attribute::required_string()
                    .force_new()
                    .with_description("slack, custom, pagerduty, bigpanda, datadog or victorops"),
            )
            .with_attribute("title", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string().with_default(json!("")))
            .with_attribute("slack", Attribute::block([("url", Attribute::required_string())]))
            .with_attribute(
                "custom",
                Attribute::block([
                    ("url", Attribute::required_string()),
                    ("method", Attribute::required_string()),
                    (
                        "headers",
                        Attribute::optional(AttributeType::StringMap).with_default(json!({})),
                    ),
                    ("body_template", Attribute::optional_string().with_default(json!(""))),
                ]),
            )
            .with_attribute("pagerduty", Attribute::block([("service_key", secret())]))
            .with_attribute(
                "bigpanda",
                Attribute::block([("api_token", secret()), ("app_key", secret())]),
            )
            .with_attribute("datadog", Attribute::block([("api_key", secret())]))
            .with_attribute(
                "victorops",
                Attribute::block([
                    ("routing_key", Attribute::required_string()),
                    ("message_type", Attribute::required_string()),
                    ("service_api_key", secret()),
                ]),
            )
    }

    /// Lowercases the type tag, uppercases the custom method and compacts
    /// the body template, matching what `read` produces.
    fn normalize(&self, config: &mut Value) -> Result<(), ProviderError> {
        let Some(object) = config.as_object_mut() else {
            return Ok(());
        };
        if let Some(Value::String(tag)) = object.get_mut("endpoint_type") {
            let kind: EndpointType = tag.parse()?;
            *tag = kind.config_name().to_string();
        }
        if let Some(Value::Object(custom)) = object.get_mut("custom") {
            if let Some(Value::String(method)) = custom.get_mut("method") {
                let parsed: HttpMethod = method.parse()?;
                *method = parsed.as_str().to_string();
            }
            if let Some(Value::String(template)) = custom.get_mut("body_template") {
                *template = body_template_text(&parse_body_template(template)?);
            }
        }
        Ok(())
    }

    async fn create(&self, client: &LogzioClient, config: Value) -> Result<Value, ProviderError> {
        let request = decode_config::<EndpointDocument>(TYPE_NAME, config)?.into_request()?;
        let endpoint_id = client.create_endpoint(&request).await?;
        state(client.get_endpoint(endpoint_id).await?)
    }

    async fn read(&self, client: &LogzioClient, id: &str) -> Result<Value, ProviderError> {
        state(client.get_endpoint(parse_id(id)?).await?)
    }

    async fn update(
        &self,
        client: &LogzioClient,
        id: &str,
        _prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let endpoint_id = parse_id(id)?;
        let request = decode_config::<EndpointDocument>(TYPE_NAME, config)?.into_request()?;
        client.update_endpoint(endpoint_id, &request).await?;
        state(client.get_endpoint(endpoint_id).await?)
    }

    async fn delete(&self, client: &LogzioClient, id: &str) -> Result<(), ProviderError> {
        client.delete_endpoint(parse_id(id)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn request_for(config: Value) -> Result<EndpointRequest, ProviderError> {
        decode_config::<EndpointDocument>(TYPE_NAME, config)?.into_request()
    }

    #[test]
    fn each_type_maps_to_its_payload() {
        let cases = vec![
            (
                json!({"endpoint_type": "slack", "title": "s", "slack": {"url": "https://hooks.slack.com/x"}}),
                EndpointType::Slack,
            ),
            (
                json!({"endpoint_type": "custom", "title": "c", "custom": {"url": "https://example.com", "method": "post"}}),
                EndpointType::Custom,
            ),
            (
                json!({"endpoint_type": "pagerduty", "title": "p", "pagerduty": {"service_key": "k"}}),
                EndpointType::PagerDuty,
            ),
            (
                json!({"endpoint_type": "bigpanda", "title": "b", "bigpanda": {"api_token": "t", "app_key": "a"}}),
                EndpointType::BigPanda,
            ),
            (
                json!({"endpoint_type": "datadog", "title": "d", "datadog": {"api_key": "k"}}),
                EndpointType::DataDog,
            ),
            (
                json!({"endpoint_type": "victorops", "title": "v", "victorops": {"routing_key": "r", "message_type": "CRITICAL", "service_api_key": "s"}}),
                EndpointType::VictorOps,
            ),
        ];

        for (config, expected) in cases {
            let request = request_for(config).unwrap();
            assert_eq!(request.payload.endpoint_type(), expected);
        }
    }

    #[test]
    fn unrecognized_type_tag_is_rejected() {
        let err = request_for(json!({"endpoint_type": "email", "title": "e"})).unwrap_err();
        assert!(err.to_string().contains("unrecognized endpoint_type 'email'"));
    }

    #[test]
    fn missing_block_is_rejected() {
        let err = request_for(json!({"endpoint_type": "datadog", "title": "d"})).unwrap_err();
        assert!(err.to_string().contains("requires a 'datadog' block"));
    }

    #[test]
    fn mismatched_block_is_rejected() {
        let err = request_for(json!({
            "endpoint_type": "slack",
            "title": "s",
            "slack": {"url": "https://hooks.slack.com/x"},
            "pagerduty": {"service_key": "k"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("block 'pagerduty' does not match endpoint_type 'slack'"));
    }

    #[test]
    fn custom_body_template_must_be_json() {
        let err = request_for(json!({
            "endpoint_type": "custom",
            "title": "c",
            "custom": {"url": "https://example.com", "method": "POST", "body_template": "{not json"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("body_template must be valid JSON"));
    }

    #[test]
    fn custom_fields_are_mapped() {
        let request = request_for(json!({
            "endpoint_type": "custom",
            "title": "c",
            "custom": {
                "url": "https://example.com/hook",
                "method": "put",
                "headers": {"X-Env": "prod"},
                "body_template": "{\"text\": \"{{alert_title}}\"}"
            }
        }))
        .unwrap();

        match request.payload {
            EndpointPayload::Custom { method, headers, body_template, .. } => {
                assert_eq!(method, HttpMethod::Put);
                assert_eq!(headers["X-Env"], "prod");
                assert_eq!(body_template, json!({"text": "{{alert_title}}"}));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn invalid_slack_url_is_rejected() {
        let err = request_for(json!({"endpoint_type": "slack", "title": "s", "slack": {"url": "slack-channel"}}))
            .unwrap_err();
        assert!(err.to_string().contains("slack.url"));
    }

    #[test]
    fn state_contains_only_the_selected_block() {
        let state = state(Endpoint {
            id: 12,
            title: "pd".to_string(),
            description: String::new(),
            payload: EndpointPayload::PagerDuty {
                service_key: "k".to_string(),
            },
        })
        .unwrap();

        assert_eq!(
            state,
            json!({
                "id": "12",
                "endpoint_type": "pagerduty",
                "title": "pd",
                "description": "",
                "pagerduty": {"service_key": "k"}
            })
        );
    }

    fn prepared(mut config: Value) -> Value {
        EndpointResource.schema().apply_defaults(&mut config);
        EndpointResource.normalize(&mut config).unwrap();
        config
    }

    fn state_without_id(endpoint: Endpoint) -> Value {
        let mut value = state(endpoint).unwrap();
        value.as_object_mut().unwrap().remove("id");
        value
    }

    #[test]
    fn normalized_type_tag_matches_state() {
        let config = prepared(json!({
            "endpoint_type": "Slack",
            "title": "team",
            "slack": {"url": "https://hooks.slack.com/x"}
        }));
        let read_back = state_without_id(Endpoint {
            id: 3,
            title: "team".to_string(),
            description: String::new(),
            payload: EndpointPayload::Slack {
                url: "https://hooks.slack.com/x".to_string(),
            },
        });
        assert_eq!(config, read_back);
    }

    #[test]
    fn minimal_custom_config_matches_read_back_state() {
        let config = prepared(json!({
            "endpoint_type": "custom",
            "title": "hook",
            "custom": {"url": "https://example.com/hook", "method": "post"}
        }));
        let read_back = state_without_id(Endpoint {
            id: 5,
            title: "hook".to_string(),
            description: String::new(),
            payload: EndpointPayload::Custom {
                url: "https://example.com/hook".to_string(),
                method: HttpMethod::Post,
                headers: BTreeMap::new(),
                body_template: Value::Null,
            },
        });
        assert_eq!(config, read_back);
    }

    #[test]
    fn body_template_is_compared_as_json() {
        let config = prepared(json!({
            "endpoint_type": "custom",
            "title": "hook",
            "custom": {
                "url": "https://example.com/hook",
                "method": "Post",
                "body_template": "{ \"text\":  \"x\" }"
            }
        }));
        assert_eq!(config["custom"]["method"], "POST");
        assert_eq!(config["custom"]["body_template"], "{\"text\":\"x\"}");

        let read_back = state_without_id(Endpoint {
            id: 5,
            title: "hook".to_string(),
            description: String::new(),
            payload: EndpointPayload::Custom {
                url: "https://example.com/hook".to_string(),
                method: HttpMethod::Post,
                headers: BTreeMap::new(),
                body_template: json!({"text": "x"}),
            },
        });
        assert_eq!(config, read_back);
    }

    #[test]
    fn normalize_rejects_unknown_method() {
        let mut config = json!({
            "endpoint_type": "custom",
            "title": "hook",
            "custom": {"url": "https://example.com/hook", "method": "PATCH"}
        });
        let err = EndpointResource.normalize(&mut config).unwrap_err();
        assert!(err.to_string().contains("unsupported HTTP method 'PATCH'"));
    }

    #[test]
    fn headers_that_cannot_round_trip_are_rejected() {
        let custom = |headers: Value| {
            json!({
                "endpoint_type": "custom",
                "title": "hook",
                "custom": {"url": "https://example.com/hook", "method": "POST", "headers": headers}
            })
        };

        let err = request_for(custom(json!({"Accept": "a, b"}))).unwrap_err();
        assert!(err.to_string().contains("custom.headers value for 'Accept'"));

        let err = request_for(custom(json!({"X=Y": "1"}))).unwrap_err();
        assert!(err.to_string().contains("custom.headers key 'X=Y'"));

        let err = request_for(custom(json!({"A,B": "1"}))).unwrap_err();
        assert!(err.to_string().contains("custom.headers key 'A,B'"));

        assert!(request_for(custom(json!({"Accept": "application/json"}))).is_ok());
    }

    #[tokio::test]
    async fn create_posts_then_reads_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/endpoints/slack"))
            .and(body_partial_json(json!({"title": "team", "url": "https://hooks.slack.com/services/x"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 21})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/endpoints/21"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 21,
                "endpointType": "Slack",
                "title": "team",
                "description": "",
                "url": "https://hooks.slack.com/services/x"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LogzioClient::new("t".into(), server.uri());
        let state = EndpointResource
            .create(
                &client,
                json!({
                    "endpoint_type": "slack",
                    "title": "team",
                    "description": "",
                    "slack": {"url": "https://hooks.slack.com/services/x"}
                }),
            )
            .await
            .unwrap();

        assert_eq!(state["id"], "21");
        assert_eq!(state["slack"]["url"], "https://hooks.slack.com/services/x");
    }
}
