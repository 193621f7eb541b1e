//! `logzio_alert`: saved searches that notify when a threshold is crossed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::provider::resource::{decode_config, encode_state, parse_id, Resource};
use crate::provider::schema::{Attribute, AttributeType, Schema};
use crate::resources::validation;
use crate::services::alerts::{
    Alert, AlertRequest, Operation, SeverityThreshold, ValueAggregationType,
};
use crate::services::LogzioClient;

pub const TYPE_NAME: &str = "logzio_alert";

pub struct AlertResource;

#[derive(Debug, Deserialize)]
struct AlertConfig {
    title: String,
    description: String,
    query_string: String,
    filter: String,
    operation: Operation,
    severity_threshold_tiers: Vec<SeverityThreshold>,
    search_timeframe_minutes: i64,
    notification_emails: Vec<String>,
    is_enabled: bool,
    suppress_notifications_minutes: i64,
    value_aggregation_type: ValueAggregationType,
    #[serde(default)]
    value_aggregation_field: Option<String>,
    group_by_aggregation_fields: Vec<String>,
    alert_notification_endpoints: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct AlertState {
    title: String,
    description: String,
    query_string: String,
    filter: String,
    operation: Operation,
    severity_threshold_tiers: Vec<SeverityThreshold>,
    search_timeframe_minutes: i64,
    notification_emails: Vec<String>,
    is_enabled: bool,
    suppress_notifications_minutes: i64,
    value_aggregation_type: ValueAggregationType,
    value_aggregation_field: Option<String>,
    group_by_aggregation_fields: Vec<String>,
    alert_notification_endpoints: Vec<i64>,
    last_updated: Option<String>,
}

impl AlertConfig {
    fn into_request(self) -> Result<AlertRequest, ProviderError> {
        validation::non_empty("title", &self.title)?;
        validation::non_empty("query_string", &self.query_string)?;
        validation::positive("search_timeframe_minutes", self.search_timeframe_minutes)?;
        for address in &self.notification_emails {
            validation::email("notification_emails", address)?;
        }

        let request = AlertRequest {
            title: self.title,
            description: self.description,
            query_string: self.query_string,
            filter: self.filter,
            operation: self.operation,
            severity_threshold_tiers: self.severity_threshold_tiers,
            search_time_frame_minutes: self.search_timeframe_minutes,
            notification_emails: self.notification_emails,
            is_enabled: self.is_enabled,
            suppress_notifications_minutes: self.suppress_notifications_minutes,
            value_aggregation_type: self.value_aggregation_type,
            value_aggregation_field: self.value_aggregation_field.filter(|field| !field.is_empty()),
            group_by_aggregation_fields: Some(self.group_by_aggregation_fields)
                .filter(|fields| !fields.is_empty()),
            alert_notification_endpoints: self.alert_notification_endpoints,
        };
        request.validate()?;
        Ok(request)
    }
}

impl From<Alert> for AlertState {
    fn from(alert: Alert) -> Self {
        Self {
            title: alert.title,
            description: alert.description.unwrap_or_default(),
            query_string: alert.query_string.unwrap_or_default(),
            filter: alert.filter.unwrap_or_default(),
            operation: alert.operation,
            severity_threshold_tiers: alert.severity_threshold_tiers,
            search_timeframe_minutes: alert.search_time_frame_minutes,
            notification_emails: alert.notification_emails,
            is_enabled: alert.is_enabled,
            suppress_notifications_minutes: alert.suppress_notifications_minutes,
            value_aggregation_type: alert.value_aggregation_type,
            value_aggregation_field: alert.value_aggregation_field,
            group_by_aggregation_fields: alert.group_by_aggregation_fields.unwrap_or_default(),
            alert_notification_endpoints: alert.alert_notification_endpoints,
            last_updated: alert.last_updated,
        }
    }
}

fn state(alert: Alert) -> Result<Value, ProviderError> {
    let id = alert.alert_id;
    encode_state(id, &AlertState::from(alert))
}

#[async_trait]
impl Resource for AlertResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("title", Attribute::required_string())
            .with_attribute("description", Attribute::optional_string().with_default(json!("")))
            .with_attribute(
                "query_string",
                Attribute::required_string().with_description("Lucene query the alert runs"),
            )
            .with_attribute("filter", Attribute::optional_string().with_default(json!("")))
            .with_attribute(
                "operation",
                Attribute::required_string().with_description(
                    "LESS_THAN, GREATER_THAN, LESS_THAN_OR_EQUALS, GREATER_THAN_OR_EQUALS, EQUALS or NOT_EQUALS",
                ),
            )
            .with_attribute(
                "severity_threshold_tiers",
                Attribute::block_list([
                    ("severity", Attribute::required_string()),
                    ("threshold", Attribute::required(AttributeType::Int)),
                ])
                .mandatory(),
            )
            .with_attribute(
                "search_timeframe_minutes",
                Attribute::required(AttributeType::Int),
            )
            .with_attribute(
                "notification_emails",
                Attribute::required(AttributeType::StringList),
            )
            .with_attribute(
                "is_enabled",
                Attribute::optional(AttributeType::Bool).with_default(json!(true)),
            )
            .with_attribute(
                "suppress_notifications_minutes",
                Attribute::optional(AttributeType::Int).with_default(json!(0)),
            )
            .with_attribute(
                "value_aggregation_type",
                Attribute::required_string()
                    .with_description("SUM, MIN, MAX, AVG, COUNT, UNIQUE_COUNT or NONE"),
            )
            .with_attribute("value_aggregation_field", Attribute::optional_string())
            .with_attribute(
                "group_by_aggregation_fields",
                Attribute::optional(AttributeType::StringList).with_default(json!([])),
            )
            .with_attribute(
                "alert_notification_endpoints",
                Attribute::optional(AttributeType::IntList).with_default(json!([])),
            )
            .with_attribute("last_updated", Attribute::computed_string())
    }

    async fn create(&self, client: &LogzioClient, config: Value) -> Result<Value, ProviderError> {
        let request = decode_config::<AlertConfig>(TYPE_NAME, config)?.into_request()?;
        let alert = client.create_alert(&request).await?;
        state(alert)
    }

    async fn read(&self, client: &LogzioClient, id: &str) -> Result<Value, ProviderError> {
        let alert = client.get_alert(parse_id(id)?).await?;
        state(alert)
    }

    async fn update(
        &self,
        client: &LogzioClient,
        id: &str,
        _prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let alert_id = parse_id(id)?;
        let request = decode_config::<AlertConfig>(TYPE_NAME, config)?.into_request()?;
        let alert = client.update_alert(alert_id, &request).await?;
        state(alert)
    }

    async fn delete(&self, client: &LogzioClient, id: &str) -> Result<(), ProviderError> {
        client.delete_alert(parse_id(id)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn config() -> Value {
        let mut config = json!({
            "title": "5xx spike",
            "query_string": "status:[500 TO 599]",
            "operation": "GREATER_THAN",
            "severity_threshold_tiers": [{"severity": "HIGH", "threshold": 25}],
            "search_timeframe_minutes": 10,
            "notification_emails": ["ops@example.com"],
            "value_aggregation_type": "NONE"
        });
        AlertResource.schema().apply_defaults(&mut config);
        config
    }

    fn remote(id: i64) -> Value {
        json!({
            "alertId": id,
            "title": "5xx spike",
            "description": "",
            "query_string": "status:[500 TO 599]",
            "filter": "",
            "operation": "GREATER_THAN",
            "severityThresholdTiers": [{"severity": "HIGH", "threshold": 25}],
            "searchTimeFrameMinutes": 10,
            "notificationEmails": ["ops@example.com"],
            "isEnabled": true,
            "suppressNotificationsMinutes": 0,
            "valueAggregationType": "NONE",
            "valueAggregationField": null,
            "groupByAggregationFields": null,
            "alertNotificationEndpoints": [],
            "lastUpdated": "2024-03-01T10:00:00Z"
        })
    }

    #[test]
    fn schema_accepts_minimal_config() {
        assert!(AlertResource.schema().validate(&config()).is_empty());
    }

    #[test]
    fn unknown_operation_is_a_descriptive_error() {
        let mut bad = config();
        bad["operation"] = json!("ROUGHLY");
        let err = decode_config::<AlertConfig>(TYPE_NAME, bad).unwrap_err();
        assert!(err.to_string().contains("ROUGHLY"));
    }

    #[test]
    fn malformed_notification_email_is_rejected() {
        let mut bad = config();
        bad["notification_emails"] = json!(["not-an-email"]);
        let err = decode_config::<AlertConfig>(TYPE_NAME, bad)
            .unwrap()
            .into_request()
            .unwrap_err();
        assert!(err.to_string().contains("notification_emails"));
    }

    #[test]
    fn empty_group_by_is_sent_as_absent() {
        let request = decode_config::<AlertConfig>(TYPE_NAME, config())
            .unwrap()
            .into_request()
            .unwrap();
        assert_eq!(request.group_by_aggregation_fields, None);
        assert_eq!(request.search_time_frame_minutes, 10);
    }

    #[tokio::test]
    async fn read_maps_null_description_and_filter_to_empty() {
        let server = MockServer::start().await;
        let mut body = remote(12);
        body["description"] = json!(null);
        body["filter"] = json!(null);
        Mock::given(method("GET"))
            .and(path("/v1/alerts/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = LogzioClient::new("t".into(), server.uri());
        let state = AlertResource.read(&client, "12").await.unwrap();
        assert_eq!(state["description"], "");
        assert_eq!(state["filter"], "");
        assert_eq!(state["query_string"], "status:[500 TO 599]");
    }

    #[tokio::test]
    async fn create_maps_fields_and_returns_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/alerts"))
            .and(body_partial_json(json!({
                "title": "5xx spike",
                "searchTimeFrameMinutes": 10,
                "isEnabled": true,
                "notificationEmails": ["ops@example.com"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(remote(31)))
            .expect(1)
            .mount(&server)
            .await;

        let client = LogzioClient::new("t".into(), server.uri());
        let state = AlertResource.create(&client, config()).await.unwrap();
        assert_eq!(state["id"], "31");
        assert_eq!(state["title"], "5xx spike");
        assert_eq!(state["operation"], "GREATER_THAN");
        assert_eq!(state["search_timeframe_minutes"], 10);
        assert_eq!(state["group_by_aggregation_fields"], json!([]));
        assert_eq!(state["last_updated"], "2024-03-01T10:00:00Z");
    }

    #[tokio::test]
    async fn read_with_malformed_id_does_not_call_api() {
        let server = MockServer::start().await;
        let client = LogzioClient::new("t".into(), server.uri());
        let err = AlertResource.read(&client, "alert-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidId(_)));
    }
}
