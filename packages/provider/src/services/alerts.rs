//! Alerts API (`/v1/alerts`).

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::services::logzio::LogzioClient;

const ALERTS_PATH: &str = "/v1/alerts";

/// Comparison applied between the aggregated value and each threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    LessThan,
    GreaterThan,
    LessThanOrEquals,
    GreaterThanOrEquals,
    Equals,
    NotEquals,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::LessThan => "LESS_THAN",
            Operation::GreaterThan => "GREATER_THAN",
            Operation::LessThanOrEquals => "LESS_THAN_OR_EQUALS",
            Operation::GreaterThanOrEquals => "GREATER_THAN_OR_EQUALS",
            Operation::Equals => "EQUALS",
            Operation::NotEquals => "NOT_EQUALS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueAggregationType {
    Sum,
    Min,
    Max,
    Avg,
    Count,
    UniqueCount,
    None,
}

impl ValueAggregationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueAggregationType::Sum => "SUM",
            ValueAggregationType::Min => "MIN",
            ValueAggregationType::Max => "MAX",
            ValueAggregationType::Avg => "AVG",
            ValueAggregationType::Count => "COUNT",
            ValueAggregationType::UniqueCount => "UNIQUE_COUNT",
            ValueAggregationType::None => "NONE",
        }
    }

    /// `NONE` and `COUNT` aggregate over documents, not over a field.
    pub fn takes_field(&self) -> bool {
        !matches!(self, ValueAggregationType::None | ValueAggregationType::Count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    pub severity: Severity,
    pub threshold: i64,
}

/// Request body for create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "query_string")]
    pub query_string: String,
    pub filter: String,
    pub operation: Operation,
    pub severity_threshold_tiers: Vec<SeverityThreshold>,
    pub search_time_frame_minutes: i64,
    pub notification_emails: Vec<String>,
    pub is_enabled: bool,
    pub suppress_notifications_minutes: i64,
    pub value_aggregation_type: ValueAggregationType,
    pub value_aggregation_field: Option<String>,
    pub group_by_aggregation_fields: Option<Vec<String>>,
    pub alert_notification_endpoints: Vec<i64>,
}

/// An alert as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub alert_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "query_string", default)]
    pub query_string: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    pub operation: Operation,
    #[serde(default)]
    pub severity_threshold_tiers: Vec<SeverityThreshold>,
    pub search_time_frame_minutes: i64,
    #[serde(default)]
    pub notification_emails: Vec<String>,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub suppress_notifications_minutes: i64,
    pub value_aggregation_type: ValueAggregationType,
    #[serde(default)]
    pub value_aggregation_field: Option<String>,
    #[serde(default)]
    pub group_by_aggregation_fields: Option<Vec<String>>,
    #[serde(default)]
    pub alert_notification_endpoints: Vec<i64>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl AlertRequest {
    /// Checks Logz.io rejects anyway, done locally for a clearer message.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.title.trim().is_empty() {
            return Err(ProviderError::validation("alert title must not be empty"));
        }
        if self.query_string.trim().is_empty() {
            return Err(ProviderError::validation("alert query_string must not be empty"));
        }
        if self.severity_threshold_tiers.is_empty() {
            return Err(ProviderError::validation(
                "alert needs at least one severity threshold tier",
            ));
        }
        if self.search_time_frame_minutes <= 0 {
            return Err(ProviderError::validation(
                "search_timeframe_minutes must be greater than zero",
            ));
        }
        if self.suppress_notifications_minutes < 0 {
            return Err(ProviderError::validation(
                "suppress_notifications_minutes must not be negative",
            ));
        }

        let has_field = self
            .value_aggregation_field
            .as_deref()
            .is_some_and(|field| !field.is_empty());
        let has_group_by = self
            .group_by_aggregation_fields
            .as_ref()
            .is_some_and(|fields| !fields.is_empty());

        if self.value_aggregation_type.takes_field() {
            if !has_field {
                return Err(ProviderError::validation(format!(
                    "value_aggregation_field is required when value_aggregation_type is {}",
                    self.value_aggregation_type.as_str()
                )));
            }
        } else if has_field || has_group_by {
            return Err(ProviderError::validation(format!(
                "value_aggregation_field and group_by_aggregation_fields must be unset when value_aggregation_type is {}",
                self.value_aggregation_type.as_str()
            )));
        }

        Ok(())
    }
}

impl LogzioClient {
    pub async fn create_alert(&self, request: &AlertRequest) -> Result<Alert, ProviderError> {
        request.validate()?;
        self.post_json(ALERTS_PATH, request).await
    }

    pub async fn get_alert(&self, alert_id: i64) -> Result<Alert, ProviderError> {
        self.get_json(&format!("{}/{}", ALERTS_PATH, alert_id)).await
    }

    pub async fn update_alert(
        &self,
        alert_id: i64,
        request: &AlertRequest,
    ) -> Result<Alert, ProviderError> {
        request.validate()?;
        self.put_json(&format!("{}/{}", ALERTS_PATH, alert_id), request)
            .await
    }

    pub async fn delete_alert(&self, alert_id: i64) -> Result<(), ProviderError> {
        self.delete(&format!("{}/{}", ALERTS_PATH, alert_id)).await
    }

    pub async fn list_alerts(&self) -> Result<Vec<Alert>, ProviderError> {
        self.get_json(ALERTS_PATH).await
    }
}
