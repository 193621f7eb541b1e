//! Handlers that forward host calls to the [`Provider`](crate::provider::Provider).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::PluginState;
use crate::error::ProviderError;
use crate::provider::{PlanResult, ProviderSchema};

type ApiError = (StatusCode, Json<Value>);

// ---- Request shapes ----

#[derive(Debug, Deserialize)]
pub struct ChangeRequest {
    #[serde(default)]
    pub prior: Value,
    pub config: Value,
}

// ---- Helpers ----

fn status_for(err: &ProviderError) -> StatusCode {
    match err {
        ProviderError::Config(_)
        | ProviderError::Validation(_)
        | ProviderError::InvalidId(_)
        | ProviderError::UnknownResource(_) => StatusCode::BAD_REQUEST,
        ProviderError::NotFound(_) => StatusCode::NOT_FOUND,
        ProviderError::NotConfigured => StatusCode::PRECONDITION_FAILED,
        ProviderError::Api { .. } | ProviderError::Network(_) | ProviderError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn error_response(err: ProviderError) -> ApiError {
    (
        status_for(&err),
        Json(json!({ "error": err.to_string(), "kind": err.kind() })),
    )
}

// ---- Handlers ----

/// `GET /schema`
pub async fn schema(State(state): State<PluginState>) -> Json<ProviderSchema> {
    Json(state.provider.schema())
}

/// `POST /configure`
pub async fn configure(
    State(state): State<PluginState>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    state
        .provider
        .configure(body)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /resources/:type_name`
pub async fn create_resource(
    State(state): State<PluginState>,
    Path(type_name): Path<String>,
    Json(config): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = state
        .provider
        .create(&type_name, config)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /resources/:type_name/:id`
pub async fn read_resource(
    State(state): State<PluginState>,
    Path((type_name, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let current = state
        .provider
        .read(&type_name, &id)
        .await
        .map_err(error_response)?;
    Ok(Json(current))
}

/// `PUT /resources/:type_name/:id`
pub async fn update_resource(
    State(state): State<PluginState>,
    Path((type_name, id)): Path<(String, String)>,
    Json(body): Json<ChangeRequest>,
) -> Result<Json<Value>, ApiError> {
    let updated = state
        .provider
        .update(&type_name, &id, body.prior, body.config)
        .await
        .map_err(error_response)?;
    Ok(Json(updated))
}

/// `DELETE /resources/:type_name/:id`
pub async fn delete_resource(
    State(state): State<PluginState>,
    Path((type_name, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .provider
        .delete(&type_name, &id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /resources/:type_name/plan`
pub async fn plan_resource(
    State(state): State<PluginState>,
    Path(type_name): Path<String>,
    Json(body): Json<ChangeRequest>,
) -> Result<Json<PlanResult>, ApiError> {
    let plan = state
        .provider
        .plan(&type_name, &body.prior, body.config)
        .map_err(error_response)?;
    Ok(Json(plan))
}
