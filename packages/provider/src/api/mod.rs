//! HTTP transport for the plugin contract.
//!
//! Routes:
//! - `GET    /health`                      liveness and configuration status
//! - `GET    /metrics`                     Prometheus text exposition
//! - `GET    /schema`                      provider and resource schemas
//! - `POST   /configure`                   provider block (`api_token`, `base_url`)
//! - `POST   /resources/:type_name`        create
//! - `GET    /resources/:type_name/:id`    read
//! - `PUT    /resources/:type_name/:id`    update, body `{prior, config}`
//! - `DELETE /resources/:type_name/:id`    delete
//! - `POST   /resources/:type_name/plan`   diff, body `{prior, config}`

pub mod health;
pub mod plugin;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::metrics::ProviderMetrics;
use crate::provider::Provider;

#[derive(Clone)]
pub struct PluginState {
    pub provider: Arc<Provider>,
    pub metrics: Arc<ProviderMetrics>,
}

pub fn create_router(state: PluginState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route("/schema", get(plugin::schema))
        .route("/configure", post(plugin::configure))
        .route("/resources/:type_name", post(plugin::create_resource))
        .route(
            "/resources/:type_name/:id",
            get(plugin::read_resource)
                .put(plugin::update_resource)
                .delete(plugin::delete_resource),
        )
        .route("/resources/:type_name/plan", post(plugin::plan_resource))
        .with_state(state)
}
