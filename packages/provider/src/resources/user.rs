//! `logzio_user`: account users and their roles.
//!
//! The user API has no `active` field on write. Deactivation goes through
//! the suspend/unsuspend calls, so create and update reconcile the declared
//! flag against what the service reports after the write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::provider::resource::{decode_config, encode_state, parse_id, Resource};
use crate::provider::schema::{Attribute, AttributeType, Schema};
use crate::resources::validation;
use crate::services::users::{User, UserRequest, VALID_ROLES};
use crate::services::LogzioClient;

pub const TYPE_NAME: &str = "logzio_user";

pub struct UserResource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UserDocument {
    username: String,
    fullname: String,
    account_id: i64,
    roles: Vec<i32>,
    active: bool,
}

impl UserDocument {
    fn validate(&self) -> Result<(), ProviderError> {
        validation::email("username", &self.username)?;
        validation::non_empty("fullname", &self.fullname)?;
        validation::positive("account_id", self.account_id)?;
        if self.roles.is_empty() {
            return Err(ProviderError::validation("roles must contain at least one role"));
        }
        if let Some(role) = self.roles.iter().find(|role| !VALID_ROLES.contains(role)) {
            return Err(ProviderError::validation(format!(
                "unknown role {}. Valid roles are 1 (read-only), 2 (user) and 3 (account admin)",
                role
            )));
        }
        Ok(())
    }

    fn request(&self) -> UserRequest {
        UserRequest {
            username: self.username.clone(),
            full_name: self.fullname.clone(),
            account_id: self.account_id,
            roles: self.roles.clone(),
        }
    }
}

impl From<User> for UserDocument {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            fullname: user.full_name,
            account_id: user.account_id,
            roles: user.roles,
            active: user.active,
        }
    }
}

/// Bring the remote activation flag in line with `desired`.
async fn reconcile_active(
    client: &LogzioClient,
    user_id: i64,
    desired: bool,
) -> Result<User, ProviderError> {
    let user = client.get_user(user_id).await?;
    if user.active == desired {
        return Ok(user);
    }

    if desired {
        tracing::info!(user_id, "Unsuspending user");
        client.unsuspend_user(user_id).await?;
    } else {
        tracing::info!(user_id, "Suspending user");
        client.suspend_user(user_id).await?;
    }
    client.get_user(user_id).await
}

fn state(user: User) -> Result<Value, ProviderError> {
    let id = user.id;
    encode_state(id, &UserDocument::from(user))
}

#[async_trait]
impl Resource for UserResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "username",
                Attribute::required_string().with_description("Email address the user logs in with"),
            )
            .with_attribute("fullname", Attribute::required_string())
            .with_attribute(
                "account_id",
                Attribute::required(AttributeType::Int).force_new(),
            )
            .with_attribute(
                "roles",
                Attribute::required(AttributeType::IntList)
                    .with_description("1 = read-only, 2 = user, 3 = account admin"),
            )
            .with_attribute(
                "active",
                Attribute::optional(AttributeType::Bool).with_default(json!(true)),
            )
    }

    async fn create(&self, client: &LogzioClient, config: Value) -> Result<Value, ProviderError> {
        let document = decode_config::<UserDocument>(TYPE_NAME, config)?;
        document.validate()?;

        let user_id = client.create_user(&document.request()).await?;
        state(reconcile_active(client, user_id, document.active).await?)
    }

    async fn read(&self, client: &LogzioClient, id: &str) -> Result<Value, ProviderError> {
        state(client.get_user(parse_id(id)?).await?)
    }

    /// Writes the user record only when one of its fields changed, then
    /// reconciles `active` separately.
    async fn update(
        &self,
        client: &LogzioClient,
        id: &str,
        prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let user_id = parse_id(id)?;
        let document = decode_config::<UserDocument>(TYPE_NAME, config)?;
        document.validate()?;

        let record_changed = match serde_json::from_value::<UserDocument>(prior) {
            Ok(prior) => prior.request() != document.request(),
            Err(_) => true,
        };
        if record_changed {
            client.update_user(user_id, &document.request()).await?;
        } else {
            tracing::debug!(user_id, "User record unchanged, skipping PUT");
        }

        state(reconcile_active(client, user_id, document.active).await?)
    }

    async fn delete(&self, client: &LogzioClient, id: &str) -> Result<(), ProviderError> {
        client.delete_user(parse_id(id)?).await
    }
}
