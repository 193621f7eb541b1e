//! User management API (`/v1/user-management`).

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::services::logzio::{CreatedId, LogzioClient};

const USERS_PATH: &str = "/v1/user-management";

pub const USER_ROLE_READ_ONLY: i32 = 1;
pub const USER_ROLE_REGULAR: i32 = 2;
pub const USER_ROLE_ACCOUNT_ADMIN: i32 = 3;

pub const VALID_ROLES: &[i32] = &[USER_ROLE_READ_ONLY, USER_ROLE_REGULAR, USER_ROLE_ACCOUNT_ADMIN];

/// Create/update body. Activation is not part of it; see
/// [`LogzioClient::suspend_user`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub username: String,
    pub full_name: String,
    pub account_id: i64,
    pub roles: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub account_id: i64,
    #[serde(default)]
    pub roles: Vec<i32>,
    #[serde(default)]
    pub active: bool,
}

impl LogzioClient {
    pub async fn create_user(&self, request: &UserRequest) -> Result<i64, ProviderError> {
        let created: CreatedId = self.post_json(USERS_PATH, request).await?;
        Ok(created.id)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, ProviderError> {
        self.get_json(&format!("{}/{}", USERS_PATH, user_id)).await
    }

    pub async fn update_user(&self, user_id: i64, request: &UserRequest) -> Result<(), ProviderError> {
        self.put_discard(&format!("{}/{}", USERS_PATH, user_id), request)
            .await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), ProviderError> {
        self.delete(&format!("{}/{}", USERS_PATH, user_id)).await
    }

    pub async fn suspend_user(&self, user_id: i64) -> Result<(), ProviderError> {
        self.post_empty(&format!("{}/suspend/{}", USERS_PATH, user_id))
            .await
    }

    pub async fn unsuspend_user(&self, user_id: i64) -> Result<(), ProviderError> {
        self.post_empty(&format!("{}/unsuspend/{}", USERS_PATH, user_id))
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ProviderError> {
        self.get_json(USERS_PATH).await
    }
}
