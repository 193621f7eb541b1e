use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://api.logz.io";

/// Header Logz.io reads the account API token from.
pub const API_TOKEN_HEADER: &str = "X-API-TOKEN";

#[derive(Clone)]
pub struct LogzioClient {
    base_url: String,
    api_token: String,
    http: Client,
}

/// Body returned by create calls that only echo the new identifier.
#[derive(Debug, Deserialize)]
pub struct CreatedId {
    pub id: i64,
}

impl LogzioClient {
    pub fn new(api_token: String, base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "Logz.io request");

        self.http
            .request(method, url)
            .header(API_TOKEN_HEADER, &self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    /// Send a request and turn any non-2xx status into a `ProviderError`.
    ///
    /// 404 becomes `NotFound`; every other failure status keeps the response
    /// body verbatim so the host sees what Logz.io said.
    async fn execute(&self, request: RequestBuilder, path: &str) -> Result<Response, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|err| ProviderError::Network(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(path.to_string()));
        }

        tracing::warn!(status = status.as_u16(), path, "Logz.io API call failed");
        Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
        response
            .json::<T>()
            .await
            .map_err(|err| ProviderError::Parse(err.to_string()))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let response = self.execute(self.request(Method::GET, path), path).await?;
        Self::decode(response).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::POST, path).json(body), path)
            .await?;
        Self::decode(response).await
    }

    pub(crate) async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::PUT, path).json(body), path)
            .await?;
        Self::decode(response).await
    }

    /// PUT where the response body is not needed.
    pub(crate) async fn put_discard<B>(&self, path: &str, body: &B) -> Result<(), ProviderError>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.request(Method::PUT, path).json(body), path)
            .await?;
        Ok(())
    }

    /// POST with no body whose response is ignored (suspend/unsuspend).
    pub(crate) async fn post_empty(&self, path: &str) -> Result<(), ProviderError> {
        self.execute(self.request(Method::POST, path), path).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ProviderError> {
        self.execute(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }
}
