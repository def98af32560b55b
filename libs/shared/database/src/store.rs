use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Writes are bounded; a timed-out write surfaces as a transport error and is
/// never assumed to have succeeded.
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document conflict")]
    Conflict,

    #[error("document not found")]
    NotFound,

    #[error("store rejected credentials: {0}")]
    Auth(String),

    #[error("store request failed: {0}")]
    Transport(String),

    #[error("failed to decode store response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// REST adapter for the document store. Collections are addressed as
/// `/v1/{collection}`; documents as `/v1/{collection}/{id}`. The store assigns
/// document ids on insert and returns the created representation.
pub struct DocStoreClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DocStoreClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.store_url.clone(),
            api_key: config.store_api_key.clone(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request: {} {}", method, url);

        let mut headers = self.headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth(error_text),
                StatusCode::NOT_FOUND => StoreError::NotFound,
                StatusCode::CONFLICT => StoreError::Conflict,
                _ => StoreError::Transport(format!("{}: {}", status, error_text)),
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Fetch every document in a collection.
    pub async fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        let path = format!("/v1/{}", collection);
        let response = self.send(Method::GET, &path, None, None).await?;
        Self::decode(response).await
    }

    /// Fetch documents matching a pre-built filter query string.
    pub async fn query<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &str,
    ) -> Result<Vec<T>, StoreError> {
        let path = format!("/v1/{}?{}", collection, filter);
        let response = self.send(Method::GET, &path, None, None).await?;
        Self::decode(response).await
    }

    pub async fn fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        let path = format!("/v1/{}/{}", collection, id);
        let response = self.send(Method::GET, &path, None, None).await?;
        Self::decode(response).await
    }

    /// Insert a document; the store assigns the id and returns the created
    /// representation. A store-side uniqueness violation maps to
    /// `StoreError::Conflict`, which makes this call a conditional create.
    pub async fn insert<T: DeserializeOwned>(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<T, StoreError> {
        let path = format!("/v1/{}", collection);

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let response = self
            .send(Method::POST, &path, Some(document), Some(headers))
            .await?;
        Self::decode(response).await
    }

    pub async fn update<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<T, StoreError> {
        let path = format!("/v1/{}/{}", collection, id);

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let response = self
            .send(Method::PATCH, &path, Some(patch), Some(headers))
            .await?;
        Self::decode(response).await
    }

    pub async fn remove(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let path = format!("/v1/{}/{}", collection, id);
        self.send(Method::DELETE, &path, None, None).await?;
        Ok(())
    }
}
